//! `sl label` — assign a label value to one element.

use crate::output::{OutputMode, render_success};
use clap::Args;
use sleuth_core::api::WorkspaceBackend;

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Element to label.
    #[arg(value_name = "ELEMENT")]
    pub element: String,

    /// Category the label belongs to.
    #[arg(short, long)]
    pub category: String,

    /// Label value ("true" or "false").
    #[arg(short, long, default_value = "true")]
    pub value: String,
}

pub async fn run_label<B: WorkspaceBackend>(
    args: &LabelArgs,
    backend: &B,
    output: OutputMode,
) -> anyhow::Result<()> {
    backend
        .put_label(&args.element, &args.category, &args.value)
        .await?;
    render_success(
        output,
        &format!(
            "labeled {} as {}={}",
            args.element, args.category, args.value
        ),
    )?;
    Ok(())
}
