//! `sl search` — keyword search over the workspace corpus.

use super::ElementRow;
use crate::output::{OutputMode, render_list};
use clap::Args;
use sleuth_core::api::WorkspaceBackend;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query string.
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Scope results to one category.
    #[arg(short, long)]
    pub category: Option<String>,
}

pub async fn run_search<B: WorkspaceBackend>(
    args: &SearchArgs,
    backend: &B,
    output: OutputMode,
) -> anyhow::Result<()> {
    let elements = backend
        .search(&args.query, args.category.as_deref())
        .await?;
    let rows: Vec<ElementRow> = elements.into_iter().map(ElementRow).collect();
    render_list(&rows, output)?;
    Ok(())
}
