//! `sl elements` — show one document's elements.

use super::ElementRow;
use crate::output::{OutputMode, render_list};
use clap::Args;
use sleuth_core::api::WorkspaceBackend;

#[derive(Args, Debug)]
pub struct ElementsArgs {
    /// Document to read.
    #[arg(value_name = "DOCUMENT")]
    pub document: String,
}

pub async fn run_elements<B: WorkspaceBackend>(
    args: &ElementsArgs,
    backend: &B,
    output: OutputMode,
) -> anyhow::Result<()> {
    let elements = backend.fetch_document_elements(&args.document).await?;
    let rows: Vec<ElementRow> = elements.into_iter().map(ElementRow).collect();
    render_list(&rows, output)?;
    Ok(())
}
