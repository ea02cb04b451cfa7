//! `sl documents` — list the workspace corpus.

use crate::output::{OutputMode, Renderable, pretty_kv, render_list};
use clap::Args;
use sleuth_core::api::WorkspaceBackend;
use sleuth_core::model::Document;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct DocumentsArgs {
    /// Maximum documents to show.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

struct DocumentRow(Document);

impl Renderable for DocumentRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_kv(w, "document", &self.0.document_id)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", self.0.document_id)
    }

    fn table_headers() -> &'static [&'static str] {
        &["document"]
    }
}

pub async fn run_documents<B: WorkspaceBackend>(
    args: &DocumentsArgs,
    backend: &B,
    output: OutputMode,
) -> anyhow::Result<()> {
    let documents = backend.fetch_documents().await?;
    let rows: Vec<DocumentRow> = documents
        .into_iter()
        .take(args.limit)
        .map(DocumentRow)
        .collect();
    render_list(&rows, output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: DocumentsArgs,
    }

    #[test]
    fn documents_args_defaults() {
        let w = Wrapper::parse_from(["test"]);
        assert_eq!(w.args.limit, 50);
    }

    #[test]
    fn limit_flag_parses() {
        let w = Wrapper::parse_from(["test", "-n", "5"]);
        assert_eq!(w.args.limit, 5);
    }
}
