//! `sl categories` — list the workspace's labeling categories.

use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render_list};
use clap::Args;
use sleuth_core::api::WorkspaceBackend;
use sleuth_core::model::Category;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct CategoriesArgs {}

struct CategoryRow(Category);

impl Renderable for CategoryRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_kv(w, "category", &self.0.category_id)?;
        pretty_kv(w, "name", &self.0.name)?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}\t{}", self.0.category_id, self.0.name)
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "name"]
    }
}

pub async fn run_categories<B: WorkspaceBackend>(
    _args: &CategoriesArgs,
    backend: &B,
    output: OutputMode,
) -> anyhow::Result<()> {
    let categories = backend.fetch_categories().await?;
    let rows: Vec<CategoryRow> = categories.into_iter().map(CategoryRow).collect();
    render_list(&rows, output)?;
    Ok(())
}
