//! `sl status` — labeling progress and model state for a category.

use crate::output::{OutputMode, Renderable, pretty_kv, pretty_section};
use clap::Args;
use serde::Serialize;
use sleuth_core::api::WorkspaceBackend;
use sleuth_core::model::LabelingStatus;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Category to report on.
    #[arg(value_name = "CATEGORY")]
    pub category: String,
}

#[derive(Serialize)]
struct StatusReport {
    category: String,
    model_version: Option<i64>,
    progress: f64,
    labeling_counts: std::collections::BTreeMap<String, u64>,
}

impl Renderable for StatusReport {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("category {}", self.category))?;
        let model = self
            .model_version
            .map_or_else(|| "none trained".to_string(), |v| format!("v{v}"));
        pretty_kv(w, "model", model)?;
        pretty_kv(w, "progress", format!("{:.0}%", self.progress))?;
        for (value, count) in &self.labeling_counts {
            pretty_kv(w, value, count.to_string())?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(w, self).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let model = self.model_version.unwrap_or(-1);
        writeln!(
            w,
            "{}\t{}\t{:.0}",
            self.category, model, self.progress
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["category", "model", "progress"]
    }
}

pub async fn run_status<B: WorkspaceBackend>(
    args: &StatusArgs,
    backend: &B,
    output: OutputMode,
) -> anyhow::Result<()> {
    let status: LabelingStatus = backend.fetch_status(&args.category).await?;
    let model_version = backend.latest_model_version(&args.category).await?;

    let report = StatusReport {
        category: args.category.clone(),
        model_version,
        progress: status.progress,
        labeling_counts: status.labeling_counts,
    };
    crate::output::render_item(&report, output)?;
    Ok(())
}
