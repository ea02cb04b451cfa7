//! `sl recommend` — the active-learning recommendation queue.

use super::ElementRow;
use crate::output::{OutputMode, render_list, render_success};
use clap::Args;
use sleuth_core::api::WorkspaceBackend;

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Category to recommend labeling targets for.
    #[arg(value_name = "CATEGORY")]
    pub category: String,
}

pub async fn run_recommend<B: WorkspaceBackend>(
    args: &RecommendArgs,
    backend: &B,
    output: OutputMode,
) -> anyhow::Result<()> {
    // No trained model yet means no queue; say so instead of an empty list.
    let version = backend.latest_model_version(&args.category).await?;
    if version.is_none() {
        render_success(
            output,
            "no trained model for this category yet; label more elements first",
        )?;
        return Ok(());
    }

    let elements = backend.fetch_recommendations(&args.category).await?;
    let rows: Vec<ElementRow> = elements.into_iter().map(ElementRow).collect();
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
        args: RecommendArgs,
    }

    #[test]
    fn category_argument_is_required() {
        assert!(Wrapper::try_parse_from(["test"]).is_err());
        let w = Wrapper::parse_from(["test", "c1"]);
        assert_eq!(w.args.category, "c1");
    }
}
