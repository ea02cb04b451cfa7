#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use sleuth_core::api::HttpBackend;
use sleuth_core::config::{Overrides, resolve_config};
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sleuth: human-in-the-loop text labeling workbench",
    long_about = None
)]
struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (shorthand for --format json).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Workspace service base URL.
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Workspace to operate on.
    #[arg(short, long, global = true)]
    workspace: Option<String>,

    /// Bearer credential for the workspace service.
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            server_url: self.server_url.clone(),
            workspace: self.workspace.clone(),
            token: self.token.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "List the workspace corpus",
        after_help = "EXAMPLES:\n    # List documents\n    sl documents\n\n    # Emit machine-readable output\n    sl documents --json"
    )]
    Documents(cmd::documents::DocumentsArgs),

    #[command(
        next_help_heading = "Read",
        about = "List labeling categories",
        after_help = "EXAMPLES:\n    # List categories\n    sl categories\n\n    # Emit machine-readable output\n    sl categories --json"
    )]
    Categories(cmd::categories::CategoriesArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one document's elements",
        after_help = "EXAMPLES:\n    # Show a document\n    sl elements d12\n\n    # Emit machine-readable output\n    sl elements d12 --json"
    )]
    Elements(cmd::elements::ElementsArgs),

    #[command(
        next_help_heading = "Labeling",
        about = "Show the recommendation queue",
        long_about = "Show the elements the active-learning loop recommends labeling next.",
        after_help = "EXAMPLES:\n    # What should I label next?\n    sl recommend c1"
    )]
    Recommend(cmd::recommend::RecommendArgs),

    #[command(
        next_help_heading = "Labeling",
        about = "Assign a label to an element",
        after_help = "EXAMPLES:\n    # Positive label\n    sl label d12-3 --category c1\n\n    # Negative label\n    sl label d12-3 --category c1 --value false"
    )]
    Label(cmd::label::LabelArgs),

    #[command(
        next_help_heading = "Read",
        about = "Search the corpus",
        after_help = "EXAMPLES:\n    # Unscoped keyword search\n    sl search \"late filing\"\n\n    # Scoped to one category\n    sl search \"late filing\" --category c1"
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        next_help_heading = "Labeling",
        about = "Show labeling progress for a category",
        after_help = "EXAMPLES:\n    # Progress and model state\n    sl status c1\n\n    # Emit machine-readable output\n    sl status c1 --json"
    )]
    Status(cmd::status::StatusArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SLEUTH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "sleuth=debug,info"
        } else {
            "sleuth=info,warn"
        })
    });

    let format = env::var("SLEUTH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();

    let config = resolve_config(&cli.overrides())?;
    let backend = HttpBackend::new(&config.server_url, &config.workspace_id, &config.token)?;

    match cli.command {
        Commands::Documents(ref args) => {
            cmd::documents::run_documents(args, &backend, output).await
        }
        Commands::Categories(ref args) => {
            cmd::categories::run_categories(args, &backend, output).await
        }
        Commands::Elements(ref args) => cmd::elements::run_elements(args, &backend, output).await,
        Commands::Recommend(ref args) => {
            cmd::recommend::run_recommend(args, &backend, output).await
        }
        Commands::Label(ref args) => cmd::label::run_label(args, &backend, output).await,
        Commands::Search(ref args) => cmd::search::run_search(args, &backend, output).await,
        Commands::Status(ref args) => cmd::status::run_status(args, &backend, output).await,
    }
}
