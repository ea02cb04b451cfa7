//! sleuth-core library.
//!
//! Client core for the Sleuth labeling workbench: the workspace state
//! aggregate, the synchronization rules that keep server-derived views in
//! step with the analyst's category/document/model selection, the panel
//! visibility state machine, and the backend API client.
//!
//! # Conventions
//!
//! - **Errors**: fallible core operations return [`error::Result`]; the CLI
//!   boundary wraps with `anyhow`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod panels;
pub mod session;
pub mod state;
pub mod sync;

pub use error::{Error, Result};
