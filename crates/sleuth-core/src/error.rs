//! Error taxonomy for the client core.
//!
//! Four failure families: transport, non-success HTTP status, malformed
//! response body, and local state violations (out-of-range navigation,
//! missing selections). Every variant carries a stable `E####` code for
//! machine parsing and an optional remediation hint.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Network/transport failure reaching the workspace service.
    #[error("request to workspace service failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("workspace service returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    /// The response body did not match the expected JSON shape.
    #[error("unexpected response shape from {endpoint}: {source}")]
    Malformed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Document navigation would leave `[0, documents.len())`.
    #[error("document index {requested} outside loaded range 0..{len}")]
    DocumentOutOfRange { requested: i64, len: usize },

    /// An operation that needs a category ran with none selected.
    #[error("no category selected")]
    NoCategorySelected,

    /// An operation that needs loaded documents ran before the corpus fetch.
    #[error("no documents loaded")]
    NoDocuments,

    /// Focus/label index beyond the current element set.
    #[error("element index {index} outside current document ({len} elements)")]
    ElementOutOfRange { index: usize, len: usize },

    /// The configuration file exists but could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E1001",
            Self::Status { .. } => "E1002",
            Self::Malformed { .. } => "E1003",
            Self::DocumentOutOfRange { .. } => "E2001",
            Self::NoCategorySelected => "E2002",
            Self::NoDocuments => "E2003",
            Self::ElementOutOfRange { .. } => "E2004",
            Self::Config(_) => "E3001",
        }
    }

    /// Optional remediation hint that can be surfaced to the analyst.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Transport(_) => Some("Check connectivity to the workspace service and retry."),
            Self::Status { .. } => Some("Retry; if persistent, verify the workspace id and token."),
            Self::Malformed { .. } => {
                Some("The service contract may have changed; check client/server versions.")
            }
            Self::DocumentOutOfRange { .. } => None,
            Self::NoCategorySelected => Some("Select a category first."),
            Self::NoDocuments => Some("Load the workspace documents before navigating."),
            Self::ElementOutOfRange { .. } => None,
            Self::Config(_) => Some("Fix syntax in the sleuth config.toml and retry."),
        }
    }

    /// True for failures that retry or user correction can recover; no
    /// failure in this core is fatal to the process.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        true
    }
}
