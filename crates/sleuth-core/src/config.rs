//! Client configuration.
//!
//! Precedence (highest wins): CLI flags, then `SLEUTH_*` environment
//! variables, then the user config file at
//! `{config_dir}/sleuth/config.toml`, then built-in defaults.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::state::DEFAULT_BATCH_SIZE;

/// On-disk user configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Labels per training batch before the session re-checks the model.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            workspace: None,
            token: None,
            batch_size: default_batch_size(),
        }
    }
}

/// Fully resolved configuration a session can be built from.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub server_url: String,
    pub workspace_id: String,
    pub token: String,
    pub batch_size: u32,
}

/// Load a config file, tolerating its absence.
pub fn load_config_file(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str::<ClientConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the user config from the platform config directory.
pub fn load_user_config() -> Result<ClientConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ClientConfig::default());
    };
    load_config_file(&config_dir.join("sleuth/config.toml"))
}

/// Per-invocation overrides (CLI flags).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub workspace: Option<String>,
    pub token: Option<String>,
}

/// Resolve the effective config from file, environment, and flags.
pub fn resolve_config(overrides: &Overrides) -> Result<EffectiveConfig> {
    let file = load_user_config()?;
    let env = Overrides {
        server_url: env::var("SLEUTH_SERVER_URL").ok(),
        workspace: env::var("SLEUTH_WORKSPACE").ok(),
        token: env::var("SLEUTH_TOKEN").ok(),
    };
    resolve_config_inner(file, &env, overrides)
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_config_inner(
    file: ClientConfig,
    env: &Overrides,
    cli: &Overrides,
) -> Result<EffectiveConfig> {
    let server_url = cli
        .server_url
        .clone()
        .or_else(|| env.server_url.clone())
        .unwrap_or_else(|| file.server_url.clone());

    let Some(workspace_id) = cli
        .workspace
        .clone()
        .or_else(|| env.workspace.clone())
        .or_else(|| file.workspace.clone())
    else {
        bail!("no workspace configured; pass --workspace, set SLEUTH_WORKSPACE, or add it to config.toml");
    };

    let Some(token) = cli
        .token
        .clone()
        .or_else(|| env.token.clone())
        .or_else(|| file.token.clone())
    else {
        bail!("no token configured; pass --token, set SLEUTH_TOKEN, or add it to config.toml");
    };

    Ok(EffectiveConfig {
        server_url,
        workspace_id,
        token,
        batch_size: file.batch_size.max(1),
    })
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

const fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}
