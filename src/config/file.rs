//! TOML configuration file loading
//!
//! Supports `~/.config/fanout-hub/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::assemble::ResponseShape;
use crate::dispatch::Extraction;
use crate::nodes::RowPolicy;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HubConfigFile {
    /// Hub identifier served on the info endpoint
    #[serde(default)]
    pub hub: Option<String>,

    /// Server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Node source configuration
    #[serde(default)]
    pub nodes: NodesFileConfig,

    /// Fan-out configuration
    #[serde(default)]
    pub dispatch: DispatchFileConfig,

    /// Response configuration
    #[serde(default)]
    pub response: ResponseFileConfig,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,
}

/// Node source configuration
#[derive(Debug, Default, Deserialize)]
pub struct NodesFileConfig {
    /// Path to the node CSV file
    pub path: Option<String>,

    /// "lenient" or "strict"
    pub row_policy: Option<RowPolicy>,
}

/// Fan-out configuration
#[derive(Debug, Default, Deserialize)]
pub struct DispatchFileConfig {
    /// "result_field" or "raw"
    pub extraction: Option<Extraction>,

    /// Overall deadline for one query, in seconds
    pub request_deadline_secs: Option<u64>,
}

/// Response configuration
#[derive(Debug, Default, Deserialize)]
pub struct ResponseFileConfig {
    /// "merged" or "per_node"
    pub shape: Option<ResponseShape>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<HubConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from `path`, or the standard path when `None`
///
/// Returns `HubConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> HubConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return HubConfigFile::default();
    };

    if !path.exists() {
        return HubConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                HubConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            HubConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/fanout-hub/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("fanout-hub").join("config.toml"))
}
