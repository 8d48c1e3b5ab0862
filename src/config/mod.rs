//! Configuration management for the fan-out hub
//!
//! Precedence: environment > TOML file > defaults. CLI flags are applied on
//! top by the binary.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assemble::ResponseShape;
use crate::dispatch::Extraction;
use crate::nodes::RowPolicy;
use crate::{Error, Result};

use self::file::HubConfigFile;

/// Default API server port
pub const DEFAULT_PORT: u16 = 8080;

/// Default node source path, relative to the working directory
pub const DEFAULT_NODES_PATH: &str = "node.csv";

/// Hub configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hub identifier, served verbatim on the info endpoint
    pub hub: String,

    /// Port to listen on
    pub port: u16,

    /// Node source, re-read on every query
    pub nodes_path: PathBuf,

    /// Field-level parse policy for the node source
    pub row_policy: RowPolicy,

    /// How node bodies become payloads
    pub extraction: Extraction,

    /// Response contract served to callers
    pub shape: ResponseShape,

    /// Overall deadline for one query; `None` waits for every node's own timeout
    pub request_deadline: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub: String::new(),
            port: DEFAULT_PORT,
            nodes_path: PathBuf::from(DEFAULT_NODES_PATH),
            row_policy: RowPolicy::default(),
            extraction: Extraction::default(),
            shape: ResponseShape::default(),
            request_deadline: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment and the TOML file
    ///
    /// `config_path` overrides the standard config file location.
    ///
    /// # Errors
    ///
    /// Returns error if an environment variable holds an invalid value
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path);
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with values from `env`
    ///
    /// # Errors
    ///
    /// Returns error if an environment value cannot be parsed
    pub fn resolve(fc: HubConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match env("HUB_PORT").or_else(|| env("PORT")) {
            Some(raw) => parse_env("PORT", &raw)?,
            None => fc.server.port.unwrap_or(defaults.port),
        };

        let row_policy = match env("HUB_ROW_POLICY") {
            Some(raw) => parse_env("HUB_ROW_POLICY", &raw)?,
            None => fc.nodes.row_policy.unwrap_or(defaults.row_policy),
        };

        let extraction = match env("HUB_EXTRACTION") {
            Some(raw) => parse_env("HUB_EXTRACTION", &raw)?,
            None => fc.dispatch.extraction.unwrap_or(defaults.extraction),
        };

        let shape = match env("HUB_RESPONSE_SHAPE") {
            Some(raw) => parse_env("HUB_RESPONSE_SHAPE", &raw)?,
            None => fc.response.shape.unwrap_or(defaults.shape),
        };

        let deadline_secs = match env("HUB_REQUEST_DEADLINE_SECS") {
            Some(raw) => Some(parse_env::<u64>("HUB_REQUEST_DEADLINE_SECS", &raw)?),
            None => fc.dispatch.request_deadline_secs,
        };

        Ok(Self {
            hub: env("HUB").or(fc.hub).unwrap_or(defaults.hub),
            port,
            nodes_path: env("HUB_NODES_FILE")
                .or(fc.nodes.path)
                .map_or(defaults.nodes_path, PathBuf::from),
            row_policy,
            extraction,
            shape,
            request_deadline: deadline_secs.filter(|s| *s > 0).map(Duration::from_secs),
        })
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("invalid {key} '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_sources() {
        let config = Config::resolve(HubConfigFile::default(), env_of(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn env_overrides_file() {
        let fc = file::parse_config_file(
            "hub = \"from-file\"\n[server]\nport = 9000\n[response]\nshape = \"per_node\"\n",
        )
        .unwrap();

        let config = Config::resolve(
            fc,
            env_of(&[("HUB", "from-env"), ("PORT", "7000"), ("HUB_NODES_FILE", "/tmp/n.csv")]),
        )
        .unwrap();

        assert_eq!(config.hub, "from-env");
        assert_eq!(config.port, 7000);
        assert_eq!(config.nodes_path, PathBuf::from("/tmp/n.csv"));
        assert_eq!(config.shape, ResponseShape::PerNode);
    }

    #[test]
    fn hub_port_wins_over_port() {
        let config = Config::resolve(
            HubConfigFile::default(),
            env_of(&[("HUB_PORT", "7100"), ("PORT", "7000")]),
        )
        .unwrap();
        assert_eq!(config.port, 7100);
    }

    #[test]
    fn invalid_env_value_is_config_error() {
        let err = Config::resolve(HubConfigFile::default(), env_of(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::resolve(
            HubConfigFile::default(),
            env_of(&[("HUB_ROW_POLICY", "sloppy")]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn zero_deadline_means_none() {
        let config = Config::resolve(
            HubConfigFile::default(),
            env_of(&[("HUB_REQUEST_DEADLINE_SECS", "0")]),
        )
        .unwrap();
        assert_eq!(config.request_deadline, None);

        let config = Config::resolve(
            HubConfigFile::default(),
            env_of(&[("HUB_REQUEST_DEADLINE_SECS", "5"), ("HUB_EXTRACTION", "raw")]),
        )
        .unwrap();
        assert_eq!(config.request_deadline, Some(Duration::from_secs(5)));
        assert_eq!(config.extraction, Extraction::Raw);
    }
}
