//! Node source loading
//!
//! The node source is a headerless CSV file with one node per row:
//!
//! ```text
//! # url, timeout_seconds, type, enabled
//! http://10.0.0.5:9000/query, 5, search, true
//! http://10.0.0.6:9000/query, 2, , false
//! ```
//!
//! Fields are trimmed and lines starting with `#` are skipped.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::types::{NodeDescriptor, RowPolicy};

/// Columns every row must carry: url, timeout, type, enabled
const REQUIRED_COLUMNS: usize = 4;

/// Errors that make the whole node source unusable
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open node source {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read node source: {0}")]
    Read(#[from] csv::Error),

    #[error("line {line}: expected 4 columns (url, timeout, type, enabled), found {found}")]
    MissingColumns { line: u64, found: usize },

    #[error("line {line}: node url is empty")]
    EmptyUrl { line: u64 },

    #[error("line {line}: invalid timeout '{value}' (expected positive whole seconds)")]
    InvalidTimeout { line: u64, value: String },

    #[error("line {line}: invalid enabled flag '{value}'")]
    InvalidEnabled { line: u64, value: String },
}

/// Read the node source at `path` without blocking the runtime, then parse it
///
/// # Errors
///
/// Returns error if the file cannot be read or a row is malformed
/// (see [`parse`])
pub async fn load(
    path: impl AsRef<Path>,
    policy: RowPolicy,
) -> Result<Vec<NodeDescriptor>, LoadError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let nodes = parse(bytes.as_slice(), policy)?;
    tracing::debug!(
        path = %path.display(),
        total = nodes.len(),
        enabled = nodes.iter().filter(|n| n.enabled).count(),
        "loaded node source"
    );
    Ok(nodes)
}

/// Parse node rows from any reader
///
/// A row with fewer than four columns or an empty URL is always fatal.
/// Timeout and enabled-flag failures follow `policy`: lenient loads default
/// them to zero and `false`, strict loads fail.
///
/// # Errors
///
/// Returns error on unreadable input or a malformed row
pub fn parse<R: Read>(reader: R, policy: RowPolicy) -> Result<Vec<NodeDescriptor>, LoadError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut nodes = Vec::new();
    for record in csv.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);

        if record.len() < REQUIRED_COLUMNS {
            return Err(LoadError::MissingColumns {
                line,
                found: record.len(),
            });
        }

        let url = &record[0];
        if url.is_empty() {
            return Err(LoadError::EmptyUrl { line });
        }

        let timeout = parse_timeout(&record[1], line, policy)?;
        let node_type = Some(&record[2])
            .filter(|t| !t.is_empty())
            .map(ToString::to_string);
        let enabled = parse_enabled(&record[3], line, policy)?;

        nodes.push(NodeDescriptor {
            url: url.to_string(),
            timeout,
            node_type,
            enabled,
        });
    }

    Ok(nodes)
}

fn parse_timeout(value: &str, line: u64, policy: RowPolicy) -> Result<Duration, LoadError> {
    match (value.parse::<u64>(), policy) {
        (Ok(secs), RowPolicy::Strict) if secs == 0 => Err(LoadError::InvalidTimeout {
            line,
            value: value.to_string(),
        }),
        (Ok(secs), _) => Ok(Duration::from_secs(secs)),
        (Err(_), RowPolicy::Strict) => Err(LoadError::InvalidTimeout {
            line,
            value: value.to_string(),
        }),
        (Err(_), RowPolicy::Lenient) => {
            tracing::warn!(line, value, "unparsable timeout, node will time out immediately");
            Ok(Duration::ZERO)
        }
    }
}

fn parse_enabled(value: &str, line: u64, policy: RowPolicy) -> Result<bool, LoadError> {
    match (parse_flag(value), policy) {
        (Some(flag), _) => Ok(flag),
        (None, RowPolicy::Strict) => Err(LoadError::InvalidEnabled {
            line,
            value: value.to_string(),
        }),
        (None, RowPolicy::Lenient) => {
            tracing::warn!(line, value, "unparsable enabled flag, node disabled");
            Ok(false)
        }
    }
}

/// Boolean-like strings accepted for the enabled column
fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
