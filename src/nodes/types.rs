//! Node descriptor types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A downstream node the hub queries on behalf of the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Base endpoint, without a query string
    pub url: String,
    /// Upper bound for the whole call (connect, body read, parse)
    #[serde(with = "timeout_secs")]
    pub timeout: Duration,
    /// Free-form label passed through to the response for client-side grouping
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Disabled nodes are never dispatched
    pub enabled: bool,
}

impl NodeDescriptor {
    /// Create an enabled, untyped node
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            node_type: None,
            enabled: true,
        }
    }

    /// Attach a type label
    #[must_use]
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Mark the node as disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// How field-level parse failures in the node source are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPolicy {
    /// Unparsable timeout becomes zero, unparsable flag becomes `false`
    #[default]
    Lenient,
    /// Any unparsable or zero field fails the whole load
    Strict,
}

impl std::str::FromStr for RowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown row policy '{other}' (expected lenient or strict)")),
        }
    }
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(timeout: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(timeout.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_compose() {
        let node = NodeDescriptor::new("http://a", Duration::from_secs(2))
            .with_type("search")
            .disabled();

        assert_eq!(node.url, "http://a");
        assert_eq!(node.node_type.as_deref(), Some("search"));
        assert!(!node.enabled);
    }

    #[test]
    fn serializes_timeout_as_seconds() {
        let node = NodeDescriptor::new("http://a", Duration::from_secs(3));
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["timeout"], 3);
        assert!(json.get("type").is_none());
    }

    #[test]
    fn row_policy_from_str() {
        assert_eq!("Strict".parse::<RowPolicy>().unwrap(), RowPolicy::Strict);
        assert_eq!(" lenient ".parse::<RowPolicy>().unwrap(), RowPolicy::Lenient);
        assert!("loose".parse::<RowPolicy>().is_err());
    }
}
