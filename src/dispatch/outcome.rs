//! Per-node dispatch outcome

use serde::Serialize;

use crate::nodes::NodeDescriptor;

/// Status reported when the call timed out before a response arrived
pub const STATUS_TIMEOUT: &str = "timeout";
/// Status reported when the call never reached the node
pub const STATUS_UNREACHABLE: &str = "unreachable";
/// Status reported when the overall request deadline cut the call short
pub const STATUS_DEADLINE: &str = "deadline exceeded";
/// Status reported when the node's task ended without reporting
pub const STATUS_FAILED: &str = "failed";

/// Classification of a node outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Response received and extracted
    Ok,
    /// Node did not answer within its timeout
    Timeout,
    /// Connection, DNS or protocol failure
    Transport,
    /// Response arrived but its body could not be read
    Body,
    /// Body was not the expected JSON document
    Parse,
    /// Overall request deadline elapsed first
    Deadline,
}

/// Result of dispatching the query to one node
///
/// `payload` holds exactly one of: the raw body, the extracted `result`
/// field, or a human-readable error message (see `kind`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub node_url: String,
    pub node_type: Option<String>,
    pub status: String,
    pub payload: String,
    pub kind: OutcomeKind,
}

impl DispatchOutcome {
    /// Successful call
    #[must_use]
    pub fn ok(node: &NodeDescriptor, status: impl Into<String>, payload: String) -> Self {
        Self::new(node, status, payload, OutcomeKind::Ok)
    }

    /// Failed call; `status` is the real HTTP status when one was received
    #[must_use]
    pub fn failed(
        node: &NodeDescriptor,
        status: impl Into<String>,
        kind: OutcomeKind,
        message: String,
    ) -> Self {
        Self::new(node, status, message, kind)
    }

    fn new(node: &NodeDescriptor, status: impl Into<String>, payload: String, kind: OutcomeKind) -> Self {
        Self {
            node_url: node.url.clone(),
            node_type: node.node_type.clone(),
            status: status.into(),
            payload,
            kind,
        }
    }

    /// Whether the node answered successfully
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.kind == OutcomeKind::Ok
    }
}
