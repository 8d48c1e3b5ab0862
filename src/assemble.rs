//! Response assembly
//!
//! Shapes collected outcomes into the JSON contract returned to the caller.
//! The shape is a deployment profile; dispatch and collection are identical
//! for both.

use serde::{Deserialize, Serialize};

use crate::dispatch::{DispatchOutcome, merge_text};

/// Response shape a deployment serves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// `{"result": "<payloads joined by newlines>"}`
    #[default]
    Merged,
    /// `[{"url", "type", "status", "body"}, ...]` in completion order
    PerNode,
}

impl std::str::FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "merged" => Ok(Self::Merged),
            "per_node" | "list" => Ok(Self::PerNode),
            other => Err(format!("unknown response shape '{other}' (expected merged or per_node)")),
        }
    }
}

/// One node's entry in a [`ResponseShape::PerNode`] response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResult {
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    pub status: String,
    pub body: String,
}

impl From<DispatchOutcome> for NodeResult {
    fn from(outcome: DispatchOutcome) -> Self {
        Self {
            url: outcome.node_url,
            node_type: outcome.node_type,
            status: outcome.status,
            body: outcome.payload,
        }
    }
}

/// Aggregate returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregateResponse {
    Merged { result: String },
    PerNode(Vec<NodeResult>),
}

/// Shape collected outcomes into the response contract
#[must_use]
pub fn assemble(shape: ResponseShape, outcomes: Vec<DispatchOutcome>) -> AggregateResponse {
    match shape {
        ResponseShape::Merged => AggregateResponse::Merged {
            result: merge_text(&outcomes),
        },
        ResponseShape::PerNode => {
            AggregateResponse::PerNode(outcomes.into_iter().map(NodeResult::from).collect())
        }
    }
}
