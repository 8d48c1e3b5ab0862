//! Fan-out dispatcher
//!
//! Spawns one task per enabled node. Every task performs a single
//! `GET {url}?input=...` bounded by the node's own timeout and reports
//! exactly one [`DispatchOutcome`] through the shared fan-in channel.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::collector::{OutcomeStream, PendingNode};
use super::outcome::{DispatchOutcome, OutcomeKind, STATUS_TIMEOUT, STATUS_UNREACHABLE};
use crate::nodes::NodeDescriptor;
use crate::{Error, Result};

/// How a node's response body becomes the outcome payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// Body must be a JSON object; its `result` field is the payload
    #[default]
    ResultField,
    /// Body is passed through verbatim
    Raw,
}

impl std::str::FromStr for Extraction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "result" | "result_field" => Ok(Self::ResultField),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown extraction '{other}' (expected result or raw)")),
        }
    }
}

/// JSON document a node answers with in [`Extraction::ResultField`] mode
#[derive(Debug, Deserialize)]
struct NodeReply {
    /// Missing and `null` both read as an empty result
    #[serde(default)]
    result: Option<String>,
}

/// Issues the query to every enabled node in parallel
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    extraction: Extraction,
}

impl Dispatcher {
    /// Create a dispatcher
    ///
    /// Per-node timeouts are applied around each call, so the client itself
    /// carries no timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(extraction: Extraction) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fanout-hub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client, extraction })
    }

    /// Launch one call per enabled node and return the stream of outcomes
    ///
    /// All calls are started before this returns; disabled nodes are skipped
    /// and produce no outcome. Must be called within a tokio runtime.
    #[must_use]
    pub fn dispatch(&self, nodes: &[NodeDescriptor], input: &str) -> OutcomeStream {
        let enabled: Vec<&NodeDescriptor> = nodes.iter().filter(|n| n.enabled).collect();
        let (tx, rx) = mpsc::channel(enabled.len().max(1));

        let pending = enabled
            .into_iter()
            .enumerate()
            .map(|(index, node)| {
                let tx = tx.clone();
                let client = self.client.clone();
                let extraction = self.extraction;
                let task_node = node.clone();
                let input = input.to_string();

                tracing::debug!(url = %node.url, timeout = ?node.timeout, "dispatching to node");

                let handle = tokio::spawn(async move {
                    let outcome = call_node(&client, &task_node, &input, extraction).await;
                    if !outcome.is_ok() {
                        tracing::warn!(
                            url = %task_node.url,
                            status = %outcome.status,
                            kind = ?outcome.kind,
                            "node call failed"
                        );
                    }
                    // Receiver gone means the collector already gave up on us
                    let _ = tx.send((index, outcome)).await;
                });

                PendingNode {
                    node: node.clone(),
                    handle,
                }
            })
            .collect();

        OutcomeStream::new(rx, pending)
    }
}

/// Run one node call under its timeout
async fn call_node(
    client: &reqwest::Client,
    node: &NodeDescriptor,
    input: &str,
    extraction: Extraction,
) -> DispatchOutcome {
    match tokio::time::timeout(node.timeout, request(client, node, input, extraction)).await {
        Ok(outcome) => outcome,
        Err(_) => DispatchOutcome::failed(
            node,
            STATUS_TIMEOUT,
            OutcomeKind::Timeout,
            format!("Error: request timed out after {:?}", node.timeout),
        ),
    }
}

/// Connect, read the body and extract the payload, strictly in that order
async fn request(
    client: &reqwest::Client,
    node: &NodeDescriptor,
    input: &str,
    extraction: Extraction,
) -> DispatchOutcome {
    let response = match client.get(&node.url).query(&[("input", input)]).send().await {
        Ok(response) => response,
        Err(e) => {
            return DispatchOutcome::failed(
                node,
                STATUS_UNREACHABLE,
                OutcomeKind::Transport,
                format!("Error: {e}"),
            );
        }
    };

    let status = response.status().to_string();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return DispatchOutcome::failed(
                node,
                status,
                OutcomeKind::Body,
                format!("Error reading body: {e}"),
            );
        }
    };

    match extraction {
        Extraction::Raw => DispatchOutcome::ok(node, status, body),
        Extraction::ResultField => match serde_json::from_str::<NodeReply>(&body) {
            Ok(reply) => DispatchOutcome::ok(node, status, reply.result.unwrap_or_default()),
            Err(e) => DispatchOutcome::failed(
                node,
                status,
                OutcomeKind::Parse,
                format!("Error parsing JSON: {e}"),
            ),
        },
    }
}
