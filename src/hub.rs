//! Query pipeline: load nodes, fan out, collect, assemble

use std::time::Instant;

use crate::assemble::{AggregateResponse, assemble};
use crate::config::Config;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::nodes::{self, NodeDescriptor};
use crate::{Error, Result};

/// Message returned when a query arrives without input
pub const MISSING_INPUT: &str = "Input query parameter is required";

/// Aggregates one query across every enabled node
///
/// Holds no per-request state: nodes are re-read from the node source on
/// every query.
#[derive(Debug, Clone)]
pub struct Hub {
    config: Config,
    dispatcher: Dispatcher,
}

impl Hub {
    /// Create a hub from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let dispatcher = Dispatcher::new(config.extraction)?;
        Ok(Self { config, dispatcher })
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Load the node source
    ///
    /// # Errors
    ///
    /// Returns error if the node source is unreadable or malformed
    pub async fn nodes(&self) -> Result<Vec<NodeDescriptor>> {
        Ok(nodes::load(&self.config.nodes_path, self.config.row_policy).await?)
    }

    /// Run one query and shape the result
    ///
    /// Node failures are reported inside the response; only a missing input
    /// or an unusable node source fail the query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for empty input (no node is contacted)
    /// and [`Error::Load`] if the node source cannot be read
    pub async fn query(&self, input: &str) -> Result<AggregateResponse> {
        if input.is_empty() {
            return Err(Error::Validation(MISSING_INPUT.to_string()));
        }

        let nodes = self.nodes().await?;
        let outcomes = self.fan_out(&nodes, input).await;
        Ok(assemble(self.config.shape, outcomes))
    }

    /// Dispatch `input` to `nodes` and collect every outcome
    pub async fn fan_out(&self, nodes: &[NodeDescriptor], input: &str) -> Vec<DispatchOutcome> {
        let started = Instant::now();
        let stream = self.dispatcher.dispatch(nodes, input);
        let expected = stream.expected();

        let outcomes = stream.collect(self.config.request_deadline).await;

        tracing::info!(
            nodes = expected,
            succeeded = outcomes.iter().filter(|o| o.is_ok()).count(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "fan-out complete"
        );
        outcomes
    }
}
