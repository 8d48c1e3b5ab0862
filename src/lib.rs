//! Fan-out hub - query aggregation across downstream nodes
//!
//! A single query is dispatched in parallel to every enabled node listed in
//! the node source; their answers are collected within each node's own
//! timeout and merged into one response. Failing nodes never fail the query.
//!
//! # Architecture
//!
//! ```text
//! GET /query?input=...
//!         │
//! ┌───────▼────────┐   ┌──────────────┐
//! │      Hub       │──▶│ nodes::load  │  node.csv, re-read per query
//! └───────┬────────┘   └──────────────┘
//!         │
//! ┌───────▼────────┐      one task per enabled node
//! │   Dispatcher   │──▶ GET {url}?input=...  (bounded by node timeout)
//! └───────┬────────┘
//!         │ mpsc fan-in
//! ┌───────▼────────┐
//! │ OutcomeStream  │  completion order, exactly one outcome per node
//! └───────┬────────┘
//!         │
//! ┌───────▼────────┐
//! │    assemble    │  {"result": ...} or [{url, type, status, body}]
//! └────────────────┘
//! ```

pub mod api;
pub mod assemble;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hub;
pub mod nodes;

pub use assemble::{AggregateResponse, NodeResult, ResponseShape, assemble};
pub use config::Config;
pub use dispatch::{DispatchOutcome, Dispatcher, Extraction, OutcomeKind, OutcomeStream};
pub use error::{Error, Result};
pub use hub::Hub;
pub use nodes::{LoadError, NodeDescriptor, RowPolicy};
