//! Downstream node registry
//!
//! Nodes are loaded fresh from the node source on every request and
//! discarded once the request completes

pub mod loader;
pub mod types;

pub use loader::{LoadError, load, parse};
pub use types::{NodeDescriptor, RowPolicy};
