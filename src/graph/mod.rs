//! Connection Graph
//!
//! This module holds the structural pieces of an assembly's dataflow graph:
//! - Connection endpoints relative to one assembly level
//! - Dotted path parsing
//! - The petgraph-based component dependency graph (cycle checks, ordering)

// Endpoint and connection types
pub mod connection;

// Dotted path helpers
pub mod path;

// Component-level DAG using petgraph
pub mod dependency;

// Re-export main types
pub use connection::{Connection, Endpoint, Owner};
pub use dependency::DependencyGraph;
