//! lazyflow: lazy dataflow execution over typed component ports
//!
//! Components expose named, typed input and output variables. Assemblies wire
//! outputs to inputs in an acyclic graph, track which values are stale, and on
//! `run()` re-execute only the components whose inputs changed.

// Core configuration and setup
pub mod config;

// Error taxonomy shared by every layer
pub mod error;

// Variables, port declarations and the external component contract
pub mod model;

// Connection endpoints, dotted paths and the petgraph dependency DAG
pub mod graph;

// Assemblies, validity propagation and the run-cycle scheduler
pub mod runtime;

// Re-export commonly used types for external consumers
pub use config::{Config, RunConfig, WorkflowOrdering};
pub use error::GraphError;
pub use model::{Component, Direction, Metadata, Ports, VarType, Variable, VariableDecl};
pub use runtime::{Assembly, RunReport, RunState};
