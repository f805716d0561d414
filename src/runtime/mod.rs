//! Runtime Execution Engine
//!
//! This module provides the assembly-level dataflow engine. It handles:
//! - Assemblies owning children, connections and a workflow
//! - Dotted path resolution and passthroughs across nesting levels
//! - Validity (dirty-bit) propagation along connections
//! - Lazy, workflow-ordered execution of stale members

// Assemblies, connections and passthroughs
pub mod assembly;

// Dirty-bit bookkeeping and direct writes
pub mod validity;

// Run cycle scheduling and reporting
pub mod scheduler;

// Re-export main types
pub use assembly::{Assembly, Node};
pub use scheduler::{RunReport, RunState};
