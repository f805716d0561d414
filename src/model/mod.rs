//! Component and Variable Model
//!
//! This module defines the data slots the engine moves values between:
//! - Payload typing (`VarType`) over `serde_json::Value`
//! - Port declarations and live variables with validity bits
//! - The external `Component` contract and the leaf node wrapping it

// Payload types and type checking
pub mod value;

// Port declarations, live variables and metadata
pub mod variable;

// External component trait and execute-time port access
pub mod component;

// Re-export commonly used types
pub use component::{Component, LeafNode, Ports, VariableMap};
pub use value::VarType;
pub use variable::{Direction, Metadata, Variable, VariableDecl};
