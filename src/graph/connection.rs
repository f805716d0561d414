//! Connection endpoints as seen from one assembly level

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who owns an endpoint's variable, relative to the assembly holding the connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// The assembly's own boundary variable
    Boundary,
    /// A direct child of the assembly
    Child(String),
}

/// One end of a connection
///
/// For a child that is itself an assembly, `var` may be a hidden passthrough
/// named by its inner path (e.g. `"comp1.r"`), which renders as `"nested.comp1.r"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub owner: Owner,
    pub var: String,
}

impl Endpoint {
    pub fn boundary(var: impl Into<String>) -> Self {
        Self {
            owner: Owner::Boundary,
            var: var.into(),
        }
    }

    pub fn child(child: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            owner: Owner::Child(child.into()),
            var: var.into(),
        }
    }

    /// Child name, if the endpoint is on a child
    pub fn child_name(&self) -> Option<&str> {
        match &self.owner {
            Owner::Child(name) => Some(name),
            Owner::Boundary => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Owner::Boundary => write!(f, "{}", self.var),
            Owner::Child(child) => write!(f, "{}.{}", child, self.var),
        }
    }
}

/// Directed edge from an output-like endpoint to an input-like endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub src: Endpoint,
    pub dest: Endpoint,
}

impl Connection {
    /// Rendered `(source, destination)` pair
    pub fn paths(&self) -> (String, String) {
        (self.src.to_string(), self.dest.to_string())
    }

    pub fn touches(&self, endpoint: &Endpoint) -> bool {
        &self.src == endpoint || &self.dest == endpoint
    }

    pub fn touches_child(&self, child: &str) -> bool {
        self.src.child_name() == Some(child) || self.dest.child_name() == Some(child)
    }
}
