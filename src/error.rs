//! Error taxonomy for graph mutation, variable access and execution.

use thiserror::Error;

/// Boxed failure raised by a component's `execute`.
pub type ComponentFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by assemblies and their variables.
///
/// Every graph-mutation error is raised before any state changes, so a rejected
/// operation leaves the assembly exactly as it was.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("{owner}: {var} must be an {expected} variable")]
    Direction {
        owner: String,
        var: String,
        expected: &'static str,
    },

    #[error("cannot connect {src} to {dest}: both are on component '{owner}'")]
    SameOwner {
        owner: String,
        src: String,
        dest: String,
    },

    #[error("'{dest}' is already connected to source '{existing}'")]
    AlreadyConnected { dest: String, existing: String },

    #[error("circular dependency ({cycle:?}) would be created by connecting {src} to {dest}")]
    CircularDependency {
        cycle: Vec<String>,
        src: String,
        dest: String,
    },

    #[error("'{path}' {reason}")]
    ReadOnlyViolation { path: String, reason: String },

    #[error("'{0}' already exists")]
    DuplicateName(String),

    #[error("cannot locate variable named '{0}'")]
    NotFound(String),

    #[error("invalid path '{0}'")]
    InvalidPath(String),

    #[error("'{path}' expects a {expected} value, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("'{path}' expects a finite Float value, got null (NaN and infinities are not representable)")]
    NonFinite { path: String },

    #[error("component '{component}' failed to execute: {source}")]
    Execution {
        component: String,
        #[source]
        source: ComponentFailure,
    },
}

impl GraphError {
    /// Read-only violation for an input that is driven by a connection.
    pub(crate) fn connected_input(path: impl Into<String>, source: &str) -> Self {
        Self::ReadOnlyViolation {
            path: path.into(),
            reason: format!(
                "is already connected to source '{}' and cannot be directly set",
                source
            ),
        }
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
