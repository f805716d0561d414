//! Configuration management for the lazyflow engine
//!
//! Handles scheduling and logging parameters. Defaults can be overridden through
//! environment variables so the CLI behaves the same in scripts and containers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scheduler configuration applied to assemblies
    pub run: RunConfig,
    /// Logging configuration used by the binary
    pub logging: LoggingConfig,
}

/// Scheduler configuration for a single assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// How workflow members are ordered within a run cycle
    pub ordering: WorkflowOrdering,
}

/// Order in which an assembly visits its workflow members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowOrdering {
    /// Members run in the order they were added to the workflow
    #[default]
    Declared,
    /// Members run in dependency order; declared order breaks ties
    Topological,
}

impl FromStr for WorkflowOrdering {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "declared" => Ok(Self::Declared),
            "topological" | "topo" => Ok(Self::Topological),
            other => Err(anyhow::anyhow!("Unknown workflow ordering: {}", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Maximum level emitted by the fmt subscriber (e.g. "info", "debug")
    pub level: String,
}

impl Default for RunConfig {
    /// Reads `LAZYFLOW_ORDERING`, falling back to declared order
    fn default() -> Self {
        let ordering = std::env::var("LAZYFLOW_ORDERING")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(ordering) => Some(ordering),
                Err(e) => {
                    tracing::warn!("⚠️ Ignoring LAZYFLOW_ORDERING: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        Self { ordering }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LAZYFLOW_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level, defaulting to INFO when unrecognised
    pub fn max_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }
}
