//! Execution scheduler
//!
//! Walks an assembly's workflow once per run cycle. Members whose inputs and
//! outputs are all valid (and whose last execution completed) are skipped;
//! the rest pull their connected inputs, execute, and invalidate everything
//! downstream of their fresh outputs. Nested assemblies run their own cycle
//! as their execute step.

use crate::config::WorkflowOrdering;
use crate::error::{GraphError, Result};
use crate::graph::path::join;
use crate::graph::{Endpoint, Owner};
use crate::runtime::assembly::{Assembly, Node};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Per-member execution state within a run cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Not evaluated yet, or stale since its last execution
    Pending,
    /// Inside `execute`; a member left here failed and will be retried
    Running,
    /// Outputs reflect the inputs consumed by the last execution
    Done,
}

/// Summary of one `run()` call
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Dotted paths of members executed this cycle, in execution order
    pub executed: Vec<String>,
    /// Dotted paths of members skipped because nothing they depend on changed
    pub skipped: Vec<String>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            duration: Duration::ZERO,
            executed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn was_executed(&self, path: &str) -> bool {
        self.executed.iter().any(|p| p == path)
    }
}

impl Assembly {
    /// Run one cycle of this assembly's workflow
    ///
    /// Blocking and single-threaded. An execution failure aborts the cycle:
    /// members already done keep their results, the failing member stays
    /// invalid and is retried by the next `run()`.
    pub fn run(&mut self) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::new();
        self.cursor = None;
        tracing::info!("🚀 Starting run of assembly '{}'", self.name);

        if let Err(e) = self.run_cycle("", &mut report) {
            tracing::error!("❌ Run of '{}' aborted: {}", self.name, e);
            return Err(e);
        }

        report.duration = start.elapsed();
        tracing::info!(
            "🎉 Run of '{}' completed in {:?}: {} executed, {} skipped",
            self.name,
            report.duration,
            report.executed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Execute the next workflow member that needs to run, then stop
    ///
    /// Members with nothing to do are passed over. Returns the executed member's
    /// name, or `None` once the cycle is complete; the following call starts a
    /// new cycle. A failing member is retried by the next call.
    pub fn step(&mut self) -> Result<Option<String>> {
        let order = self.execution_order();
        let mut at = self.cursor.take().unwrap_or(0);
        if at == 0 {
            self.state = RunState::Running;
        }
        let mut report = RunReport::new();

        while let Some(name) = order.get(at) {
            match self.run_member("", name, &mut report) {
                Ok(true) => {
                    self.cursor = Some(at + 1);
                    tracing::info!("👣 Stepped '{}' in '{}'", name, self.name);
                    return Ok(Some(name.clone()));
                }
                Ok(false) => at += 1,
                Err(e) => {
                    self.cursor = Some(at);
                    return Err(e);
                }
            }
        }

        self.finish_cycle("")?;
        tracing::info!("🏁 Step cycle of '{}' complete", self.name);
        Ok(None)
    }

    pub(crate) fn needs_run(&self) -> bool {
        self.state != RunState::Done
            || self.vars.values().any(|v| !v.is_valid())
            || self
                .workflow
                .iter()
                .filter_map(|name| self.children.get(name))
                .any(Node::needs_run)
    }

    /// Workflow members in the order they are evaluated this cycle
    pub fn execution_order(&self) -> Vec<String> {
        match self.config.ordering {
            WorkflowOrdering::Declared => self.workflow.clone(),
            WorkflowOrdering::Topological => self.deps.topological_order(&self.workflow),
        }
    }

    pub(crate) fn run_cycle(&mut self, prefix: &str, report: &mut RunReport) -> Result<()> {
        self.state = RunState::Running;
        for name in self.execution_order() {
            self.run_member(prefix, &name, report)?;
        }
        self.finish_cycle(prefix)
    }

    /// Evaluate one member; returns whether it executed
    fn run_member(&mut self, prefix: &str, name: &str, report: &mut RunReport) -> Result<bool> {
        let path = join(prefix, name);
        let needs_run = match self.children.get(name) {
            Some(node) => node.needs_run(),
            None => return Ok(false),
        };
        if !needs_run {
            tracing::debug!("⏭️ Skipping '{}' - nothing changed", path);
            report.skipped.push(path);
            return Ok(false);
        }

        self.pull_inputs(prefix, name)?;
        let node_start = Instant::now();
        match self.children.get_mut(name) {
            Some(Node::Leaf(leaf)) => {
                tracing::debug!("📍 Executing '{}'", path);
                leaf.state = RunState::Running;
                if let Err(e) = leaf.execute(&path) {
                    tracing::error!("❌ '{}' failed: {}", path, e);
                    return Err(GraphError::Execution {
                        component: path,
                        source: e.into(),
                    });
                }
                leaf.exec_count += 1;
                leaf.vars.values_mut().for_each(|v| v.mark_valid());
                leaf.state = RunState::Done;
            }
            Some(Node::Assembly(asm)) => asm.run_cycle(&path, report)?,
            None => return Ok(false),
        }
        tracing::info!("✅ '{}' completed in {:?}", path, node_start.elapsed());
        report.executed.push(path);

        let seeds = self
            .children
            .get(name)
            .map(Node::output_names)
            .unwrap_or_default()
            .into_iter()
            .map(|out| Endpoint::child(name, out))
            .collect();
        // boundary outputs reached here are refreshed by finish_cycle
        self.propagate(seeds);
        Ok(true)
    }

    fn finish_cycle(&mut self, prefix: &str) -> Result<()> {
        self.pull_boundary_outputs(prefix)?;
        self.vars.values_mut().for_each(|v| v.mark_valid());
        self.exec_count += 1;
        self.state = RunState::Done;
        Ok(())
    }

    fn source_value(&self, src: &Endpoint) -> Option<(Value, bool)> {
        self.endpoint_var(src).map(|var| (var.get().clone(), var.is_valid()))
    }

    /// Copy values across every connection feeding the child `name`
    fn pull_inputs(&mut self, prefix: &str, name: &str) -> Result<()> {
        let feeds: Vec<(Endpoint, Endpoint)> = self
            .connections
            .iter()
            .filter(|conn| conn.dest.child_name() == Some(name))
            .map(|conn| (conn.src.clone(), conn.dest.clone()))
            .collect();
        self.transfer(prefix, feeds)
    }

    /// Copy internal results into boundary outputs fed from inside
    fn pull_boundary_outputs(&mut self, prefix: &str) -> Result<()> {
        let feeds: Vec<(Endpoint, Endpoint)> = self
            .connections
            .iter()
            .filter(|conn| conn.dest.owner == Owner::Boundary)
            .map(|conn| (conn.src.clone(), conn.dest.clone()))
            .collect();
        self.transfer(prefix, feeds)
    }

    /// Destinations fed from a valid source become valid themselves
    fn transfer(&mut self, prefix: &str, feeds: Vec<(Endpoint, Endpoint)>) -> Result<()> {
        for (src, dest) in feeds {
            let Some((value, valid)) = self.source_value(&src) else {
                continue;
            };
            if !valid {
                tracing::warn!("⚠️ Pulling stale value from '{}' into '{}'", src, dest);
            }
            let path = join(prefix, &dest.to_string());
            if let Some(var) = self.endpoint_var_mut(&dest) {
                var.assign(&path, value)?;
                if valid {
                    var.mark_valid();
                }
            }
        }
        Ok(())
    }
}
