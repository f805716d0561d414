//! Validity propagation
//!
//! Every variable carries one valid/invalid bit. Staleness spreads breadth-first
//! along connections: an invalidated input makes its component's outputs stale,
//! which in turn invalidates every input they feed. The walk stops at variables
//! that are already invalid. Boundary outputs reached by the walk are handed back
//! to the caller so the parent assembly can continue the walk one level up.

use crate::error::{GraphError, Result};
use crate::graph::path::split_head;
use crate::graph::{Endpoint, Owner};
use crate::model::Direction;
use crate::runtime::assembly::{Assembly, Node};
use crate::runtime::scheduler::RunState;
use serde_json::Value;
use std::collections::VecDeque;

impl Assembly {
    /// Invalidate everything downstream of `seeds` (source endpoints)
    ///
    /// Returns the names of boundary outputs that became invalid.
    pub(crate) fn propagate(&mut self, seeds: Vec<Endpoint>) -> Vec<String> {
        let mut queue: VecDeque<Endpoint> = seeds.into();
        let mut outward = Vec::new();

        while let Some(src) = queue.pop_front() {
            let dests: Vec<Endpoint> = self
                .connections
                .iter()
                .filter(|conn| conn.src == src)
                .map(|conn| conn.dest.clone())
                .collect();
            for dest in dests {
                match &dest.owner {
                    Owner::Boundary => {
                        if let Some(var) = self.vars.get_mut(&dest.var) {
                            if var.invalidate() {
                                outward.push(dest.var.clone());
                            }
                        }
                    }
                    Owner::Child(child) => queue.extend(self.invalidate_child_input(child, &dest.var)),
                }
            }
        }
        outward
    }

    /// Invalidate one input of a child and return the child outputs it made stale
    fn invalidate_child_input(&mut self, child: &str, var: &str) -> Vec<Endpoint> {
        let stale: Vec<String> = match self.children.get_mut(child) {
            Some(Node::Leaf(leaf)) => {
                let newly = leaf.vars.get_mut(var).map(|v| v.invalidate()).unwrap_or(false);
                if !newly {
                    return Vec::new();
                }
                leaf.vars
                    .values_mut()
                    .filter(|v| v.direction() == Direction::Output)
                    .filter_map(|v| v.invalidate().then(|| v.name().to_string()))
                    .collect()
            }
            Some(Node::Assembly(asm)) => {
                let newly = asm.vars.get_mut(var).map(|v| v.invalidate()).unwrap_or(false);
                if !newly {
                    return Vec::new();
                }
                asm.propagate(vec![Endpoint::boundary(var)])
            }
            None => return Vec::new(),
        };
        stale
            .into_iter()
            .map(|out| Endpoint::child(child, out))
            .collect()
    }

    /// Mark a freshly connected destination stale and spread it downstream
    pub(crate) fn invalidate_dest(&mut self, dest: &Endpoint) -> Vec<String> {
        match &dest.owner {
            Owner::Boundary => match self.vars.get_mut(&dest.var) {
                Some(var) => {
                    if var.invalidate() {
                        vec![dest.var.clone()]
                    } else {
                        Vec::new()
                    }
                }
                None => Vec::new(),
            },
            Owner::Child(child) => {
                let seeds = self.invalidate_child_input(child, &dest.var);
                self.propagate(seeds)
            }
        }
    }

    /// Direct external write of an unconnected input
    ///
    /// The written variable becomes valid; everything that has not yet seen the
    /// new value becomes invalid. Equal-value writes invalidate as well.
    ///
    /// Boundary outputs made stale here are reported to the parent when the
    /// write happens inside `edit_assembly`.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let outward = self.set_path(path, path, value.into())?;
        tracing::debug!(
            "✏️ Set '{}' on '{}' ({} boundary outputs invalidated)",
            path,
            self.name,
            outward.len()
        );
        Ok(())
    }

    /// Spread staleness of a child assembly's boundary outputs into this level
    pub(crate) fn propagate_from_child(&mut self, child: &str) {
        let Some(Node::Assembly(asm)) = self.children.get(child) else {
            return;
        };
        let seeds = asm
            .vars
            .values()
            .filter(|v| v.direction() == Direction::Output && !v.is_valid())
            .map(|v| Endpoint::child(child, v.name()))
            .collect();
        self.propagate(seeds);
    }

    fn set_path(&mut self, path: &str, full: &str, value: Value) -> Result<Vec<String>> {
        let not_found = || GraphError::NotFound(full.to_string());
        let (head, rest) = split_head(path)?;
        let Some(rest) = rest else {
            let var = self.vars.get_mut(head).ok_or_else(not_found)?;
            var.set(full, value)?;
            return Ok(self.propagate(vec![Endpoint::boundary(head)]));
        };

        let stale = match self.children.get_mut(head).ok_or_else(not_found)? {
            Node::Leaf(leaf) => {
                let var = leaf.vars.get_mut(rest).ok_or_else(not_found)?;
                var.set(full, value)?;
                leaf.state = RunState::Pending;
                leaf.vars
                    .values_mut()
                    .filter(|v| v.direction() == Direction::Output)
                    .filter_map(|v| v.invalidate().then(|| v.name().to_string()))
                    .collect::<Vec<_>>()
            }
            Node::Assembly(asm) => asm.set_path(rest, full, value)?,
        };
        let seeds = stale
            .into_iter()
            .map(|out| Endpoint::child(head, out))
            .collect();
        Ok(self.propagate(seeds))
    }
}
