//! Component-level dependency graph
//!
//! Tracks which children feed which, using a petgraph `StableDiGraph` so node
//! indices survive removals. Edge weights count the variable connections
//! between a pair of components; the edge disappears with the last one.

use petgraph::algo::astar;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Incoming;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Dependency graph over an assembly's direct children
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// The petgraph structure; node weights are child names
    graph: StableDiGraph<String, usize>,
    /// Mapping from child name to graph node index
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) {
        if !self.index.contains_key(name) {
            let idx = self.graph.add_node(name.to_string());
            self.index.insert(name.to_string(), idx);
        }
    }

    pub fn remove_node(&mut self, name: &str) {
        if let Some(idx) = self.index.remove(name) {
            self.graph.remove_node(idx);
        }
    }

    /// Cycle that an edge `src -> dest` would close, if any
    ///
    /// The cycle is listed in traversal order starting at `src`: for an existing
    /// chain `a -> b -> c`, adding `c -> a` yields `["c", "a", "b"]`.
    pub fn cycle_with(&self, src: &str, dest: &str) -> Option<Vec<String>> {
        let (&from, &to) = (self.index.get(dest)?, self.index.get(src)?);
        let (_, path) = astar(&self.graph, from, |n| n == to, |_| 1usize, |_| 0usize)?;
        let mut cycle = vec![src.to_string()];
        cycle.extend(
            path.iter()
                .take(path.len().saturating_sub(1))
                .map(|&idx| self.graph[idx].clone()),
        );
        Some(cycle)
    }

    pub fn add_edge(&mut self, src: &str, dest: &str) {
        self.add_node(src);
        self.add_node(dest);
        let (a, b) = (self.index[src], self.index[dest]);
        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph[edge] += 1,
            None => {
                self.graph.add_edge(a, b, 1);
            }
        }
    }

    pub fn remove_edge(&mut self, src: &str, dest: &str) {
        let (Some(&a), Some(&b)) = (self.index.get(src), self.index.get(dest)) else {
            return;
        };
        if let Some(edge) = self.graph.find_edge(a, b) {
            if self.graph[edge] > 1 {
                self.graph[edge] -= 1;
            } else {
                self.graph.remove_edge(edge);
            }
        }
    }

    /// Whether `a` has a direct edge to `b`
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Order `members` so every component comes after its upstream peers
    ///
    /// Kahn's algorithm over the whole graph; among ready nodes the one
    /// declared first wins, so an already-consistent declared order is
    /// returned unchanged. Names unknown to the graph keep their declared slot.
    pub fn topological_order(&self, members: &[String]) -> Vec<String> {
        let rank: HashMap<&str, usize> = members
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let rank_of = |idx: NodeIndex| rank.get(self.graph[idx].as_str()).copied().unwrap_or(usize::MAX);

        let mut indegree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| (idx, self.graph.neighbors_directed(idx, Incoming).count()))
            .collect();
        let mut ready: BinaryHeap<Reverse<(usize, NodeIndex)>> = indegree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&idx, _)| Reverse((rank_of(idx), idx)))
            .collect();

        let mut order = Vec::with_capacity(members.len());
        while let Some(Reverse((r, idx))) = ready.pop() {
            if r != usize::MAX {
                order.push(self.graph[idx].clone());
            }
            for next in self.graph.neighbors(idx) {
                if let Some(deg) = indegree.get_mut(&next) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse((rank_of(next), next)));
                    }
                }
            }
        }

        // members that never entered the graph
        for name in members {
            if !self.index.contains_key(name) {
                let at = rank[name.as_str()].min(order.len());
                order.insert(at, name.clone());
            }
        }
        order
    }
}
