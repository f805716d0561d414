//! Assemblies: components containing a nested dataflow graph
//!
//! An assembly owns its children, the connections among them, a workflow
//! (declared execution-candidate order) and its own boundary variables. Every
//! public accessor takes a dotted path that may reach through nested
//! assemblies, e.g. `"nested.comp1.r"`.

use crate::config::RunConfig;
use crate::error::{GraphError, Result};
use crate::graph::path::{self, split_head};
use crate::graph::{Connection, DependencyGraph, Endpoint, Owner};
use crate::model::{
    Component, Direction, LeafNode, Metadata, VarType, Variable, VariableDecl, VariableMap,
};
use crate::runtime::scheduler::RunState;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// A member of an assembly
#[derive(Debug)]
pub enum Node {
    Leaf(LeafNode),
    Assembly(Box<Assembly>),
}

impl Node {
    /// Port addressable at this node's boundary
    pub(crate) fn var(&self, name: &str) -> Option<&Variable> {
        match self {
            Node::Leaf(leaf) => leaf.vars.get(name),
            Node::Assembly(asm) => asm.vars.get(name),
        }
    }

    pub(crate) fn var_mut(&mut self, name: &str) -> Option<&mut Variable> {
        match self {
            Node::Leaf(leaf) => leaf.vars.get_mut(name),
            Node::Assembly(asm) => asm.vars.get_mut(name),
        }
    }

    pub(crate) fn output_names(&self) -> Vec<String> {
        match self {
            Node::Leaf(leaf) => leaf.names(Direction::Output),
            Node::Assembly(asm) => asm
                .vars
                .values()
                .filter(|v| v.direction() == Direction::Output)
                .map(|v| v.name().to_string())
                .collect(),
        }
    }

    pub(crate) fn needs_run(&self) -> bool {
        match self {
            Node::Leaf(leaf) => leaf.needs_run(),
            Node::Assembly(asm) => asm.needs_run(),
        }
    }

    pub fn exec_count(&self) -> u64 {
        match self {
            Node::Leaf(leaf) => leaf.exec_count,
            Node::Assembly(asm) => asm.exec_count,
        }
    }

    pub fn state(&self) -> RunState {
        match self {
            Node::Leaf(leaf) => leaf.state,
            Node::Assembly(asm) => asm.state,
        }
    }
}

/// Connection end resolved against this assembly, before any mutation
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub(crate) endpoint: Endpoint,
    pub(crate) direction: Direction,
    pub(crate) var_type: VarType,
    /// The endpoint is a hidden passthrough that still has to be created
    pub(crate) hidden: bool,
}

/// Which end of a connection an endpoint is asked to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Source,
    Dest,
}

/// A component containing a nested graph of components
#[derive(Debug)]
pub struct Assembly {
    pub(crate) name: String,
    pub(crate) config: RunConfig,
    /// Boundary variables: plain ports, passthroughs and hidden passthroughs
    pub(crate) vars: VariableMap,
    /// Boundary variable name -> inner path it exposes
    pub(crate) passthroughs: BTreeMap<String, String>,
    pub(crate) children: HashMap<String, Node>,
    /// Children in insertion order
    pub(crate) order: Vec<String>,
    pub(crate) workflow: Vec<String>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) deps: DependencyGraph,
    pub(crate) exec_count: u64,
    pub(crate) state: RunState,
    /// Position of the next `step()` within the execution order
    pub(crate) cursor: Option<usize>,
}

impl Assembly {
    /// Create an empty assembly using the default (env-driven) run configuration
    pub fn new(name: &str) -> Self {
        Self::with_config(name, RunConfig::default())
    }

    pub fn with_config(name: &str, config: RunConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            vars: VariableMap::new(),
            passthroughs: BTreeMap::new(),
            children: HashMap::new(),
            order: Vec::new(),
            workflow: Vec::new(),
            connections: Vec::new(),
            deps: DependencyGraph::new(),
            exec_count: 0,
            state: RunState::Pending,
            cursor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Add a component as a direct child
    pub fn add(&mut self, name: &str, component: impl Component + 'static) -> Result<()> {
        self.add_boxed(name, Box::new(component))
    }

    pub fn add_boxed(&mut self, name: &str, component: Box<dyn Component>) -> Result<()> {
        self.check_new_name(name)?;
        let leaf = LeafNode::new(component)?;
        self.insert_child(name, Node::Leaf(leaf));
        Ok(())
    }

    /// Add a nested assembly as a direct child; it is renamed to `name`
    pub fn add_assembly(&mut self, name: &str, mut assembly: Assembly) -> Result<()> {
        self.check_new_name(name)?;
        assembly.name = name.to_string();
        self.insert_child(name, Node::Assembly(Box::new(assembly)));
        Ok(())
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        path::check_simple_name(name)?;
        if self.children.contains_key(name) || self.vars.contains_key(name) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn insert_child(&mut self, name: &str, node: Node) {
        tracing::debug!("➕ Added '{}' to assembly '{}'", name, self.name);
        self.children.insert(name.to_string(), node);
        self.order.push(name.to_string());
        self.deps.add_node(name);
    }

    /// Remove a child, dropping all of its connections first
    ///
    /// A dotted path removes a member of a nested assembly. Destinations fed by
    /// the removed child keep their last value; passthroughs exposing it are
    /// removed together with their connections.
    pub fn remove(&mut self, path: &str) -> Result<()> {
        split_head(path)?;
        if let Some((parent, name)) = path.rsplit_once('.') {
            return self.edit_assembly(parent, |asm| asm.remove(name));
        }
        let name = path;
        if !self.children.contains_key(name) {
            return Err(GraphError::NotFound(name.to_string()));
        }
        self.disconnect_child(name);

        let exposing: Vec<String> = self
            .passthroughs
            .iter()
            .filter(|(_, inner)| split_head(inner).map(|(h, _)| h == name).unwrap_or(false))
            .map(|(alias, _)| alias.clone())
            .collect();
        for alias in &exposing {
            let boundary = Endpoint::boundary(alias.as_str());
            self.remove_connections(|conn| conn.touches(&boundary));
            self.passthroughs.remove(alias);
            self.vars.remove(alias);
            tracing::debug!("🗑️ Dropped passthrough '{}' of removed '{}'", alias, name);
        }

        self.workflow.retain(|member| member != name);
        self.order.retain(|member| member != name);
        self.children.remove(name);
        self.deps.remove_node(name);
        self.cursor = None;
        tracing::info!("🗑️ Removed '{}' from assembly '{}'", name, self.name);
        Ok(())
    }

    /// Declare a port owned by the assembly itself
    ///
    /// Its inputs act as sources for internal connections, its outputs as
    /// destinations.
    pub fn add_variable(&mut self, decl: VariableDecl) -> Result<()> {
        self.check_new_name(&decl.name)?;
        let name = decl.name.clone();
        self.vars.insert(name, Variable::from_decl(decl)?);
        Ok(())
    }

    /// Append a child to the workflow; already-present members are left in place
    pub fn workflow_add(&mut self, name: &str) -> Result<()> {
        if !self.children.contains_key(name) {
            return Err(GraphError::NotFound(name.to_string()));
        }
        if !self.workflow.iter().any(|member| member == name) {
            self.workflow.push(name.to_string());
        }
        Ok(())
    }

    pub fn workflow_add_all(&mut self, names: &[&str]) -> Result<()> {
        for name in names {
            self.workflow_add(name)?;
        }
        Ok(())
    }

    pub fn workflow_remove(&mut self, name: &str) {
        self.workflow.retain(|member| member != name);
    }

    pub fn workflow_names(&self) -> &[String] {
        &self.workflow
    }

    /// Direct children in insertion order
    pub fn child_names(&self) -> &[String] {
        &self.order
    }

    /// Names of the assembly's visible boundary variables
    pub fn variable_names(&self) -> Vec<String> {
        self.vars
            .keys()
            .filter(|name| !name.contains('.'))
            .cloned()
            .collect()
    }

    /// Nested assembly at `path`
    pub fn assembly(&self, path: &str) -> Result<&Assembly> {
        let (head, rest) = split_head(path)?;
        match (self.children.get(head), rest) {
            (Some(Node::Assembly(asm)), None) => Ok(asm.as_ref()),
            (Some(Node::Assembly(asm)), Some(rest)) => asm.assembly(rest),
            _ => Err(GraphError::NotFound(path.to_string())),
        }
    }

    /// Apply `edit` to the nested assembly at `path`, then reconcile each level
    ///
    /// Connections whose endpoint disappeared during the edit are dropped, and
    /// boundary outputs the edit made stale invalidate their consumers here.
    pub fn edit_assembly<R>(
        &mut self,
        path: &str,
        edit: impl FnOnce(&mut Assembly) -> Result<R>,
    ) -> Result<R> {
        let (head, rest) = split_head(path)?;
        let result = match (self.children.get_mut(head), rest) {
            (Some(Node::Assembly(asm)), None) => edit(asm.as_mut()),
            (Some(Node::Assembly(asm)), Some(rest)) => asm.edit_assembly(rest, edit),
            _ => return Err(GraphError::NotFound(path.to_string())),
        };
        self.reconcile_child(head);
        result
    }

    /// Drop connections that point at vanished child ports and pull staleness up
    fn reconcile_child(&mut self, child: &str) {
        let dangling: Vec<Endpoint> = self
            .connections
            .iter()
            .flat_map(|conn| [&conn.src, &conn.dest])
            .filter(|end| end.child_name() == Some(child) && self.endpoint_var(end).is_none())
            .cloned()
            .collect();
        if !dangling.is_empty() {
            tracing::warn!(
                "✂️ Dropping {} connection end(s) left dangling by an edit of '{}'",
                dangling.len(),
                child
            );
            self.remove_connections(|conn| dangling.iter().any(|end| conn.touches(end)));
        }
        self.propagate_from_child(child);
    }

    /// Node at `path` relative to this assembly
    fn node(&self, path: &str) -> Result<&Node> {
        let (head, rest) = split_head(path)?;
        match (self.children.get(head), rest) {
            (Some(node), None) => Ok(node),
            (Some(Node::Assembly(asm)), Some(rest)) => asm.node(rest),
            _ => Err(GraphError::NotFound(path.to_string())),
        }
    }

    /// Number of completed executions of the member at `path` (`""` is this assembly)
    pub fn exec_count(&self, path: &str) -> Result<u64> {
        if path.is_empty() {
            return Ok(self.exec_count);
        }
        self.node(path).map(Node::exec_count)
    }

    pub fn run_state(&self, path: &str) -> Result<RunState> {
        if path.is_empty() {
            return Ok(self.state);
        }
        self.node(path).map(Node::state)
    }

    // ---- variable access -------------------------------------------------

    fn lookup(&self, path: &str) -> Option<&Variable> {
        let (head, rest) = split_head(path).ok()?;
        match rest {
            None => self.vars.get(head),
            Some(rest) => match self.children.get(head)? {
                Node::Leaf(leaf) => leaf.vars.get(rest),
                Node::Assembly(asm) => asm.lookup(rest),
            },
        }
    }

    /// Variable at `path`
    pub fn variable(&self, path: &str) -> Result<&Variable> {
        split_head(path)?;
        self.lookup(path)
            .ok_or_else(|| GraphError::NotFound(path.to_string()))
    }

    /// Current value at `path`
    pub fn get(&self, path: &str) -> Result<Value> {
        self.variable(path).map(|var| var.get().clone())
    }

    /// Validity bit of each path, in order
    pub fn get_valid(&self, paths: &[&str]) -> Result<Vec<bool>> {
        paths
            .iter()
            .map(|path| self.variable(path).map(Variable::is_valid))
            .collect()
    }

    /// Whether the variable at `path` has an incoming connection
    pub fn is_connected(&self, path: &str) -> Result<bool> {
        self.variable(path).map(|var| var.connected_source().is_some())
    }

    /// Variable whose metadata answers for `path`; passthroughs read their inner variable
    fn metadata_var(&self, path: &str) -> Option<&Variable> {
        let (head, rest) = split_head(path).ok()?;
        match rest {
            None => self
                .passthroughs
                .get(head)
                .and_then(|inner| self.metadata_var(inner))
                .or_else(|| self.vars.get(head)),
            Some(rest) => match self.children.get(head)? {
                Node::Leaf(leaf) => leaf.vars.get(rest),
                Node::Assembly(asm) => asm.metadata_var(rest),
            },
        }
    }

    fn metadata_var_mut(&mut self, path: &str) -> Option<&mut Variable> {
        let (head, rest) = split_head(path).ok()?;
        match rest {
            None => {
                if let Some(inner) = self.passthroughs.get(head).cloned() {
                    if self.metadata_var(&inner).is_some() {
                        return self.metadata_var_mut(&inner);
                    }
                }
                self.vars.get_mut(head)
            }
            Some(rest) => match self.children.get_mut(head)? {
                Node::Leaf(leaf) => leaf.vars.get_mut(rest),
                Node::Assembly(asm) => asm.metadata_var_mut(rest),
            },
        }
    }

    /// Full metadata mapping of the variable at `path`
    pub fn get_metadata(&self, path: &str) -> Result<Metadata> {
        self.metadata_var(path)
            .map(Variable::metadata)
            .ok_or_else(|| GraphError::NotFound(path.to_string()))
    }

    /// One metadata entry; `Ok(None)` when the variable exists but the key does not
    pub fn get_metadata_key(&self, path: &str, key: &str) -> Result<Option<Value>> {
        self.metadata_var(path)
            .map(|var| var.metadata_value(key))
            .ok_or_else(|| GraphError::NotFound(path.to_string()))
    }

    pub fn set_metadata(&mut self, path: &str, key: &str, value: impl Into<Value>) -> Result<()> {
        self.metadata_var_mut(path)
            .ok_or_else(|| GraphError::NotFound(path.to_string()))?
            .set_metadata(path, key, value.into())
    }

    // ---- connections -----------------------------------------------------

    pub(crate) fn endpoint_var(&self, endpoint: &Endpoint) -> Option<&Variable> {
        match &endpoint.owner {
            Owner::Boundary => self.vars.get(&endpoint.var),
            Owner::Child(child) => self.children.get(child)?.var(&endpoint.var),
        }
    }

    pub(crate) fn endpoint_var_mut(&mut self, endpoint: &Endpoint) -> Option<&mut Variable> {
        match &endpoint.owner {
            Owner::Boundary => self.vars.get_mut(&endpoint.var),
            Owner::Child(child) => self.children.get_mut(child)?.var_mut(&endpoint.var),
        }
    }

    /// Rendered source of the connection feeding `endpoint`, if any
    fn incoming(&self, endpoint: &Endpoint) -> Option<String> {
        self.connections
            .iter()
            .find(|conn| &conn.dest == endpoint)
            .map(|conn| conn.src.to_string())
    }

    /// Resolve a path to a connection endpoint at this level without mutating anything
    ///
    /// Paths reaching deeper than a child's boundary resolve to a hidden
    /// passthrough on that child, named by the remaining inner path.
    pub(crate) fn resolve_endpoint(&self, path: &str) -> Result<Resolved> {
        let not_found = || GraphError::NotFound(path.to_string());
        let (head, rest) = split_head(path)?;
        let Some(rest) = rest else {
            let var = self.vars.get(head).ok_or_else(not_found)?;
            return Ok(Resolved {
                endpoint: Endpoint::boundary(head),
                direction: var.direction(),
                var_type: var.var_type(),
                hidden: false,
            });
        };

        let child = self.children.get(head).ok_or_else(not_found)?;
        if let Some(var) = child.var(rest) {
            return Ok(Resolved {
                endpoint: Endpoint::child(head, rest),
                direction: var.direction(),
                var_type: var.var_type(),
                hidden: false,
            });
        }
        match child {
            Node::Assembly(asm) if rest.contains('.') => {
                let (direction, var_type) = asm.check_hidden(rest).map_err(|e| match e {
                    GraphError::NotFound(_) => not_found(),
                    other => other,
                })?;
                Ok(Resolved {
                    endpoint: Endpoint::child(head, rest),
                    direction,
                    var_type,
                    hidden: true,
                })
            }
            _ => Err(not_found()),
        }
    }

    /// Validate that a hidden passthrough for `inner` could be created
    fn check_hidden(&self, inner: &str) -> Result<(Direction, VarType)> {
        let resolved = self.resolve_endpoint(inner)?;
        if resolved.direction == Direction::Input {
            if let Some(existing) = self.incoming(&resolved.endpoint) {
                return Err(GraphError::AlreadyConnected {
                    dest: inner.to_string(),
                    existing,
                });
            }
        }
        Ok((resolved.direction, resolved.var_type))
    }

    /// Create the hidden passthrough named by `inner` if it does not exist yet
    fn create_hidden(&mut self, inner: &str) -> Result<()> {
        if self.vars.contains_key(inner) {
            return Ok(());
        }
        let resolved = self.resolve_endpoint(inner)?;
        self.expose(inner, inner, &resolved)?;
        tracing::debug!("🔀 Created hidden passthrough '{}.{}'", self.name, inner);
        Ok(())
    }

    /// Create any hidden passthrough a resolved endpoint depends on
    fn materialize(&mut self, resolved: &Resolved) -> Result<()> {
        if !resolved.hidden {
            return Ok(());
        }
        if let Owner::Child(child) = &resolved.endpoint.owner {
            if let Some(Node::Assembly(asm)) = self.children.get_mut(child) {
                asm.create_hidden(&resolved.endpoint.var)?;
            }
        }
        Ok(())
    }

    /// Add boundary variable `alias` mirroring the resolved inner variable and wire it up
    fn expose(&mut self, alias: &str, inner: &str, resolved: &Resolved) -> Result<()> {
        self.materialize(resolved)?;
        let inner_var = self
            .endpoint_var(&resolved.endpoint)
            .ok_or_else(|| GraphError::NotFound(inner.to_string()))?;
        let inner_valid = inner_var.is_valid();
        let mut var = Variable::from_decl(inner_var.to_decl(alias))?;
        if resolved.direction == Direction::Input || inner_valid {
            var.mark_valid();
        }
        self.vars.insert(alias.to_string(), var);
        self.passthroughs.insert(alias.to_string(), inner.to_string());

        let boundary = Endpoint::boundary(alias);
        match resolved.direction {
            Direction::Input => self.attach(&boundary, &resolved.endpoint),
            Direction::Output => self.attach(&resolved.endpoint, &boundary),
        }
        Ok(())
    }

    fn check_role(&self, resolved: &Resolved, role: Role) -> Result<()> {
        let boundary = resolved.endpoint.owner == Owner::Boundary;
        // boundary ports play the opposite role inside the assembly
        let expected = match (role, boundary) {
            (Role::Source, false) | (Role::Dest, true) => Direction::Output,
            (Role::Source, true) | (Role::Dest, false) => Direction::Input,
        };
        if resolved.direction == expected {
            return Ok(());
        }
        Err(GraphError::Direction {
            owner: resolved
                .endpoint
                .child_name()
                .unwrap_or(&self.name)
                .to_string(),
            var: resolved.endpoint.var.clone(),
            expected: expected.noun(),
        })
    }

    /// Connect an output-like variable to an input-like variable
    ///
    /// All checks run before anything changes: direction, same owner, single
    /// source per input, type compatibility and acyclicity.
    pub fn connect(&mut self, src_path: &str, dest_path: &str) -> Result<()> {
        let src = self.resolve_endpoint(src_path)?;
        let dest = self.resolve_endpoint(dest_path)?;
        self.check_role(&src, Role::Source)?;
        self.check_role(&dest, Role::Dest)?;

        if src.endpoint.owner == dest.endpoint.owner {
            return Err(GraphError::SameOwner {
                owner: src
                    .endpoint
                    .child_name()
                    .unwrap_or(&self.name)
                    .to_string(),
                src: src_path.to_string(),
                dest: dest_path.to_string(),
            });
        }
        if let Some(existing) = self.incoming(&dest.endpoint) {
            return Err(GraphError::AlreadyConnected {
                dest: dest.endpoint.to_string(),
                existing,
            });
        }
        if !src.var_type.can_feed(dest.var_type) {
            return Err(GraphError::TypeMismatch {
                path: dest_path.to_string(),
                expected: dest.var_type.to_string(),
                actual: src.var_type.to_string(),
            });
        }
        if let (Some(a), Some(b)) = (src.endpoint.child_name(), dest.endpoint.child_name()) {
            if let Some(cycle) = self.deps.cycle_with(a, b) {
                tracing::warn!("🔁 Rejected connection {} -> {}: cycle {:?}", src_path, dest_path, cycle);
                return Err(GraphError::CircularDependency {
                    cycle,
                    src: src_path.to_string(),
                    dest: dest_path.to_string(),
                });
            }
        }

        self.materialize(&src)?;
        self.materialize(&dest)?;
        self.attach(&src.endpoint, &dest.endpoint);
        self.invalidate_dest(&dest.endpoint);
        tracing::info!("🔗 Connected {} -> {} in '{}'", src.endpoint, dest.endpoint, self.name);
        Ok(())
    }

    /// Record a checked connection
    fn attach(&mut self, src: &Endpoint, dest: &Endpoint) {
        if let (Some(a), Some(b)) = (src.child_name(), dest.child_name()) {
            self.deps.add_edge(a, b);
        }
        let rendered = src.to_string();
        if let Some(var) = self.endpoint_var_mut(dest) {
            var.source = Some(rendered);
        }
        self.connections.push(Connection {
            src: src.clone(),
            dest: dest.clone(),
        });
    }

    /// Expose a descendant's variable as a port of this assembly
    ///
    /// `alias` defaults to the inner variable's own name. Input passthroughs
    /// feed the inner variable; output passthroughs are fed by it.
    pub fn create_passthrough(&mut self, inner_path: &str, alias: Option<&str>) -> Result<()> {
        if split_head(inner_path)?.1.is_none() {
            return Err(GraphError::InvalidPath(inner_path.to_string()));
        }
        let alias = alias.unwrap_or_else(|| path::leaf_name(inner_path));
        path::check_simple_name(alias)?;
        if self.vars.contains_key(alias) || self.children.contains_key(alias) {
            return Err(GraphError::DuplicateName(alias.to_string()));
        }
        let resolved = self.resolve_endpoint(inner_path)?;
        if resolved.direction == Direction::Input {
            if let Some(existing) = self.incoming(&resolved.endpoint) {
                return Err(GraphError::AlreadyConnected {
                    dest: inner_path.to_string(),
                    existing,
                });
            }
        }
        self.expose(alias, inner_path, &resolved)?;
        tracing::info!("🔀 Created passthrough '{}' -> '{}' on '{}'", alias, inner_path, self.name);
        Ok(())
    }

    /// Syntactic endpoint for a path, used by disconnect (nothing has to exist)
    fn endpoint_of(path: &str) -> Result<Endpoint> {
        let (head, rest) = split_head(path)?;
        Ok(match rest {
            None => Endpoint::boundary(head),
            Some(rest) => Endpoint::child(head, rest),
        })
    }

    /// Remove every connection touching `path`
    ///
    /// `path` may name a variable (incoming and outgoing edges are removed) or
    /// a direct child (all of its edges are removed). Never fails when nothing
    /// matches.
    pub fn disconnect(&mut self, path: &str) -> Result<()> {
        if split_head(path)?.1.is_none() && self.children.contains_key(path) {
            self.disconnect_child(path);
            return Ok(());
        }
        let endpoint = Self::endpoint_of(path)?;
        self.remove_connections(|conn| conn.touches(&endpoint));
        Ok(())
    }

    /// Remove the single edge `src_path -> dest_path`, if present
    pub fn disconnect_pair(&mut self, src_path: &str, dest_path: &str) -> Result<()> {
        let src = Self::endpoint_of(src_path)?;
        let dest = Self::endpoint_of(dest_path)?;
        self.remove_connections(|conn| conn.src == src && conn.dest == dest);
        Ok(())
    }

    fn disconnect_child(&mut self, child: &str) {
        self.remove_connections(|conn| conn.touches_child(child));
    }

    fn remove_connections(&mut self, matches: impl Fn(&Connection) -> bool) {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.connections).into_iter().partition(|conn| matches(conn));
        self.connections = kept;

        for conn in removed {
            if let (Some(a), Some(b)) = (conn.src.child_name(), conn.dest.child_name()) {
                self.deps.remove_edge(a, b);
            }
            if let Some(var) = self.endpoint_var_mut(&conn.dest) {
                var.source = None;
            }
            tracing::info!("✂️ Disconnected {} -> {} in '{}'", conn.src, conn.dest, self.name);
            for endpoint in [&conn.src, &conn.dest] {
                self.drop_unused_hidden(endpoint);
            }
        }
    }

    /// Remove a child's hidden passthrough once no connection at this level uses it
    fn drop_unused_hidden(&mut self, endpoint: &Endpoint) {
        let Owner::Child(child) = &endpoint.owner else {
            return;
        };
        if !endpoint.var.contains('.') || self.connections.iter().any(|c| c.touches(endpoint)) {
            return;
        }
        if let Some(Node::Assembly(asm)) = self.children.get_mut(child) {
            let boundary = Endpoint::boundary(endpoint.var.clone());
            asm.remove_connections(|conn| conn.touches(&boundary));
            asm.vars.remove(&endpoint.var);
            asm.passthroughs.remove(&endpoint.var);
        }
    }

    /// All connections at this level as `(source, destination)` paths
    pub fn list_connections(&self) -> Vec<(String, String)> {
        self.connections.iter().map(Connection::paths).collect()
    }
}
