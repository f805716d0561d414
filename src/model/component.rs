//! External component contract and the leaf node wrapping it
//!
//! A component is a black box: it declares its ports once and exposes a single
//! `execute` operation. The engine owns the port values; `execute` reads inputs
//! and writes outputs through `Ports`.

use crate::error::{GraphError, Result};
use crate::model::variable::{Direction, Variable, VariableDecl};
use crate::runtime::scheduler::RunState;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Variables owned by one node, keyed by name
pub type VariableMap = BTreeMap<String, Variable>;

/// A unit of work exposing typed ports
///
/// Implementors wrap whatever actually does the computation (an external
/// solver, a closure, a lookup table). The declaration is static per component
/// type and is the only configuration surface the engine consumes.
pub trait Component {
    /// Port schema, consumed once when the component is added to an assembly
    fn declare(&self) -> Vec<VariableDecl>;

    /// Perform the unit of work: read current inputs, write outputs
    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()>;
}

/// Execute-time view of a component's ports
pub struct Ports<'a> {
    component: &'a str,
    vars: &'a mut VariableMap,
}

impl<'a> Ports<'a> {
    pub(crate) fn new(component: &'a str, vars: &'a mut VariableMap) -> Self {
        Self { component, vars }
    }

    /// Current value of any port
    pub fn get(&self, name: &str) -> anyhow::Result<&Value> {
        self.vars
            .get(name)
            .map(Variable::get)
            .ok_or_else(|| anyhow::anyhow!("{}: no port named '{}'", self.component, name))
    }

    pub fn get_f64(&self, name: &str) -> anyhow::Result<f64> {
        self.get(name)?
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("{}: port '{}' is not numeric", self.component, name))
    }

    pub fn get_i64(&self, name: &str) -> anyhow::Result<i64> {
        self.get(name)?
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("{}: port '{}' is not an integer", self.component, name))
    }

    pub fn get_bool(&self, name: &str) -> anyhow::Result<bool> {
        self.get(name)?
            .as_bool()
            .ok_or_else(|| anyhow::anyhow!("{}: port '{}' is not a bool", self.component, name))
    }

    pub fn get_str(&self, name: &str) -> anyhow::Result<&str> {
        self.get(name)?
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("{}: port '{}' is not a string", self.component, name))
    }

    /// Write an output port
    ///
    /// `Float` ports hold finite numbers only; writing NaN or an infinity fails.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> anyhow::Result<()> {
        let var = self
            .vars
            .get_mut(name)
            .ok_or_else(|| anyhow::anyhow!("{}: no port named '{}'", self.component, name))?;
        if var.direction() != Direction::Output {
            return Err(anyhow::anyhow!(
                "{}: '{}' is an input and cannot be written by execute",
                self.component,
                name
            ));
        }
        var.assign(&format!("{}.{}", self.component, name), value.into())?;
        Ok(())
    }
}

/// A non-assembly member of an assembly: a component plus its live ports
pub struct LeafNode {
    model: Box<dyn Component>,
    pub(crate) vars: VariableMap,
    pub(crate) exec_count: u64,
    pub(crate) state: RunState,
}

impl fmt::Debug for LeafNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNode")
            .field("vars", &self.vars)
            .field("exec_count", &self.exec_count)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl LeafNode {
    /// Wrap a component, creating one variable per declared port
    pub fn new(model: Box<dyn Component>) -> Result<Self> {
        let mut node = Self {
            vars: VariableMap::new(),
            model,
            exec_count: 0,
            state: RunState::Pending,
        };
        for decl in node.model.declare() {
            node.add_variable(decl)?;
        }
        Ok(node)
    }

    /// Add a port after construction
    pub fn add_variable(&mut self, decl: VariableDecl) -> Result<()> {
        if self.vars.contains_key(&decl.name) {
            return Err(GraphError::DuplicateName(decl.name));
        }
        let name = decl.name.clone();
        self.vars.insert(name, Variable::from_decl(decl)?);
        Ok(())
    }

    pub fn exec_count(&self) -> u64 {
        self.exec_count
    }

    pub(crate) fn names(&self, direction: Direction) -> Vec<String> {
        self.vars
            .values()
            .filter(|v| v.direction() == direction)
            .map(|v| v.name().to_string())
            .collect()
    }

    /// Whether this leaf must execute in the current cycle
    pub(crate) fn needs_run(&self) -> bool {
        self.state != RunState::Done || self.vars.values().any(|v| !v.is_valid())
    }

    pub(crate) fn execute(&mut self, path: &str) -> anyhow::Result<()> {
        let mut ports = Ports::new(path, &mut self.vars);
        self.model.execute(&mut ports)
    }
}
