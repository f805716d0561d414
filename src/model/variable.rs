//! Variable (port) definitions
//!
//! A `VariableDecl` is the static declaration a component publishes once at
//! construction; a `Variable` is the live slot created from it, carrying the
//! current value and its validity bit.

use crate::error::{GraphError, Result};
use crate::model::value::{kind_of, VarType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered descriptive metadata (units, bounds, description, ...)
pub type Metadata = BTreeMap<String, Value>;

/// Metadata keys derived from the declaration itself
const DERIVED_KEYS: [&str; 2] = ["iotype", "vartypename"];

/// Data flow direction of a port, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Short form used by the `iotype` metadata key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "in",
            Self::Output => "out",
        }
    }

    pub(crate) fn noun(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Static declaration of a named, typed port
///
/// Built with the `input`/`output` constructors and refined with the builder
/// methods, e.g. `VariableDecl::output("rout", VarType::Float).units("ft")`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub direction: Direction,
    pub var_type: VarType,
    /// Initial value; the type's zero value when absent
    pub default: Option<Value>,
    pub metadata: Metadata,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, direction: Direction, var_type: VarType) -> Self {
        Self {
            name: name.into(),
            direction,
            var_type,
            default: None,
            metadata: Metadata::new(),
        }
    }

    pub fn input(name: impl Into<String>, var_type: VarType) -> Self {
        Self::new(name, Direction::Input, var_type)
    }

    pub fn output(name: impl Into<String>, var_type: VarType) -> Self {
        Self::new(name, Direction::Output, var_type)
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn units(self, units: &str) -> Self {
        self.meta("units", units)
    }

    pub fn desc(self, desc: &str) -> Self {
        self.meta("desc", desc)
    }

    pub fn low(self, low: f64) -> Self {
        self.meta("low", low)
    }

    pub fn high(self, high: f64) -> Self {
        self.meta("high", high)
    }

    /// Attach an arbitrary metadata entry
    pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// A live port owned by exactly one component or assembly
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    direction: Direction,
    var_type: VarType,
    value: Value,
    valid: bool,
    metadata: Metadata,
    /// Rendered path of the connection source driving this variable, if any
    pub(crate) source: Option<String>,
}

impl Variable {
    /// Create a variable from its declaration; every variable starts invalid
    pub fn from_decl(decl: VariableDecl) -> Result<Self> {
        let value = decl.default.unwrap_or_else(|| decl.var_type.zero());
        if !decl.var_type.accepts(&value) {
            return Err(GraphError::TypeMismatch {
                path: decl.name,
                expected: decl.var_type.to_string(),
                actual: kind_of(&value).to_string(),
            });
        }
        let value = decl.var_type.coerce(value);
        let mut metadata = decl.metadata;
        for key in DERIVED_KEYS {
            metadata.remove(key);
        }
        Ok(Self {
            name: decl.name,
            direction: decl.direction,
            var_type: decl.var_type,
            value,
            valid: false,
            metadata,
            source: None,
        })
    }

    /// Declaration describing this variable's current shape and value
    pub fn to_decl(&self, name: &str) -> VariableDecl {
        VariableDecl {
            name: name.to_string(),
            direction: self.direction,
            var_type: self.var_type,
            default: Some(self.value.clone()),
            metadata: self.metadata.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn get(&self) -> &Value {
        &self.value
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Source path of the incoming connection, if one exists
    pub fn connected_source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Direct external write
    ///
    /// Only unconnected inputs may be set this way; outputs change through
    /// `execute` and connected inputs through the graph. A successful write
    /// makes the variable valid since it now holds the authoritative value.
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        if self.direction == Direction::Output {
            return Err(GraphError::ReadOnlyViolation {
                path: path.to_string(),
                reason: "is an output and can only be set by its component's execute".to_string(),
            });
        }
        if let Some(source) = &self.source {
            return Err(GraphError::connected_input(path, source));
        }
        self.assign(path, value)?;
        self.valid = true;
        Ok(())
    }

    /// Store a value after type checking, leaving validity untouched
    pub(crate) fn assign(&mut self, path: &str, value: Value) -> Result<()> {
        // serde_json turns non-finite f64s into null
        if self.var_type == VarType::Float && value.is_null() {
            return Err(GraphError::NonFinite {
                path: path.to_string(),
            });
        }
        if !self.var_type.accepts(&value) {
            return Err(GraphError::TypeMismatch {
                path: path.to_string(),
                expected: self.var_type.to_string(),
                actual: kind_of(&value).to_string(),
            });
        }
        self.value = self.var_type.coerce(value);
        Ok(())
    }

    pub(crate) fn mark_valid(&mut self) {
        self.valid = true;
    }

    /// Mark invalid; returns false if the variable was already invalid
    pub(crate) fn invalidate(&mut self) -> bool {
        std::mem::replace(&mut self.valid, false)
    }

    /// Full metadata including the derived `iotype` and `vartypename` keys
    pub fn metadata(&self) -> Metadata {
        let mut all = self.metadata.clone();
        all.insert("iotype".to_string(), Value::from(self.direction.as_str()));
        all.insert("vartypename".to_string(), Value::from(self.var_type.name()));
        all
    }

    /// Single metadata entry; `None` when the key is absent
    pub fn metadata_value(&self, key: &str) -> Option<Value> {
        match key {
            "iotype" => Some(Value::from(self.direction.as_str())),
            "vartypename" => Some(Value::from(self.var_type.name())),
            _ => self.metadata.get(key).cloned(),
        }
    }

    pub fn set_metadata(&mut self, path: &str, key: &str, value: Value) -> Result<()> {
        if DERIVED_KEYS.contains(&key) {
            return Err(GraphError::ReadOnlyViolation {
                path: format!("{}:{}", path, key),
                reason: "is derived from the declaration and cannot be changed".to_string(),
            });
        }
        self.metadata.insert(key.to_string(), value);
        Ok(())
    }
}
