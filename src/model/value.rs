//! Port payload typing
//!
//! Payloads are plain `serde_json::Value`s; a `VarType` is declared per port and
//! checked on every write so components never see a payload of the wrong shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Declared payload type of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarType {
    /// Floating point scalar; integers are accepted as well
    Float,
    /// Integer scalar
    Int,
    /// Boolean flag
    Bool,
    /// UTF-8 string
    Str,
    /// Array of values
    List,
    /// Nested container, carried by value
    Object,
    /// Untyped slot
    Any,
}

impl VarType {
    /// Whether `value` may be stored in a port of this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Float => value.is_number(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::Str => value.is_string(),
            Self::List => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    /// Value a port holds when its declaration gives no default
    pub fn zero(&self) -> Value {
        match self {
            Self::Float => Value::from(0.0),
            Self::Int => Value::from(0),
            Self::Bool => Value::Bool(false),
            Self::Str => Value::String(String::new()),
            Self::List => Value::Array(Vec::new()),
            Self::Object => Value::Object(serde_json::Map::new()),
            Self::Any => Value::Null,
        }
    }

    /// Normalise an accepted value; integers stored in `Float` ports become floats
    pub fn coerce(&self, value: Value) -> Value {
        if *self == Self::Float {
            if let Some(f) = value.as_number().filter(|n| !n.is_f64()).and_then(|n| n.as_f64()) {
                return Value::from(f);
            }
        }
        value
    }

    /// Whether a connection may carry values from a port of this type into `dest`
    pub fn can_feed(&self, dest: VarType) -> bool {
        *self == dest
            || dest == Self::Any
            || *self == Self::Any
            || (*self == Self::Int && dest == Self::Float)
    }

    /// Name reported under the `vartypename` metadata key
    pub fn name(&self) -> &'static str {
        match self {
            Self::Float => "Float",
            Self::Int => "Int",
            Self::Bool => "Bool",
            Self::Str => "Str",
            Self::List => "List",
            Self::Object => "Object",
            Self::Any => "Any",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Short description of a payload's JSON kind, used in type errors
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
