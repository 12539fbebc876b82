//! Closed classification of tree nodes.
//!
//! Every type check and every coercion in this crate is expressed in terms of
//! a [`TypeTag`]; nothing inspects Rust types at runtime.
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Integer,
    Float,
    Boolean,
    Mapping,
    Sequence,
    Null,
}

impl TypeTag {
    pub const ALL: [TypeTag; 7] = [
        TypeTag::String,
        TypeTag::Integer,
        TypeTag::Float,
        TypeTag::Boolean,
        TypeTag::Mapping,
        TypeTag::Sequence,
        TypeTag::Null,
    ];

    /// Runtime tag of a node. Numbers are integers only when they fit `i64`;
    /// larger unsigned values are floats, matching what `i64` extraction
    /// can hold.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(n) if n.is_i64() => TypeTag::Integer,
            Value::Number(_) => TypeTag::Float,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Sequence,
            Value::Object(_) => TypeTag::Mapping,
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        Self::of(value) == self
    }

    /// Value handed out when a lookup has nothing better to offer.
    pub fn default_value(self) -> Value {
        match self {
            TypeTag::String => Value::String(String::new()),
            TypeTag::Integer => Value::from(0_i64),
            TypeTag::Float => Value::from(0.0_f64),
            TypeTag::Boolean => Value::Bool(false),
            TypeTag::Mapping => Value::Object(Map::new()),
            TypeTag::Sequence => Value::Array(Vec::new()),
            TypeTag::Null => Value::Null,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::Boolean => "boolean",
            TypeTag::Mapping => "mapping",
            TypeTag::Sequence => "sequence",
            TypeTag::Null => "null",
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, TypeTag::Mapping | TypeTag::Sequence)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type tag `{0}`")]
pub struct UnknownTag(pub String);

impl FromStr for TypeTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(TypeTag::String),
            "integer" | "int" => Ok(TypeTag::Integer),
            "float" | "number" => Ok(TypeTag::Float),
            "boolean" | "bool" => Ok(TypeTag::Boolean),
            "mapping" | "map" | "object" => Ok(TypeTag::Mapping),
            "sequence" | "list" | "array" => Ok(TypeTag::Sequence),
            "null" => Ok(TypeTag::Null),
            _ => Err(UnknownTag(s.to_string())),
        }
    }
}
