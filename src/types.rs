//! Payload types carried by frames.
//!
//! The engine never inspects a payload beyond asking for its [`DataKind`];
//! values are opaque to routing and scheduling. [`DataKind`] is the type
//! half of a topic and is what edge filters compare against.

use serde::{Deserialize, Serialize};

/// The category of a frame payload.
///
/// Used by topics to express "frames of this type"; a topic with no kind
/// matches payloads of every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// Boolean flag
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// UTF-8 text
    Text,
    /// Raw bytes (for custom interpretation)
    Bytes,
    /// Vector of 64-bit floats (sensor sample blocks)
    FloatArray,
    /// Vector of 64-bit signed integers
    IntArray,
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataKind::Bool => write!(f, "bool"),
            DataKind::Int => write!(f, "int"),
            DataKind::Float => write!(f, "float"),
            DataKind::Text => write!(f, "text"),
            DataKind::Bytes => write!(f, "bytes"),
            DataKind::FloatArray => write!(f, "float[]"),
            DataKind::IntArray => write!(f, "int[]"),
        }
    }
}

/// An opaque frame payload.
///
/// The engine routes and schedules frames without looking inside; concrete
/// modules agree on variants through their topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    FloatArray(Vec<f64>),
    IntArray(Vec<i64>),
}

impl Value {
    /// The kind tag of this payload.
    pub fn kind(&self) -> DataKind {
        match self {
            Value::Bool(_) => DataKind::Bool,
            Value::Int(_) => DataKind::Int,
            Value::Float(_) => DataKind::Float,
            Value::Text(_) => DataKind::Text,
            Value::Bytes(_) => DataKind::Bytes,
            Value::FloatArray(_) => DataKind::FloatArray,
            Value::IntArray(_) => DataKind::IntArray,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float_array(&self) -> Option<&[f64]> {
        match self {
            Value::FloatArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::FloatArray(v)
    }
}
