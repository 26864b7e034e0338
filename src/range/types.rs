//! Column value types used as range keys
//!
//! A `SqlType` supplies the two things the range engine needs from a
//! column type: a total order over its values and an adjacency predicate.
//! String comparison is bytewise; collation lives above this layer.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{RangeError, RangeResult};

/// A non-null key value carried by a `Cut`.
///
/// NULL is never a key; it is modelled by the NULL cuts instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value (false < true)
    Bool(bool),
    /// Signed integer value
    Int(i64),
    /// Floating point value, totally ordered
    Float(f64),
    /// Text value, compared bytewise
    Text(String),
}

impl Value {
    /// Create a value from a JSON scalar.
    ///
    /// Returns None for null, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            _ => None,
        }
    }

    /// Name of the value's kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Column type of one index dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    /// BOOLEAN
    Boolean,
    /// BIGINT
    Int64,
    /// DOUBLE
    Float64,
    /// TEXT / VARCHAR (binary collation)
    Text,
}

impl SqlType {
    /// Returns the type name
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Boolean => "boolean",
            SqlType::Int64 => "int64",
            SqlType::Float64 => "float64",
            SqlType::Text => "text",
        }
    }

    /// Parses a type name
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Some(SqlType::Boolean),
            "int64" | "bigint" | "int" | "integer" => Some(SqlType::Int64),
            "float64" | "double" | "float" => Some(SqlType::Float64),
            "text" | "varchar" | "string" => Some(SqlType::Text),
            _ => None,
        }
    }

    /// Checks that a value belongs to this type
    pub fn validate(&self, value: &Value) -> RangeResult<()> {
        let ok = matches!(
            (self, value),
            (SqlType::Boolean, Value::Bool(_))
                | (SqlType::Int64, Value::Int(_))
                | (SqlType::Float64, Value::Float(_))
                | (SqlType::Float64, Value::Int(_))
                | (SqlType::Text, Value::Text(_))
        );
        if ok {
            Ok(())
        } else {
            Err(self.mismatch(value))
        }
    }

    /// Compares two values of this type.
    ///
    /// Fails when either value is not of this type. Float columns accept
    /// integer literals; mixed pairs compare by exact value, never through
    /// a lossy cast.
    pub fn compare(&self, a: &Value, b: &Value) -> RangeResult<Ordering> {
        match (self, a, b) {
            (SqlType::Boolean, Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
            (SqlType::Int64, Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
            (SqlType::Float64, Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
            (SqlType::Float64, Value::Float(x), Value::Float(y)) => Ok(x.total_cmp(y)),
            (SqlType::Float64, Value::Int(x), Value::Float(y)) => Ok(compare_int_float(*x, *y)),
            (SqlType::Float64, Value::Float(x), Value::Int(y)) => {
                Ok(compare_int_float(*y, *x).reverse())
            }
            (SqlType::Text, Value::Text(x), Value::Text(y)) => Ok(x.as_bytes().cmp(y.as_bytes())),
            _ => {
                self.validate(a)?;
                Err(self.mismatch(b))
            }
        }
    }

    /// Returns true when no value of this type lies strictly between `a`
    /// and `b`, with `a < b`.
    ///
    /// Only discrete types have adjacent values; floats and text never do.
    pub fn is_adjacent(&self, a: &Value, b: &Value) -> RangeResult<bool> {
        match (self, a, b) {
            (SqlType::Boolean, Value::Bool(x), Value::Bool(y)) => Ok(!*x && *y),
            (SqlType::Int64, Value::Int(x), Value::Int(y)) => Ok(x.checked_add(1) == Some(*y)),
            _ => {
                self.validate(a)?;
                self.validate(b)?;
                Ok(false)
            }
        }
    }

    fn mismatch(&self, value: &Value) -> RangeError {
        RangeError::type_mismatch(format!(
            "cannot compare {} value {} as {}",
            value.kind(),
            value,
            self.as_str()
        ))
    }
}

/// Orders an integer against a float consistently with `f64::total_cmp`,
/// treating the integer `0` as `+0.0`.
fn compare_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, exactly representable
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    let whole = f.trunc();
    if whole >= BOUND {
        return Ordering::Less;
    }
    if whole < -BOUND {
        return Ordering::Greater;
    }
    // in range, so the cast is exact
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        Ordering::Equal if i == 0 && f.is_sign_negative() => Ordering::Greater,
        other => other,
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
