//! Scalar cell values and level ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A single cell value in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Free-text or categorical level.
    Categorical(String),
    /// Whole number.
    Integer(i64),
    /// Real number.
    Float(f64),
    /// `true`/`false` flag.
    Boolean(bool),
    /// Missing value.
    Missing,
}

/// Column type inferred when loading a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Categorical,
    Integer,
    Float,
    Boolean,
}

impl Value {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Value::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of integer and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Label used as a level name in tables and reports.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Parse a raw text cell according to a column type.
    ///
    /// Empty cells and `NA`/`NaN` markers become [`Value::Missing`], as does
    /// any cell that does not parse as the requested type.
    pub fn parse(raw: &str, value_type: ValueType) -> Self {
        let raw = raw.trim();
        if is_missing_marker(raw) {
            return Value::Missing;
        }
        match value_type {
            ValueType::Integer => raw.parse().map(Value::Integer).unwrap_or(Value::Missing),
            ValueType::Float => raw.parse().map(Value::Float).unwrap_or(Value::Missing),
            ValueType::Boolean => parse_bool(raw).map(Value::Boolean).unwrap_or(Value::Missing),
            ValueType::Categorical => Value::Categorical(raw.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Boolean(_) => 0,
            Value::Integer(_) | Value::Float(_) => 1,
            Value::Categorical(_) => 2,
            Value::Missing => 3,
        }
    }

    /// Natural level order: booleans, then numbers, then strings, missing last.
    pub fn cmp_level(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Categorical(a), Value::Categorical(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Categorical(s) => write!(f, "{}", s),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Missing => write!(f, "NA"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Categorical(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Categorical(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Distinct non-missing levels in natural level order.
///
/// Two values are the same level when their labels match.
pub fn distinct_levels<'a, I>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut seen = HashSet::new();
    let mut levels: Vec<Value> = values
        .into_iter()
        .filter(|v| !v.is_missing())
        .filter(|v| seen.insert(v.label()))
        .cloned()
        .collect();
    levels.sort_by(|a, b| a.cmp_level(b).then_with(|| a.label().cmp(&b.label())));
    levels
}

/// Infer the narrowest type that every present cell parses as.
pub fn infer_type<'a, I>(raw_values: I) -> ValueType
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let present = || {
        raw_values
            .clone()
            .into_iter()
            .map(str::trim)
            .filter(|v| !is_missing_marker(v))
    };

    if present().next().is_none() {
        return ValueType::Categorical;
    }
    if present().all(|v| v.parse::<i64>().is_ok()) {
        ValueType::Integer
    } else if present().all(|v| v.parse::<f64>().is_ok()) {
        ValueType::Float
    } else if present().all(|v| parse_bool(v).is_some()) {
        ValueType::Boolean
    } else {
        ValueType::Categorical
    }
}

fn is_missing_marker(raw: &str) -> bool {
    matches!(raw, "" | "NA" | "na" | "NaN" | "nan")
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
