//! Value types stored in attribute maps.
//!
//! A [`Value`] is either a scalar (text, boolean, integer, float), a list of
//! strings, or a nested [`AttributeMap`]. Nested maps are owned by exactly one
//! entry, so a document is always a tree.

use std::fmt;

use super::{AttributeMap, MapError};

/// Values that can be stored in an [`AttributeMap`].
///
/// # Direct Comparisons
///
/// `Value` implements `PartialEq` with primitive types for ergonomic comparisons:
///
/// ```
/// # use thunderfile::map::Value;
/// let text = Value::Text("hello".to_string());
/// let number = Value::Int(42);
/// let flag = Value::Bool(true);
///
/// assert!(text == "hello");
/// assert!(number == 42);
/// assert!(flag == true);
///
/// // Type mismatches return false
/// assert!(!(text == 42));
/// assert!(!(number == "hello"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Scalars
    /// Text string value, written quoted
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),

    // Containers
    /// Ordered list of raw strings
    List(Vec<String>),
    /// Nested block of entries
    Map(AttributeMap),
}

impl Value {
    /// Returns true if this is a scalar value
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Text(_) | Value::Bool(_) | Value::Int(_) | Value::Float(_)
        )
    }

    /// Returns true if this is a nested map
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Attempts to convert to a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to convert to an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to convert to a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to convert to a string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to convert to a list of strings
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Attempts to convert to a nested map (returns immutable reference)
    pub fn as_map(&self) -> Option<&AttributeMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Attempts to convert to a mutable nested map reference
    pub fn as_map_mut(&mut self) -> Option<&mut AttributeMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:?}"),
            Value::List(list) => write!(f, "[{}]", list.join(", ")),
            Value::Map(map) => write!(f, "{map}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::List(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<AttributeMap> for Value {
    fn from(value: AttributeMap) -> Self {
        Value::Map(value)
    }
}

fn mismatch(expected: &'static str, value: &Value) -> MapError {
    MapError::TypeMismatch {
        expected,
        actual: value.type_name(),
    }
}

impl TryFrom<&Value> for String {
    type Error = MapError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            _ => Err(mismatch("text", value)),
        }
    }
}

impl<'a> TryFrom<&'a Value> for &'a str {
    type Error = MapError;

    fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(s) => Ok(s),
            _ => Err(mismatch("text", value)),
        }
    }
}

impl TryFrom<&Value> for i64 {
    type Error = MapError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(n) => Ok(*n),
            _ => Err(mismatch("int", value)),
        }
    }
}

impl TryFrom<&Value> for f64 {
    type Error = MapError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(n) => Ok(*n),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = MapError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl TryFrom<&Value> for Vec<String> {
    type Error = MapError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::List(list) => Ok(list.clone()),
            _ => Err(mismatch("list", value)),
        }
    }
}

impl TryFrom<&Value> for AttributeMap {
    type Error = MapError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(map) => Ok(map.clone()),
            _ => Err(mismatch("map", value)),
        }
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Value::Text(s) if s == other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<String> for Value {
    fn eq(&self, other: &String) -> bool {
        self == other.as_str()
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Value::Int(n) if n == other)
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        matches!(self, Value::Int(n) if *n == *other as i64)
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Value::Float(n) if n == other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        matches!(self, Value::Bool(b) if b == other)
    }
}

// Reverse implementations for symmetry
impl PartialEq<Value> for &str {
    fn eq(&self, other: &Value) -> bool {
        other == *self
    }
}

impl PartialEq<Value> for i64 {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

impl PartialEq<Value> for bool {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}
