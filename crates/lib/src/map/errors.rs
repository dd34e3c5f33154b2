//! Error types for attribute map operations.
//!
//! These are precondition failures: they are raised before the map is touched,
//! so a failed call never leaves a partially applied edit behind.

use thiserror::Error;

/// Structured error types for [`AttributeMap`](super::AttributeMap) operations.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// The key path resolved to no components.
    #[error("Empty key path")]
    EmptyPath,

    /// A key contains characters the text format reserves.
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// A path tried to descend through a value that is not a nested map.
    #[error("Cannot descend into '{path}': value is a {found}, not a map")]
    NotAMap { path: String, found: &'static str },

    /// A value had a different type than requested.
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl MapError {
    /// Check if this error is a type mismatch.
    pub fn is_type_error(&self) -> bool {
        matches!(self, MapError::TypeMismatch { .. })
    }

    /// Check if this error was caused by a malformed key or path.
    pub fn is_key_error(&self) -> bool {
        matches!(self, MapError::EmptyPath | MapError::InvalidKey { .. })
    }

    /// Get the offending path if this error carries one.
    pub fn path(&self) -> Option<&str> {
        match self {
            MapError::InvalidKey { key, .. } => Some(key),
            MapError::NotAMap { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<MapError> for crate::Error {
    fn from(err: MapError) -> Self {
        crate::Error::Map(err)
    }
}
