//! Dotted key paths for hierarchical map access.
//!
//! A [`KeyPath`] addresses a value inside nested [`AttributeMap`](super::AttributeMap)s,
//! one component per map level: `server.tls.enabled` is the `enabled` key inside the
//! `tls` block inside the `server` block.
//!
//! # Usage
//!
//! ```rust
//! use thunderfile::map::KeyPath;
//! use thunderfile::key_path;
//!
//! // Construct from a string (automatically normalized)
//! let path = KeyPath::normalize("server..tls.");
//! assert_eq!(path.as_str(), "server.tls");
//!
//! // Build incrementally
//! let path = KeyPath::new().push("server").push("tls");
//! assert_eq!(path.len(), 2);
//!
//! // Or with the macro
//! let path = key_path!("server", "tls", "enabled");
//! assert_eq!(path.last(), Some("enabled"));
//! ```

use std::{fmt, str::FromStr};

use super::MapError;

/// Characters that can never appear in a key, because the text format
/// gives them structural meaning.
const RESERVED: &[char] = &['.', ':', '{', '}', '#', '"', '[', ']', '\n', '\r'];

/// Normalizes a path string by dropping empty components.
///
/// - Empty string "" → empty string (refers to the map itself)
/// - Leading dots ".server" → "server"
/// - Trailing dots "server." → "server"
/// - Consecutive dots "server..tls" → "server.tls"
/// - Whitespace around components is trimmed
///
/// ```rust
/// # use thunderfile::map::path::normalize_path;
/// assert_eq!(normalize_path(""), "");
/// assert_eq!(normalize_path(".server"), "server");
/// assert_eq!(normalize_path("server..tls"), "server.tls");
/// assert_eq!(normalize_path(" server . tls "), "server.tls");
/// assert_eq!(normalize_path("..."), "");
/// ```
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .split('.')
        .map(str::trim)
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Checks that a single key can be written to and read back from a file.
///
/// Keys must be non-empty, carry no surrounding whitespace and contain none
/// of `. : { } # " [ ]` or line breaks.
pub fn validate_key(key: &str) -> Result<(), MapError> {
    if key.is_empty() {
        return Err(MapError::InvalidKey {
            key: key.to_string(),
            reason: "keys cannot be empty".to_string(),
        });
    }
    if key.trim() != key {
        return Err(MapError::InvalidKey {
            key: key.to_string(),
            reason: "keys cannot start or end with whitespace".to_string(),
        });
    }
    if let Some(c) = key.chars().find(|c| RESERVED.contains(c)) {
        return Err(MapError::InvalidKey {
            key: key.to_string(),
            reason: format!("'{}' is reserved", c.escape_default()),
        });
    }
    Ok(())
}

/// An owned, normalized dotted path.
///
/// Paths are always stored normalized, so two paths naming the same location
/// compare equal regardless of how they were spelled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath {
    inner: String,
}

impl KeyPath {
    /// Creates a new empty path, referring to the map itself.
    pub fn new() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Creates a path by normalizing the input string. Always succeeds.
    pub fn normalize(path: &str) -> Self {
        Self {
            inner: normalize_path(path),
        }
    }

    /// Builds a path from individual components, normalizing each one.
    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        components
            .into_iter()
            .fold(Self::new(), |path, component| path.push(component))
    }

    /// Appends a path (one or more dotted components) to the end of this path.
    ///
    /// ```rust
    /// # use thunderfile::map::KeyPath;
    /// let path = KeyPath::new().push("server").push("tls.enabled");
    /// assert_eq!(path.as_str(), "server.tls.enabled");
    /// ```
    pub fn push(mut self, path: impl AsRef<str>) -> Self {
        let normalized = normalize_path(path.as_ref());
        if normalized.is_empty() {
            return self;
        }

        if self.inner.is_empty() {
            self.inner = normalized;
        } else {
            self.inner.push('.');
            self.inner.push_str(&normalized);
        }
        self
    }

    /// Joins this path with another path.
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        self.clone().push(other.as_str())
    }

    /// Returns an iterator over the path components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.inner.split('.').filter(|s| !s.is_empty())
    }

    /// Returns the number of components in the path.
    pub fn len(&self) -> usize {
        self.components().count()
    }

    /// Returns `true` if the path has no components.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the parent path, or `None` if this path has at most one component.
    pub fn parent(&self) -> Option<KeyPath> {
        self.inner.rfind('.').map(|last_dot| KeyPath {
            inner: self.inner[..last_dot].to_string(),
        })
    }

    /// Returns the last component of the path, or `None` if empty.
    pub fn last(&self) -> Option<&str> {
        if self.inner.is_empty() {
            None
        } else {
            self.inner.rsplit('.').next()
        }
    }

    /// Splits the path into its parent (possibly empty) and its last component.
    pub fn split_last(&self) -> Option<(KeyPath, &str)> {
        let last = self.last()?;
        Some((self.parent().unwrap_or_default(), last))
    }

    /// Checks every component with [`validate_key`].
    pub fn validate(&self) -> Result<(), MapError> {
        if self.is_empty() {
            return Err(MapError::EmptyPath);
        }
        self.components().try_for_each(validate_key)
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl AsRef<str> for KeyPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for KeyPath {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl From<String> for KeyPath {
    fn from(s: String) -> Self {
        Self::normalize(&s)
    }
}

impl From<&KeyPath> for KeyPath {
    fn from(path: &KeyPath) -> Self {
        path.clone()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.inner)
        }
    }
}

/// Constructs a [`KeyPath`] from one or more components.
///
/// - `key_path!()` - Empty path
/// - `key_path!("server.tls")` - Dotted string
/// - `key_path!("server", "tls")` - Multiple components
/// - `key_path!(base, "tls")` - Mix runtime values and literals
#[macro_export]
macro_rules! key_path {
    () => {
        $crate::map::KeyPath::new()
    };

    ($($component:expr),+ $(,)?) => {{
        let path = $crate::map::KeyPath::new();
        $(
            let path = path.push($component.to_string());
        )+
        path
    }};
}
