//! Capabilities shared by documents and sections.
//!
//! Code that only reads values can take any `impl Gettable`, so the same
//! function works on a whole [`ConfigDocument`](super::ConfigDocument) or on
//! one of its [`Section`](super::Section)s.

use crate::Result;
use crate::map::{KeyPath, MapError, Value};

use super::errors::DocumentError;

/// Read access by dotted key path.
///
/// Reads take `&mut self` because they may reload the file first.
pub trait Gettable {
    /// Gets the value at `key`.
    fn get(&mut self, key: impl Into<KeyPath>) -> Option<&Value>;

    /// Returns true if a value exists at `key`.
    fn contains(&mut self, key: impl Into<KeyPath>) -> bool {
        self.get(key).is_some()
    }

    /// Gets the value at `key` as `T`.
    ///
    /// No coercion happens: an integer is not readable as a float and text is
    /// never parsed.
    fn get_as<T>(&mut self, key: impl Into<KeyPath>) -> Result<T>
    where
        T: for<'v> TryFrom<&'v Value, Error = MapError>,
    {
        let key = key.into();
        match self.get(&key) {
            Some(value) => Ok(T::try_from(value)?),
            None => Err(DocumentError::MissingKey {
                path: key.to_string(),
            }
            .into()),
        }
    }

    /// Gets the value at `key` as `T`, or `default` if it is missing or has a
    /// different type.
    fn get_or<T>(&mut self, key: impl Into<KeyPath>, default: T) -> T
    where
        T: for<'v> TryFrom<&'v Value, Error = MapError>,
    {
        self.get_as(key).unwrap_or(default)
    }

    /// Gets several values at once, in the order of `keys`.
    fn get_all<I, K>(&mut self, keys: I) -> Vec<Option<Value>>
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyPath>,
    {
        keys.into_iter().map(|key| self.get(key).cloned()).collect()
    }
}

/// Write access by dotted key path.
///
/// Every method reports whether the data changed.
pub trait Settable {
    /// Sets the value at `key`, creating intermediate blocks.
    fn set(&mut self, key: impl Into<KeyPath>, value: impl Into<Value>) -> Result<bool>;

    /// Sets several values as one change.
    fn set_all<I, K, V>(&mut self, pairs: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<KeyPath>,
        V: Into<Value>;

    /// Removes the value at `key`.
    fn remove(&mut self, key: impl Into<KeyPath>) -> Result<bool>;

    /// Removes several values as one change.
    fn remove_all<I, K>(&mut self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyPath>;
}

/// Navigation into nested blocks.
pub trait SectionNavigable {
    /// The view type returned for a nested block.
    type Section<'s>
    where
        Self: 's;

    /// Returns a view of the block at `key`, relative to this one.
    fn section(&mut self, key: impl Into<KeyPath>) -> Self::Section<'_>;
}

/// Access to the comment lines around a block and its entries.
pub trait CommentAware {
    /// Lines before the first entry.
    fn header(&mut self) -> Vec<String>;

    fn set_header(&mut self, lines: Vec<String>) -> Result<()>;

    /// Lines after the last entry.
    fn footer(&mut self) -> Vec<String>;

    fn set_footer(&mut self, lines: Vec<String>) -> Result<()>;

    /// Lines directly before the entry at `key`.
    fn comment(&mut self, key: impl Into<KeyPath>) -> Option<Vec<String>>;

    fn set_comment(&mut self, key: impl Into<KeyPath>, lines: Vec<String>) -> Result<()>;
}
