//! Ordered, comment-aware attribute maps.
//!
//! [`AttributeMap`] is the in-memory form of a configuration file: an ordered
//! sequence of [`Entry`] values plus the comment lines that surround them.
//! Entries keep the position they were first introduced at, so a map that is
//! read from a file and written back comes out in the same order.
//!
//! # Comment attachments
//!
//! Each map level owns three kinds of comment lines:
//!
//! - its **header**: lines before the first entry
//! - each entry's **leading comment**: lines directly before that entry
//! - its **footer**: lines after the last entry
//!
//! Comment lines are stored trimmed; a blank line is stored as `""`.
//!
//! # Lookup
//!
//! Lookup is a linear scan. [`AttributeMap::add`] may create duplicate keys;
//! every key-based operation ([`get`](AttributeMap::get),
//! [`put`](AttributeMap::put), [`remove`](AttributeMap::remove)) acts on the
//! first match in scan order.
//!
//! ```
//! use thunderfile::map::AttributeMap;
//!
//! let mut map = AttributeMap::new();
//! map.put("name", "alice");
//! map.put("port", 8080);
//! map.put("name", "bob"); // upsert keeps the original position
//!
//! let keys: Vec<&str> = map.keys().collect();
//! assert_eq!(keys, vec!["name", "port"]);
//! assert_eq!(map.get("name").unwrap(), &"bob");
//! ```

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

pub mod errors;
pub mod path;
pub mod value;

pub use errors::MapError;
pub use path::KeyPath;
pub use value::Value;

/// One key/value pair inside an [`AttributeMap`].
#[derive(Debug, Clone)]
pub struct Entry {
    key: String,
    value: Value,
    order: u64,
    comments: Vec<String>,
}

impl Entry {
    /// The entry's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The entry's value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access to the entry's value.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Insertion sequence number within the enclosing map level.
    ///
    /// Numbers increase with every insertion and are never reused, so gaps
    /// appear after removals.
    pub fn order(&self) -> u64 {
        self.order
    }

    /// Comment and blank lines directly preceding this entry.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

/// Entries compare by key and value only.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

/// Ordered key/value store with comment attachments.
///
/// Two maps are equal when their ordered `(key, value)` sequences are equal;
/// comments and insertion counters are not compared.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    entries: Vec<Entry>,
    header: Vec<String>,
    footer: Vec<String>,
    next_order: u64,
}

impl PartialEq for AttributeMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl AttributeMap {
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Reserves room for at least `additional` more entries, reporting
    /// allocation failure instead of aborting.
    pub fn try_reserve(
        &mut self,
        additional: usize,
    ) -> Result<(), std::collections::TryReserveError> {
        self.entries.try_reserve(additional)
    }

    /// Number of entries at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if this level has no entries. Comments do not count.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key == key)
    }

    /// Returns true if an entry with this key exists at this level.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Gets the value of the first entry with this key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    /// Gets a mutable reference to the value of the first entry with this key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|entry| entry.key == key)
            .map(|entry| &mut entry.value)
    }

    /// Gets the first entry with this key.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// Inserts or replaces a value, returning the previous value.
    ///
    /// An existing entry keeps its position, order number and comments.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.push_entry(key, value, Vec::new());
                None
            }
        }
    }

    /// Appends an entry, even if the key already exists.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.push_entry(key.into(), value.into(), Vec::new());
    }

    /// Appends an entry together with its leading comment lines.
    pub fn add_commented(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        comments: Vec<String>,
    ) {
        let comments = normalize_comments(comments);
        self.push_entry(key.into(), value.into(), comments);
    }

    fn push_entry(&mut self, key: String, value: Value, comments: Vec<String>) {
        let order = self.next_order;
        self.next_order += 1;
        self.entries.push(Entry {
            key,
            value,
            order,
            comments,
        });
    }

    /// Removes the first entry with this key and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.remove_entry(key).map(|entry| entry.value)
    }

    /// Removes the first entry with this key and returns it whole.
    pub fn remove_entry(&mut self, key: &str) -> Option<Entry> {
        let index = self.position(key)?;
        Some(self.entries.remove(index))
    }

    /// Removes every entry and every comment line.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.header.clear();
        self.footer.clear();
    }

    /// Iterates over entries in order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Iterates over `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), &entry.value))
    }

    /// Iterates over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Iterates over values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|entry| &entry.value)
    }

    /// Header comment lines of this level.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Replaces the header. Lines without a leading `#` get one, and text
    /// containing line breaks becomes several comment lines.
    pub fn set_header<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = normalize_comments(lines);
    }

    /// Footer comment lines of this level.
    pub fn footer(&self) -> &[String] {
        &self.footer
    }

    /// Replaces the footer, normalized like [`set_header`](Self::set_header).
    pub fn set_footer<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.footer = normalize_comments(lines);
    }

    /// Leading comment lines of the first entry with this key.
    pub fn comment(&self, key: &str) -> Option<&[String]> {
        self.entry(key).map(Entry::comments)
    }

    /// Replaces the leading comment of the first entry with this key.
    ///
    /// Returns false if no such entry exists.
    pub fn set_comment<I, S>(&mut self, key: &str, lines: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => {
                entry.comments = normalize_comments(lines);
                true
            }
            None => false,
        }
    }

    /// Collects every comment line of this map and its nested maps, in the
    /// order they appear in the encoded text. Blank lines are skipped.
    pub fn all_comments(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_comments(&mut out);
        out
    }

    fn collect_comments<'a>(&'a self, out: &mut Vec<&'a str>) {
        let non_blank = |line: &&'a String| !line.is_empty();
        out.extend(self.header.iter().filter(non_blank).map(String::as_str));
        for entry in &self.entries {
            out.extend(entry.comments.iter().filter(non_blank).map(String::as_str));
            if let Value::Map(nested) = &entry.value {
                nested.collect_comments(out);
            }
        }
        out.extend(self.footer.iter().filter(non_blank).map(String::as_str));
    }

    /// Gets the map addressed by `path`; the empty path is this map.
    pub fn get_map_path(&self, path: &KeyPath) -> Option<&AttributeMap> {
        path.components()
            .try_fold(self, |current, component| current.get(component)?.as_map())
    }

    /// Mutable variant of [`get_map_path`](Self::get_map_path).
    pub fn get_map_path_mut(&mut self, path: &KeyPath) -> Option<&mut AttributeMap> {
        let mut current = self;
        for component in path.components() {
            current = current.get_mut(component)?.as_map_mut()?;
        }
        Some(current)
    }

    /// Gets a value by dotted path.
    pub fn get_path(&self, path: &KeyPath) -> Option<&Value> {
        let (parent, last) = path.split_last()?;
        self.get_map_path(&parent)?.get(last)
    }

    /// Gets a mutable value by dotted path.
    pub fn get_path_mut(&mut self, path: &KeyPath) -> Option<&mut Value> {
        let (parent, last) = path.split_last()?;
        let last = last.to_string();
        self.get_map_path_mut(&parent)?.get_mut(&last)
    }

    /// Upserts a value by dotted path, creating intermediate maps as needed.
    ///
    /// Fails without modifying anything if the path is empty, contains an
    /// invalid key, or would have to descend through a non-map value.
    pub fn put_path(
        &mut self,
        path: &KeyPath,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, MapError> {
        self.put_path_with(path, value, || Ok(AttributeMap::new()))
    }

    /// Like [`put_path`](Self::put_path), but missing intermediate maps come
    /// from `new_map`.
    ///
    /// Every missing map is created before the first one is inserted, so a
    /// failing factory leaves this map untouched.
    pub fn put_path_with<F, E>(
        &mut self,
        path: &KeyPath,
        value: impl Into<Value>,
        mut new_map: F,
    ) -> Result<Option<Value>, E>
    where
        F: FnMut() -> Result<AttributeMap, E>,
        E: From<MapError>,
    {
        path.validate()?;
        let components: Vec<&str> = path.components().collect();
        let (last, parents) = components.split_last().ok_or(MapError::EmptyPath)?;

        // Check the whole route before creating anything.
        let mut existing = 0;
        let mut probe = Some(&*self);
        for (depth, component) in parents.iter().enumerate() {
            probe = match probe.and_then(|map| map.get(component)) {
                Some(Value::Map(nested)) => {
                    existing = depth + 1;
                    Some(nested)
                }
                Some(other) => {
                    return Err(MapError::NotAMap {
                        path: parents[..=depth].join("."),
                        found: other.type_name(),
                    }
                    .into());
                }
                None => break,
            };
        }

        let mut fresh = (existing..parents.len())
            .map(|_| new_map())
            .collect::<Result<Vec<_>, E>>()?
            .into_iter();

        let mut current = self;
        for component in parents {
            if !current.contains_key(component) {
                let map = fresh.next().unwrap_or_default();
                current.put(*component, map);
            }
            current = current
                .get_mut(component)
                .and_then(Value::as_map_mut)
                .ok_or_else(|| MapError::NotAMap {
                    path: (*component).to_string(),
                    found: "scalar",
                })?;
        }
        Ok(current.put(*last, value))
    }

    /// Removes a value by dotted path and returns it.
    pub fn remove_path(&mut self, path: &KeyPath) -> Option<Value> {
        let (parent, last) = path.split_last()?;
        let last = last.to_string();
        self.get_map_path_mut(&parent)?.remove(&last)
    }

    /// Keys at this level whose values are nested maps.
    pub fn block_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| entry.value.is_map())
            .map(|entry| entry.key.as_str())
    }
}

/// Normalizes comment input into stored lines.
///
/// Each input is split on line breaks so no stored line can end up as bare
/// text in the encoded file. Whitespace-only input stays one blank line.
pub(crate) fn normalize_comments<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    lines
        .into_iter()
        .flat_map(|text| {
            let text = text.into();
            if text.trim().is_empty() {
                vec![String::new()]
            } else {
                text.lines()
                    .flat_map(|line| line.split('\r'))
                    .map(normalize_comment)
                    .collect()
            }
        })
        .collect()
}

/// Normalizes one physical comment line: trimmed, blank stays blank, and
/// text without a leading `#` gets `"# "` prepended.
fn normalize_comment(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("# {trimmed}")
    }
}

impl fmt::Display for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Value::Text(s) => write!(f, "{key}: {s:?}")?,
                other => write!(f, "{key}: {other}")?,
            }
        }
        write!(f, "}}")
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::List(list) => list.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

/// Serializes as a plain ordered map; comments are not part of the data model
/// of serde formats and are dropped.
impl Serialize for AttributeMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
