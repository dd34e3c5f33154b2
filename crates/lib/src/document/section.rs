//! Key-prefixed views of a document.

use super::{CommentAware, ConfigDocument, Gettable, SectionNavigable, Settable};
use crate::Result;
use crate::map::{KeyPath, Value};
use crate::provider::ContainerProvider;

/// A view of the block at one path inside a [`ConfigDocument`].
///
/// Keys given to a section are relative to its path. Nothing is copied:
/// every call goes straight to the document, including reloads and autosave.
///
/// ```
/// # fn main() -> thunderfile::Result<()> {
/// use thunderfile::{ConfigDocument, Gettable, SectionNavigable, Settable};
///
/// let dir = tempfile::tempdir()?;
/// let mut doc = ConfigDocument::open(dir.path().join("app.tf"))?;
/// {
///     let mut tls = doc.section("server").into_section("tls");
///     tls.set("enabled", true)?;
/// }
/// assert_eq!(doc.get_as::<bool>("server.tls.enabled")?, true);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Section<'a, P: ContainerProvider> {
    doc: &'a mut ConfigDocument<P>,
    path: KeyPath,
}

impl<'a, P: ContainerProvider> Section<'a, P> {
    pub(super) fn new(doc: &'a mut ConfigDocument<P>, path: KeyPath) -> Self {
        Self { doc, path }
    }

    /// The section's path from the document root.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    fn resolve(&self, key: impl Into<KeyPath>) -> KeyPath {
        self.path.join(&key.into())
    }

    /// Narrows this section further, keeping the document borrow.
    pub fn into_section(self, key: impl Into<KeyPath>) -> Section<'a, P> {
        let path = self.resolve(key);
        Section::new(self.doc, path)
    }

    /// Returns true if a block exists at this section's path.
    pub fn exists(&mut self) -> bool {
        let path = self.path.clone();
        self.path.is_empty() || self.doc.value_at(&path).is_some_and(Value::is_map)
    }

    /// Keys of this section's block in file order.
    pub fn keys(&mut self) -> Vec<String> {
        self.doc.keys_at(self.path.clone())
    }

    /// Writes the whole document.
    pub fn save(&mut self) -> Result<()> {
        self.doc.save()
    }
}

impl<P: ContainerProvider> Gettable for Section<'_, P> {
    fn get(&mut self, key: impl Into<KeyPath>) -> Option<&Value> {
        let path = self.resolve(key);
        self.doc.value_at(&path)
    }
}

impl<P: ContainerProvider> Settable for Section<'_, P> {
    fn set(&mut self, key: impl Into<KeyPath>, value: impl Into<Value>) -> Result<bool> {
        let path = self.resolve(key);
        self.doc.set_at(&path, value.into())
    }

    fn set_all<I, K, V>(&mut self, pairs: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<KeyPath>,
        V: Into<Value>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| (self.resolve(key), value.into()))
            .collect();
        self.doc.set_all_at(pairs)
    }

    fn remove(&mut self, key: impl Into<KeyPath>) -> Result<bool> {
        let path = self.resolve(key);
        self.doc.remove_at(&path)
    }

    fn remove_all<I, K>(&mut self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyPath>,
    {
        let paths = keys.into_iter().map(|key| self.resolve(key)).collect();
        self.doc.remove_all_at(paths)
    }
}

impl<P: ContainerProvider> SectionNavigable for Section<'_, P> {
    type Section<'s>
        = Section<'s, P>
    where
        Self: 's;

    fn section(&mut self, key: impl Into<KeyPath>) -> Section<'_, P> {
        let path = self.resolve(key);
        Section::new(&mut *self.doc, path)
    }
}

impl<P: ContainerProvider> CommentAware for Section<'_, P> {
    /// Empty if the block does not exist yet.
    fn header(&mut self) -> Vec<String> {
        self.doc.header_at(self.path.clone()).unwrap_or_default()
    }

    fn set_header(&mut self, lines: Vec<String>) -> Result<()> {
        self.doc.set_header_at(self.path.clone(), lines)
    }

    /// Empty if the block does not exist yet.
    fn footer(&mut self) -> Vec<String> {
        self.doc.footer_at(self.path.clone()).unwrap_or_default()
    }

    fn set_footer(&mut self, lines: Vec<String>) -> Result<()> {
        self.doc.set_footer_at(self.path.clone(), lines)
    }

    fn comment(&mut self, key: impl Into<KeyPath>) -> Option<Vec<String>> {
        let path = self.resolve(key);
        self.doc.comment_at(&path)
    }

    fn set_comment(&mut self, key: impl Into<KeyPath>, lines: Vec<String>) -> Result<()> {
        let path = self.resolve(key);
        self.doc.set_comment_at(&path, lines)
    }
}
