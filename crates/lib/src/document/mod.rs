//! Configuration documents backed by a file.
//!
//! A [`ConfigDocument`] caches the decoded content of one file and keeps it
//! in sync according to its [`ReloadPolicy`]. Reads re-check the policy
//! first; writes go through [`save`](ConfigDocument::save), which autosave
//! calls after every change.
//!
//! ```
//! # fn main() -> thunderfile::Result<()> {
//! use thunderfile::{ConfigDocument, Gettable, Settable, SectionNavigable};
//!
//! let dir = tempfile::tempdir()?;
//! let mut doc = ConfigDocument::open(dir.path().join("app.tf"))?;
//!
//! doc.set("server.port", 8080)?;
//! assert_eq!(doc.get_as::<i64>("server.port")?, 8080);
//!
//! let mut server = doc.section("server");
//! server.set("host", "localhost")?;
//! assert_eq!(
//!     std::fs::read_to_string(dir.path().join("app.tf"))?,
//!     "server {\n  port: 8080\n  host: \"localhost\"\n}\n"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! A failed reload never replaces the cache. Reads keep serving the previous
//! content and log the failure; writes return it and change nothing, so an
//! edit can never be saved over newer content. A document is `Send` but not shared;
//! wrap it in a `Mutex` to use it from several threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::{Error, Result};
use crate::codec::{Codec, CommentMode, Format, ParseError};
use crate::lock::FileAccess;
use crate::map::{AttributeMap, KeyPath, Value};
use crate::provider::{ContainerProvider, DefaultProvider};

mod builder;
pub mod errors;
mod reload;
mod section;
mod seed;
mod traits;

pub use builder::DocumentBuilder;
pub use errors::DocumentError;
pub use reload::ReloadPolicy;
pub use section::Section;
pub use seed::Seed;
pub use traits::{CommentAware, Gettable, SectionNavigable, Settable};

/// A file-backed, cached configuration document.
#[derive(Debug)]
pub struct ConfigDocument<P = DefaultProvider> {
    path: PathBuf,
    access: FileAccess,
    data: AttributeMap,
    last_loaded: Option<DateTime<Utc>>,
    reload_policy: ReloadPolicy,
    comment_mode: CommentMode,
    format: Format,
    autosave: bool,
    clock: Arc<dyn Clock>,
    provider: P,
}

impl ConfigDocument<DefaultProvider> {
    /// Starts configuring a document for `path`.
    pub fn builder(path: impl Into<PathBuf>) -> DocumentBuilder {
        DocumentBuilder::new(path)
    }

    /// Opens `path` with default options.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(path).open()
    }
}

impl<P: ContainerProvider> ConfigDocument<P> {
    /// The path the document was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The resolved path used for lock coordination.
    pub fn canonical_path(&self) -> &Path {
        self.access.path()
    }

    pub fn reload_policy(&self) -> ReloadPolicy {
        self.reload_policy
    }

    pub fn set_reload_policy(&mut self, policy: ReloadPolicy) {
        self.reload_policy = policy;
    }

    pub fn comment_mode(&self) -> CommentMode {
        self.comment_mode
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    pub fn set_autosave(&mut self, autosave: bool) {
        self.autosave = autosave;
    }

    /// When the file was last loaded or saved successfully.
    pub fn last_loaded(&self) -> Option<DateTime<Utc>> {
        self.last_loaded
    }

    /// The file's modification time, if the filesystem reports one.
    fn modified(&self) -> Option<DateTime<Utc>> {
        self.access.modified().ok().map(DateTime::<Utc>::from)
    }

    /// Returns true if the file changed after the last load, whatever the
    /// reload policy.
    pub fn has_changed(&self) -> bool {
        ReloadPolicy::OnChange.should_reload(self.last_loaded, self.modified())
    }

    /// Re-reads and decodes the file.
    ///
    /// On failure the cached content is left untouched.
    pub fn reload(&mut self) -> Result<()> {
        // Stamped before reading: a write racing the read stays newer.
        let started = self.clock.now();
        let decoded = self.read_file();
        match decoded {
            Ok(map) => {
                debug!(
                    path = %self.path.display(),
                    entries = map.len(),
                    "loaded document"
                );
                self.data = map;
                self.last_loaded = Some(started);
                Ok(())
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "reload failed, keeping previous content"
                );
                Err(err)
            }
        }
    }

    fn read_file(&self) -> Result<AttributeMap> {
        let bytes = {
            let _guard = self.access.try_read()?;
            self.access.read_all()?
        };
        let text =
            std::str::from_utf8(&bytes).map_err(|err| ParseError::invalid_utf8(&bytes, &err))?;
        self.format
            .decode_with(text, self.comment_mode, &self.provider)
    }

    /// Reloads if the policy says the cache is stale.
    ///
    /// Every mutation calls this first and stops on failure, so a change is
    /// never applied to (and saved over) content older than the file.
    fn refresh(&mut self) -> Result<()> {
        if self
            .reload_policy
            .should_reload(self.last_loaded, self.modified())
        {
            debug!(path = %self.path.display(), policy = ?self.reload_policy, "cache is stale");
            self.reload()?;
        }
        Ok(())
    }

    /// Refresh for read accessors, which keep serving the previous snapshot
    /// when the reload fails. The failure is logged by `reload`.
    fn refresh_for_read(&mut self) {
        let _ = self.refresh();
    }

    /// Encodes the cache and writes it to the file under a write lock.
    pub fn save(&mut self) -> Result<()> {
        let text = self.format.encode(&self.data)?;
        {
            let _guard = self.access.try_write()?;
            self.access.replace_all(text.as_bytes())?;
        }
        self.last_loaded = Some(self.clock.now());
        debug!(path = %self.path.display(), bytes = text.len(), "saved document");
        Ok(())
    }

    fn autosave_if(&mut self, changed: bool) -> Result<bool> {
        if changed && self.autosave {
            self.save()?;
        }
        Ok(changed)
    }

    /// The whole cached map, refreshed first.
    pub fn data(&mut self) -> &AttributeMap {
        self.refresh_for_read();
        &self.data
    }

    /// Top-level keys in file order.
    pub fn keys(&mut self) -> Vec<String> {
        self.keys_at(KeyPath::new())
    }

    /// Keys of the block at `path` in file order. Empty if there is no block.
    pub fn keys_at(&mut self, path: impl Into<KeyPath>) -> Vec<String> {
        let path = path.into();
        self.refresh_for_read();
        self.data
            .get_map_path(&path)
            .map(|map| map.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Top-level keys that hold blocks.
    pub fn block_keys(&mut self) -> Vec<String> {
        self.refresh_for_read();
        self.data.block_keys().map(str::to_string).collect()
    }

    /// Every non-blank comment line in file order.
    pub fn comments(&mut self) -> Vec<String> {
        self.refresh_for_read();
        self.data
            .all_comments()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn value_at(&mut self, path: &KeyPath) -> Option<&Value> {
        self.refresh_for_read();
        self.data.get_path(path)
    }

    fn set_at(&mut self, path: &KeyPath, value: Value) -> Result<bool> {
        path.validate()?;
        self.refresh()?;
        if self.data.get_path(path) == Some(&value) {
            return Ok(false);
        }
        let provider = &self.provider;
        self.data
            .put_path_with(path, value, || provider.new_map().map_err(Error::from))?;
        self.autosave_if(true)
    }

    fn set_all_at(&mut self, pairs: Vec<(KeyPath, Value)>) -> Result<bool> {
        for (path, _) in &pairs {
            path.validate()?;
        }
        self.refresh()?;

        // Apply to a copy so a path that crosses a scalar leaves nothing half done.
        let mut next = self.data.clone();
        let mut changed = false;
        for (path, value) in pairs {
            if next.get_path(&path) != Some(&value) {
                next.put_path_with(&path, value, || {
                    self.provider.new_map().map_err(Error::from)
                })?;
                changed = true;
            }
        }
        if changed {
            self.data = next;
        }
        self.autosave_if(changed)
    }

    fn remove_at(&mut self, path: &KeyPath) -> Result<bool> {
        path.validate()?;
        self.refresh()?;
        let changed = self.data.remove_path(path).is_some();
        self.autosave_if(changed)
    }

    fn remove_all_at(&mut self, paths: Vec<KeyPath>) -> Result<bool> {
        for path in &paths {
            path.validate()?;
        }
        self.refresh()?;
        let mut changed = false;
        for path in &paths {
            changed |= self.data.remove_path(path).is_some();
        }
        self.autosave_if(changed)
    }

    /// The block at `path`; the empty path is the document itself.
    fn block(&self, path: &KeyPath) -> Result<&AttributeMap> {
        if let Some(map) = self.data.get_map_path(path) {
            return Ok(map);
        }
        Err(self.block_error(path).into())
    }

    fn block_mut(&mut self, path: &KeyPath) -> Result<&mut AttributeMap> {
        let err = self.block_error(path);
        self.data.get_map_path_mut(path).ok_or_else(|| err.into())
    }

    fn block_error(&self, path: &KeyPath) -> DocumentError {
        match self.data.get_path(path) {
            Some(value) => DocumentError::NotABlock {
                path: path.to_string(),
                found: value.type_name(),
            },
            None => DocumentError::MissingKey {
                path: path.to_string(),
            },
        }
    }

    /// Header lines of the block at `path`.
    pub fn header_at(&mut self, path: impl Into<KeyPath>) -> Result<Vec<String>> {
        let path = path.into();
        self.refresh_for_read();
        Ok(self.block(&path)?.header().to_vec())
    }

    /// Footer lines of the block at `path`.
    pub fn footer_at(&mut self, path: impl Into<KeyPath>) -> Result<Vec<String>> {
        let path = path.into();
        self.refresh_for_read();
        Ok(self.block(&path)?.footer().to_vec())
    }

    pub fn set_header_at(&mut self, path: impl Into<KeyPath>, lines: Vec<String>) -> Result<()> {
        let path = path.into();
        self.refresh()?;
        let block = self.block_mut(&path)?;
        let before = block.header().to_vec();
        block.set_header(lines);
        let changed = block.header() != before.as_slice();
        self.autosave_if(changed).map(drop)
    }

    pub fn set_footer_at(&mut self, path: impl Into<KeyPath>, lines: Vec<String>) -> Result<()> {
        let path = path.into();
        self.refresh()?;
        let block = self.block_mut(&path)?;
        let before = block.footer().to_vec();
        block.set_footer(lines);
        let changed = block.footer() != before.as_slice();
        self.autosave_if(changed).map(drop)
    }

    fn comment_at(&mut self, path: &KeyPath) -> Option<Vec<String>> {
        self.refresh_for_read();
        let (parent, last) = path.split_last()?;
        self.data
            .get_map_path(&parent)?
            .comment(last)
            .map(<[String]>::to_vec)
    }

    fn set_comment_at(&mut self, path: &KeyPath, lines: Vec<String>) -> Result<()> {
        path.validate()?;
        self.refresh()?;
        let missing = || DocumentError::MissingKey {
            path: path.to_string(),
        };
        let (parent, last) = path.split_last().ok_or_else(missing)?;
        let block = self.data.get_map_path_mut(&parent).ok_or_else(missing)?;
        let before = block.comment(last).map(<[String]>::to_vec);
        if !block.set_comment(last, lines) {
            return Err(missing().into());
        }
        let changed = block.comment(last).map(<[String]>::to_vec) != before;
        self.autosave_if(changed).map(drop)
    }

    /// Replaces the file content with `seed` and loads it.
    ///
    /// The seed is decoded before anything is written, so invalid content
    /// leaves both the file and the cache untouched.
    pub fn set_data_from(&mut self, seed: impl Into<Seed>) -> Result<()> {
        let bytes = seed.into().into_bytes()?;
        let text =
            std::str::from_utf8(&bytes).map_err(|err| ParseError::invalid_utf8(&bytes, &err))?;
        let map = self
            .format
            .decode_with(text, self.comment_mode, &self.provider)?;
        {
            let _guard = self.access.try_write()?;
            self.access.replace_all(&bytes)?;
        }
        self.data = map;
        self.last_loaded = Some(self.clock.now());
        debug!(path = %self.path.display(), bytes = bytes.len(), "replaced document content");
        Ok(())
    }

    /// Empties both the cache and the file.
    pub fn clear(&mut self) -> Result<()> {
        let empty = self.provider.new_map()?;
        {
            let _guard = self.access.try_write()?;
            self.access.replace_all(&[])?;
        }
        self.data = empty;
        self.last_loaded = Some(self.clock.now());
        debug!(path = %self.path.display(), "cleared document");
        Ok(())
    }

    /// Closes the document and deletes its file.
    ///
    /// Other accessors of the same file keep their handle to the removed file.
    pub fn delete_file(mut self) -> Result<()> {
        {
            let _guard = self.access.try_write()?;
        }
        self.access.close();
        std::fs::remove_file(&self.path)?;
        debug!(path = %self.path.display(), "deleted document file");
        Ok(())
    }
}

impl<P: ContainerProvider> Gettable for ConfigDocument<P> {
    fn get(&mut self, key: impl Into<KeyPath>) -> Option<&Value> {
        self.value_at(&key.into())
    }
}

impl<P: ContainerProvider> Settable for ConfigDocument<P> {
    fn set(&mut self, key: impl Into<KeyPath>, value: impl Into<Value>) -> Result<bool> {
        self.set_at(&key.into(), value.into())
    }

    fn set_all<I, K, V>(&mut self, pairs: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<KeyPath>,
        V: Into<Value>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.set_all_at(pairs)
    }

    fn remove(&mut self, key: impl Into<KeyPath>) -> Result<bool> {
        self.remove_at(&key.into())
    }

    fn remove_all<I, K>(&mut self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyPath>,
    {
        self.remove_all_at(keys.into_iter().map(Into::into).collect())
    }
}

impl<P: ContainerProvider> SectionNavigable for ConfigDocument<P> {
    type Section<'s>
        = Section<'s, P>
    where
        Self: 's;

    fn section(&mut self, key: impl Into<KeyPath>) -> Section<'_, P> {
        Section::new(self, key.into())
    }
}

impl<P: ContainerProvider> CommentAware for ConfigDocument<P> {
    fn header(&mut self) -> Vec<String> {
        self.refresh_for_read();
        self.data.header().to_vec()
    }

    fn set_header(&mut self, lines: Vec<String>) -> Result<()> {
        self.set_header_at(KeyPath::new(), lines)
    }

    fn footer(&mut self) -> Vec<String> {
        self.refresh_for_read();
        self.data.footer().to_vec()
    }

    fn set_footer(&mut self, lines: Vec<String>) -> Result<()> {
        self.set_footer_at(KeyPath::new(), lines)
    }

    fn comment(&mut self, key: impl Into<KeyPath>) -> Option<Vec<String>> {
        self.comment_at(&key.into())
    }

    fn set_comment(&mut self, key: impl Into<KeyPath>, lines: Vec<String>) -> Result<()> {
        self.set_comment_at(&key.into(), lines)
    }
}
