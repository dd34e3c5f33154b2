//! Options for opening a [`ConfigDocument`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::{ConfigDocument, ReloadPolicy, Seed};
use crate::Result;
use crate::clock::{Clock, SystemClock};
use crate::codec::{Codec, CommentMode, Format, ParseError};
use crate::lock::LockRegistry;
use crate::provider::{ContainerProvider, DefaultProvider};

/// Builder for [`ConfigDocument`].
///
/// ```
/// # fn main() -> thunderfile::Result<()> {
/// use thunderfile::document::{ConfigDocument, ReloadPolicy};
/// use thunderfile::lock::LockRegistry;
///
/// let dir = tempfile::tempdir()?;
/// let doc = ConfigDocument::builder(dir.path().join("app.tf"))
///     .reload_policy(ReloadPolicy::Manual)
///     .registry(LockRegistry::new())
///     .seed("name: \"demo\"\n")
///     .open()?;
/// assert_eq!(doc.reload_policy(), ReloadPolicy::Manual);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DocumentBuilder<P = DefaultProvider> {
    path: PathBuf,
    reload_policy: ReloadPolicy,
    comment_mode: CommentMode,
    format: Option<Format>,
    autosave: bool,
    registry: Option<LockRegistry>,
    seed: Option<Seed>,
    clock: Arc<dyn Clock>,
    provider: P,
}

impl DocumentBuilder<DefaultProvider> {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reload_policy: ReloadPolicy::default(),
            comment_mode: CommentMode::default(),
            format: None,
            autosave: true,
            registry: None,
            seed: None,
            clock: Arc::new(SystemClock),
            provider: DefaultProvider,
        }
    }
}

impl<P: ContainerProvider> DocumentBuilder<P> {
    /// When the file is re-read. Defaults to [`ReloadPolicy::OnChange`].
    pub fn reload_policy(mut self, policy: ReloadPolicy) -> Self {
        self.reload_policy = policy;
        self
    }

    /// Whether comments are kept. Defaults to [`CommentMode::Preserve`].
    pub fn comment_mode(mut self, mode: CommentMode) -> Self {
        self.comment_mode = mode;
        self
    }

    /// The file format. Defaults to a guess from the file extension.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Whether every change is written immediately. Defaults to true.
    pub fn autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// The lock registry to coordinate through. Defaults to
    /// [`LockRegistry::global`].
    pub fn registry(mut self, registry: LockRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Content written to the file if it is missing or empty.
    pub fn seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Time source for load timestamps.
    #[cfg(any(test, feature = "testing"))]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Factory for every map and list the document decodes into.
    pub fn provider<Q: ContainerProvider>(self, provider: Q) -> DocumentBuilder<Q> {
        DocumentBuilder {
            path: self.path,
            reload_policy: self.reload_policy,
            comment_mode: self.comment_mode,
            format: self.format,
            autosave: self.autosave,
            registry: self.registry,
            seed: self.seed,
            clock: self.clock,
            provider,
        }
    }

    /// Opens the file, creating it (and its parent directories) if needed.
    ///
    /// A configured seed is written only if the file is empty, and only after
    /// it decodes cleanly. The file is then always decoded once; any failure
    /// is returned and no document is created.
    pub fn open(self) -> Result<ConfigDocument<P>> {
        let format = self.format.unwrap_or_else(|| Format::from_path(&self.path));
        let registry = self.registry.unwrap_or_else(LockRegistry::global);
        let access = registry.acquire(&self.path)?;

        if let Some(seed) = self.seed
            && access.is_empty()?
        {
            let bytes = seed.into_bytes()?;
            let text = std::str::from_utf8(&bytes)
                .map_err(|err| ParseError::invalid_utf8(&bytes, &err))?;
            format.decode_with(text, self.comment_mode, &self.provider)?;

            let _guard = access.try_write()?;
            access.replace_all(&bytes)?;
            debug!(path = %self.path.display(), bytes = bytes.len(), "seeded empty file");
        }

        let data = self.provider.new_map()?;
        let mut doc = ConfigDocument {
            path: self.path,
            access,
            data,
            last_loaded: None,
            reload_policy: self.reload_policy,
            comment_mode: self.comment_mode,
            format,
            autosave: self.autosave,
            clock: self.clock,
            provider: self.provider,
        };
        doc.reload()?;
        debug!(
            path = %doc.path.display(),
            policy = ?doc.reload_policy,
            format = doc.format.name(),
            "opened document"
        );
        Ok(doc)
    }
}
