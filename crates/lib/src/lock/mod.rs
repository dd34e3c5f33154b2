//! In-process coordination of file access.
//!
//! A [`LockRegistry`] maps canonical file paths to one shared
//! [`FileHandleRecord`]: an open file plus a reentrant read/write lock pair.
//! Every [`FileAccess`] obtained for the same canonical path from the same
//! registry points at the identical record, so independent consumers of one
//! file see one lock state. The record and its file handle go away when the
//! last accessor is closed or dropped.
//!
//! All acquisition is non-blocking. A lock attempt either succeeds at once or
//! reports failure; nothing waits.
//!
//! ```
//! # fn main() -> thunderfile::Result<()> {
//! use thunderfile::lock::LockRegistry;
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("app.tf");
//!
//! let registry = LockRegistry::new();
//! let first = registry.acquire(&path)?;
//! let second = registry.acquire(&path)?;
//! assert!(first.shares_handle_with(&second));
//!
//! {
//!     let _guard = first.try_write()?;
//!     assert!(second.try_read().is_err());
//! }
//! assert!(second.try_read().is_ok());
//! # Ok(())
//! # }
//! ```
//!
//! Locks only coordinate threads of one process; other processes are not
//! affected.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::SystemTime;

use handle_trait::Handle;
use tracing::{debug, trace};
use uuid::Uuid;

pub mod errors;
mod record;

pub use errors::LockError;
pub use record::FileHandleRecord;

use crate::Result;

/// The two sides of a file's lock pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKind {
    Read,
    Write,
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKind::Read => write!(f, "read"),
            LockKind::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    slots: Mutex<HashMap<PathBuf, Weak<FileHandleRecord>>>,
}

/// Registry of shared file records, keyed by canonical path.
///
/// Cloning is cheap and yields a handle to the same registry. Accessors from
/// different registries never coordinate, which keeps tests isolated.
#[derive(Clone, Debug, Default, Handle)]
pub struct LockRegistry {
    inner: Arc<RegistryInner>,
}

static GLOBAL: OnceLock<LockRegistry> = OnceLock::new();

impl LockRegistry {
    /// Creates an empty, independent registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry.
    pub fn global() -> LockRegistry {
        GLOBAL.get_or_init(LockRegistry::new).handle()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<PathBuf, Weak<FileHandleRecord>>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens `path` for coordinated access.
    ///
    /// Missing parent directories and the file itself are created. The
    /// returned accessor shares its record with every other live accessor of
    /// the same canonical path from this registry.
    pub fn acquire(&self, path: impl AsRef<Path>) -> Result<FileAccess> {
        let path = path.as_ref();
        let canonical = canonicalize_creating(path).map_err(|source| LockError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut slots = self.slots();
        let record = match slots.get(&canonical).and_then(Weak::upgrade) {
            Some(record) => record,
            None => {
                let record = Arc::new(FileHandleRecord::open(canonical.clone()).map_err(
                    |source| LockError::Open {
                        path: canonical.clone(),
                        source,
                    },
                )?);
                debug!(path = %canonical.display(), "opened shared file record");
                slots.insert(canonical.clone(), Arc::downgrade(&record));
                record
            }
        };
        // Forget records whose last accessor is gone.
        slots.retain(|_, slot| slot.strong_count() > 0);
        drop(slots);

        let holder = Uuid::new_v4();
        trace!(path = %canonical.display(), %holder, "acquired file access");
        Ok(FileAccess {
            path: canonical,
            holder,
            record: Some(record),
        })
    }

    /// Number of canonical paths with at least one live accessor.
    pub fn open_files(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }

    /// Number of live accessors for `path`, or 0 if it is not open.
    pub fn holder_count(&self, path: impl AsRef<Path>) -> usize {
        let Ok(canonical) = path.as_ref().canonicalize() else {
            return 0;
        };
        self.slots()
            .get(&canonical)
            .map_or(0, |slot| slot.strong_count())
    }
}

/// Creates the file and its parents if needed, then resolves the path.
fn canonicalize_creating(path: &Path) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    path.canonicalize()
}

/// One consumer's view of a shared file.
///
/// Each accessor has its own holder identity: its locks are reentrant for
/// itself and exclusive against other accessors, including other accessors
/// of the same registry in the same thread. Dropping the accessor releases
/// every hold it still has.
#[derive(Debug)]
pub struct FileAccess {
    path: PathBuf,
    holder: Uuid,
    record: Option<Arc<FileHandleRecord>>,
}

impl FileAccess {
    /// The canonical path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// This accessor's holder identity.
    pub fn holder(&self) -> Uuid {
        self.holder
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.record.is_none()
    }

    fn record(&self) -> Result<&Arc<FileHandleRecord>> {
        self.record.as_ref().ok_or_else(|| {
            LockError::Closed {
                path: self.path.clone(),
            }
            .into()
        })
    }

    /// Returns true if both accessors refer to the identical shared record.
    pub fn shares_handle_with(&self, other: &FileAccess) -> bool {
        match (&self.record, &other.record) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The read side of this file's lock pair.
    pub fn read_lock(&self) -> FileLock<'_> {
        FileLock {
            access: self,
            kind: LockKind::Read,
        }
    }

    /// The write side of this file's lock pair.
    pub fn write_lock(&self) -> FileLock<'_> {
        FileLock {
            access: self,
            kind: LockKind::Write,
        }
    }

    /// Takes a read lock for the guard's lifetime, failing at once if a
    /// different accessor is writing.
    pub fn try_read(&self) -> Result<LockGuard<'_>> {
        self.scoped(LockKind::Read)
    }

    /// Takes a write lock for the guard's lifetime, failing at once if a
    /// different accessor holds either lock.
    pub fn try_write(&self) -> Result<LockGuard<'_>> {
        self.scoped(LockKind::Write)
    }

    fn scoped(&self, kind: LockKind) -> Result<LockGuard<'_>> {
        let lock = FileLock { access: self, kind };
        if lock.try_lock()? {
            Ok(LockGuard { lock })
        } else {
            Err(LockError::Contended {
                path: self.path.clone(),
                kind,
            }
            .into())
        }
    }

    /// Releases every read and write hold of this accessor.
    pub fn unlock_all(&self) {
        if let Some(record) = &self.record {
            record.state().release_all(self.holder);
            trace!(path = %self.path.display(), holder = %self.holder, "released all locks");
        }
    }

    /// Releases all holds and drops this accessor's reference to the shared
    /// record. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.unlock_all();
        if self.record.take().is_some() {
            trace!(path = %self.path.display(), holder = %self.holder, "closed file access");
        }
    }

    /// Reads the whole file through the shared handle.
    ///
    /// This does not lock; callers take [`try_read`](Self::try_read) first.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        Ok(self.record()?.read_all()?)
    }

    /// Truncates the file and writes `bytes` through the shared handle.
    ///
    /// This does not lock; callers take [`try_write`](Self::try_write) first.
    pub fn replace_all(&self, bytes: &[u8]) -> Result<()> {
        Ok(self.record()?.replace_all(bytes)?)
    }

    /// Current length of the file in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.record()?.len()?)
    }

    /// Returns true if the file has no content.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Last modification time as reported by the filesystem.
    pub fn modified(&self) -> Result<SystemTime> {
        Ok(std::fs::metadata(&self.path)?.modified()?)
    }
}

impl Drop for FileAccess {
    fn drop(&mut self) {
        self.close();
    }
}

/// One side of a file's lock pair, as seen by one accessor.
#[derive(Debug, Clone, Copy)]
pub struct FileLock<'a> {
    access: &'a FileAccess,
    kind: LockKind,
}

impl FileLock<'_> {
    pub fn kind(&self) -> LockKind {
        self.kind
    }

    /// Attempts to take one more hold without waiting.
    ///
    /// Write succeeds when no other accessor holds either side; read succeeds
    /// when no other accessor holds the write side.
    pub fn try_lock(&self) -> Result<bool> {
        let record = self.access.record()?;
        let holder = self.access.holder;
        let mut state = record.state();
        let acquired = match self.kind {
            LockKind::Read => state.try_read(holder),
            LockKind::Write => state.try_write(holder),
        };
        trace!(
            path = %self.access.path.display(),
            %holder,
            kind = %self.kind,
            acquired,
            "try_lock"
        );
        Ok(acquired)
    }

    /// Gives back one hold.
    pub fn unlock(&self) -> Result<()> {
        let record = self.access.record()?;
        let holder = self.access.holder;
        let released = match self.kind {
            LockKind::Read => record.state().release_read(holder),
            LockKind::Write => record.state().release_write(holder),
        };
        if !released {
            return Err(LockError::NotHeld {
                path: self.access.path.clone(),
                kind: self.kind,
            }
            .into());
        }
        trace!(path = %self.access.path.display(), %holder, kind = %self.kind, "unlock");
        Ok(())
    }

    /// Number of holds this accessor has on this side.
    pub fn hold_count(&self) -> usize {
        let Some(record) = &self.access.record else {
            return 0;
        };
        let state = record.state();
        match self.kind {
            LockKind::Read => state.read_count(self.access.holder),
            LockKind::Write => state.write_count(self.access.holder),
        }
    }

    /// Returns true if this accessor has at least one hold on this side.
    pub fn is_held(&self) -> bool {
        self.hold_count() > 0
    }
}

/// A lock hold released when dropped.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: FileLock<'a>,
}

impl LockGuard<'_> {
    pub fn kind(&self) -> LockKind {
        self.lock.kind
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // The hold can only be missing if unlock_all ran inside the scope.
        let _ = self.lock.unlock();
    }
}
