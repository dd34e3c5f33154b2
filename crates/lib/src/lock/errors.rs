//! Error types for file access coordination.

use std::path::PathBuf;

use thiserror::Error;

use super::LockKind;

/// Structured error types for [`FileAccess`](super::FileAccess) operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder has a conflicting lock.
    #[error("{kind} lock on '{}' is held by another accessor", path.display())]
    Contended { path: PathBuf, kind: LockKind },

    /// `unlock` was called without a matching hold.
    #[error("{kind} lock on '{}' is not held by this accessor", path.display())]
    NotHeld { path: PathBuf, kind: LockKind },

    /// The accessor was closed and no longer refers to a file.
    #[error("File access for '{}' is closed", path.display())]
    Closed { path: PathBuf },

    /// The file could not be created, resolved or opened.
    #[error("Cannot open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    /// Check if this error is a non-blocking acquisition that lost.
    pub fn is_contended(&self) -> bool {
        matches!(self, LockError::Contended { .. })
    }

    /// Check if this error is an unlock without a hold.
    pub fn is_not_held(&self) -> bool {
        matches!(self, LockError::NotHeld { .. })
    }

    /// Check if this error came from the filesystem.
    pub fn is_io_error(&self) -> bool {
        matches!(self, LockError::Open { .. })
    }

    /// Get the path this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            LockError::Contended { path, .. }
            | LockError::NotHeld { path, .. }
            | LockError::Closed { path }
            | LockError::Open { path, .. } => path,
        }
    }
}

impl From<LockError> for crate::Error {
    fn from(err: LockError) -> Self {
        crate::Error::Lock(err)
    }
}
