//! Error types for document operations.

use thiserror::Error;

/// Structured error types for [`ConfigDocument`](super::ConfigDocument) and
/// [`Section`](super::Section) operations.
///
/// These are precondition failures, reported before anything is changed.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// No entry exists at the given path.
    #[error("No entry at '{path}'")]
    MissingKey { path: String },

    /// The path exists but does not hold a nested block.
    #[error("'{path}' is a {found}, not a block")]
    NotABlock { path: String, found: &'static str },
}

impl DocumentError {
    /// Check if this error is about a missing entry.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, DocumentError::MissingKey { .. })
    }

    /// Get the path this error refers to.
    pub fn path(&self) -> &str {
        match self {
            DocumentError::MissingKey { path } | DocumentError::NotABlock { path, .. } => path,
        }
    }
}

impl From<DocumentError> for crate::Error {
    fn from(err: DocumentError) -> Self {
        crate::Error::Document(err)
    }
}
