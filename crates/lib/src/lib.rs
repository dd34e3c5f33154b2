//!
//! Thunderfile: configuration files that survive a round trip.
//! This library reads, caches and rewrites hierarchical configuration files
//! while keeping their comments, nesting and ordering intact.
//!
//! ## Core Concepts
//!
//! * **Attribute maps (`map::AttributeMap`)**: Ordered, nestable key/value stores that carry the comment lines of the file they came from.
//! * **Codecs (`codec::Codec`)**: Text transforms between files and attribute maps. The native Thunder format keeps comments; JSON is available for interchange.
//! * **Lock registry (`lock::LockRegistry`)**: Gives every in-process consumer of one file the same handle and the same reentrant read/write lock pair.
//! * **Documents (`document::ConfigDocument`)**: A cached map bound to a file, with a reload policy deciding when the cache is stale and autosave writing changes back.
//! * **Sections (`document::Section`)**: Key-prefixed views into a document's nested blocks.
//!
//! Library code logs through `tracing` and never installs a subscriber.

pub mod clock;
pub mod codec;
pub mod document;
pub mod lock;
pub mod map;
pub mod provider;

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};
pub use codec::{Codec, CommentMode, Format};
pub use document::{
    CommentAware, ConfigDocument, DocumentBuilder, Gettable, ReloadPolicy, Section,
    SectionNavigable, Seed, Settable,
};
pub use lock::{FileAccess, LockRegistry};
pub use map::{AttributeMap, KeyPath, Value};

/// Result type used throughout the Thunderfile library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Thunderfile library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Text that could not be decoded
    #[error(transparent)]
    Parse(codec::ParseError),

    /// Structured lock and file access errors from the lock module
    #[error(transparent)]
    Lock(lock::LockError),

    /// Container factory failures from the provider module
    #[error(transparent)]
    Provider(provider::ProviderError),

    /// Invalid keys, paths and type mismatches from the map module
    #[error(transparent)]
    Map(map::MapError),

    /// Invalid document arguments from the document module
    #[error(transparent)]
    Document(document::DocumentError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Parse(_) => "codec",
            Error::Lock(_) => "lock",
            Error::Provider(_) => "provider",
            Error::Map(_) => "map",
            Error::Document(_) => "document",
        }
    }

    /// Check if this error came from decoding text.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Parse(_))
    }

    /// Check if this error is I/O related, lock contention included.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Lock(_))
    }

    /// Check if this error came from a container provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Error::Provider(_))
    }

    /// Check if this error was raised before anything was changed because an
    /// argument was invalid.
    pub fn is_precondition_error(&self) -> bool {
        matches!(self, Error::Map(_) | Error::Document(_))
    }

    /// Check if this error indicates a missing entry.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Document(document_err) => document_err.is_missing_key(),
            Error::Io(io_err) => io_err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Check if this error is a type mismatch.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Map(map_err) => map_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error is a non-blocking lock attempt that lost.
    pub fn is_contended(&self) -> bool {
        match self {
            Error::Lock(lock_err) => lock_err.is_contended(),
            _ => false,
        }
    }
}
