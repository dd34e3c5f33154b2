//! Text codecs for attribute maps.
//!
//! A [`Codec`] turns text into an [`AttributeMap`] and back. Two are provided:
//!
//! - [`Thunder`](thunder::Thunder): the native, comment-preserving format
//! - [`Json`](json::Json): plain JSON, for interchange; comments are dropped
//!
//! Documents pick one through the [`Format`] tag.
//!
//! ```
//! use thunderfile::codec::{Codec, CommentMode, Format};
//!
//! let text = "# greeting\nname: \"alice\"\n";
//! let map = Format::Thunder.decode(text, CommentMode::Preserve).unwrap();
//! assert_eq!(map.get("name").unwrap(), &"alice");
//! assert_eq!(Format::Thunder.encode(&map).unwrap(), text);
//! ```

use std::path::Path;

use crate::Result;
use crate::map::path::validate_key;
use crate::map::{AttributeMap, MapError, Value};
use crate::provider::{ContainerProvider, DefaultProvider};

pub mod errors;
pub mod json;
pub mod literal;
pub mod thunder;

pub use errors::{ParseError, ParseErrorKind};

/// Whether comment and blank lines survive decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentMode {
    /// Attach comments to headers, entries and footers.
    #[default]
    Preserve,
    /// Discard comments while decoding.
    Skip,
}

/// Bidirectional transform between text and [`AttributeMap`].
pub trait Codec {
    /// Decodes `text`, obtaining every map and list from `provider`.
    ///
    /// On failure nothing is returned; callers keep whatever they had.
    fn decode_with<P>(&self, text: &str, mode: CommentMode, provider: &P) -> Result<AttributeMap>
    where
        P: ContainerProvider + ?Sized;

    /// Decodes `text` with plain containers.
    fn decode(&self, text: &str, mode: CommentMode) -> Result<AttributeMap> {
        self.decode_with(text, mode, &DefaultProvider)
    }

    /// Encodes `map`. Fails if a key could not be read back.
    fn encode(&self, map: &AttributeMap) -> Result<String>;
}

/// The on-disk format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Thunder,
    Json,
}

impl Format {
    /// Guesses the format from a file extension; anything but `.json` is
    /// Thunder.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Thunder,
        }
    }

    /// Returns true if the format can store comments.
    pub fn supports_comments(&self) -> bool {
        matches!(self, Format::Thunder)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Thunder => "thunder",
            Format::Json => "json",
        }
    }
}

impl Codec for Format {
    fn decode_with<P>(&self, text: &str, mode: CommentMode, provider: &P) -> Result<AttributeMap>
    where
        P: ContainerProvider + ?Sized,
    {
        match self {
            Format::Thunder => thunder::Thunder.decode_with(text, mode, provider),
            Format::Json => json::Json.decode_with(text, mode, provider),
        }
    }

    fn encode(&self, map: &AttributeMap) -> Result<String> {
        match self {
            Format::Thunder => thunder::Thunder.encode(map),
            Format::Json => json::Json.encode(map),
        }
    }
}

/// Checks every key in `map` and its nested maps with
/// [`validate_key`].
pub(crate) fn check_keys(map: &AttributeMap) -> std::result::Result<(), MapError> {
    for (key, value) in map.iter() {
        validate_key(key)?;
        if let Value::Map(nested) = value {
            check_keys(nested)?;
        }
    }
    Ok(())
}
