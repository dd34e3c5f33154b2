//! Initial content for documents whose file is missing or empty.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;

/// A one-shot source of seed bytes.
///
/// Embedded resources are plain bytes:
///
/// ```
/// use thunderfile::document::Seed;
///
/// let seed = Seed::bytes(&b"name: \"default\"\n"[..]);
/// # let _ = seed;
/// ```
pub enum Seed {
    /// In-memory content, for example from `include_bytes!`.
    Bytes(Cow<'static, [u8]>),
    /// The content of another file.
    File(PathBuf),
    /// Any reader; read to the end once.
    Reader(Box<dyn Read + Send>),
}

impl Seed {
    pub fn bytes(bytes: impl Into<Cow<'static, [u8]>>) -> Self {
        Seed::Bytes(bytes.into())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Seed::File(path.into())
    }

    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Seed::Reader(Box::new(reader))
    }

    /// Consumes the seed and returns its content.
    pub(crate) fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            Seed::Bytes(bytes) => Ok(bytes.into_owned()),
            Seed::File(path) => std::fs::read(path),
            Seed::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Seed::File(path) => f.debug_tuple("File").field(path).finish(),
            Seed::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<&'static str> for Seed {
    fn from(text: &'static str) -> Self {
        Seed::Bytes(Cow::Borrowed(text.as_bytes()))
    }
}

impl From<String> for Seed {
    fn from(text: String) -> Self {
        Seed::Bytes(Cow::Owned(text.into_bytes()))
    }
}

impl From<&'static [u8]> for Seed {
    fn from(bytes: &'static [u8]) -> Self {
        Seed::Bytes(Cow::Borrowed(bytes))
    }
}

impl From<Vec<u8>> for Seed {
    fn from(bytes: Vec<u8>) -> Self {
        Seed::Bytes(Cow::Owned(bytes))
    }
}
