//! The shared per-path record behind every [`FileAccess`](super::FileAccess).

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

/// Who holds the read/write pair of one file, and how many times.
///
/// Counts make both sides reentrant. A holder may own both sides at once.
#[derive(Debug, Default)]
pub(crate) struct LockState {
    writer: Option<(Uuid, usize)>,
    readers: HashMap<Uuid, usize>,
}

impl LockState {
    /// Takes a read hold unless another holder is writing.
    pub(crate) fn try_read(&mut self, holder: Uuid) -> bool {
        if matches!(self.writer, Some((writer, _)) if writer != holder) {
            return false;
        }
        *self.readers.entry(holder).or_insert(0) += 1;
        true
    }

    /// Takes a write hold unless another holder is reading or writing.
    pub(crate) fn try_write(&mut self, holder: Uuid) -> bool {
        if self.readers.keys().any(|reader| *reader != holder) {
            return false;
        }
        match &mut self.writer {
            Some((writer, count)) if *writer == holder => {
                *count += 1;
                true
            }
            Some(_) => false,
            None => {
                self.writer = Some((holder, 1));
                true
            }
        }
    }

    /// Drops one read hold. Returns false if the holder had none.
    pub(crate) fn release_read(&mut self, holder: Uuid) -> bool {
        match self.readers.get_mut(&holder) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.readers.remove(&holder);
                true
            }
            None => false,
        }
    }

    /// Drops one write hold. Returns false if the holder had none.
    pub(crate) fn release_write(&mut self, holder: Uuid) -> bool {
        match &mut self.writer {
            Some((writer, count)) if *writer == holder => {
                if *count > 1 {
                    *count -= 1;
                } else {
                    self.writer = None;
                }
                true
            }
            _ => false,
        }
    }

    /// Drops every hold of `holder`.
    pub(crate) fn release_all(&mut self, holder: Uuid) {
        self.readers.remove(&holder);
        if matches!(self.writer, Some((writer, _)) if writer == holder) {
            self.writer = None;
        }
    }

    pub(crate) fn read_count(&self, holder: Uuid) -> usize {
        self.readers.get(&holder).copied().unwrap_or(0)
    }

    pub(crate) fn write_count(&self, holder: Uuid) -> usize {
        match self.writer {
            Some((writer, count)) if writer == holder => count,
            _ => 0,
        }
    }
}

/// One open file shared by every accessor of the same canonical path.
///
/// The file handle is closed when the last `Arc` to this record drops.
#[derive(Debug)]
pub struct FileHandleRecord {
    path: PathBuf,
    file: Mutex<File>,
    state: Mutex<LockState>,
}

impl FileHandleRecord {
    pub(crate) fn open(path: PathBuf) -> io::Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            state: Mutex::new(LockState::default()),
        })
    }

    /// The canonical path this record was opened for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn file(&self) -> MutexGuard<'_, File> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the whole file through the shared handle.
    pub(crate) fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut file = self.file();
        file.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Replaces the whole file content through the shared handle.
    pub(crate) fn replace_all(&self, bytes: &[u8]) -> io::Result<()> {
        let mut file = self.file();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(bytes)?;
        file.flush()
    }

    /// Current file length in bytes.
    pub(crate) fn len(&self) -> io::Result<u64> {
        Ok(self.file().metadata()?.len())
    }
}
