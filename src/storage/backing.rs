//! Backing resources
//!
//! The byte resource underneath a [`Store`](super::Store) or an
//! [`Index`](super::Index). Only three capabilities are required:
//! appending at the end, reading at a position, and reporting the size.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// An append-only byte resource with positional reads
pub trait Backing: Send {
    /// Append `buf` to the end of the resource
    fn append(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Fill `buf` with the bytes starting at `position`
    ///
    /// A short read is reported as `UnexpectedEof`.
    fn read_at(&mut self, buf: &mut [u8], position: u64) -> io::Result<()>;

    /// Current total size in bytes
    fn size(&mut self) -> io::Result<u64>;

    /// Release the resource
    fn close(self) -> io::Result<()>
    where
        Self: Sized;
}

/// Open (or create) a file suitable for use as a [`Backing`]
///
/// The file is opened in append mode, so writes always land at the end
/// regardless of where the last read left the cursor.
pub fn open_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
}

impl Backing for File {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }

    fn read_at(&mut self, buf: &mut [u8], position: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(position))?;
        self.read_exact(buf)
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn close(self) -> io::Result<()> {
        self.sync_all()
    }
}

/// In-memory backing, used for tests and for logs that need no durability
#[derive(Debug, Default, Clone)]
pub struct MemoryBacking {
    data: Vec<u8>,
}

impl MemoryBacking {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer pre-populated with existing bytes
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Everything appended so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Backing for MemoryBacking {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn read_at(&mut self, buf: &mut [u8], position: u64) -> io::Result<()> {
        let start = usize::try_from(position).ok();
        let range = start.and_then(|s| s.checked_add(buf.len()).map(|e| s..e));

        match range {
            Some(range) if range.end <= self.data.len() => {
                buf.copy_from_slice(&self.data[range]);
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at {} past end of {} byte buffer",
                    buf.len(),
                    position,
                    self.data.len()
                ),
            )),
        }
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn close(self) -> io::Result<()> {
        Ok(())
    }
}
