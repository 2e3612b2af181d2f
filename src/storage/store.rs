//! Store
//!
//! Append-only arena of length-prefixed frames.

use std::fs::File;

use parking_lot::Mutex;

use crate::error::{LogError, Result};

use super::Backing;

/// Width of the little-endian length prefix in front of every payload
pub const LEN_WIDTH: u64 = 8;

/// Framed, append-only byte arena
///
/// ## Concurrency:
/// - `inner`: one exclusive lock guards both the backing and the tracked
///   size; reads take it too, since positional reads move the file cursor
pub struct Store<B: Backing = File> {
    inner: Mutex<StoreInner<B>>,
}

struct StoreInner<B> {
    backing: B,
    /// Bytes written so far (next frame starts here)
    size: u64,
    /// Set when the real end of the backing could not be recovered
    failed: bool,
}

impl<B: Backing> Store<B> {
    /// Open a store over `backing`, resuming after any existing bytes
    pub fn open(mut backing: B) -> Result<Self> {
        let size = backing.size()?;
        tracing::debug!(size, "store opened");

        Ok(Self {
            inner: Mutex::new(StoreInner {
                backing,
                size,
                failed: false,
            }),
        })
    }

    /// Append a frame holding `data`
    ///
    /// Returns the byte position where the frame begins. A failed append may
    /// still have written part of the frame, so the tracked size is re-read
    /// from the backing; if even that fails, every later write is refused.
    pub fn write(&self, data: &[u8]) -> Result<u64> {
        if data.is_empty() {
            return Err(LogError::validation("cannot store an empty record"));
        }

        let mut frame = Vec::with_capacity(LEN_WIDTH as usize + data.len());
        frame.extend_from_slice(&(data.len() as u64).to_le_bytes());
        frame.extend_from_slice(data);

        let mut inner = self.inner.lock();
        if inner.failed {
            return Err(LogError::Failed(
                "store size unknown after a failed write".to_string(),
            ));
        }
        let position = inner.size;

        if let Err(e) = inner.backing.append(&frame) {
            match inner.backing.size() {
                Ok(size) => {
                    tracing::warn!(position, size, "append failed, store size resynced");
                    inner.size = size;
                }
                Err(size_err) => {
                    tracing::warn!("append failed and store size is unknown: {}", size_err);
                    inner.failed = true;
                }
            }
            return Err(e.into());
        }
        inner.size += frame.len() as u64;

        tracing::trace!(position, len = data.len(), "frame written");
        Ok(position)
    }

    /// Read the payload of the frame starting at `position`
    pub fn read(&self, position: u64) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();

        if position >= inner.size {
            return Err(LogError::validation(format!(
                "position {} out of range (store size {})",
                position, inner.size
            )));
        }

        let len = Self::read_len(&mut inner, position)?;
        let start = position + LEN_WIDTH;

        // Never trust a header that points past what exists
        let fits = start.checked_add(len).is_some_and(|end| end <= inner.size);
        let len = match usize::try_from(len) {
            Ok(len) if fits => len,
            _ => {
                return Err(LogError::StoreCorruption(format!(
                    "frame at {} declares {} bytes but store holds {}",
                    position, len, inner.size
                )))
            }
        };

        let mut data = vec![0u8; len];
        inner
            .backing
            .read_at(&mut data, start)
            .map_err(|source| LogError::IoAt {
                operation: "read payload",
                position,
                source,
            })?;

        Ok(data)
    }

    /// Position just past the frame starting at `position`
    pub fn frame_end(&self, position: u64) -> Result<u64> {
        let mut inner = self.inner.lock();

        if position >= inner.size {
            return Err(LogError::validation(format!(
                "position {} out of range (store size {})",
                position, inner.size
            )));
        }

        let len = Self::read_len(&mut inner, position)?;
        position
            .checked_add(LEN_WIDTH)
            .and_then(|p| p.checked_add(len))
            .ok_or_else(|| {
                LogError::StoreCorruption(format!(
                    "frame at {} declares impossible length {}",
                    position, len
                ))
            })
    }

    /// Total bytes in the store
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Release the backing resource
    pub fn close(self) -> Result<()> {
        self.inner.into_inner().backing.close()?;
        Ok(())
    }

    fn read_len(inner: &mut StoreInner<B>, position: u64) -> Result<u64> {
        let mut header = [0u8; LEN_WIDTH as usize];
        inner
            .backing
            .read_at(&mut header, position)
            .map_err(|source| LogError::IoAt {
                operation: "read frame header",
                position,
                source,
            })?;
        Ok(u64::from_le_bytes(header))
    }
}
