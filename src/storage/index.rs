//! Index
//!
//! Maps logical offsets to store positions. Persisted as a flat run of
//! little-endian `u64` positions, entry `i` belonging to offset `i`.

use std::fs::File;

use parking_lot::Mutex;

use crate::error::{LogError, Result};

use super::Backing;

/// Width of one persisted index entry
pub const ENTRY_WIDTH: u64 = 8;

/// Offset → position lookup table
pub struct Index<B: Backing = File> {
    inner: Mutex<IndexInner<B>>,
}

struct IndexInner<B> {
    backing: B,
    /// positions[offset] = byte position of that record's frame
    positions: Vec<u64>,
}

impl<B: Backing> Index<B> {
    /// Open an index over `backing`, rebuilding entries from its bytes
    ///
    /// Fails with `IndexCorruption` if the backing length is not a whole
    /// number of entries or the positions are not strictly increasing.
    pub fn open(mut backing: B) -> Result<Self> {
        let size = backing.size()?;

        if size % ENTRY_WIDTH != 0 {
            tracing::warn!(size, "index length is not a multiple of the entry width");
            return Err(LogError::IndexCorruption(format!(
                "index holds {} bytes, not a multiple of {}",
                size, ENTRY_WIDTH
            )));
        }

        let len = usize::try_from(size).map_err(|_| {
            LogError::IndexCorruption(format!("index of {} bytes does not fit in memory", size))
        })?;

        let mut raw = vec![0u8; len];
        if !raw.is_empty() {
            backing
                .read_at(&mut raw, 0)
                .map_err(|source| LogError::IoAt {
                    operation: "rehydrate index",
                    position: 0,
                    source,
                })?;
        }

        let positions: Vec<u64> = raw
            .chunks_exact(ENTRY_WIDTH as usize)
            .map(|chunk| {
                let mut entry = [0u8; ENTRY_WIDTH as usize];
                entry.copy_from_slice(chunk);
                u64::from_le_bytes(entry)
            })
            .collect();

        if let Some(offset) = positions.windows(2).position(|w| w[1] <= w[0]) {
            return Err(LogError::IndexCorruption(format!(
                "position {} for offset {} does not follow {}",
                positions[offset + 1],
                offset + 1,
                positions[offset]
            )));
        }

        tracing::debug!(entries = positions.len(), "index rehydrated");

        Ok(Self {
            inner: Mutex::new(IndexInner { backing, positions }),
        })
    }

    /// Record `position` as the next offset's entry
    ///
    /// The entry is persisted first and only then made visible, so a failed
    /// write leaves the in-memory table untouched.
    pub fn store(&self, position: u64) -> Result<()> {
        let mut inner = self.inner.lock();

        if let Some(&last) = inner.positions.last() {
            if position <= last {
                return Err(LogError::IndexCorruption(format!(
                    "position {} does not follow last position {}",
                    position, last
                )));
            }
        }

        let entry_at = inner.positions.len() as u64 * ENTRY_WIDTH;
        inner
            .backing
            .append(&position.to_le_bytes())
            .map_err(|source| LogError::IoAt {
                operation: "persist index entry",
                position: entry_at,
                source,
            })?;
        inner.positions.push(position);

        Ok(())
    }

    /// Look up the position stored for `offset`
    pub fn read_position(&self, offset: i64) -> Result<u64> {
        let inner = self.inner.lock();

        usize::try_from(offset)
            .ok()
            .and_then(|i| inner.positions.get(i).copied())
            .ok_or_else(|| {
                LogError::validation(format!(
                    "invalid offset {} (index holds {} entries)",
                    offset,
                    inner.positions.len()
                ))
            })
    }

    /// Snapshot of every stored position, in offset order
    pub fn positions(&self) -> Vec<u64> {
        self.inner.lock().positions.clone()
    }

    /// Position of the most recent entry
    pub fn last_position(&self) -> Option<u64> {
        self.inner.lock().positions.last().copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release the backing resource
    pub fn close(self) -> Result<()> {
        self.inner.into_inner().backing.close()?;
        Ok(())
    }
}
