//! AppendLog Module
//!
//! The logical-offset facade over a [`Store`] and an [`Index`].
//!
//! ## Responsibilities
//! - Assign dense offsets `0, 1, 2, ...` in append order
//! - Serialize appends so no two writers interleave
//! - Validate caller-supplied offsets and payloads
//! - Detect store/index divergence on open
//! - Refuse further appends once an append failed after touching the store

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{LogError, Result};
use crate::storage::{open_file, Backing, Index, MemoryBacking, Store};

/// An append-only log of opaque records addressed by logical offset
///
/// ## Concurrency Model
///
/// - **Appends**: serialized by `write_lock`, held across the store write
///   and the index update, so offsets are handed out strictly in order
/// - **Reads**: take no log-level lock. The store and index each guard
///   their own state, and an offset only becomes readable once its index
///   entry is published, which happens after the frame is fully written
///
/// If an append fails after the store was written to, the store may hold
/// bytes the index does not cover. The log then refuses every later append;
/// reopening reports the divergence.
pub struct AppendLog<B: Backing = File> {
    /// Framed record bytes
    store: Store<B>,

    /// Offset → store position
    index: Index<B>,

    /// Largest accepted record
    max_record_size: usize,

    /// Serializes appends; `true` once an append failed midway
    write_lock: Mutex<bool>,
}

impl AppendLog<File> {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const STORE_FILENAME: &'static str = "store.log";
    const INDEX_FILENAME: &'static str = "index.log";

    /// Open or create a file-backed log with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open the store, resuming at its current size
    /// 3. Rehydrate the index
    /// 4. Verify the two agree
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let store_file = open_file(&config.data_dir.join(Self::STORE_FILENAME))?;
        let index_file = open_file(&config.data_dir.join(Self::INDEX_FILENAME))?;

        let store = Store::open(store_file)?;
        let index = Index::open(index_file)?;

        let log = Self::from_parts(store, index, config.max_record_size)?;
        tracing::info!(
            records = log.len(),
            dir = %config.data_dir.display(),
            "log opened"
        );
        Ok(log)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(&config)
    }
}

impl AppendLog<MemoryBacking> {
    /// Create an empty log that lives entirely in memory
    pub fn in_memory() -> Result<Self> {
        Self::from_parts(
            Store::open(MemoryBacking::new())?,
            Index::open(MemoryBacking::new())?,
            Config::default().max_record_size,
        )
    }
}

impl<B: Backing> AppendLog<B> {
    /// Assemble a log from an already opened store and index
    ///
    /// Fails with `LogCorruption` unless the indexed frames tile the store
    /// exactly: the first starts at 0, each starts where the previous one
    /// ends, and the last ends at the store size.
    pub fn from_parts(store: Store<B>, index: Index<B>, max_record_size: usize) -> Result<Self> {
        Self::verify_consistency(&store, &index)?;

        Ok(Self {
            store,
            index,
            max_record_size,
            write_lock: Mutex::new(false),
        })
    }

    /// Append the full contents of `reader` as one record
    ///
    /// Returns the record's offset.
    pub fn append<R: Read>(&self, reader: R) -> Result<u64> {
        let mut data = Vec::new();
        reader
            .take(self.max_record_size as u64 + 1)
            .read_to_end(&mut data)
            .map_err(|e| LogError::validation(format!("error reading record: {}", e)))?;

        if data.is_empty() {
            return Err(LogError::validation("empty record provided"));
        }
        if data.len() > self.max_record_size {
            return Err(LogError::validation(format!(
                "record exceeds the {} byte limit",
                self.max_record_size
            )));
        }

        let mut failed = self.write_lock.lock();
        if *failed {
            return Err(LogError::Failed(
                "an earlier append left the store and index out of step; reopen the log"
                    .to_string(),
            ));
        }

        let offset = self.index.len() as u64;
        let written = self
            .store
            .write(&data)
            .and_then(|position| self.index.store(position).map(|()| position));

        let position = match written {
            Ok(position) => position,
            Err(e) => {
                tracing::warn!(offset, "append failed, refusing further appends: {}", e);
                *failed = true;
                return Err(e);
            }
        };

        tracing::trace!(offset, position, len = data.len(), "record appended");
        Ok(offset)
    }

    /// Read the record named by an external offset token such as `"42"`
    pub fn read(&self, token: &str) -> Result<Vec<u8>> {
        let offset: i64 = token
            .parse()
            .map_err(|e| LogError::validation(format!("can't parse offset {:?}: {}", token, e)))?;

        let offset = u64::try_from(offset)
            .map_err(|_| LogError::validation(format!("negative offset: {}", offset)))?;

        self.read_offset(offset)
    }

    /// Read the record at `offset`
    pub fn read_offset(&self, offset: u64) -> Result<Vec<u8>> {
        let count = self.len() as u64;
        if offset >= count {
            return Err(LogError::validation(format!(
                "can't find offset: {} (log holds {} records)",
                offset, count
            )));
        }

        let offset = i64::try_from(offset)
            .map_err(|_| LogError::validation(format!("offset {} out of range", offset)))?;
        let position = self.index.read_position(offset)?;
        self.store.read(position)
    }

    /// Number of records appended so far
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the store and the index
    ///
    /// Both are always closed; the first failure is reported.
    pub fn close(self) -> Result<()> {
        let store_result = self.store.close();
        let index_result = self.index.close();
        store_result.and(index_result)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Walk the indexed frames and check they cover the store with no gaps
    fn verify_consistency(store: &Store<B>, index: &Index<B>) -> Result<()> {
        let store_size = store.size();
        let mut expected = 0u64;

        for (offset, position) in index.positions().into_iter().enumerate() {
            if position != expected {
                tracing::warn!(offset, position, expected, "index does not follow the frame chain");
                return Err(LogError::LogCorruption(format!(
                    "offset {} is indexed at position {} but the previous frame ends at {}",
                    offset, position, expected
                )));
            }
            if position >= store_size {
                return Err(LogError::LogCorruption(format!(
                    "index points at position {} beyond store size {}",
                    position, store_size
                )));
            }
            expected = store.frame_end(position)?;
        }

        if expected != store_size {
            tracing::warn!(expected, store_size, "store holds bytes the index does not cover");
            return Err(LogError::LogCorruption(format!(
                "indexed frames end at {} but store size is {}",
                expected, store_size
            )));
        }

        Ok(())
    }
}
