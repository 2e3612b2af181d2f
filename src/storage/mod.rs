//! Storage Module
//!
//! Persistent storage layer: a framed append-only record arena plus a
//! fixed-width position index.
//!
//! ## Responsibilities
//! - Append records to the end of the store and return their byte position
//! - Map logical offsets to byte positions in O(1)
//! - Rehydrate both from existing bytes on open
//! - Never rewrite bytes once they are written
//!
//! ## File Format
//! ```text
//! store.log                               index.log
//! ┌─────────────────────────────┐        ┌──────────────┐
//! │ Frame 0                     │◄───────│ Position (8) │ offset 0
//! │ ┌─────────┬───────────────┐ │        ├──────────────┤
//! │ │ Len (8) │ Payload       │ │   ┌────│ Position (8) │ offset 1
//! │ └─────────┴───────────────┘ │   │    ├──────────────┤
//! ├─────────────────────────────┤   │    │ ...          │
//! │ Frame 1                     │◄──┘    └──────────────┘
//! │ ┌─────────┬───────────────┐ │
//! │ │ Len (8) │ Payload       │ │
//! │ └─────────┴───────────────┘ │
//! └─────────────────────────────┘
//! ```
//! All integers are little-endian `u64`.

mod backing;
mod index;
mod store;

pub use backing::{open_file, Backing, MemoryBacking};
pub use index::{Index, ENTRY_WIDTH};
pub use store::{Store, LEN_WIDTH};
