//! # AtlasLog
//!
//! A durable, append-only commit log with:
//! - Dense logical offsets assigned at write time
//! - Length-prefixed record frames that are never rewritten
//! - A fixed-width position index rehydrated on open
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  append(bytes) / read(offset)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     AppendLog                                │
//! │              (Serialized Appends)                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Store    │          │    Index    │
//!   │  (Frames)   │◄─────────│ (Positions) │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod append_log;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, LogError, Result};
pub use config::Config;
pub use append_log::AppendLog;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasLog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
