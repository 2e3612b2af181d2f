//! Error types for AtlasLog
//!
//! Provides a unified error type for all operations, plus the closed
//! [`ErrorKind`] classification the network layer maps to response codes.

use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Unified error type for AtlasLog operations
#[derive(Debug, Error)]
pub enum LogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error during {operation} at position {position}: {source}")]
    IoAt {
        operation: &'static str,
        position: u64,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Corruption Errors
    // -------------------------------------------------------------------------
    #[error("Index corruption detected: {0}")]
    IndexCorruption(String),

    #[error("Store corruption detected: {0}")]
    StoreCorruption(String),

    #[error("Store and index diverged: {0}")]
    LogCorruption(String),

    #[error("Writes disabled after an earlier failure: {0}")]
    Failed(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`LogError`]
///
/// Validation failures are pure functions of the caller's input and recur
/// identically on retry. A malformed request frame counts as one. Everything
/// else is an infrastructure fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Internal,
}

impl LogError {
    /// Shorthand for building a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LogError::Validation(message.into())
    }

    /// Classify this error for response mapping
    pub fn kind(&self) -> ErrorKind {
        match self {
            LogError::Validation(_) | LogError::Protocol(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    /// Whether this error was caused by caller input
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
