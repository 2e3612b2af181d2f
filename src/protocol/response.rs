//! Response definitions
//!
//! Represents responses to clients.

use crate::error::{ErrorKind, LogError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Invalid = 0x01,
    Error = 0x02,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (offset, record, or error message)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an OK response carrying an assigned offset
    pub fn offset(offset: u64) -> Self {
        Self::ok(Some(offset.to_be_bytes().to_vec()))
    }

    /// Create an INVALID response
    pub fn invalid(message: &str) -> Self {
        Self {
            status: Status::Invalid,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Map a log error onto INVALID or ERROR by its kind
    pub fn from_error(error: &LogError) -> Self {
        match error.kind() {
            ErrorKind::Validation => Self::invalid(&error.to_string()),
            ErrorKind::Internal => Self::error(&error.to_string()),
        }
    }

    /// Payload interpreted as a UTF-8 message (lossy)
    pub fn message(&self) -> String {
        self.payload
            .as_deref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }

    /// Convert back into a result on the client side
    pub fn into_result(self) -> Result<Option<Vec<u8>>> {
        match self.status {
            Status::Ok => Ok(self.payload),
            Status::Invalid => Err(LogError::Validation(self.message())),
            Status::Error => Err(LogError::Network(format!("server error: {}", self.message()))),
        }
    }
}
