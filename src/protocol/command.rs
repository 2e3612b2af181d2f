//! Command definitions
//!
//! Represents commands from clients.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Append = 0x01,
    Read = 0x02,
    Ping = 0x03,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append a record
    Append { payload: Vec<u8> },

    /// Read the record at an offset token
    Read { offset: String },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Append { .. } => CommandType::Append,
            Command::Read { .. } => CommandType::Read,
            Command::Ping => CommandType::Ping,
        }
    }
}
