//! Blocking TCP client

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{LogError, Result};
use crate::protocol::{read_response, write_command, Command, Response};

/// A connection to an AtlasLog server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| LogError::Network(format!("failed to connect: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Append a record, returning its offset
    pub fn append(&mut self, data: &[u8]) -> Result<u64> {
        let payload = self
            .call(&Command::Append {
                payload: data.to_vec(),
            })?
            .into_result()?
            .unwrap_or_default();

        let bytes: [u8; 8] = payload.as_slice().try_into().map_err(|_| {
            LogError::Protocol(format!("expected 8-byte offset, got {} bytes", payload.len()))
        })?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Read the record at an offset token
    pub fn read(&mut self, offset: &str) -> Result<Vec<u8>> {
        let payload = self
            .call(&Command::Read {
                offset: offset.to_string(),
            })?
            .into_result()?;
        Ok(payload.unwrap_or_default())
    }

    /// Health check
    pub fn ping(&mut self) -> Result<()> {
        let payload = self.call(&Command::Ping)?.into_result()?;
        match payload.as_deref() {
            Some(b"PONG") => Ok(()),
            other => Err(LogError::Protocol(format!(
                "unexpected ping reply: {:?}",
                other.map(String::from_utf8_lossy)
            ))),
        }
    }

    /// Send one command and wait for its response
    pub fn call(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }
}
