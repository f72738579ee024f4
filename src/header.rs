//! The fixed SMB2 header fields the engine interprets.
//!
//! Encoding and decoding of full messages belongs to the request builders and
//! the transport; the engine only needs the command and status of each
//! response, plus the location of the command body.

use std::fmt;

use crate::{
    byte_order::{read_le_u16, read_le_u32},
    error::DecodeError,
    status::NtStatus,
};

/// Size of the fixed SMB2 header preceding every command body.
pub const SMB2_HEADER_SIZE: usize = 64;

const STATUS_OFFSET: usize = 8;
const COMMAND_OFFSET: usize = 12;

/// SMB2 commands issued by compound operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// `SMB2 CREATE` (0x0005).
    Create,
    /// `SMB2 CLOSE` (0x0006).
    Close,
    /// `SMB2 QUERY_INFO` (0x0010).
    QueryInfo,
    /// `SMB2 SET_INFO` (0x0011).
    SetInfo,
    /// Any other command code.
    Other(u16),
}

impl Command {
    /// Wire value of the command.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::Create => 0x0005,
            Self::Close => 0x0006,
            Self::QueryInfo => 0x0010,
            Self::SetInfo => 0x0011,
            Self::Other(code) => code,
        }
    }
}

impl From<u16> for Command {
    fn from(code: u16) -> Self {
        match code {
            0x0005 => Self::Create,
            0x0006 => Self::Close,
            0x0010 => Self::QueryInfo,
            0x0011 => Self::SetInfo,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("CREATE"),
            Self::Close => f.write_str("CLOSE"),
            Self::QueryInfo => f.write_str("QUERY_INFO"),
            Self::SetInfo => f.write_str("SET_INFO"),
            Self::Other(code) => write!(f, "command {code:#06x}"),
        }
    }
}

/// Command and status read from a response header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Command the response answers.
    pub command: Command,
    /// Status of the response.
    pub status: NtStatus,
}

impl ResponseHeader {
    /// Read the command and status from the start of `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if `frame` is shorter than a full
    /// SMB2 header.
    pub fn parse(frame: &[u8]) -> Result<Self, DecodeError> {
        let truncated = || DecodeError::Truncated {
            what: "SMB2 header",
            have: frame.len(),
            need: SMB2_HEADER_SIZE,
        };
        if frame.len() < SMB2_HEADER_SIZE {
            return Err(truncated());
        }
        let status = read_le_u32(frame, STATUS_OFFSET).ok_or_else(truncated)?;
        let command = read_le_u16(frame, COMMAND_OFFSET).ok_or_else(truncated)?;
        Ok(Self {
            command: Command::from(command),
            status: NtStatus(status),
        })
    }
}
