//! Error taxonomy for compound operations.
//!
//! Failures fall into four families, each with its own type:
//!
//! - [`BuildError`]: a sub-request could not be assembled; nothing was sent.
//! - [`TransportError`]: the exchange itself failed.
//! - [`StatusError`]: a sub-response carried a non-success NT status.
//! - [`DecodeError`]: a response could not be trusted or parsed.
//!
//! [`CompoundError`] wraps them together with the outcomes the translation
//! policy produces (referral, not-supported, share changed). Every variant
//! reduces to a single [`ErrorCode`] through [`CompoundError::code`].

use thiserror::Error;

use crate::{
    compound::Phase,
    header::Command,
    status::{NtStatus, StatusClass},
};

/// A sub-request builder rejected its parameters.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// A path or target name exceeds the protocol maximum.
    #[error("name of {units} UTF-16 units exceeds maximum of {max}")]
    NameTooLong {
        /// Length of the converted name.
        units: usize,
        /// Maximum number of units accepted.
        max: usize,
    },
    /// A rename or link target was empty.
    #[error("target name is empty")]
    EmptyTarget,
    /// The external builder refused the request.
    #[error("{command} request rejected: {reason}")]
    Rejected {
        /// Command whose builder failed.
        command: Command,
        /// Builder-supplied reason.
        reason: String,
    },
}

/// The dispatcher failed to complete the exchange.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("transport failure: {message}")]
pub struct TransportError {
    /// Human-readable description from the transport.
    pub message: String,
    /// The session must be re-established before further use.
    pub reconnect_required: bool,
}

impl TransportError {
    /// Construct a transport error that does not require reconnecting.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reconnect_required: false,
        }
    }

    /// Construct a transport error that requires reconnecting.
    #[must_use]
    pub fn reconnect(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reconnect_required: true,
        }
    }
}

/// A sub-response reported a non-success status.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{command} ({phase}) failed with status {status}")]
pub struct StatusError {
    /// Batch slot the failing response occupied.
    pub phase: Phase,
    /// Command the response answered.
    pub command: Command,
    /// Status returned by the server.
    pub status: NtStatus,
}

impl StatusError {
    /// Policy class of the status.
    #[must_use]
    pub fn class(&self) -> StatusClass { self.status.class() }
}

/// A response could not be decoded safely.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is shorter than the fixed part being read.
    #[error("{what} truncated: have {have} bytes, need {need}")]
    Truncated {
        /// Structure being decoded.
        what: &'static str,
        /// Bytes available.
        have: usize,
        /// Bytes required.
        need: usize,
    },
    /// The declared payload starts inside the SMB2 header.
    #[error("illegal payload offset {offset}")]
    IllegalOffset {
        /// Offset declared by the server.
        offset: usize,
    },
    /// The declared payload is smaller than the structure it must hold.
    #[error("payload length {length} smaller than minimum {min}")]
    TooShort {
        /// Length declared by the server.
        length: usize,
        /// Minimum accepted length.
        min: usize,
    },
    /// The declared payload exceeds the maximum buffer size.
    #[error("payload length {length} exceeds maximum {max}")]
    TooLarge {
        /// Length declared by the server.
        length: usize,
        /// Maximum accepted length.
        max: usize,
    },
    /// The declared payload extends past the received buffer.
    #[error("payload {offset}+{length} exceeds received {received} bytes")]
    OutOfBounds {
        /// Offset declared by the server.
        offset: usize,
        /// Length declared by the server.
        length: usize,
        /// Bytes actually received.
        received: usize,
    },
    /// A symlink error response had an unexpected tag.
    #[error("malformed symlink response: {0}")]
    BadSymlink(&'static str),
    /// The dispatcher returned a different number of responses than sent.
    #[error("sent {sent} sub-requests but received {received} responses")]
    ResponseCount {
        /// Sub-requests sent.
        sent: usize,
        /// Responses received.
        received: usize,
    },
    /// The expected response slot holds no buffer.
    #[error("no response buffer for {0} slot")]
    MissingResponse(Phase),
}

/// Errors returned by compound operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompoundError {
    /// Assembly failed before anything was sent.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A sub-response carried a failing status.
    #[error(transparent)]
    Status(#[from] StatusError),
    /// A response could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The path is served through a DFS referral.
    #[error("path requires a DFS referral")]
    Referral,
    /// The operation is not supported for this path or mount.
    #[error("operation not supported")]
    NotSupported,
    /// The share was deleted or changed; the tree must reconnect.
    #[error("share deleted or changed (status {status}); reconnect required")]
    ShareChanged {
        /// Status returned by the server, unmodified.
        status: NtStatus,
    },
}

impl CompoundError {
    /// Reduce the error to the single code reported to callers.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Build(BuildError::NameTooLong { .. }) => ErrorCode::NameTooLong,
            Self::Build(BuildError::EmptyTarget) => ErrorCode::InvalidArgument,
            Self::Build(BuildError::Rejected { .. }) => ErrorCode::NoMemory,
            Self::Transport(_) => ErrorCode::Io,
            Self::Status(err) => err.status.error_code(),
            Self::Decode(_) => ErrorCode::InvalidArgument,
            Self::Referral => ErrorCode::Remote,
            Self::NotSupported => ErrorCode::NotSupported,
            Self::ShareChanged { .. } => ErrorCode::RemoteChanged,
        }
    }

    /// Status of the failing sub-response, if the error came from one.
    #[must_use]
    pub fn status(&self) -> Option<NtStatus> {
        match self {
            Self::Status(err) => Some(err.status),
            Self::ShareChanged { status } => Some(*status),
            _ => None,
        }
    }
}

/// Single error code surfaced to callers, mirroring POSIX errno values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `ENOENT`.
    NotFound,
    /// `EIO`.
    Io,
    /// `ENOMEM`.
    NoMemory,
    /// `EACCES`.
    AccessDenied,
    /// `EEXIST`.
    Exists,
    /// `ENOTDIR`.
    NotDirectory,
    /// `EISDIR`.
    IsDirectory,
    /// `EINVAL`.
    InvalidArgument,
    /// `ENAMETOOLONG`.
    NameTooLong,
    /// `ENOTEMPTY`.
    NotEmpty,
    /// `EREMOTE`.
    Remote,
    /// `EREMCHG`.
    RemoteChanged,
    /// `EOPNOTSUPP`.
    NotSupported,
}

impl ErrorCode {
    /// Linux errno value for this code.
    #[must_use]
    pub fn errno(self) -> i32 {
        match self {
            Self::NotFound => 2,
            Self::Io => 5,
            Self::NoMemory => 12,
            Self::AccessDenied => 13,
            Self::Exists => 17,
            Self::NotDirectory => 20,
            Self::IsDirectory => 21,
            Self::InvalidArgument => 22,
            Self::NameTooLong => 36,
            Self::NotEmpty => 39,
            Self::Remote => 66,
            Self::RemoteChanged => 78,
            Self::NotSupported => 95,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{BuildError, CompoundError, DecodeError, ErrorCode, StatusError, TransportError};
    use crate::{compound::Phase, header::Command, status::NtStatus};

    #[rstest]
    #[case(CompoundError::Referral, ErrorCode::Remote, 66)]
    #[case(CompoundError::NotSupported, ErrorCode::NotSupported, 95)]
    #[case(
        CompoundError::ShareChanged { status: NtStatus::NETWORK_NAME_DELETED },
        ErrorCode::RemoteChanged,
        78
    )]
    #[case(
        CompoundError::Build(BuildError::NameTooLong { units: 5000, max: 4096 }),
        ErrorCode::NameTooLong,
        36
    )]
    #[case(
        CompoundError::Decode(DecodeError::TooShort { length: 1, min: 100 }),
        ErrorCode::InvalidArgument,
        22
    )]
    #[case(
        CompoundError::Transport(TransportError::new("reset")),
        ErrorCode::Io,
        5
    )]
    fn reduces_to_error_code(
        #[case] error: CompoundError,
        #[case] code: ErrorCode,
        #[case] errno: i32,
    ) {
        assert_eq!(error.code(), code);
        assert_eq!(error.code().errno(), errno);
    }

    #[test]
    fn status_error_display_names_command_and_slot() {
        let error = CompoundError::from(StatusError {
            phase: Phase::Open,
            command: Command::Create,
            status: NtStatus::ACCESS_DENIED,
        });
        assert_eq!(
            error.to_string(),
            "CREATE (open) failed with status 0xc0000022"
        );
        assert_eq!(error.status(), Some(NtStatus::ACCESS_DENIED));
    }
}
