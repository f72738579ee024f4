//! NT status codes carried in SMB2 response headers.
//!
//! Only the statuses the engine interprets are named; every other value is
//! preserved verbatim and reported through [`StatusClass::Other`].

use std::fmt;

use crate::error::ErrorCode;

/// A 32-bit NT status code as returned in an SMB2 response header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NtStatus(pub u32);

impl NtStatus {
    pub const SUCCESS: Self = Self(0x0000_0000);
    pub const STOPPED_ON_SYMLINK: Self = Self(0x8000_002D);
    pub const INVALID_PARAMETER: Self = Self(0xC000_000D);
    pub const ACCESS_DENIED: Self = Self(0xC000_0022);
    pub const OBJECT_NAME_INVALID: Self = Self(0xC000_0033);
    pub const OBJECT_NAME_NOT_FOUND: Self = Self(0xC000_0034);
    pub const OBJECT_NAME_COLLISION: Self = Self(0xC000_0035);
    pub const OBJECT_PATH_NOT_FOUND: Self = Self(0xC000_003A);
    pub const DELETE_PENDING: Self = Self(0xC000_0056);
    pub const NOT_SUPPORTED: Self = Self(0xC000_00BB);
    pub const NETWORK_NAME_DELETED: Self = Self(0xC000_00C9);
    pub const DIRECTORY_NOT_EMPTY: Self = Self(0xC000_0101);
    pub const NOT_A_DIRECTORY: Self = Self(0xC000_0103);
    pub const FILE_IS_A_DIRECTORY: Self = Self(0xC000_00BA);
    pub const PATH_NOT_COVERED: Self = Self(0xC000_0257);

    /// `true` only for `STATUS_SUCCESS`; informational statuses such as
    /// `STOPPED_ON_SYMLINK` still fail the sub-request.
    #[must_use]
    pub fn is_success(self) -> bool { self == Self::SUCCESS }

    /// Classify this status for the retry and translation policy.
    #[must_use]
    pub fn class(self) -> StatusClass {
        match self {
            Self::STOPPED_ON_SYMLINK => StatusClass::Reparse,
            Self::PATH_NOT_COVERED => StatusClass::Referral,
            Self::OBJECT_NAME_INVALID => StatusClass::NameInvalid,
            Self::NETWORK_NAME_DELETED => StatusClass::ShareChanged,
            _ => StatusClass::Other,
        }
    }

    /// Map the status onto the single error code reported to callers.
    #[must_use]
    pub fn error_code(self) -> ErrorCode {
        match self {
            Self::STOPPED_ON_SYMLINK | Self::NOT_SUPPORTED => ErrorCode::NotSupported,
            Self::OBJECT_NAME_INVALID
            | Self::OBJECT_NAME_NOT_FOUND
            | Self::OBJECT_PATH_NOT_FOUND
            | Self::DELETE_PENDING => ErrorCode::NotFound,
            Self::PATH_NOT_COVERED => ErrorCode::Remote,
            Self::NETWORK_NAME_DELETED => ErrorCode::RemoteChanged,
            Self::ACCESS_DENIED => ErrorCode::AccessDenied,
            Self::OBJECT_NAME_COLLISION => ErrorCode::Exists,
            Self::DIRECTORY_NOT_EMPTY => ErrorCode::NotEmpty,
            Self::NOT_A_DIRECTORY => ErrorCode::NotDirectory,
            Self::FILE_IS_A_DIRECTORY => ErrorCode::IsDirectory,
            Self::INVALID_PARAMETER => ErrorCode::InvalidArgument,
            _ => ErrorCode::Io,
        }
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#010x}", self.0) }
}

/// How the policy layer treats a non-success status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    /// The open stopped on a reparse point and may be retried as one.
    Reparse,
    /// The path lives in another namespace.
    Referral,
    /// The server rejected the name; may stand in for a referral.
    NameInvalid,
    /// The share was deleted or changed under the tree connection.
    ShareChanged,
    /// Any other failure; surfaced as-is.
    Other,
}
