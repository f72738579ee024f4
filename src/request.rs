//! Open parameters and the request a caller hands to the engine.

use std::ops::BitOr;

use crate::{
    context::MountContext,
    error::BuildError,
    info::PATH_MAX,
    operation::Operation,
};

/// Access rights requested on open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessMask(pub u32);

impl AccessMask {
    pub const FILE_WRITE_DATA: Self = Self(0x0000_0002);
    pub const FILE_READ_ATTRIBUTES: Self = Self(0x0000_0080);
    pub const FILE_WRITE_ATTRIBUTES: Self = Self(0x0000_0100);
    pub const DELETE: Self = Self(0x0001_0000);
}

/// What the server does when the target does or does not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateDisposition {
    /// `FILE_OPEN`: open an existing object, fail otherwise.
    Open,
    /// `FILE_CREATE`: create a new object, fail if it exists.
    Create,
}

impl CreateDisposition {
    /// Wire value of the disposition.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Open => 1,
            Self::Create => 2,
        }
    }
}

/// Create options bit set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CreateOptions(pub u32);

impl CreateOptions {
    pub const NONE: Self = Self(0);
    pub const NOT_FILE: Self = Self(0x0000_0001);
    pub const DELETE_ON_CLOSE: Self = Self(0x0000_1000);
    pub const OPEN_BACKUP_INTENT: Self = Self(0x0000_4000);
    pub const OPEN_REPARSE_POINT: Self = Self(0x0020_0000);

    /// `true` if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }

    /// Add the mount-wide options to an explicit set.
    #[must_use]
    pub fn for_mount(self, mount: &MountContext) -> Self {
        if mount.backup_intent {
            self | Self::OPEN_BACKUP_INTENT
        } else {
            self
        }
    }
}

impl BitOr for CreateOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

/// One compound operation against a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationRequest {
    pub path: String,
    pub desired_access: AccessMask,
    pub disposition: CreateDisposition,
    pub create_options: CreateOptions,
    /// Mode applied on create; `None` leaves the server default.
    pub mode: Option<u32>,
    pub operation: Operation,
}

impl OperationRequest {
    /// Request `operation` on `path`, opening it with `FILE_OPEN` and no
    /// explicit options.
    #[must_use]
    pub fn new(path: impl Into<String>, desired_access: AccessMask, operation: Operation) -> Self {
        Self {
            path: path.into(),
            desired_access,
            disposition: CreateDisposition::Open,
            create_options: CreateOptions::NONE,
            mode: None,
            operation,
        }
    }

    /// Override the create disposition.
    #[must_use]
    pub fn with_disposition(mut self, disposition: CreateDisposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// Override the create options.
    #[must_use]
    pub fn with_create_options(mut self, options: CreateOptions) -> Self {
        self.create_options = options;
        self
    }

    /// Set the mode applied on create.
    #[must_use]
    pub fn with_mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }
}

/// Convert a share-relative path to the UTF-16 form sent on open.
///
/// Leading separators are dropped and `/` becomes `\` unless the mount uses
/// POSIX paths.
///
/// # Errors
///
/// Returns [`BuildError::NameTooLong`] if the result exceeds [`PATH_MAX`]
/// code units.
pub fn encode_path(path: &str, mount: &MountContext) -> Result<Vec<u16>, BuildError> {
    let trimmed = path.trim_start_matches(['/', '\\']);
    let units: Vec<u16> = if mount.posix_paths {
        trimmed.encode_utf16().collect()
    } else {
        trimmed
            .encode_utf16()
            .map(|unit| if unit == u16::from(b'/') { u16::from(b'\\') } else { unit })
            .collect()
    };
    check_len(units)
}

/// Convert a rename or link target to UTF-16.
///
/// Unlike [`encode_path`], the target is sent as given apart from separator
/// conversion; an empty target is rejected.
///
/// # Errors
///
/// Returns [`BuildError::EmptyTarget`] or [`BuildError::NameTooLong`].
pub fn encode_target(target: &str, mount: &MountContext) -> Result<Vec<u16>, BuildError> {
    let units = encode_path(target, mount)?;
    if units.is_empty() {
        return Err(BuildError::EmptyTarget);
    }
    Ok(units)
}

fn check_len(units: Vec<u16>) -> Result<Vec<u16>, BuildError> {
    if units.len() > PATH_MAX {
        return Err(BuildError::NameTooLong {
            units: units.len(),
            max: PATH_MAX,
        });
    }
    Ok(units)
}
