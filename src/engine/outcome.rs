//! Results returned by the engine.

use crate::{
    error::{CompoundError, ErrorCode},
    lifecycle::Diagnostics,
    operation::Payload,
};

/// Whether the raw responses of a failed call are handed to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Capture {
    /// Release every response before returning.
    #[default]
    Discard,
    /// Move the responses into [`CompoundFailure::diagnostics`] on failure.
    OnFailure,
}

/// A successful compound operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Decoded result of the operate slot.
    pub payload: Payload,
    /// Symlink target recorded on the caller's handle, for queries run over
    /// one.
    pub symlink_target: Option<String>,
}

/// A failed compound operation.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct CompoundFailure {
    /// What went wrong.
    #[source]
    pub error: CompoundError,
    /// Raw responses, present only when [`Capture::OnFailure`] was requested.
    pub diagnostics: Option<Diagnostics>,
}

impl CompoundFailure {
    /// Single error code for the failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode { self.error.code() }
}

impl From<CompoundFailure> for CompoundError {
    fn from(failure: CompoundFailure) -> Self { failure.error }
}

/// Result of a path query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathInfo<T> {
    /// Decoded metadata.
    pub data: T,
    /// Target of the symbolic link the path names, if known.
    pub symlink_target: Option<String>,
    /// The path was queried as a reparse point.
    pub reparse: bool,
    /// Timestamps need timezone adjustment. Always `false` for SMB2.
    pub adjust_tz: bool,
}

impl<T> PathInfo<T> {
    pub(crate) fn new(data: T) -> Self {
        Self {
            data,
            symlink_target: None,
            reparse: false,
            adjust_tz: false,
        }
    }
}
