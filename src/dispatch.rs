//! The transport seam: sending a batch and receiving one response per slot.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    builder::SubRequest,
    context::TreeConnection,
    error::{DecodeError, TransportError},
    header::{Command, ResponseHeader},
    status::NtStatus,
};

/// Who is responsible for a response buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferOwnership {
    /// No buffer was received for the slot.
    None,
    /// The transport keeps the buffer alive; releasing our view frees nothing.
    TransportOwned,
    /// The buffer belongs to the call and must be released exactly once.
    NeedsFree,
}

/// A received response buffer and its ownership tag.
#[derive(Debug)]
pub struct ResponseBuffer {
    data: Option<Bytes>,
    ownership: BufferOwnership,
}

impl ResponseBuffer {
    /// A slot for which nothing was received.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: None,
            ownership: BufferOwnership::None,
        }
    }

    /// Wrap received bytes with their ownership tag.
    #[must_use]
    pub fn new(data: Bytes, ownership: BufferOwnership) -> Self {
        Self {
            data: Some(data),
            ownership,
        }
    }

    /// Ownership tag of the buffer.
    #[must_use]
    pub fn ownership(&self) -> BufferOwnership { self.ownership }

    /// Received bytes, if any.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> { self.data.as_deref() }

    /// Release the buffer. Returns `true` if it was owned by the call.
    pub fn release(mut self) -> bool { self.release_in_place() }

    pub(crate) fn release_in_place(&mut self) -> bool {
        let owned = self.ownership == BufferOwnership::NeedsFree && self.data.is_some();
        self.data = None;
        self.ownership = BufferOwnership::None;
        owned
    }
}

/// The response to one sub-request.
#[derive(Debug)]
pub struct SubResponse {
    command: Command,
    status: NtStatus,
    buffer: ResponseBuffer,
}

impl SubResponse {
    /// Build a response from a full SMB2 frame, reading command and status
    /// from its header.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the frame is shorter than a
    /// header.
    pub fn from_frame(frame: Bytes, ownership: BufferOwnership) -> Result<Self, DecodeError> {
        let header = ResponseHeader::parse(&frame)?;
        Ok(Self {
            command: header.command,
            status: header.status,
            buffer: ResponseBuffer::new(frame, ownership),
        })
    }

    /// A response carrying only a status, with no buffer.
    #[must_use]
    pub fn without_buffer(command: Command, status: NtStatus) -> Self {
        Self {
            command,
            status,
            buffer: ResponseBuffer::empty(),
        }
    }

    /// Command the response answers.
    #[must_use]
    pub fn command(&self) -> Command { self.command }

    /// Status of the response.
    #[must_use]
    pub fn status(&self) -> NtStatus { self.status }

    /// Full SMB2 frame, if a buffer was received.
    #[must_use]
    pub fn frame(&self) -> Option<&[u8]> { self.buffer.bytes() }

    /// Buffer and ownership tag.
    #[must_use]
    pub fn buffer(&self) -> &ResponseBuffer { &self.buffer }

    pub(crate) fn buffer_mut(&mut self) -> &mut ResponseBuffer { &mut self.buffer }
}

/// Flags applied to the whole exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SendFlags {
    /// Send with a transform (encryption) header.
    pub transform: bool,
    /// The batch ends with a CLOSE of a handle opened in the same batch.
    pub create_close: bool,
}

/// A failed exchange, with whatever responses arrived before the failure.
///
/// The engine takes ownership of `received` so that partially delivered
/// buffers are released or captured like any other.
#[derive(Debug)]
pub struct DispatchFailure {
    pub error: TransportError,
    pub received: Vec<SubResponse>,
}

impl From<TransportError> for DispatchFailure {
    fn from(error: TransportError) -> Self {
        Self {
            error,
            received: Vec::new(),
        }
    }
}

/// Sends compound batches over a session.
///
/// Implementations send all `requests` in one exchange, honouring each
/// request's chained and related marks, and return exactly one response per
/// request, in order. Timeouts and cancellation are theirs to enforce.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send `requests` as one compound exchange on `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchFailure`] if the exchange could not be completed.
    async fn send(
        &self,
        tree: &TreeConnection,
        flags: SendFlags,
        requests: &[SubRequest],
    ) -> Result<Vec<SubResponse>, DispatchFailure>;
}
