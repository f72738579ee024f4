//! Sub-request parameters and the external encoder that turns them into
//! wire frames.
//!
//! The engine decides *what* each slot of a batch asks for; a
//! [`RequestBuilder`] decides how it is laid out on the wire. Each
//! [`SubRequest`] keeps both the typed parameters and the encoded frame so
//! that the dispatcher can send the frame and tests can inspect the intent.

use bytes::Bytes;

use crate::{
    compound::Phase,
    error::BuildError,
    handle::FileId,
    header::Command,
    info::{INFO_TYPE_FILE, InfoClass},
    request::{AccessMask, CreateDisposition, CreateOptions},
};

/// Parameters of a CREATE sub-request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenArgs {
    /// Share-relative path as UTF-16 code units.
    pub path: Vec<u16>,
    pub desired_access: AccessMask,
    pub disposition: CreateDisposition,
    pub create_options: CreateOptions,
    /// POSIX mode to apply on create, if any.
    pub mode: Option<u32>,
}

/// Parameters of a QUERY_INFO sub-request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryInfoArgs {
    pub file_id: FileId,
    pub info_type: u8,
    pub class: InfoClass,
    /// Largest response payload the server may return.
    pub output_buffer_length: u32,
}

/// Parameters of a SET_INFO sub-request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetInfoArgs {
    pub file_id: FileId,
    /// Process id of the caller, sent in the request header.
    pub pid: u32,
    pub info_type: u8,
    pub class: InfoClass,
    /// Info buffers, concatenated on the wire.
    pub buffers: Vec<Bytes>,
}

impl SetInfoArgs {
    /// Set-info args for a file-level class.
    #[must_use]
    pub fn file(file_id: FileId, pid: u32, class: InfoClass, buffers: Vec<Bytes>) -> Self {
        Self {
            file_id,
            pid,
            info_type: INFO_TYPE_FILE,
            class,
            buffers,
        }
    }

    /// Total size of the info buffers.
    #[must_use]
    pub fn payload_len(&self) -> usize { self.buffers.iter().map(Bytes::len).sum() }
}

/// Parameters of a CLOSE sub-request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloseArgs {
    pub file_id: FileId,
    /// Ask the server to return attributes on close.
    pub query_attributes: bool,
}

/// Typed parameters of one sub-request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubRequestBody {
    Open(OpenArgs),
    QueryInfo(QueryInfoArgs),
    SetInfo(SetInfoArgs),
    Close(CloseArgs),
}

impl SubRequestBody {
    /// Command this body is sent as.
    #[must_use]
    pub fn command(&self) -> Command {
        match self {
            Self::Open(_) => Command::Create,
            Self::QueryInfo(_) => Command::QueryInfo,
            Self::SetInfo(_) => Command::SetInfo,
            Self::Close(_) => Command::Close,
        }
    }
}

/// Encodes sub-requests into wire frames.
///
/// Implementations own the message layouts, signing and credit accounting;
/// a returned error aborts assembly of the whole batch.
pub trait RequestBuilder: Send + Sync {
    /// Encode a CREATE request.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the parameters cannot be encoded.
    fn open(&self, args: &OpenArgs) -> Result<Bytes, BuildError>;

    /// Encode a QUERY_INFO request.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the parameters cannot be encoded.
    fn query_info(&self, args: &QueryInfoArgs) -> Result<Bytes, BuildError>;

    /// Encode a SET_INFO request.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the parameters cannot be encoded.
    fn set_info(&self, args: &SetInfoArgs) -> Result<Bytes, BuildError>;

    /// Encode a CLOSE request.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the parameters cannot be encoded.
    fn close(&self, args: &CloseArgs) -> Result<Bytes, BuildError>;
}

/// One encoded slot of a compound batch.
#[derive(Clone, Debug)]
pub struct SubRequest {
    phase: Phase,
    body: SubRequestBody,
    frame: Bytes,
    chained: bool,
    related: bool,
}

impl SubRequest {
    /// Encode `body` through `builder` for the given slot.
    ///
    /// # Errors
    ///
    /// Propagates the builder's [`BuildError`].
    pub fn build(
        builder: &dyn RequestBuilder,
        phase: Phase,
        body: SubRequestBody,
    ) -> Result<Self, BuildError> {
        let frame = match &body {
            SubRequestBody::Open(args) => builder.open(args)?,
            SubRequestBody::QueryInfo(args) => builder.query_info(args)?,
            SubRequestBody::SetInfo(args) => builder.set_info(args)?,
            SubRequestBody::Close(args) => builder.close(args)?,
        };
        Ok(Self {
            phase,
            body,
            frame,
            chained: false,
            related: false,
        })
    }

    /// Mark that another request follows in the same exchange.
    pub(crate) fn chain_next(&mut self) { self.chained = true; }

    /// Mark that this request operates on the previous request's handle.
    pub(crate) fn mark_related(&mut self) { self.related = true; }

    /// Slot this request occupies.
    #[must_use]
    pub fn phase(&self) -> Phase { self.phase }

    /// Command this request is sent as.
    #[must_use]
    pub fn command(&self) -> Command { self.body.command() }

    /// Typed parameters.
    #[must_use]
    pub fn body(&self) -> &SubRequestBody { &self.body }

    /// Encoded frame produced by the builder.
    #[must_use]
    pub fn frame(&self) -> &Bytes { &self.frame }

    /// Whether another request follows in the same exchange.
    #[must_use]
    pub fn is_chained(&self) -> bool { self.chained }

    /// Whether this request uses the previous request's handle.
    #[must_use]
    pub fn is_related(&self) -> bool { self.related }
}
