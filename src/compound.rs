//! Assembly of an operation into a compound batch of one to three slots.
//!
//! A batch is either the full open / operate / close sequence on an
//! ephemeral handle (the operate slot is absent for kinds expressed by the
//! open alone) or a single operate slot against a handle the caller already
//! holds. The shape is fixed when the batch is built; the close slot exists at
//! most once, so an ephemeral handle is closed at most once.

use std::fmt;

use crate::{
    builder::{CloseArgs, OpenArgs, RequestBuilder, SubRequest, SubRequestBody},
    context::{MountContext, TreeConnection},
    dispatch::SendFlags,
    error::BuildError,
    handle::{FileId, HandleRef},
    request::{OperationRequest, encode_path},
};

/// Slot of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Open,
    Operate,
    Close,
}

impl Phase {
    /// Position of the slot in a full three-slot batch.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Open => 0,
            Self::Operate => 1,
            Self::Close => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Operate => "operate",
            Self::Close => "close",
        })
    }
}

/// The sub-requests of one compound exchange.
#[derive(Debug)]
pub enum CompoundBatch {
    /// Open and close an ephemeral handle; the open carries the operation.
    OpenClose([SubRequest; 2]),
    /// Open an ephemeral handle, operate on it, and close it.
    OpenOperateClose([SubRequest; 3]),
    /// Operate on a handle the caller holds.
    OperateOnly([SubRequest; 1]),
}

impl CompoundBatch {
    /// The sub-requests to send, in order.
    #[must_use]
    pub fn requests(&self) -> &[SubRequest] {
        match self {
            Self::OpenClose(slots) => slots,
            Self::OpenOperateClose(slots) => slots,
            Self::OperateOnly(slots) => slots,
        }
    }

    /// Number of sub-requests in the batch.
    #[must_use]
    pub fn len(&self) -> usize { self.requests().len() }

    /// Always `false`; a batch holds at least one sub-request.
    #[must_use]
    pub fn is_empty(&self) -> bool { false }

    /// Whether the batch opens (and therefore closes) its own handle.
    #[must_use]
    pub fn opens_handle(&self) -> bool { !matches!(self, Self::OperateOnly(_)) }

    /// Slot of each sub-request, in send order.
    pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.requests().iter().map(SubRequest::phase)
    }

    /// Exchange flags for sending this batch on `tree`.
    #[must_use]
    pub fn send_flags(&self, tree: &TreeConnection) -> SendFlags {
        SendFlags {
            transform: tree.encryption_required(),
            create_close: self.opens_handle(),
        }
    }
}

/// Build the batch for `request`.
///
/// When `handle` is given and the operation can run on an existing handle,
/// the batch is a single operate slot addressed at it. Otherwise the batch
/// opens `request.path`, chains the operate slot (if any) to the open and
/// closes the handle in the last slot.
///
/// # Errors
///
/// Returns [`BuildError`] if the path or payload is invalid or a builder
/// rejects a slot. Slots already built are dropped; nothing is sent.
pub fn assemble(
    builder: &dyn RequestBuilder,
    request: &OperationRequest,
    handle: Option<&HandleRef>,
    pid: u32,
    mount: &MountContext,
) -> Result<CompoundBatch, BuildError> {
    let spec = request.operation.spec();

    if let Some(handle) = handle.filter(|_| spec.reuses_handle()) {
        if let Some(body) = spec.operate(handle.file_id(), pid, mount)? {
            let operate = SubRequest::build(builder, Phase::Operate, body)?;
            return Ok(CompoundBatch::OperateOnly([operate]));
        }
    }

    let open_args = OpenArgs {
        path: encode_path(&request.path, mount)?,
        desired_access: request.desired_access,
        disposition: request.disposition,
        create_options: request.create_options.for_mount(mount),
        mode: request.mode,
    };
    let mut open = SubRequest::build(builder, Phase::Open, SubRequestBody::Open(open_args))?;
    open.chain_next();

    let operate = spec
        .operate(FileId::COMPOUND, pid, mount)?
        .map(|body| SubRequest::build(builder, Phase::Operate, body))
        .transpose()?;

    let close_args = CloseArgs {
        file_id: FileId::COMPOUND,
        query_attributes: false,
    };
    let mut close = SubRequest::build(builder, Phase::Close, SubRequestBody::Close(close_args))?;
    close.mark_related();

    Ok(match operate {
        Some(mut operate) => {
            operate.chain_next();
            operate.mark_related();
            CompoundBatch::OpenOperateClose([open, operate, close])
        }
        None => CompoundBatch::OpenClose([open, close]),
    })
}
