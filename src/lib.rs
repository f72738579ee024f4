#![doc(html_root_url = "https://docs.rs/smb2_compound/latest")]
//! Public API for the `smb2_compound` library.
//!
//! This crate runs file operations against an SMB2 share as compound
//! exchanges: open, operate and close travel in one request and their
//! responses are demultiplexed, decoded and translated into a single result.
//! Encoding of individual requests, the transport and the handle table are
//! supplied by the caller through the [`RequestBuilder`], [`Dispatcher`] and
//! [`HandleProvider`] traits.

pub mod builder;
pub mod byte_order;
pub mod compound;
pub mod context;
pub mod decode;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod handle;
pub mod header;
pub mod info;
mod lifecycle;
pub mod metrics;
pub mod operation;
mod policy;
pub mod request;
pub mod status;

#[cfg(test)]
mod test_helpers;

pub use builder::{
    CloseArgs,
    OpenArgs,
    QueryInfoArgs,
    RequestBuilder,
    SetInfoArgs,
    SubRequest,
    SubRequestBody,
};
pub use compound::{CompoundBatch, Phase};
pub use context::{Call, MountContext, TreeConnection, Xid};
pub use dispatch::{
    BufferOwnership,
    DispatchFailure,
    Dispatcher,
    ResponseBuffer,
    SendFlags,
    SubResponse,
};
pub use engine::{
    Capture,
    CompoundEngine,
    CompoundEngineBuilder,
    CompoundFailure,
    EngineBuildError,
    Outcome,
    PathInfo,
    TracingConfig,
};
pub use error::{
    BuildError,
    CompoundError,
    DecodeError,
    ErrorCode,
    StatusError,
    TransportError,
};
pub use handle::{
    CachedRoot,
    FileId,
    FindWritable,
    HandleProvider,
    HandleRef,
    NoCachedHandles,
    OpenFile,
};
pub use header::Command;
pub use info::{FileAllInfo, FileBasicInfo, InfoClass, LinkTargetInfo, PosixInfo};
pub use lifecycle::Diagnostics;
pub use operation::{Operation, OperationKind, Payload};
pub use request::{AccessMask, CreateDisposition, CreateOptions, OperationRequest};
pub use status::{NtStatus, StatusClass};
