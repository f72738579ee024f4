//! The closed set of operations a compound batch can carry.
//!
//! Each kind is a small struct implementing [`OperationSpec`]: what to put in
//! the OPERATE slot and how to read its response. [`Operation::spec`]
//! resolves the variant once per call; the assembler and decoder then work
//! against the trait.

use std::fmt;

use bytes::Bytes;

use crate::{
    builder::{QueryInfoArgs, SetInfoArgs, SubRequestBody},
    byte_order::write_le_u64,
    context::MountContext,
    decode::{query_info_payload, response_frame},
    dispatch::SubResponse,
    error::{BuildError, DecodeError},
    handle::FileId,
    info::{
        FileAllInfo,
        FileBasicInfo,
        INFO_TYPE_FILE,
        InfoClass,
        LinkTargetInfo,
        PATH_MAX,
        PosixInfo,
        SID_MAX_SIZE,
    },
    request::encode_target,
};

/// Operation kinds, used for logging, metrics and dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    QueryInfo,
    PosixQueryInfo,
    Delete,
    Mkdir,
    Rmdir,
    SetEndOfFile,
    SetBasicInfo,
    Rename,
    HardLink,
}

impl OperationKind {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueryInfo => "query_info",
            Self::PosixQueryInfo => "posix_query_info",
            Self::Delete => "delete",
            Self::Mkdir => "mkdir",
            Self::Rmdir => "rmdir",
            Self::SetEndOfFile => "set_eof",
            Self::SetBasicInfo => "set_info",
            Self::Rename => "rename",
            Self::HardLink => "hardlink",
        }
    }

    /// Whether a symlink stop on open may be retried as a reparse point.
    #[must_use]
    pub fn is_query(self) -> bool { matches!(self, Self::QueryInfo | Self::PosixQueryInfo) }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Typed result of a successful operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// The operation only changes state.
    None,
    /// Result of a `FileAllInformation` query.
    AllInfo(FileAllInfo),
    /// Result of a posix information query.
    Posix(PosixInfo),
}

impl Payload {
    /// The `FileAllInformation` result, if this is one.
    #[must_use]
    pub fn into_all_info(self) -> Option<FileAllInfo> {
        match self {
            Self::AllInfo(info) => Some(info),
            _ => None,
        }
    }

    /// The posix information result, if this is one.
    #[must_use]
    pub fn into_posix(self) -> Option<PosixInfo> {
        match self {
            Self::Posix(info) => Some(info),
            _ => None,
        }
    }
}

/// Build / post-process capability pair shared by every operation kind.
pub trait OperationSpec {
    /// Kind of the operation.
    fn kind(&self) -> OperationKind;

    /// Whether a handle the caller already holds can carry the operation,
    /// skipping the open and close.
    fn reuses_handle(&self) -> bool { true }

    /// Parameters of the OPERATE slot addressed at `file_id`, or `None` when
    /// the open and close alone express the operation.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the payload cannot be represented.
    fn operate(
        &self,
        file_id: FileId,
        pid: u32,
        mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError>;

    /// Decode the OPERATE slot's response into the operation's result.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the response cannot be trusted.
    fn decode(&self, _response: Option<&SubResponse>) -> Result<Payload, DecodeError> {
        Ok(Payload::None)
    }
}

/// `FileAllInformation` query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryAllInfo;

impl QueryAllInfo {
    /// Output buffer reserved for the fixed part and a full-length name.
    pub const OUTPUT_BUFFER_LENGTH: usize = FileAllInfo::FIXED_SIZE + PATH_MAX * 2;
}

impl OperationSpec for QueryAllInfo {
    fn kind(&self) -> OperationKind { OperationKind::QueryInfo }

    fn operate(
        &self,
        file_id: FileId,
        _pid: u32,
        _mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        Ok(Some(query_body(file_id, InfoClass::All, Self::OUTPUT_BUFFER_LENGTH)))
    }

    fn decode(&self, response: Option<&SubResponse>) -> Result<Payload, DecodeError> {
        let frame = response_frame(response)?;
        let payload = query_info_payload(frame, FileAllInfo::FIXED_SIZE, Self::OUTPUT_BUFFER_LENGTH)?;
        FileAllInfo::decode(&payload).map(Payload::AllInfo)
    }
}

/// Posix information query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryPosixInfo;

impl QueryPosixInfo {
    /// Output buffer reserved for the fixed part, a name and two SIDs.
    pub const OUTPUT_BUFFER_LENGTH: usize =
        PosixInfo::FIXED_SIZE + PATH_MAX * 2 + SID_MAX_SIZE * 2;
}

impl OperationSpec for QueryPosixInfo {
    fn kind(&self) -> OperationKind { OperationKind::PosixQueryInfo }

    fn operate(
        &self,
        file_id: FileId,
        _pid: u32,
        _mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        Ok(Some(query_body(file_id, InfoClass::Posix, Self::OUTPUT_BUFFER_LENGTH)))
    }

    fn decode(&self, response: Option<&SubResponse>) -> Result<Payload, DecodeError> {
        let frame = response_frame(response)?;
        let payload = query_info_payload(frame, PosixInfo::FIXED_SIZE, Self::OUTPUT_BUFFER_LENGTH)?;
        PosixInfo::decode(&payload).map(Payload::Posix)
    }
}

/// Delete through an open with delete-on-close followed by a close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteOnClose;

impl OperationSpec for DeleteOnClose {
    fn kind(&self) -> OperationKind { OperationKind::Delete }

    fn reuses_handle(&self) -> bool { false }

    fn operate(
        &self,
        _file_id: FileId,
        _pid: u32,
        _mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        Ok(None)
    }
}

/// Directory creation through the open's create disposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MakeDirectory;

impl OperationSpec for MakeDirectory {
    fn kind(&self) -> OperationKind { OperationKind::Mkdir }

    fn reuses_handle(&self) -> bool { false }

    fn operate(
        &self,
        _file_id: FileId,
        _pid: u32,
        _mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        Ok(None)
    }
}

/// Directory removal by setting delete-pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveDirectory;

impl OperationSpec for RemoveDirectory {
    fn kind(&self) -> OperationKind { OperationKind::Rmdir }

    fn reuses_handle(&self) -> bool { false }

    fn operate(
        &self,
        file_id: FileId,
        pid: u32,
        _mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        let delete_pending = Bytes::from_static(&[1]);
        Ok(Some(set_body(
            file_id,
            pid,
            InfoClass::Disposition,
            vec![delete_pending],
        )))
    }
}

/// End-of-file update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetEndOfFile {
    pub end_of_file: u64,
}

impl OperationSpec for SetEndOfFile {
    fn kind(&self) -> OperationKind { OperationKind::SetEndOfFile }

    fn operate(
        &self,
        file_id: FileId,
        pid: u32,
        _mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        let eof = Bytes::copy_from_slice(&write_le_u64(self.end_of_file));
        Ok(Some(set_body(file_id, pid, InfoClass::EndOfFile, vec![eof])))
    }
}

/// Timestamp and attribute update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetBasicInfo {
    pub info: FileBasicInfo,
}

impl OperationSpec for SetBasicInfo {
    fn kind(&self) -> OperationKind { OperationKind::SetBasicInfo }

    fn operate(
        &self,
        file_id: FileId,
        pid: u32,
        _mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        Ok(Some(set_body(
            file_id,
            pid,
            InfoClass::Basic,
            vec![self.info.encode()],
        )))
    }
}

/// Rename, replacing an existing target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rename {
    pub target: String,
}

impl OperationSpec for Rename {
    fn kind(&self) -> OperationKind { OperationKind::Rename }

    fn operate(
        &self,
        file_id: FileId,
        pid: u32,
        mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        let name = encode_target(&self.target, mount)?;
        let buffers = LinkTargetInfo::encode_with_name(true, &name);
        Ok(Some(set_body(file_id, pid, InfoClass::Rename, buffers.into())))
    }
}

/// Hard link creation; never replaces an existing target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HardLink {
    pub target: String,
}

impl OperationSpec for HardLink {
    fn kind(&self) -> OperationKind { OperationKind::HardLink }

    fn reuses_handle(&self) -> bool { false }

    fn operate(
        &self,
        file_id: FileId,
        pid: u32,
        mount: &MountContext,
    ) -> Result<Option<SubRequestBody>, BuildError> {
        let name = encode_target(&self.target, mount)?;
        let buffers = LinkTargetInfo::encode_with_name(false, &name);
        Ok(Some(set_body(file_id, pid, InfoClass::Link, buffers.into())))
    }
}

/// An operation together with its kind-specific payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    QueryInfo(QueryAllInfo),
    PosixQueryInfo(QueryPosixInfo),
    Delete(DeleteOnClose),
    Mkdir(MakeDirectory),
    Rmdir(RemoveDirectory),
    SetEndOfFile(SetEndOfFile),
    SetBasicInfo(SetBasicInfo),
    Rename(Rename),
    HardLink(HardLink),
}

impl Operation {
    /// Resolve the variant's capabilities.
    #[must_use]
    pub fn spec(&self) -> &dyn OperationSpec {
        match self {
            Self::QueryInfo(op) => op,
            Self::PosixQueryInfo(op) => op,
            Self::Delete(op) => op,
            Self::Mkdir(op) => op,
            Self::Rmdir(op) => op,
            Self::SetEndOfFile(op) => op,
            Self::SetBasicInfo(op) => op,
            Self::Rename(op) => op,
            Self::HardLink(op) => op,
        }
    }

    /// Kind of the operation.
    #[must_use]
    pub fn kind(&self) -> OperationKind { self.spec().kind() }

    /// Rename to `target`.
    #[must_use]
    pub fn rename(target: impl Into<String>) -> Self {
        Self::Rename(Rename {
            target: target.into(),
        })
    }

    /// Hard link named `target`.
    #[must_use]
    pub fn hard_link(target: impl Into<String>) -> Self {
        Self::HardLink(HardLink {
            target: target.into(),
        })
    }

    /// Set the end of file to `end_of_file`.
    #[must_use]
    pub fn set_end_of_file(end_of_file: u64) -> Self {
        Self::SetEndOfFile(SetEndOfFile { end_of_file })
    }

    /// Set timestamps and attributes.
    #[must_use]
    pub fn set_basic_info(info: FileBasicInfo) -> Self { Self::SetBasicInfo(SetBasicInfo { info }) }
}

fn query_body(file_id: FileId, class: InfoClass, output_len: usize) -> SubRequestBody {
    SubRequestBody::QueryInfo(QueryInfoArgs {
        file_id,
        info_type: INFO_TYPE_FILE,
        class,
        output_buffer_length: u32::try_from(output_len).unwrap_or(u32::MAX),
    })
}

fn set_body(file_id: FileId, pid: u32, class: InfoClass, buffers: Vec<Bytes>) -> SubRequestBody {
    SubRequestBody::SetInfo(SetInfoArgs::file(file_id, pid, class, buffers))
}
