//! One entry point per operation kind.

use super::{Capture, CompoundEngine, CompoundFailure, Outcome, PathInfo};
use crate::{
    compound::Phase,
    context::Call,
    dispatch::SubResponse,
    error::{CompoundError, DecodeError},
    handle::{FindWritable, HandleRef},
    info::{ATTR_READONLY, FileAllInfo, FileBasicInfo, PosixInfo},
    metrics,
    operation::{
        DeleteOnClose,
        MakeDirectory,
        Operation,
        OperationKind,
        QueryAllInfo,
        QueryPosixInfo,
        RemoveDirectory,
    },
    policy,
    request::{AccessMask, CreateDisposition, CreateOptions, OperationRequest},
};

impl CompoundEngine {
    /// Query `FileAllInformation` for `path`.
    ///
    /// The empty path is answered from the cached root handle when one is
    /// available: from its cached metadata if still valid, else by a query
    /// over the cached handle. An open that stops on a symbolic link is
    /// retried once as a reparse point; the result then carries the link
    /// target and `reparse` is set.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the query fails. A name-invalid open on
    /// a DFS-enabled mount is reported as [`CompoundError::Referral`]; a
    /// referral on a mount with DFS disabled as
    /// [`CompoundError::NotSupported`].
    pub async fn query_path_info(
        &self,
        call: &Call<'_>,
        path: &str,
    ) -> Result<PathInfo<FileAllInfo>, CompoundError> {
        let result = self.query_all_info(call, path).await;
        count_error(OperationKind::QueryInfo, result)
    }

    /// Query posix information for `path`.
    ///
    /// Any not-supported failure is retried once as a reparse point; when the
    /// open stopped on a symbolic link the result carries the link target.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the query or its retry fails. A referral
    /// is reported as [`CompoundError::Referral`] and is not retried.
    pub async fn posix_query_path_info(
        &self,
        call: &Call<'_>,
        path: &str,
    ) -> Result<PathInfo<PosixInfo>, CompoundError> {
        let result = self.query_posix_info(call, path).await;
        count_error(OperationKind::PosixQueryInfo, result)
    }

    /// Create the directory `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the directory cannot be created.
    pub async fn mkdir(
        &self,
        call: &Call<'_>,
        path: &str,
        mode: Option<u32>,
    ) -> Result<(), CompoundError> {
        let request = OperationRequest::new(
            path,
            AccessMask::FILE_WRITE_ATTRIBUTES,
            Operation::Mkdir(MakeDirectory),
        )
        .with_disposition(CreateDisposition::Create)
        .with_create_options(CreateOptions::NOT_FILE)
        .with_mode(mode);
        self.run_discarding(call, &request, None).await
    }

    /// Mark the newly created directory `path` read-only.
    ///
    /// Returns the DOS attributes that were set, `attributes` with
    /// [`ATTR_READONLY`] added.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the attributes cannot be set.
    pub async fn mkdir_setinfo(
        &self,
        call: &Call<'_>,
        path: &str,
        attributes: u32,
    ) -> Result<u32, CompoundError> {
        let attributes = attributes | ATTR_READONLY;
        let info = FileBasicInfo {
            attributes,
            ..FileBasicInfo::default()
        };
        let request = OperationRequest::new(
            path,
            AccessMask::FILE_WRITE_ATTRIBUTES,
            Operation::set_basic_info(info),
        )
        .with_disposition(CreateDisposition::Create)
        .with_create_options(CreateOptions::NOT_FILE);
        let handle = self.handles.writable(path, FindWritable::Any);
        self.run_discarding(call, &request, handle).await?;
        Ok(attributes)
    }

    /// Remove the directory `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the directory cannot be removed.
    pub async fn rmdir(&self, call: &Call<'_>, path: &str) -> Result<(), CompoundError> {
        self.handles.drop_cached_dir(path);
        let request =
            OperationRequest::new(path, AccessMask::DELETE, Operation::Rmdir(RemoveDirectory))
                .with_create_options(CreateOptions::NOT_FILE);
        self.run_discarding(call, &request, None).await
    }

    /// Delete the file `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the file cannot be deleted.
    pub async fn unlink(&self, call: &Call<'_>, path: &str) -> Result<(), CompoundError> {
        let request =
            OperationRequest::new(path, AccessMask::DELETE, Operation::Delete(DeleteOnClose))
                .with_create_options(
                    CreateOptions::DELETE_ON_CLOSE | CreateOptions::OPEN_REPARSE_POINT,
                );
        self.run_discarding(call, &request, None).await
    }

    /// Rename `from` to `to`, replacing any existing `to`.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the rename fails.
    pub async fn rename_path(
        &self,
        call: &Call<'_>,
        from: &str,
        to: &str,
    ) -> Result<(), CompoundError> {
        self.handles.drop_cached_dir(from);
        let request = OperationRequest::new(from, AccessMask::DELETE, Operation::rename(to));
        let handle = self.handles.writable(from, FindWritable::WithDelete);
        self.run_discarding(call, &request, handle).await
    }

    /// Create the hard link `to` naming the file `from`.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the link cannot be created.
    pub async fn create_hardlink(
        &self,
        call: &Call<'_>,
        from: &str,
        to: &str,
    ) -> Result<(), CompoundError> {
        let request = OperationRequest::new(
            from,
            AccessMask::FILE_READ_ATTRIBUTES,
            Operation::hard_link(to),
        );
        self.run_discarding(call, &request, None).await
    }

    /// Set the end of file of `path` to `size`.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the size cannot be set.
    pub async fn set_path_size(
        &self,
        call: &Call<'_>,
        path: &str,
        size: u64,
    ) -> Result<(), CompoundError> {
        let request = OperationRequest::new(
            path,
            AccessMask::FILE_WRITE_DATA,
            Operation::set_end_of_file(size),
        );
        let handle = self.handles.writable(path, FindWritable::Any);
        self.run_discarding(call, &request, handle).await
    }

    /// Set timestamps and attributes of `path`.
    ///
    /// An all-zero `info` changes nothing and sends nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundError`] if the information cannot be set.
    pub async fn set_file_info(
        &self,
        call: &Call<'_>,
        path: &str,
        info: FileBasicInfo,
    ) -> Result<(), CompoundError> {
        if info.is_noop() {
            return Ok(());
        }
        let request = OperationRequest::new(
            path,
            AccessMask::FILE_WRITE_ATTRIBUTES,
            Operation::set_basic_info(info),
        );
        let handle = self.handles.writable(path, FindWritable::Any);
        self.run_discarding(call, &request, handle).await
    }

    async fn query_all_info(
        &self,
        call: &Call<'_>,
        path: &str,
    ) -> Result<PathInfo<FileAllInfo>, CompoundError> {
        if path.is_empty() {
            if let Some(root) = self.handles.cached_root() {
                if let Some(info) = root.file_all_info {
                    tracing::trace!("root metadata served from cache");
                    return Ok(PathInfo::new(info));
                }
                let request = query_request(path, Operation::QueryInfo(QueryAllInfo));
                let outcome = self
                    .attempt(call, &request, Some(root.handle), Capture::Discard)
                    .await?;
                return all_info(outcome);
            }
        }

        let request = query_request(path, Operation::QueryInfo(QueryAllInfo));
        let failure = match self
            .attempt(call, &request, self.handles.readable(path), Capture::OnFailure)
            .await
        {
            Ok(outcome) => return all_info(outcome),
            Err(failure) => failure,
        };

        let CompoundFailure { error, diagnostics } = failure;
        let Some(diagnostics) = diagnostics else {
            return Err(error);
        };
        if let Some(target) = policy::symlink_stop(&error, &diagnostics) {
            let target = target?;
            drop(diagnostics);
            let outcome = self.retry_as_reparse(call, request).await?;
            let mut info = all_info(outcome)?;
            info.symlink_target = Some(target);
            info.reparse = true;
            return Ok(info);
        }
        let open_status = diagnostics.open().map(SubResponse::status);
        Err(policy::remap_referral(error, open_status, call.mount))
    }

    async fn query_posix_info(
        &self,
        call: &Call<'_>,
        path: &str,
    ) -> Result<PathInfo<PosixInfo>, CompoundError> {
        let request = query_request(path, Operation::PosixQueryInfo(QueryPosixInfo));
        let failure = match self
            .attempt(call, &request, self.handles.readable(path), Capture::OnFailure)
            .await
        {
            Ok(outcome) => return posix_info(outcome),
            Err(failure) => failure,
        };
        if !policy::is_not_supported(&failure.error) {
            return Err(failure.error);
        }

        let target = failure
            .diagnostics
            .as_ref()
            .and_then(|diagnostics| policy::symlink_stop(&failure.error, diagnostics))
            .transpose()?;
        drop(failure);
        let outcome = self.retry_as_reparse(call, request).await?;
        let mut info = posix_info(outcome)?;
        if target.is_some() {
            info.symlink_target = target;
        }
        info.reparse = true;
        Ok(info)
    }

    async fn run_discarding(
        &self,
        call: &Call<'_>,
        request: &OperationRequest,
        handle: Option<HandleRef>,
    ) -> Result<(), CompoundError> {
        self.execute(call, request, handle, Capture::Discard).await?;
        Ok(())
    }

    /// Second and last attempt of a query, opening the path as a reparse
    /// point. Its failures are surfaced as they are.
    async fn retry_as_reparse(
        &self,
        call: &Call<'_>,
        request: OperationRequest,
    ) -> Result<Outcome, CompoundFailure> {
        let kind = request.operation.kind();
        metrics::inc_retries(kind);
        tracing::debug!(op = kind.as_str(), "retrying as reparse point");
        let options = request.create_options | CreateOptions::OPEN_REPARSE_POINT;
        let request = request.with_create_options(options);
        let handle = self.handles.readable(&request.path);
        self.attempt(call, &request, handle, Capture::Discard).await
    }
}

fn count_error<T>(kind: OperationKind, result: Result<T, CompoundError>) -> Result<T, CompoundError> {
    if result.is_err() {
        metrics::inc_errors(kind);
    }
    result
}

fn query_request(path: &str, operation: Operation) -> OperationRequest {
    OperationRequest::new(path, AccessMask::FILE_READ_ATTRIBUTES, operation)
}

fn all_info(outcome: Outcome) -> Result<PathInfo<FileAllInfo>, CompoundError> {
    let data = outcome
        .payload
        .into_all_info()
        .ok_or(DecodeError::MissingResponse(Phase::Operate))?;
    Ok(PathInfo {
        symlink_target: outcome.symlink_target,
        ..PathInfo::new(data)
    })
}

fn posix_info(outcome: Outcome) -> Result<PathInfo<PosixInfo>, CompoundError> {
    let data = outcome
        .payload
        .into_posix()
        .ok_or(DecodeError::MissingResponse(Phase::Operate))?;
    Ok(PathInfo {
        symlink_target: outcome.symlink_target,
        ..PathInfo::new(data)
    })
}
