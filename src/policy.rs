//! Retry and error-translation policy.
//!
//! Failing statuses are translated here before they reach the caller. Three
//! cases are special: an open that stopped on a symbolic link (retried once by
//! the query entry points), a DFS referral (including the server quirk of
//! answering with a name-invalid status instead), and a share that was
//! deleted under the tree connection (flagged for reconnect, never retried).

use crate::{
    compound::Phase,
    context::{MountContext, TreeConnection},
    decode::parse_symlink_response,
    error::{CompoundError, DecodeError, ErrorCode, StatusError, TransportError},
    header::Command,
    lifecycle::Diagnostics,
    metrics,
    status::{NtStatus, StatusClass},
};

/// Translate the first failing status of an exchange.
///
/// `NETWORK_NAME_DELETED` marks `tree` for reconnection and becomes
/// [`CompoundError::ShareChanged`] with the status unmodified.
/// `PATH_NOT_COVERED` becomes [`CompoundError::Referral`] whatever the mount.
/// Everything else is surfaced as a [`StatusError`].
pub(crate) fn translate_status(failure: StatusError, tree: &TreeConnection) -> CompoundError {
    match failure.class() {
        StatusClass::ShareChanged => {
            mark_share_changed(tree);
            CompoundError::ShareChanged {
                status: failure.status,
            }
        }
        StatusClass::Referral => CompoundError::Referral,
        StatusClass::Reparse | StatusClass::NameInvalid | StatusClass::Other => {
            CompoundError::Status(failure)
        }
    }
}

/// Note a transport failure; one that requires reconnecting marks `tree`.
pub(crate) fn note_transport_failure(error: &TransportError, tree: &TreeConnection) {
    if error.reconnect_required && tree.mark_need_reconnect() {
        metrics::inc_reconnects();
        tracing::debug!(tree = tree.tree_name(), "transport requested reconnect");
    }
}

/// Apply the DFS name-invalid quirk to a failed path query.
///
/// Some servers answer a query on a DFS link whose namespace name holds
/// non-ASCII characters with `OBJECT_NAME_INVALID` on the open. When DFS
/// upcalls are enabled that status is read as a referral.
///
/// This is the only place a referral on a mount with DFS disabled becomes
/// [`CompoundError::NotSupported`]; other operations report the referral.
pub(crate) fn remap_referral(
    error: CompoundError,
    open_status: Option<NtStatus>,
    mount: &MountContext,
) -> CompoundError {
    match error {
        CompoundError::Referral => referral(mount),
        _ if mount.dfs_upcall() && open_status == Some(NtStatus::OBJECT_NAME_INVALID) => {
            tracing::debug!("name-invalid on open treated as a referral");
            referral(mount)
        }
        error => error,
    }
}

/// The symlink target of an open that stopped on a symbolic link.
///
/// Returns `None` unless `error` is the open's `STOPPED_ON_SYMLINK` status
/// and the captured open response is the CREATE carrying it. Transport and
/// decode failures never qualify, whatever was delivered before them.
pub(crate) fn symlink_stop(
    error: &CompoundError,
    diagnostics: &Diagnostics,
) -> Option<Result<String, DecodeError>> {
    let stopped = matches!(
        error,
        CompoundError::Status(StatusError {
            phase: Phase::Open,
            status: NtStatus::STOPPED_ON_SYMLINK,
            ..
        })
    );
    if !stopped {
        return None;
    }
    let open = diagnostics.open()?;
    if open.command() != Command::Create || open.status() != NtStatus::STOPPED_ON_SYMLINK {
        return None;
    }
    Some(
        open.frame()
            .ok_or(DecodeError::MissingResponse(Phase::Open))
            .and_then(parse_symlink_response),
    )
}

/// Whether a posix query failure should be retried as a reparse point.
pub(crate) fn is_not_supported(error: &CompoundError) -> bool {
    error.code() == ErrorCode::NotSupported
}

fn referral(mount: &MountContext) -> CompoundError {
    if mount.no_dfs() {
        CompoundError::NotSupported
    } else {
        CompoundError::Referral
    }
}

fn mark_share_changed(tree: &TreeConnection) {
    if tree.mark_need_reconnect() {
        metrics::inc_reconnects();
        log::warn!("server share {} deleted", tree.tree_name());
    }
}
