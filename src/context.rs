//! Per-call context: transaction id, tree connection and mount policy.

use std::sync::atomic::{AtomicBool, Ordering};

/// Transaction identifier used to correlate log records of one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Xid(pub u32);

/// A connected share.
///
/// Compound operations read its identifiers and encryption requirement and
/// may flag it for reconnection when the server reports the share gone.
#[derive(Debug)]
pub struct TreeConnection {
    tree_name: String,
    tree_id: u32,
    session_id: u64,
    encrypt: bool,
    need_reconnect: AtomicBool,
}

impl TreeConnection {
    /// Describe a tree connection.
    #[must_use]
    pub fn new(tree_name: impl Into<String>, tree_id: u32, session_id: u64) -> Self {
        Self {
            tree_name: tree_name.into(),
            tree_id,
            session_id,
            encrypt: false,
            need_reconnect: AtomicBool::new(false),
        }
    }

    /// Require every exchange on this tree to be encrypted.
    #[must_use]
    pub fn with_encryption(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// UNC name of the share, e.g. `\\server\share`.
    #[must_use]
    pub fn tree_name(&self) -> &str { &self.tree_name }

    /// Server-assigned tree id.
    #[must_use]
    pub fn tree_id(&self) -> u32 { self.tree_id }

    /// Session the tree belongs to.
    #[must_use]
    pub fn session_id(&self) -> u64 { self.session_id }

    /// Whether requests must be sent with a transform header.
    #[must_use]
    pub fn encryption_required(&self) -> bool { self.encrypt }

    /// Whether the tree has been flagged for reconnection.
    #[must_use]
    pub fn needs_reconnect(&self) -> bool { self.need_reconnect.load(Ordering::Acquire) }

    /// Flag the tree for reconnection.
    ///
    /// Returns `true` only for the call that changed the flag.
    pub fn mark_need_reconnect(&self) -> bool { !self.need_reconnect.swap(true, Ordering::AcqRel) }

    /// Clear the flag after the owner has reconnected.
    pub fn clear_need_reconnect(&self) { self.need_reconnect.store(false, Ordering::Release); }
}

/// Mount-level policy consulted by compound operations.
#[expect(
    clippy::struct_excessive_bools,
    reason = "four independent mount switches"
)]
#[derive(Clone, Debug)]
pub struct MountContext {
    pub(crate) no_dfs: bool,
    pub(crate) dfs_upcall: bool,
    pub(crate) backup_intent: bool,
    pub(crate) posix_paths: bool,
}

impl Default for MountContext {
    fn default() -> Self {
        Self {
            no_dfs: false,
            dfs_upcall: true,
            backup_intent: false,
            posix_paths: false,
        }
    }
}

impl MountContext {
    /// Disable DFS for this mount; referrals then surface as not-supported.
    #[must_use]
    pub fn with_no_dfs(mut self, no_dfs: bool) -> Self {
        self.no_dfs = no_dfs;
        self
    }

    /// Enable or disable DFS referral handling altogether.
    ///
    /// When disabled, neither the name-invalid remapping nor the no-DFS
    /// downgrade is applied.
    #[must_use]
    pub fn with_dfs_upcall(mut self, enabled: bool) -> Self {
        self.dfs_upcall = enabled;
        self
    }

    /// Open files with backup intent.
    #[must_use]
    pub fn with_backup_intent(mut self, enabled: bool) -> Self {
        self.backup_intent = enabled;
        self
    }

    /// Keep `/` as the path separator instead of converting to `\`.
    #[must_use]
    pub fn with_posix_paths(mut self, enabled: bool) -> Self {
        self.posix_paths = enabled;
        self
    }

    /// Whether DFS is disabled for this mount.
    #[must_use]
    pub fn no_dfs(&self) -> bool { self.no_dfs }

    /// Whether DFS referral handling is enabled.
    #[must_use]
    pub fn dfs_upcall(&self) -> bool { self.dfs_upcall }
}

/// Everything a single compound call needs from its caller.
#[derive(Clone, Copy, Debug)]
pub struct Call<'a> {
    /// Transaction id of the call.
    pub xid: Xid,
    /// Tree the call operates on.
    pub tree: &'a TreeConnection,
    /// Mount policy.
    pub mount: &'a MountContext,
}

impl<'a> Call<'a> {
    /// Bundle the per-call context.
    #[must_use]
    pub fn new(xid: Xid, tree: &'a TreeConnection, mount: &'a MountContext) -> Self {
        Self { xid, tree, mount }
    }
}

#[cfg(test)]
mod tests {
    use super::TreeConnection;

    #[test]
    fn reconnect_flag_reports_first_transition_only() {
        let tree = TreeConnection::new(r"\\srv\share", 7, 1);
        assert!(!tree.needs_reconnect());
        assert!(tree.mark_need_reconnect());
        assert!(!tree.mark_need_reconnect());
        assert!(tree.needs_reconnect());
        tree.clear_need_reconnect();
        assert!(tree.mark_need_reconnect());
    }
}
