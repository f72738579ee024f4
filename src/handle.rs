//! Open-handle identifiers and the provider of already-open handles.
//!
//! A handle obtained from a [`HandleProvider`] is lent to one call. The engine
//! sends operations against it but never closes it; the reference is dropped
//! when the call returns, whatever the outcome.

use std::sync::Arc;

use crate::info::FileAllInfo;

/// Server-assigned identifier of an open file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId {
    /// Identifier that survives reconnects.
    pub persistent: u64,
    /// Identifier valid for the current session.
    pub volatile: u64,
}

impl FileId {
    /// Placeholder addressing the handle opened earlier in the same batch.
    pub const COMPOUND: Self = Self {
        persistent: u64::MAX,
        volatile: u64::MAX,
    };

    /// Construct a file id.
    #[must_use]
    pub const fn new(persistent: u64, volatile: u64) -> Self { Self { persistent, volatile } }

    /// `true` for the related-request placeholder.
    #[must_use]
    pub fn is_compound(self) -> bool { self == Self::COMPOUND }
}

/// An open file tracked by the caller's handle table.
#[derive(Debug)]
pub struct OpenFile {
    /// Identifier of the open.
    pub fid: FileId,
    /// Target recorded when the handle was opened on a symlink.
    pub symlink_target: Option<String>,
}

impl OpenFile {
    /// Describe an open file without a symlink target.
    #[must_use]
    pub fn new(fid: FileId) -> Self {
        Self {
            fid,
            symlink_target: None,
        }
    }

    /// Record the symlink target of this open.
    #[must_use]
    pub fn with_symlink_target(mut self, target: impl Into<String>) -> Self {
        self.symlink_target = Some(target.into());
        self
    }
}

/// A counted reference to an [`OpenFile`], lent to one call.
///
/// Dropping the reference is the "put" that returns it to the table.
#[derive(Clone, Debug)]
pub struct HandleRef(Arc<OpenFile>);

impl HandleRef {
    /// Wrap a shared open file.
    #[must_use]
    pub fn new(file: Arc<OpenFile>) -> Self { Self(file) }

    /// Identifier to address operations to.
    #[must_use]
    pub fn file_id(&self) -> FileId { self.0.fid }

    /// Symlink target recorded on the open, if any.
    #[must_use]
    pub fn symlink_target(&self) -> Option<&str> { self.0.symlink_target.as_deref() }
}

/// Which writable handle the caller's table should look for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FindWritable {
    /// Any handle opened for writing.
    Any,
    /// A writable handle that was also opened with `DELETE` access.
    WithDelete,
}

/// The cached handle for a share root.
#[derive(Clone, Debug)]
pub struct CachedRoot {
    /// Handle to the root directory.
    pub handle: HandleRef,
    /// Metadata cached when the root was opened, if still valid.
    pub file_all_info: Option<FileAllInfo>,
}

/// Source of handles the caller already holds open.
///
/// Implementations own the handle table and its reference counting; the
/// engine only borrows references for the duration of a call.
pub trait HandleProvider: Send + Sync {
    /// An open handle with read access to `path`, if one exists.
    fn readable(&self, path: &str) -> Option<HandleRef>;

    /// An open handle with write access to `path`, if one exists.
    fn writable(&self, path: &str, find: FindWritable) -> Option<HandleRef>;

    /// The cached root handle, used when querying the empty path.
    fn cached_root(&self) -> Option<CachedRoot> { None }

    /// Forget any cached directory handle for `path` before it is removed or
    /// renamed.
    fn drop_cached_dir(&self, _path: &str) {}
}

/// A provider that never has an open handle.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCachedHandles;

impl HandleProvider for NoCachedHandles {
    fn readable(&self, _path: &str) -> Option<HandleRef> { None }

    fn writable(&self, _path: &str, _find: FindWritable) -> Option<HandleRef> { None }
}
