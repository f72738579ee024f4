//! Shared utilities for integration tests.
//!
//! Provides a [`Harness`] wiring a [`CompoundEngine`] to a scripted
//! dispatcher, a recording request builder and a static handle table, plus
//! helpers for the response frames most tests need.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::sync::Arc;

use rstest::fixture;
use smb2_compound::{
    Call,
    CompoundEngine,
    FileAllInfo,
    FileId,
    HandleRef,
    MountContext,
    OpenFile,
    TracingConfig,
    TreeConnection,
    Xid,
};
use smb2_compound_testing::{RecordingBuilder, ScriptedDispatcher, StaticHandles, frames};

/// Name of the share every harness tree is connected to.
pub const TREE_NAME: &str = r"\\server\share";

/// An engine together with the fakes it talks to.
pub struct Harness {
    pub engine: CompoundEngine,
    pub dispatcher: ScriptedDispatcher,
    pub builder: RecordingBuilder,
    pub handles: StaticHandles,
    pub tree: TreeConnection,
    pub mount: MountContext,
}

impl Harness {
    /// A harness with no cached handles and the default mount.
    pub fn new() -> Self { Self::with(StaticHandles::new(), MountContext::default()) }

    /// A harness serving `handles` on a `mount`.
    #[expect(
        clippy::expect_used,
        reason = "a harness that cannot be built must abort the test immediately"
    )]
    pub fn with(handles: StaticHandles, mount: MountContext) -> Self {
        let dispatcher = ScriptedDispatcher::new();
        let builder = RecordingBuilder::new();
        let engine = CompoundEngine::builder()
            .request_builder(builder.clone())
            .dispatcher(dispatcher.clone())
            .handle_provider(handles.clone())
            .tracing_config(TracingConfig::default().with_all_timing(true))
            .build()
            .expect("engine has every component");
        Self {
            engine,
            dispatcher,
            builder,
            handles,
            tree: TreeConnection::new(TREE_NAME, 5, 0x1234),
            mount,
        }
    }

    /// Replace the tree connection.
    #[must_use]
    pub fn with_tree(mut self, tree: TreeConnection) -> Self {
        self.tree = tree;
        self
    }

    /// Per-call context on the harness tree and mount.
    pub fn call(&self) -> Call<'_> { Call::new(Xid(42), &self.tree, &self.mount) }
}

impl Default for Harness {
    fn default() -> Self { Self::new() }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn harness() -> Harness { Harness::new() }

/// Metadata returned by the scripted server for `name`.
pub fn sample_info(name: &str) -> FileAllInfo {
    FileAllInfo {
        creation_time: 132_000_000_000_000_000,
        last_write_time: 132_000_000_100_000_000,
        attributes: 0x20,
        end_of_file: 4096,
        allocation_size: 8192,
        number_of_links: 1,
        index_number: 77,
        file_name: name.to_owned(),
        ..FileAllInfo::default()
    }
}

/// A successful open, query and close answering with `info`.
pub fn query_reply(info: &FileAllInfo) -> Vec<Vec<u8>> {
    vec![
        frames::create_response(),
        frames::query_info_response(&frames::file_all_info(info)),
        frames::close_response(),
    ]
}

/// A successful open, set-info and close.
pub fn set_info_reply() -> Vec<Vec<u8>> {
    vec![
        frames::create_response(),
        frames::set_info_response(),
        frames::close_response(),
    ]
}

/// A successful open and close.
pub fn open_close_reply() -> Vec<Vec<u8>> {
    vec![frames::create_response(), frames::close_response()]
}

/// An open file and a reference to it, as a caller's handle table would
/// hold them.
pub fn open_handle(persistent: u64, volatile: u64) -> (Arc<OpenFile>, HandleRef) {
    let file = Arc::new(OpenFile::new(FileId::new(persistent, volatile)));
    let handle = HandleRef::new(Arc::clone(&file));
    (file, handle)
}
