//! A handle provider backed by fixed tables.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use smb2_compound::{CachedRoot, FindWritable, HandleProvider, HandleRef};

#[derive(Default)]
struct State {
    readable: HashMap<String, HandleRef>,
    writable: HashMap<String, HandleRef>,
    cached_root: Option<CachedRoot>,
    writable_lookups: Vec<(String, FindWritable)>,
    dropped_dirs: Vec<String>,
}

/// Hands out preconfigured handles and records lookups.
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct StaticHandles {
    state: Arc<Mutex<State>>,
}

impl StaticHandles {
    /// A provider with no handles.
    pub fn new() -> Self { Self::default() }

    /// Serve `handle` for read lookups of `path`.
    #[must_use]
    pub fn with_readable(self, path: &str, handle: HandleRef) -> Self {
        self.lock().readable.insert(path.to_owned(), handle);
        self
    }

    /// Serve `handle` for write lookups of `path`.
    #[must_use]
    pub fn with_writable(self, path: &str, handle: HandleRef) -> Self {
        self.lock().writable.insert(path.to_owned(), handle);
        self
    }

    /// Serve `root` as the cached root handle.
    #[must_use]
    pub fn with_cached_root(self, root: CachedRoot) -> Self {
        self.lock().cached_root = Some(root);
        self
    }

    /// Write lookups made so far.
    pub fn writable_lookups(&self) -> Vec<(String, FindWritable)> {
        self.lock().writable_lookups.clone()
    }

    /// Paths whose cached directory handle was dropped.
    pub fn dropped_dirs(&self) -> Vec<String> { self.lock().dropped_dirs.clone() }

    fn lock(&self) -> MutexGuard<'_, State> { self.state.lock().expect("handle state poisoned") }
}

impl HandleProvider for StaticHandles {
    fn readable(&self, path: &str) -> Option<HandleRef> { self.lock().readable.get(path).cloned() }

    fn writable(&self, path: &str, find: FindWritable) -> Option<HandleRef> {
        let mut state = self.lock();
        state.writable_lookups.push((path.to_owned(), find));
        state.writable.get(path).cloned()
    }

    fn cached_root(&self) -> Option<CachedRoot> { self.lock().cached_root.clone() }

    fn drop_cached_dir(&self, path: &str) { self.lock().dropped_dirs.push(path.to_owned()); }
}
