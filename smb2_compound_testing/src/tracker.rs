//! Response buffers that report when they are freed.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use bytes::Bytes;

/// Counts buffers handed out and buffers whose last reference was dropped.
#[derive(Clone, Debug, Default)]
pub struct ReleaseTracker {
    issued: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl ReleaseTracker {
    /// Create a tracker with no buffers outstanding.
    pub fn new() -> Self { Self::default() }

    /// Wrap `data` so that dropping its last [`Bytes`] reference is counted.
    pub fn track(&self, data: Vec<u8>) -> Bytes {
        self.issued.fetch_add(1, Ordering::SeqCst);
        Bytes::from_owner(Tracked {
            data,
            released: Arc::clone(&self.released),
        })
    }

    /// Buffers handed out so far.
    pub fn issued(&self) -> usize { self.issued.load(Ordering::SeqCst) }

    /// Buffers freed so far.
    pub fn released(&self) -> usize { self.released.load(Ordering::SeqCst) }

    /// Buffers handed out and not yet freed.
    pub fn outstanding(&self) -> usize { self.issued() - self.released() }
}

struct Tracked {
    data: Vec<u8>,
    released: Arc<AtomicUsize>,
}

impl AsRef<[u8]> for Tracked {
    fn as_ref(&self) -> &[u8] { &self.data }
}

impl Drop for Tracked {
    fn drop(&mut self) { self.released.fetch_add(1, Ordering::SeqCst); }
}
