//! A dispatcher that answers from a script and records what it was sent.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use smb2_compound::{
    BufferOwnership,
    Command,
    DispatchFailure,
    Dispatcher,
    SendFlags,
    SubRequest,
    SubResponse,
    TransportError,
    TreeConnection,
};

use crate::tracker::ReleaseTracker;

/// One scripted answer.
#[derive(Clone, Debug)]
pub enum Exchange {
    /// Return these response frames, one per sub-request.
    Reply(Vec<Vec<u8>>),
    /// Fail the exchange after delivering `received`.
    Fail {
        error: TransportError,
        received: Vec<Vec<u8>>,
    },
}

/// A batch the engine asked to send.
#[derive(Clone, Debug)]
pub struct SentBatch {
    pub flags: SendFlags,
    pub requests: Vec<SubRequest>,
}

impl SentBatch {
    /// Commands of the batch, in send order.
    pub fn commands(&self) -> Vec<Command> { self.requests.iter().map(SubRequest::command).collect() }

    /// Number of sub-requests sent as `command`.
    pub fn count(&self, command: Command) -> usize {
        self.requests
            .iter()
            .filter(|request| request.command() == command)
            .count()
    }
}

#[derive(Default)]
struct Inner {
    script: Mutex<VecDeque<Exchange>>,
    sent: Mutex<Vec<SentBatch>>,
    tracker: ReleaseTracker,
}

/// Answers exchanges in script order. Every response buffer is tracked and
/// tagged [`BufferOwnership::NeedsFree`].
///
/// Clones share the script and the record.
#[derive(Clone, Default)]
pub struct ScriptedDispatcher {
    inner: Arc<Inner>,
}

impl ScriptedDispatcher {
    /// A dispatcher with an empty script.
    pub fn new() -> Self { Self::default() }

    /// Queue a successful exchange answered with `frames`.
    pub fn reply(&self, frames: Vec<Vec<u8>>) -> &Self { self.push(Exchange::Reply(frames)) }

    /// Queue a failed exchange that delivered `received` first.
    pub fn fail(&self, error: TransportError, received: Vec<Vec<u8>>) -> &Self {
        self.push(Exchange::Fail { error, received })
    }

    /// Batches sent so far.
    pub fn sent(&self) -> Vec<SentBatch> { self.inner.sent.lock().expect("sent poisoned").clone() }

    /// Tracker of every response buffer handed out.
    pub fn tracker(&self) -> &ReleaseTracker { &self.inner.tracker }

    fn push(&self, exchange: Exchange) -> &Self {
        self.inner
            .script
            .lock()
            .expect("script poisoned")
            .push_back(exchange);
        self
    }

    fn responses(&self, frames: Vec<Vec<u8>>) -> Vec<SubResponse> {
        frames
            .into_iter()
            .map(|frame| {
                SubResponse::from_frame(self.inner.tracker.track(frame), BufferOwnership::NeedsFree)
                    .expect("scripted frame carries a header")
            })
            .collect()
    }
}

#[async_trait]
impl Dispatcher for ScriptedDispatcher {
    async fn send(
        &self,
        _tree: &TreeConnection,
        flags: SendFlags,
        requests: &[SubRequest],
    ) -> Result<Vec<SubResponse>, DispatchFailure> {
        self.inner
            .sent
            .lock()
            .expect("sent poisoned")
            .push(SentBatch {
                flags,
                requests: requests.to_vec(),
            });
        let next = self.inner.script.lock().expect("script poisoned").pop_front();
        match next {
            Some(Exchange::Reply(frames)) => Ok(self.responses(frames)),
            Some(Exchange::Fail { error, received }) => Err(DispatchFailure {
                error,
                received: self.responses(received),
            }),
            None => Err(TransportError::new("script exhausted").into()),
        }
    }
}
