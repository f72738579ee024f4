//! A request builder that records what it was asked to encode.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use smb2_compound::{
    BuildError,
    CloseArgs,
    Command,
    OpenArgs,
    QueryInfoArgs,
    RequestBuilder,
    SetInfoArgs,
    SubRequestBody,
};

#[derive(Default)]
struct State {
    built: Vec<SubRequestBody>,
    reject: Option<Command>,
}

/// Encodes each request as its two-byte command code and keeps a copy of
/// its parameters.
///
/// Clones share state, so a test can keep one while the engine owns another.
#[derive(Clone, Default)]
pub struct RecordingBuilder {
    state: Arc<Mutex<State>>,
}

impl RecordingBuilder {
    /// A builder that accepts every request.
    pub fn new() -> Self { Self::default() }

    /// A builder that rejects every request for `command`.
    pub fn rejecting(command: Command) -> Self {
        let builder = Self::new();
        builder.lock().reject = Some(command);
        builder
    }

    /// Parameters of every request encoded so far, in order.
    pub fn built(&self) -> Vec<SubRequestBody> { self.lock().built.clone() }

    fn lock(&self) -> MutexGuard<'_, State> { self.state.lock().expect("builder state poisoned") }

    fn record(&self, body: SubRequestBody) -> Result<Bytes, BuildError> {
        let command = body.command();
        let mut state = self.lock();
        if state.reject == Some(command) {
            return Err(BuildError::Rejected {
                command,
                reason: "rejected by test builder".to_owned(),
            });
        }
        state.built.push(body);
        Ok(Bytes::copy_from_slice(&command.code().to_le_bytes()))
    }
}

impl RequestBuilder for RecordingBuilder {
    fn open(&self, args: &OpenArgs) -> Result<Bytes, BuildError> {
        self.record(SubRequestBody::Open(args.clone()))
    }

    fn query_info(&self, args: &QueryInfoArgs) -> Result<Bytes, BuildError> {
        self.record(SubRequestBody::QueryInfo(*args))
    }

    fn set_info(&self, args: &SetInfoArgs) -> Result<Bytes, BuildError> {
        self.record(SubRequestBody::SetInfo(args.clone()))
    }

    fn close(&self, args: &CloseArgs) -> Result<Bytes, BuildError> {
        self.record(SubRequestBody::Close(*args))
    }
}
