//! Request builders and a dispatcher used by unit tests.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    builder::{CloseArgs, OpenArgs, QueryInfoArgs, RequestBuilder, SetInfoArgs, SubRequest},
    context::TreeConnection,
    dispatch::{DispatchFailure, Dispatcher, SendFlags, SubResponse},
    error::BuildError,
    header::Command,
    status::NtStatus,
};

/// Encodes every request as its two-byte command code.
pub struct PlainBuilder;

impl RequestBuilder for PlainBuilder {
    fn open(&self, _args: &OpenArgs) -> Result<Bytes, BuildError> { Ok(frame(Command::Create)) }

    fn query_info(&self, _args: &QueryInfoArgs) -> Result<Bytes, BuildError> {
        Ok(frame(Command::QueryInfo))
    }

    fn set_info(&self, _args: &SetInfoArgs) -> Result<Bytes, BuildError> {
        Ok(frame(Command::SetInfo))
    }

    fn close(&self, _args: &CloseArgs) -> Result<Bytes, BuildError> { Ok(frame(Command::Close)) }
}

/// Rejects requests for one command and encodes the rest like
/// [`PlainBuilder`].
pub struct RejectingBuilder(pub Command);

impl RejectingBuilder {
    fn check(&self, command: Command) -> Result<Bytes, BuildError> {
        if command == self.0 {
            return Err(BuildError::Rejected {
                command,
                reason: "rejected by test".to_owned(),
            });
        }
        Ok(frame(command))
    }
}

impl RequestBuilder for RejectingBuilder {
    fn open(&self, _args: &OpenArgs) -> Result<Bytes, BuildError> { self.check(Command::Create) }

    fn query_info(&self, _args: &QueryInfoArgs) -> Result<Bytes, BuildError> {
        self.check(Command::QueryInfo)
    }

    fn set_info(&self, _args: &SetInfoArgs) -> Result<Bytes, BuildError> {
        self.check(Command::SetInfo)
    }

    fn close(&self, _args: &CloseArgs) -> Result<Bytes, BuildError> { self.check(Command::Close) }
}

fn frame(command: Command) -> Bytes { Bytes::copy_from_slice(&command.code().to_le_bytes()) }

/// Answers every sub-request with a bufferless response for its command,
/// carrying `status` or success.
#[derive(Default)]
pub struct EchoDispatcher {
    pub status: Option<NtStatus>,
}

#[async_trait]
impl Dispatcher for EchoDispatcher {
    async fn send(
        &self,
        _tree: &TreeConnection,
        _flags: SendFlags,
        requests: &[SubRequest],
    ) -> Result<Vec<SubResponse>, DispatchFailure> {
        let status = self.status.unwrap_or(NtStatus::SUCCESS);
        Ok(requests
            .iter()
            .map(|request| SubResponse::without_buffer(request.command(), status))
            .collect())
    }
}
