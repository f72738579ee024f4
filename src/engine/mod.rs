//! The compound engine: assemble, dispatch, decode, translate.
//!
//! [`CompoundEngine::execute`] runs one operation as a single compound
//! exchange. The per-kind entry points in this module build the request for
//! their kind, pick up any handle the caller already holds and apply the
//! symlink retry and DFS translation where they belong.

use std::{fmt, sync::Arc, time::Instant};

use tracing::Instrument;

mod builder;
mod outcome;
mod path_ops;
mod tracing_config;
mod tracing_helpers;

pub use builder::{CompoundEngineBuilder, EngineBuildError};
pub use outcome::{Capture, CompoundFailure, Outcome, PathInfo};
pub use tracing_config::TracingConfig;

use self::tracing_helpers::{emit_timing_event, operation_span};
use crate::{
    builder::RequestBuilder,
    compound::{CompoundBatch, Phase, assemble},
    context::Call,
    dispatch::{DispatchFailure, Dispatcher},
    error::CompoundError,
    handle::{HandleProvider, HandleRef},
    lifecycle::ResponseSet,
    metrics,
    operation::OperationKind,
    policy,
    request::OperationRequest,
};

/// Runs file operations as SMB2 compound exchanges.
///
/// The engine holds no per-call state; one instance may serve concurrent
/// calls on any number of trees.
pub struct CompoundEngine {
    pub(crate) builder: Arc<dyn RequestBuilder>,
    pub(crate) dispatcher: Arc<dyn Dispatcher>,
    pub(crate) handles: Arc<dyn HandleProvider>,
    pub(crate) tracing_config: TracingConfig,
}

impl fmt::Debug for CompoundEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundEngine")
            .field("tracing_config", &self.tracing_config)
            .finish_non_exhaustive()
    }
}

impl CompoundEngine {
    /// Start building an engine.
    #[must_use]
    pub fn builder() -> CompoundEngineBuilder { CompoundEngineBuilder::new() }

    /// Run `request` as one compound exchange.
    ///
    /// With `handle`, and when the operation can reuse it, only the operate
    /// slot is sent; the engine never closes the handle and drops its
    /// reference before returning. Otherwise the path is opened, operated on
    /// and closed within the exchange.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundFailure`] when assembly, the exchange, a status or
    /// decoding fails. Its diagnostics hold the raw responses only when
    /// `capture` is [`Capture::OnFailure`].
    pub async fn execute(
        &self,
        call: &Call<'_>,
        request: &OperationRequest,
        handle: Option<HandleRef>,
        capture: Capture,
    ) -> Result<Outcome, CompoundFailure> {
        let result = self.attempt(call, request, handle, capture).await;
        if result.is_err() {
            metrics::inc_errors(request.operation.kind());
        }
        result
    }

    /// One traced exchange. Failures are not counted here; callers that
    /// may retry count only their final result.
    pub(crate) async fn attempt(
        &self,
        call: &Call<'_>,
        request: &OperationRequest,
        handle: Option<HandleRef>,
        capture: Capture,
    ) -> Result<Outcome, CompoundFailure> {
        let kind = request.operation.kind();
        let span = operation_span(&self.tracing_config, kind, call, &request.path);
        let start = self.tracing_config.timing_for(kind).then(Instant::now);
        let result = self
            .run(call, request, handle, capture)
            .instrument(span.clone())
            .await;
        span.record("result", if result.is_ok() { "ok" } else { "err" });
        span.in_scope(|| emit_timing_event(start));
        result
    }

    async fn run(
        &self,
        call: &Call<'_>,
        request: &OperationRequest,
        handle: Option<HandleRef>,
        capture: Capture,
    ) -> Result<Outcome, CompoundFailure> {
        let kind = request.operation.kind();
        let batch = assemble(
            self.builder.as_ref(),
            request,
            handle.as_ref(),
            std::process::id(),
            call.mount,
        )
        .map_err(|error| CompoundFailure {
            error: error.into(),
            diagnostics: None,
        })?;
        let symlink_target = handle_symlink_target(kind, &batch, handle.as_ref());
        drop(handle);

        let flags = batch.send_flags(call.tree);
        tracing::trace!(
            slots = batch.len(),
            transform = flags.transform,
            create_close = flags.create_close,
            "sending compound"
        );
        metrics::inc_requests(kind);
        let responses = match self.dispatcher.send(call.tree, flags, batch.requests()).await {
            Ok(responses) => ResponseSet::collect(&batch, responses),
            Err(DispatchFailure { error, received }) => {
                policy::note_transport_failure(&error, call.tree);
                let responses = ResponseSet::collect(&batch, received);
                return Err(fail(error.into(), responses, capture));
            }
        };

        if let Err(error) = responses.check_count() {
            return Err(fail(error.into(), responses, capture));
        }
        if let Some(failure) = responses.first_failure() {
            let error = policy::translate_status(failure, call.tree);
            return Err(fail(error, responses, capture));
        }
        let decoded = request
            .operation
            .spec()
            .decode(responses.get(Phase::Operate));
        match decoded {
            Ok(payload) => {
                tracing::debug!("compound done");
                Ok(Outcome {
                    payload,
                    symlink_target,
                })
            }
            Err(error) => Err(fail(error.into(), responses, capture)),
        }
    }
}

fn fail(error: CompoundError, responses: ResponseSet, capture: Capture) -> CompoundFailure {
    tracing::debug!(%error, "compound failed");
    let diagnostics = match capture {
        Capture::OnFailure => Some(responses.into_diagnostics()),
        Capture::Discard => None,
    };
    CompoundFailure { error, diagnostics }
}

/// A query run over the caller's handle reports the symlink target the
/// handle recorded when it was opened.
fn handle_symlink_target(
    kind: OperationKind,
    batch: &CompoundBatch,
    handle: Option<&HandleRef>,
) -> Option<String> {
    if !kind.is_query() || batch.opens_handle() {
        return None;
    }
    handle.and_then(HandleRef::symlink_target).map(str::to_owned)
}
