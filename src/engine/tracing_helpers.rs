//! Tracing span and event helpers for compound operations.
//!
//! These helpers centralise span creation with dynamic level selection and
//! timing emission, keeping the instrumentation out of the engine's call
//! path.

use std::time::Instant;

use tracing::{Level, Span};

use super::tracing_config::TracingConfig;
use crate::{context::Call, operation::OperationKind};

/// Create a tracing span at a dynamically selected level.
///
/// Each branch calls the corresponding `tracing::<level>_span!` macro so the
/// span metadata is static per branch while the branch selection is dynamic.
macro_rules! dynamic_span {
    ($level:expr, $name:expr $(, $($field:tt)*)?) => {
        match $level {
            Level::ERROR => tracing::error_span!($name $(, $($field)*)?),
            Level::WARN  => tracing::warn_span!($name $(, $($field)*)?),
            Level::INFO  => tracing::info_span!($name $(, $($field)*)?),
            Level::DEBUG => tracing::debug_span!($name $(, $($field)*)?),
            Level::TRACE => tracing::trace_span!($name $(, $($field)*)?),
        }
    };
}

/// A span named after one operation kind, carrying the call's identifiers.
macro_rules! kind_span {
    ($level:expr, $name:literal, $call:expr, $path:expr) => {
        dynamic_span!(
            $level,
            $name,
            xid = $call.xid.0,
            session_id = $call.tree.session_id(),
            tree_id = $call.tree.tree_id(),
            path = $path,
            result = tracing::field::Empty
        )
    };
}

/// Create the span wrapping one compound operation.
///
/// The `result` field is recorded when the operation completes using
/// [`Span::record`].
#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion, five arms per operation kind"
)]
pub(crate) fn operation_span(
    config: &TracingConfig,
    kind: OperationKind,
    call: &Call<'_>,
    path: &str,
) -> Span {
    let level = config.level_for(kind);
    match kind {
        OperationKind::QueryInfo => kind_span!(level, "smb2.query_info", call, path),
        OperationKind::PosixQueryInfo => kind_span!(level, "smb2.posix_query_info", call, path),
        OperationKind::Delete => kind_span!(level, "smb2.delete", call, path),
        OperationKind::Mkdir => kind_span!(level, "smb2.mkdir", call, path),
        OperationKind::Rmdir => kind_span!(level, "smb2.rmdir", call, path),
        OperationKind::SetEndOfFile => kind_span!(level, "smb2.set_eof", call, path),
        OperationKind::SetBasicInfo => kind_span!(level, "smb2.set_info", call, path),
        OperationKind::Rename => kind_span!(level, "smb2.rename", call, path),
        OperationKind::HardLink => kind_span!(level, "smb2.hardlink", call, path),
    }
}

/// Record elapsed time if timing was enabled for this operation.
///
/// `start` is `None` when timing is disabled. When `Some`, an event is
/// emitted with the `elapsed_us` field at `DEBUG` level.
pub(crate) fn emit_timing_event(start: Option<Instant>) {
    if let Some(start) = start {
        let elapsed_us = start.elapsed().as_micros();
        tracing::debug!(elapsed_us = elapsed_us, "operation.timing");
    }
}
