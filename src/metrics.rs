//! Metric helpers for `smb2_compound`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::operation::OperationKind;

/// Name of the counter tracking compound exchanges sent.
pub const REQUESTS_TOTAL: &str = "smb2_compound_requests_total";
/// Name of the counter tracking failed operations.
pub const ERRORS_TOTAL: &str = "smb2_compound_errors_total";
/// Name of the counter tracking reparse-point retries.
pub const RETRIES_TOTAL: &str = "smb2_compound_retries_total";
/// Name of the counter tracking trees marked for reconnection.
pub const RECONNECTS_TOTAL: &str = "smb2_compound_reconnects_total";

/// Record a compound exchange for `kind`.
pub fn inc_requests(kind: OperationKind) {
    #[cfg(feature = "metrics")]
    counter!(REQUESTS_TOTAL, "op" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a failed operation of `kind`.
pub fn inc_errors(kind: OperationKind) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "op" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a reparse-point retry of `kind`.
pub fn inc_retries(kind: OperationKind) {
    #[cfg(feature = "metrics")]
    counter!(RETRIES_TOTAL, "op" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a tree newly marked for reconnection.
pub fn inc_reconnects() {
    #[cfg(feature = "metrics")]
    counter!(RECONNECTS_TOTAL).increment(1);
}
