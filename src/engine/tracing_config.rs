//! Tracing configuration for compound operations.
//!
//! [`TracingConfig`] controls the level of the span each operation emits and
//! whether an elapsed-time event is recorded when it completes.

use tracing::Level;

use crate::operation::OperationKind;

/// Controls tracing span levels and per-operation timing.
///
/// By default, path queries emit spans at `DEBUG` level and state-changing
/// operations (create, delete, rename, set-info) at `INFO` level. Timing is
/// disabled for all operations by default.
///
/// Spans are always created at the configured level. When no `tracing`
/// subscriber is installed, span creation is a no-op. When timing is enabled
/// for an operation, an event recording `elapsed_us` is emitted when the
/// operation completes.
///
/// # Examples
///
/// ```
/// use smb2_compound::TracingConfig;
/// use tracing::Level;
///
/// let config = TracingConfig::default()
///     .with_query_level(Level::TRACE)
///     .with_modify_timing(true);
/// let _ = config;
/// ```
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub(crate) query_level: Level,
    pub(crate) modify_level: Level,
    pub(crate) query_timing: bool,
    pub(crate) modify_timing: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            query_level: Level::DEBUG,
            modify_level: Level::INFO,
            query_timing: false,
            modify_timing: false,
        }
    }
}

impl TracingConfig {
    /// Set the tracing level for path queries.
    #[must_use]
    pub fn with_query_level(mut self, level: Level) -> Self {
        self.query_level = level;
        self
    }

    /// Enable or disable timing for path queries.
    #[must_use]
    pub fn with_query_timing(mut self, enabled: bool) -> Self {
        self.query_timing = enabled;
        self
    }

    /// Set the tracing level for state-changing operations.
    #[must_use]
    pub fn with_modify_level(mut self, level: Level) -> Self {
        self.modify_level = level;
        self
    }

    /// Enable or disable timing for state-changing operations.
    ///
    /// # Examples
    ///
    /// ```
    /// use smb2_compound::TracingConfig;
    ///
    /// let config = TracingConfig::default().with_modify_timing(true);
    /// let _ = config;
    /// ```
    #[must_use]
    pub fn with_modify_timing(mut self, enabled: bool) -> Self {
        self.modify_timing = enabled;
        self
    }

    /// Set the tracing level for all operations at once.
    #[must_use]
    pub fn with_all_levels(mut self, level: Level) -> Self {
        self.query_level = level;
        self.modify_level = level;
        self
    }

    /// Enable or disable timing for all operations at once.
    #[must_use]
    pub fn with_all_timing(mut self, enabled: bool) -> Self {
        self.query_timing = enabled;
        self.modify_timing = enabled;
        self
    }

    pub(crate) fn level_for(&self, kind: OperationKind) -> Level {
        if kind.is_query() { self.query_level } else { self.modify_level }
    }

    pub(crate) fn timing_for(&self, kind: OperationKind) -> bool {
        if kind.is_query() { self.query_timing } else { self.modify_timing }
    }
}
