//! Builder for [`CompoundEngine`].

use std::sync::Arc;

use super::{CompoundEngine, TracingConfig};
use crate::{
    builder::RequestBuilder,
    dispatch::Dispatcher,
    handle::{HandleProvider, NoCachedHandles},
};

/// Errors raised while building a [`CompoundEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineBuildError {
    /// No sub-request builder was supplied.
    #[error("no request builder configured")]
    MissingRequestBuilder,
    /// No dispatcher was supplied.
    #[error("no dispatcher configured")]
    MissingDispatcher,
}

/// Builder for [`CompoundEngine`].
///
/// A request builder and a dispatcher are required. The handle provider
/// defaults to [`NoCachedHandles`] and tracing to [`TracingConfig::default`].
///
/// # Examples
///
/// ```
/// use smb2_compound::{CompoundEngineBuilder, EngineBuildError};
///
/// let err = CompoundEngineBuilder::new().build().unwrap_err();
/// assert_eq!(err, EngineBuildError::MissingRequestBuilder);
/// ```
#[derive(Default)]
pub struct CompoundEngineBuilder {
    request_builder: Option<Arc<dyn RequestBuilder>>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    handles: Option<Arc<dyn HandleProvider>>,
    tracing_config: TracingConfig,
}

impl CompoundEngineBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Set the encoder for individual sub-requests.
    #[must_use]
    pub fn request_builder(mut self, builder: impl RequestBuilder + 'static) -> Self {
        self.request_builder = Some(Arc::new(builder));
        self
    }

    /// Set the transport that sends batches.
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: impl Dispatcher + 'static) -> Self {
        self.dispatcher = Some(Arc::new(dispatcher));
        self
    }

    /// Set the source of handles the caller already holds open.
    #[must_use]
    pub fn handle_provider(mut self, handles: impl HandleProvider + 'static) -> Self {
        self.handles = Some(Arc::new(handles));
        self
    }

    /// Configure tracing span levels and timing.
    #[must_use]
    pub fn tracing_config(mut self, config: TracingConfig) -> Self {
        self.tracing_config = config;
        self
    }

    /// Build the engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineBuildError`] if a required collaborator is missing.
    pub fn build(self) -> Result<CompoundEngine, EngineBuildError> {
        let builder = self
            .request_builder
            .ok_or(EngineBuildError::MissingRequestBuilder)?;
        let dispatcher = self.dispatcher.ok_or(EngineBuildError::MissingDispatcher)?;
        let handles = self.handles.unwrap_or_else(|| Arc::new(NoCachedHandles));
        Ok(CompoundEngine {
            builder,
            dispatcher,
            handles,
            tracing_config: self.tracing_config,
        })
    }
}
