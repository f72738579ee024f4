//! Utilities for driving a [`CompoundEngine`](smb2_compound::CompoundEngine)
//! against scripted servers during tests.
//!
//! The scripted dispatcher answers each exchange with prepared response
//! frames and records every batch it was asked to send. Response buffers are
//! handed out through a [`ReleaseTracker`] so tests can assert that each one
//! was released exactly once.
//!
//! ```rust
//! use smb2_compound::{CompoundEngine, NtStatus};
//! use smb2_compound_testing::{RecordingBuilder, ScriptedDispatcher, frames};
//!
//! let dispatcher = ScriptedDispatcher::new();
//! dispatcher.reply(vec![frames::create_response(), frames::close_response()]);
//! let engine = CompoundEngine::builder()
//!     .request_builder(RecordingBuilder::new())
//!     .dispatcher(dispatcher.clone())
//!     .build()
//!     .unwrap();
//! # let _ = (engine, NtStatus::SUCCESS);
//! ```

pub mod builder;
pub mod dispatcher;
pub mod frames;
pub mod handles;
pub mod logging;
pub mod metrics;
pub mod tracker;

pub use builder::RecordingBuilder;
pub use dispatcher::{Exchange, ScriptedDispatcher, SentBatch};
pub use handles::StaticHandles;
pub use logging::{LoggerHandle, logger};
pub use tracker::ReleaseTracker;
