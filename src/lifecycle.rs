//! Ownership of response buffers for the lifetime of one call.
//!
//! Responses move from the dispatcher into a [`ResponseSet`] positioned by
//! slot. From there every buffer leaves exactly once: it is released when the
//! set is dropped, or moved into [`Diagnostics`] for a caller that asked to
//! inspect a failure. Every early return in the engine converges on the drop.

use std::mem;

use crate::{
    compound::{CompoundBatch, Phase},
    dispatch::SubResponse,
    error::{DecodeError, StatusError},
};

const SLOTS: usize = 3;

/// Responses of one exchange, keyed by the slot they answer.
#[derive(Debug)]
pub(crate) struct ResponseSet {
    slots: [Option<SubResponse>; SLOTS],
    overflow: Vec<SubResponse>,
    sent: usize,
    received: usize,
}

impl ResponseSet {
    /// Position `responses` against the slots of `batch`.
    ///
    /// A caller-handle batch sends only its operate slot, so the first
    /// response lands in [`Phase::Operate`]. Responses beyond the batch are
    /// kept so they are released with the rest.
    pub(crate) fn collect(batch: &CompoundBatch, responses: Vec<SubResponse>) -> Self {
        let sent = batch.len();
        let received = responses.len();
        let mut slots: [Option<SubResponse>; SLOTS] = Default::default();
        let mut overflow = Vec::new();
        let mut phases = batch.phases();
        for response in responses {
            match phases.next() {
                Some(phase) => slots[phase.index()] = Some(response),
                None => overflow.push(response),
            }
        }
        Self {
            slots,
            overflow,
            sent,
            received,
        }
    }

    /// Check that one response arrived per sub-request.
    pub(crate) fn check_count(&self) -> Result<(), DecodeError> {
        if self.sent == self.received {
            Ok(())
        } else {
            Err(DecodeError::ResponseCount {
                sent: self.sent,
                received: self.received,
            })
        }
    }

    /// First non-success status in slot order.
    pub(crate) fn first_failure(&self) -> Option<StatusError> {
        [Phase::Open, Phase::Operate, Phase::Close]
            .into_iter()
            .find_map(|phase| {
                self.get(phase)
                    .filter(|response| !response.status().is_success())
                    .map(|response| StatusError {
                        phase,
                        command: response.command(),
                        status: response.status(),
                    })
            })
    }

    pub(crate) fn get(&self, phase: Phase) -> Option<&SubResponse> {
        self.slots[phase.index()].as_ref()
    }

    /// Move the slotted responses to the caller. Overflow responses are still
    /// released when `self` drops.
    pub(crate) fn into_diagnostics(mut self) -> Diagnostics {
        Diagnostics {
            slots: mem::take(&mut self.slots),
        }
    }

    fn release_all(&mut self) -> usize {
        self.slots
            .iter_mut()
            .flatten()
            .chain(self.overflow.iter_mut())
            .map(|response| response.buffer_mut().release_in_place())
            .filter(|owned| *owned)
            .count()
    }
}

impl Drop for ResponseSet {
    fn drop(&mut self) {
        let released = self.release_all();
        if released > 0 {
            tracing::trace!(released, "released response buffers");
        }
    }
}

/// Raw responses of a failed call, handed to the caller for inspection.
///
/// Slots are positional: the open response (if any) first, then the operate
/// and close responses. The buffers belong to the caller from here on and
/// are released when this value is dropped or [`Diagnostics::release`]d.
#[derive(Debug, Default)]
pub struct Diagnostics {
    slots: [Option<SubResponse>; SLOTS],
}

impl Diagnostics {
    /// Response to the slot `phase`, if one was received.
    #[must_use]
    pub fn get(&self, phase: Phase) -> Option<&SubResponse> { self.slots[phase.index()].as_ref() }

    /// Response to the open slot.
    #[must_use]
    pub fn open(&self) -> Option<&SubResponse> { self.get(Phase::Open) }

    /// Response to the operate slot.
    #[must_use]
    pub fn operate(&self) -> Option<&SubResponse> { self.get(Phase::Operate) }

    /// Response to the close slot.
    #[must_use]
    pub fn close(&self) -> Option<&SubResponse> { self.get(Phase::Close) }

    /// Number of slots holding a response.
    #[must_use]
    pub fn len(&self) -> usize { self.slots.iter().flatten().count() }

    /// Whether no response was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[cfg(test)]
    pub(crate) fn with_open(open: SubResponse) -> Self {
        let mut diagnostics = Self::default();
        diagnostics.slots[Phase::Open.index()] = Some(open);
        diagnostics
    }

    /// Release every captured buffer, returning how many were owned.
    pub fn release(mut self) -> usize {
        self.slots
            .iter_mut()
            .flatten()
            .map(|response| response.buffer_mut().release_in_place())
            .filter(|owned| *owned)
            .count()
    }
}
