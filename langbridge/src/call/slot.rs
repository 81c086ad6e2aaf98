//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use crate::Timeout;
use crate::call::CallError;
use crate::envelope::{CorrelationId, Envelope};
use parking_lot::{Condvar, Mutex};

/// What a timed-out wait does to a slot that is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnTimeout {
    /// Leave the slot pending; a later reply can still resolve it.
    KeepPending,
    /// Fail the slot with the timeout so that a later reply is discarded.
    Abandon,
}

#[derive(Debug)]
enum SlotState {
    Pending,
    Resolved(Envelope),
    Failed(CallError),
    Cancelled,
}

/// One outstanding request awaiting its reply.
///
/// A slot leaves `Pending` exactly once: through a reply, a failure, a
/// cancellation or an abandoning timeout, whichever takes the slot's lock
/// first. Every later attempt reports `false` and changes nothing, and every
/// later wait observes the same outcome.
#[derive(Debug)]
pub struct CallSlot {
    id: CorrelationId,
    state: Mutex<SlotState>,
    settled: Condvar,
}

impl CallSlot {
    pub(crate) fn new(id: CorrelationId) -> Self {
        Self {
            id,
            state: Mutex::new(SlotState::Pending),
            settled: Condvar::new(),
        }
    }

    /// The correlation ID that links this slot to its reply.
    #[must_use]
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Stamps this slot's correlation ID into `envelope`.
    #[must_use]
    pub fn stamp(&self, envelope: Envelope) -> Envelope {
        envelope.with_correlation_id(self.id)
    }

    /// Returns `true` while no outcome has been decided.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Pending)
    }

    /// Resolves the slot with a reply. Returns `false` if it already settled.
    pub fn resolve(&self, reply: Envelope) -> bool {
        self.settle(SlotState::Resolved(reply))
    }

    /// Fails the slot. Returns `false` if it already settled.
    pub fn fail(&self, error: CallError) -> bool {
        self.settle(SlotState::Failed(error))
    }

    /// Cancels the slot. Returns `false` if it already settled.
    pub fn cancel(&self) -> bool {
        self.settle(SlotState::Cancelled)
    }

    fn settle(&self, outcome: SlotState) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, SlotState::Pending) {
            return false;
        }
        *state = outcome;
        self.settled.notify_all();
        true
    }

    /// Returns the outcome if the slot has settled, without blocking.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<Envelope, CallError>> {
        let state = self.state.lock();
        self.read(&state)
    }

    /// Blocks until the slot settles or `timeout` elapses.
    ///
    /// With [`OnTimeout::Abandon`] the timeout itself settles the slot, in
    /// the same critical section that observed the deadline, so a reply
    /// racing the deadline either wins outright or is discarded.
    ///
    /// # Errors
    ///
    /// Returns the failure the slot settled with, [`CallError::Cancelled`],
    /// or [`CallError::Timeout`].
    pub fn wait(&self, timeout: Timeout, on_timeout: OnTimeout) -> Result<Envelope, CallError> {
        let deadline = timeout.deadline();
        let mut state = self.state.lock();
        loop {
            if let Some(outcome) = self.read(&state) {
                return outcome;
            }
            match deadline {
                // Infinite, or too far out for `Instant` to represent.
                None => self.settled.wait(&mut state),
                Some(deadline) => {
                    if self.settled.wait_until(&mut state, deadline).timed_out()
                        && matches!(*state, SlotState::Pending)
                    {
                        let error = CallError::Timeout {
                            correlation_id: self.id,
                            timeout,
                        };
                        if on_timeout == OnTimeout::Abandon {
                            *state = SlotState::Failed(error.clone());
                            self.settled.notify_all();
                        }
                        return Err(error);
                    }
                }
            }
        }
    }

    fn read(&self, state: &SlotState) -> Option<Result<Envelope, CallError>> {
        match state {
            SlotState::Pending => None,
            SlotState::Resolved(reply) => Some(Ok(reply.clone())),
            SlotState::Failed(error) => Some(Err(error.clone())),
            SlotState::Cancelled => Some(Err(CallError::Cancelled {
                correlation_id: self.id,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn slot() -> CallSlot {
        CallSlot::new(CorrelationId::from(1))
    }

    #[test]
    fn test_stamp() {
        let envelope = slot().stamp(Envelope::new("Req"));
        assert_eq!(envelope.correlation_id(), Some(CorrelationId::from(1)));
    }

    #[test]
    fn test_first_settlement_wins() {
        let slot = slot();
        assert!(slot.resolve(Envelope::untyped()));
        assert!(!slot.cancel());
        assert!(!slot.resolve(Envelope::new("Second")));
        assert!(!slot.fail(CallError::Stopped));
        assert!(slot.wait(Timeout::IMMEDIATE, OnTimeout::KeepPending).is_ok());
    }

    #[test]
    fn test_cancel_then_reply_is_discarded() {
        let slot = slot();
        assert!(slot.cancel());
        assert!(!slot.resolve(Envelope::untyped()));
        let error = slot.wait(Timeout::Infinite, OnTimeout::KeepPending).unwrap_err();
        assert!(error.is_cancelled());
    }

    #[test]
    fn test_keep_pending_timeout_allows_late_reply() {
        let slot = slot();
        let error = slot
            .wait(Timeout::from_millis(10), OnTimeout::KeepPending)
            .unwrap_err();
        assert!(error.is_timeout());
        assert!(slot.is_pending());
        assert!(slot.resolve(Envelope::untyped()));
    }

    #[test]
    fn test_abandon_timeout_settles_slot() {
        let slot = slot();
        let error = slot
            .wait(Timeout::from_millis(10), OnTimeout::Abandon)
            .unwrap_err();
        assert!(error.is_timeout());
        assert!(!slot.resolve(Envelope::untyped()));
        assert!(slot.outcome().unwrap().unwrap_err().is_timeout());
    }

    #[test]
    fn test_wait_respects_timeout() {
        let slot = slot();
        let started = Instant::now();
        let _ = slot.wait(Timeout::from_millis(50), OnTimeout::Abandon);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_wakes_on_resolve() {
        let slot = Arc::new(slot());
        let resolver = Arc::clone(&slot);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            resolver.resolve(Envelope::new("Reply"))
        });

        let reply = slot.wait(Timeout::Infinite, OnTimeout::Abandon).unwrap();
        assert_eq!(reply.class(), Some("Reply"));
        assert!(handle.join().unwrap());
    }
}
