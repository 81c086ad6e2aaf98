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

//! Allocation and resolution of call slots.

use crate::call::{CallError, CallSlot};
use crate::envelope::{CorrelationId, CorrelationIdGenerator, Envelope};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// How an inbound envelope related to the outstanding calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The envelope resolved an outstanding call.
    Matched,
    /// The envelope answers a call this allocator issued, but that call has
    /// already timed out, been cancelled, or been released.
    Stale,
    /// The envelope is not a reply to any call this allocator issued.
    Unmatched,
}

/// Allocates call slots and routes replies to them by correlation ID.
///
/// # Thread Safety
///
/// All operations take a short-held internal lock. Resolving a slot happens
/// outside that lock, under the slot's own.
///
/// # Example
///
/// ```rust
/// use langbridge::call::{CallSlots, Resolution};
/// use langbridge::envelope::Envelope;
/// use serde_json::json;
///
/// let slots = CallSlots::new();
/// let slot = slots.allocate();
/// let request = slot.stamp(Envelope::new("Query"));
///
/// let reply = Envelope::reply_to(&request, json!(42));
/// assert_eq!(slots.resolve(&reply), Resolution::Matched);
/// assert_eq!(slots.resolve(&reply), Resolution::Stale);
/// assert_eq!(slots.resolve(&Envelope::new("Tick")), Resolution::Unmatched);
///
/// slots.release(slot.id());
/// assert!(slots.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct CallSlots {
    ids: CorrelationIdGenerator,
    slots: Mutex<HashMap<CorrelationId, Arc<CallSlot>>>,
}

impl CallSlots {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a pending slot with a fresh correlation ID.
    pub fn allocate(&self) -> Arc<CallSlot> {
        let slot = Arc::new(CallSlot::new(self.ids.next()));
        self.slots.lock().insert(slot.id(), Arc::clone(&slot));
        slot
    }

    /// Resolves the slot that `envelope` answers, if any.
    pub fn resolve(&self, envelope: &Envelope) -> Resolution {
        let Some(id) = envelope.correlation_id() else {
            return Resolution::Unmatched;
        };
        let slot = self.slots.lock().get(&id).cloned();
        match slot {
            Some(slot) if slot.resolve(envelope.clone()) => Resolution::Matched,
            Some(_) => Resolution::Stale,
            None if self.ids.was_issued(id) => Resolution::Stale,
            None => Resolution::Unmatched,
        }
    }

    /// Forgets the slot for `id`. Returns `false` if it was not allocated.
    pub fn release(&self, id: CorrelationId) -> bool {
        self.slots.lock().remove(&id).is_some()
    }

    /// Fails every pending slot with the error built by `failure`.
    ///
    /// Returns how many slots were still pending.
    pub fn fail_all(&self, failure: impl Fn(CorrelationId) -> CallError) -> usize {
        let slots: Vec<Arc<CallSlot>> = self.slots.lock().values().cloned().collect();
        slots
            .into_iter()
            .filter(|slot| slot.fail(failure(slot.id())))
            .count()
    }

    /// Number of allocated slots, settled or not, that have not been released.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns `true` if no slots are allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timeout;
    use crate::call::OnTimeout;

    #[test]
    fn test_allocate_issues_distinct_ids() {
        let slots = CallSlots::new();
        let a = slots.allocate();
        let b = slots.allocate();
        assert_ne!(a.id(), b.id());
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_reply_after_release_is_stale() {
        let slots = CallSlots::new();
        let slot = slots.allocate();
        let reply = Envelope::untyped().with_correlation_id(slot.id());
        slots.release(slot.id());
        assert_eq!(slots.resolve(&reply), Resolution::Stale);
    }

    #[test]
    fn test_unknown_id_is_unmatched() {
        let slots = CallSlots::new();
        let envelope = Envelope::new("Tick").with_correlation_id(CorrelationId::from(999));
        assert_eq!(slots.resolve(&envelope), Resolution::Unmatched);
    }

    #[test]
    fn test_reply_after_abandon_is_stale() {
        let slots = CallSlots::new();
        let slot = slots.allocate();
        let _ = slot.wait(Timeout::IMMEDIATE, OnTimeout::Abandon);
        let reply = Envelope::untyped().with_correlation_id(slot.id());
        assert_eq!(slots.resolve(&reply), Resolution::Stale);
    }

    #[test]
    fn test_fail_all_skips_settled_slots() {
        let slots = CallSlots::new();
        let settled = slots.allocate();
        let pending = slots.allocate();
        settled.cancel();

        let failed = slots.fail_all(|correlation_id| CallError::Disconnected { correlation_id });
        assert_eq!(failed, 1);
        assert!(settled.outcome().unwrap().unwrap_err().is_cancelled());
        assert!(pending.outcome().unwrap().unwrap_err().is_disconnected());
    }

    #[test]
    fn test_release_is_idempotent() {
        let slots = CallSlots::new();
        let slot = slots.allocate();
        assert!(slots.release(slot.id()));
        assert!(!slots.release(slot.id()));
        assert!(slots.is_empty());
    }
}
