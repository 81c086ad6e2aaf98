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
use crate::call::{CallError, CallSlot, CallSlots, OnTimeout};
use crate::envelope::{CorrelationId, Envelope};
use crate::observability::ConnectorMetrics;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A request that has been sent and may still be awaiting its reply.
///
/// Returned by [`Connector::begin_call`](crate::Connector::begin_call).
/// `wait_for_result` and `cancel` may be called from different threads at the
/// same time; whichever of cancel and the incoming reply settles the call
/// first wins.
///
/// Dropping the handle cancels the call if it is still pending and releases
/// its slot, so a reply arriving afterwards is discarded.
pub struct CallHandle {
    slot: Arc<CallSlot>,
    slots: Arc<CallSlots>,
    metrics: Arc<ConnectorMetrics>,
    reported: AtomicBool,
}

impl CallHandle {
    pub(crate) fn new(
        slot: Arc<CallSlot>,
        slots: Arc<CallSlots>,
        metrics: Arc<ConnectorMetrics>,
    ) -> Self {
        Self {
            slot,
            slots,
            metrics,
            reported: AtomicBool::new(false),
        }
    }

    /// The correlation ID stamped into the request.
    #[must_use]
    pub fn id(&self) -> CorrelationId {
        self.slot.id()
    }

    /// Returns `true` while the call has no outcome.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }

    /// Waits up to `timeout` for the call's outcome.
    ///
    /// Once the call has settled, every further call returns the same outcome
    /// immediately. A timeout leaves the call pending, so waiting again may
    /// still succeed.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Timeout`] if the call is still pending when
    /// `timeout` elapses, or the error the call settled with.
    pub fn wait_for_result(&self, timeout: impl Into<Timeout>) -> Result<Envelope, CallError> {
        let result = self.slot.wait(timeout.into(), OnTimeout::KeepPending);
        if !matches!(result, Err(CallError::Timeout { .. })) {
            self.report(&result);
        }
        result
    }

    /// Returns the outcome if the call has settled, without blocking.
    #[must_use]
    pub fn try_result(&self) -> Option<Result<Envelope, CallError>> {
        let outcome = self.slot.outcome();
        if let Some(result) = &outcome {
            self.report(result);
        }
        outcome
    }

    /// Cancels the call.
    ///
    /// Returns `true` if this cancelled a pending call, `false` if the call had
    /// already settled.
    pub fn cancel(&self) -> bool {
        let cancelled = self.slot.cancel();
        if cancelled && !self.reported.swap(true, Ordering::AcqRel) {
            self.metrics.record_call_cancelled();
        }
        cancelled
    }

    fn report(&self, result: &Result<Envelope, CallError>) {
        if self.reported.swap(true, Ordering::AcqRel) {
            return;
        }
        match result {
            Ok(_) => self.metrics.record_call_succeeded(),
            Err(CallError::Cancelled { .. }) => self.metrics.record_call_cancelled(),
            Err(CallError::Timeout { .. }) => self.metrics.record_call_timed_out(),
            Err(_) => self.metrics.record_call_failed(),
        }
    }
}

impl fmt::Debug for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallHandle")
            .field("id", &self.slot.id())
            .field("pending", &self.slot.is_pending())
            .finish()
    }
}

impl Drop for CallHandle {
    fn drop(&mut self) {
        self.cancel();
        self.slots.release(self.slot.id());
    }
}
