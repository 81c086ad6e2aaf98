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

//! Inbound routing: the connector's side of [`SessionEvents`].

use crate::call::{CallError, CallSlots, Resolution};
use crate::callback::CallbackRegistry;
use crate::connector::lifecycle::Lifecycle;
use crate::dispatch::DispatchExecutor;
use crate::envelope::Envelope;
use crate::observability::ConnectorMetrics;
use crate::transport::{ConnectionState, SessionEvents};
use std::sync::Arc;

#[cfg(feature = "observability")]
use tracing::{debug, info, warn};

/// Receives session notifications on the transport thread and routes them.
///
/// Replies settle their call slot right here: that only takes the slot's lock
/// and never runs application code. Everything else (notification fan-out,
/// lifecycle updates, thread-disconnect delivery) goes to the dispatch worker.
///
/// The router holds the connector's parts, never the connector itself, so
/// the session keeping the router alive does not keep the connector alive.
pub(crate) struct Router {
    pub(crate) identity: String,
    pub(crate) slots: Arc<CallSlots>,
    pub(crate) registry: Arc<CallbackRegistry>,
    pub(crate) executor: Arc<DispatchExecutor>,
    pub(crate) lifecycle: Arc<Lifecycle>,
    pub(crate) metrics: Arc<ConnectorMetrics>,
    pub(crate) recycle_on_disconnect: bool,
}

impl Router {
    fn schedule_observe(&self, next: ConnectionState) {
        let lifecycle = Arc::clone(&self.lifecycle);
        if self
            .executor
            .submit(move || {
                lifecycle.observe(next);
            })
            .is_err()
        {
            // Worker gone; the monitor is cheap enough to update here.
            self.lifecycle.observe(next);
        }
    }

    fn on_terminal(&self, previous: ConnectionState, _next: ConnectionState) {
        let _failed = self
            .slots
            .fail_all(|correlation_id| CallError::Disconnected { correlation_id });

        #[cfg(feature = "observability")]
        {
            if _failed > 0 {
                warn!(identity = %self.identity, state = %_next, calls = _failed, "Failed outstanding calls on disconnect");
            }
        }

        if !self.recycle_on_disconnect || previous.is_terminal() || self.lifecycle.is_stopped() {
            return;
        }
        let registry = Arc::clone(&self.registry);
        match self.executor.recycle(move || {
            registry.notify_thread_disconnect();
        }) {
            Ok(()) => self.metrics.record_dispatch_recycle(),
            Err(_err) => {
                #[cfg(feature = "observability")]
                debug!(identity = %self.identity, error = %_err, "Dispatch worker not recycled");
            }
        }
    }
}

impl SessionEvents for Router {
    fn on_state_change(&self, previous: ConnectionState, next: ConnectionState) {
        #[cfg(feature = "observability")]
        info!(identity = %self.identity, %previous, %next, "Connection state changed");

        self.schedule_observe(next);
        if next.is_terminal() {
            self.on_terminal(previous, next);
        }
    }

    fn on_message(&self, envelope: Envelope) {
        self.metrics.record_message_received();

        match self.slots.resolve(&envelope) {
            Resolution::Matched => {}
            Resolution::Stale => {
                self.metrics.record_stale_reply();
                #[cfg(feature = "observability")]
                debug!(
                    identity = %self.identity,
                    correlation_id = ?envelope.correlation_id(),
                    "Dropped reply for a call that already settled"
                );
            }
            Resolution::Unmatched if envelope.class().is_none() => {
                self.metrics.record_unroutable();
                #[cfg(feature = "observability")]
                debug!(
                    identity = %self.identity,
                    correlation_id = ?envelope.correlation_id(),
                    "Dropped envelope with no class and no matching call"
                );
            }
            Resolution::Unmatched => {
                let registry = Arc::clone(&self.registry);
                let metrics = Arc::clone(&self.metrics);
                let submitted = self.executor.submit(move || {
                    let invoked = registry.dispatch(&envelope);
                    metrics.record_notification_dispatched(invoked);
                });
                if let Err(_err) = submitted {
                    #[cfg(feature = "observability")]
                    debug!(identity = %self.identity, error = %_err, "Dropped notification after shutdown");
                }
            }
        }
    }
}
