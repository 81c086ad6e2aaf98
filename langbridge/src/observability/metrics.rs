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

//! Connector metrics.
//!
//! Counters are plain atomics so they can be read without any exporter. With
//! the `observability` feature enabled every update is also forwarded to the
//! `metrics` crate under the `langbridge.` prefix.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters describing a connector's traffic.
///
/// # Examples
///
/// ```rust
/// use langbridge::observability::ConnectorMetrics;
///
/// let metrics = ConnectorMetrics::new();
/// metrics.record_call_started();
/// metrics.record_call_timed_out();
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.calls_started, 1);
/// assert_eq!(snapshot.calls_timed_out, 1);
/// assert_eq!(snapshot.calls_outstanding(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ConnectorMetrics {
    calls_started: AtomicU64,
    calls_succeeded: AtomicU64,
    calls_timed_out: AtomicU64,
    calls_failed: AtomicU64,
    calls_cancelled: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    notifications_dispatched: AtomicU64,
    callback_invocations: AtomicU64,
    stale_replies: AtomicU64,
    unroutable_envelopes: AtomicU64,
    dispatch_recycles: AtomicU64,
}

impl ConnectorMetrics {
    /// Creates a zeroed set of counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A correlated call was sent.
    pub fn record_call_started(&self) {
        self.calls_started.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.calls.started").increment(1);
    }

    /// A correlated call received its reply.
    pub fn record_call_succeeded(&self) {
        self.calls_succeeded.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.calls.succeeded").increment(1);
    }

    /// A blocking call gave up waiting.
    pub fn record_call_timed_out(&self) {
        self.calls_timed_out.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.calls.timed_out").increment(1);
    }

    /// A call failed to send or was failed by a disconnect.
    pub fn record_call_failed(&self) {
        self.calls_failed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.calls.failed").increment(1);
    }

    /// A call was cancelled before its reply arrived.
    pub fn record_call_cancelled(&self) {
        self.calls_cancelled.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.calls.cancelled").increment(1);
    }

    /// An envelope was handed to the transport.
    pub fn record_message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.messages.sent").increment(1);
    }

    /// An envelope arrived from the transport.
    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.messages.received").increment(1);
    }

    /// A notification was fanned out to `callbacks` registrations.
    pub fn record_notification_dispatched(&self, callbacks: usize) {
        let callbacks = callbacks as u64;
        self.notifications_dispatched.fetch_add(1, Ordering::Relaxed);
        self.callback_invocations.fetch_add(callbacks, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("langbridge.notifications.dispatched").increment(1);
            metrics::counter!("langbridge.callbacks.invoked").increment(callbacks);
        }
    }

    /// A reply arrived for a call that had already settled.
    pub fn record_stale_reply(&self) {
        self.stale_replies.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.replies.stale").increment(1);
    }

    /// An envelope matched no call and carried no class.
    pub fn record_unroutable(&self) {
        self.unroutable_envelopes.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.envelopes.unroutable").increment(1);
    }

    /// The dispatch worker was replaced.
    pub fn record_dispatch_recycle(&self) {
        self.dispatch_recycles.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("langbridge.dispatch.recycles").increment(1);
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls_started: self.calls_started.load(Ordering::Relaxed),
            calls_succeeded: self.calls_succeeded.load(Ordering::Relaxed),
            calls_timed_out: self.calls_timed_out.load(Ordering::Relaxed),
            calls_failed: self.calls_failed.load(Ordering::Relaxed),
            calls_cancelled: self.calls_cancelled.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            notifications_dispatched: self.notifications_dispatched.load(Ordering::Relaxed),
            callback_invocations: self.callback_invocations.load(Ordering::Relaxed),
            stale_replies: self.stale_replies.load(Ordering::Relaxed),
            unroutable_envelopes: self.unroutable_envelopes.load(Ordering::Relaxed),
            dispatch_recycles: self.dispatch_recycles.load(Ordering::Relaxed),
        }
    }

    /// Resets every counter to zero.
    pub fn reset(&self) {
        for counter in [
            &self.calls_started,
            &self.calls_succeeded,
            &self.calls_timed_out,
            &self.calls_failed,
            &self.calls_cancelled,
            &self.messages_sent,
            &self.messages_received,
            &self.notifications_dispatched,
            &self.callback_invocations,
            &self.stale_replies,
            &self.unroutable_envelopes,
            &self.dispatch_recycles,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of [`ConnectorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Correlated calls sent
    pub calls_started: u64,
    /// Calls that received a reply
    pub calls_succeeded: u64,
    /// Blocking calls that timed out
    pub calls_timed_out: u64,
    /// Calls that failed to send or were failed by a disconnect
    pub calls_failed: u64,
    /// Calls cancelled before a reply
    pub calls_cancelled: u64,
    /// Envelopes handed to the transport
    pub messages_sent: u64,
    /// Envelopes received from the transport
    pub messages_received: u64,
    /// Notifications fanned out to callbacks
    pub notifications_dispatched: u64,
    /// Individual callback invocations
    pub callback_invocations: u64,
    /// Replies that arrived after their call settled
    pub stale_replies: u64,
    /// Envelopes that matched no call and had no class
    pub unroutable_envelopes: u64,
    /// Dispatch worker replacements
    pub dispatch_recycles: u64,
}

impl MetricsSnapshot {
    /// Calls started but not yet accounted for by any outcome.
    #[must_use]
    pub fn calls_outstanding(&self) -> u64 {
        self.calls_started.saturating_sub(
            self.calls_succeeded + self.calls_timed_out + self.calls_failed + self.calls_cancelled,
        )
    }
}
