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

use crate::call::{CallError, CallHandle, CallSlot, CallSlots, OnTimeout};
use crate::callback::{Callback, CallbackRegistry};
use crate::connector::builder::ConnectorBuilder;
use crate::connector::config::ConnectorConfig;
use crate::connector::lifecycle::Lifecycle;
use crate::dispatch::DispatchExecutor;
use crate::envelope::Envelope;
use crate::observability::{ConnectorMetrics, MetricsSnapshot};
use crate::transport::{ConnectionState, Session, SessionFactory};
use crate::{ConnectorError, Timeout};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "observability")]
use tracing::{debug, info, instrument};

/// The connector's shared state. Dropped when the last [`Connector`] handle is.
pub(crate) struct Inner {
    pub(crate) identity: String,
    pub(crate) config: ConnectorConfig,
    pub(crate) session: Arc<dyn Session>,
    pub(crate) slots: Arc<CallSlots>,
    pub(crate) registry: Arc<CallbackRegistry>,
    pub(crate) executor: Arc<DispatchExecutor>,
    pub(crate) lifecycle: Arc<Lifecycle>,
    pub(crate) metrics: Arc<ConnectorMetrics>,
}

impl Inner {
    fn stop(&self) -> bool {
        if !self.lifecycle.stop() {
            return false;
        }

        #[cfg(feature = "observability")]
        info!(identity = %self.identity, "Stopping connector");

        if let Err(_err) = self.session.close() {
            #[cfg(feature = "observability")]
            debug!(identity = %self.identity, error = %_err, "Session close reported an error");
        }
        self.slots
            .fail_all(|correlation_id| CallError::Disconnected { correlation_id });

        let registry = Arc::clone(&self.registry);
        self.executor.shutdown(move || {
            registry.notify_thread_disconnect();
        });
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Client-side connector to a peer runtime.
///
/// A connector owns one session and layers two things on top of it:
///
/// - **correlated calls**: [`call`](Self::call) blocks for the reply to a
///   request; [`begin_call`](Self::begin_call) returns a [`CallHandle`] to
///   wait on later;
/// - **callbacks**: every inbound envelope that is not a reply is delivered,
///   on the dispatch worker, to each [`Callback`] registered for its class.
///
/// # Handles
///
/// `Connector` is a shared handle. Cloning it (or calling
/// [`retain`](Self::retain)) adds a reference and dropping it (or calling
/// [`release`](Self::release)) removes one. The connector stops when the last
/// handle is dropped, if [`stop`](Self::stop) was not called earlier. Stopping
/// never invalidates other handles; they just report [`ConnectorError::Stopped`].
///
/// # Example
///
/// ```rust
/// use langbridge::{Connector, Timeout};
/// use langbridge::envelope::Envelope;
/// use langbridge::transport::{MemoryConfig, MemorySessionFactory};
/// use serde_json::json;
///
/// let factory = MemorySessionFactory::new(MemoryConfig::default());
/// let connector = Connector::start("Runtime", &factory).unwrap();
/// assert!(connector.wait_for_startup(Timeout::from_millis(5_000)));
///
/// // The peer answers every request with the request's body doubled.
/// factory.peer("Runtime").unwrap().set_responder(|request| {
///     let n = request.body().as_i64().unwrap_or(0);
///     Some(Envelope::reply_to(request, json!(n * 2)))
/// });
///
/// let reply = connector
///     .call(Envelope::new("Double").with_body(json!(21)), Timeout::from_millis(5_000))
///     .unwrap();
/// assert_eq!(reply.body(), &json!(42));
///
/// assert!(connector.stop());
/// assert!(!connector.stop());
/// ```
#[derive(Clone)]
pub struct Connector {
    inner: Arc<Inner>,
}

impl Connector {
    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Starts a connector for `identity` with the default configuration.
    ///
    /// Returns as soon as the session has begun connecting; use
    /// [`wait_for_startup`](Self::wait_for_startup) to wait for the connection.
    ///
    /// # Errors
    ///
    /// Fails if the session cannot be created or started, or the dispatch
    /// worker cannot be spawned.
    pub fn start(
        identity: impl Into<String>,
        factory: &dyn SessionFactory,
    ) -> Result<Self, ConnectorError> {
        ConnectorBuilder::new(identity).start(factory)
    }

    /// Returns a builder for a connector bound to `identity`.
    #[must_use]
    pub fn builder(identity: impl Into<String>) -> ConnectorBuilder {
        ConnectorBuilder::new(identity)
    }

    /// Adds a reference to this connector. Equivalent to `clone`.
    #[must_use]
    pub fn retain(&self) -> Self {
        self.clone()
    }

    /// Gives up this reference. Equivalent to `drop`.
    pub fn release(self) {
        drop(self);
    }

    /// Number of live handles to this connector.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// The logical identity the session was created for.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    /// The configuration this connector was started with.
    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.inner.config
    }

    /// Blocks until the session has connected.
    ///
    /// Returns `true` immediately if it already has. Returns `false` if
    /// `timeout` elapses first or the connector is (or becomes) stopped.
    ///
    /// Connection state is observed on the dispatch worker. Called from a
    /// callback (which runs on that worker) this only reports the current
    /// state and never blocks, whatever `timeout` says.
    #[cfg_attr(feature = "observability", instrument(skip_all, fields(identity = %self.inner.identity)))]
    pub fn wait_for_startup(&self, timeout: impl Into<Timeout>) -> bool {
        let timeout = if self.inner.executor.is_worker_thread() {
            #[cfg(feature = "observability")]
            debug!("Startup wait on the dispatch worker; not blocking");
            Timeout::IMMEDIATE
        } else {
            timeout.into()
        };
        self.inner.lifecycle.wait_for_startup(timeout)
    }

    /// [`wait_for_startup`](Self::wait_for_startup) with the configured
    /// startup timeout.
    pub fn wait_for_startup_default(&self) -> bool {
        self.wait_for_startup(self.inner.config.startup_timeout)
    }

    /// Stops the connector.
    ///
    /// Closes the session, fails every outstanding call with
    /// [`CallError::Disconnected`], and shuts the dispatch worker down after
    /// delivering [`Callback::on_thread_disconnect`] to every registration.
    ///
    /// Returns `false` if the connector was already stopped.
    pub fn stop(&self) -> bool {
        self.inner.stop()
    }

    /// Returns `true` once [`stop`](Self::stop) has run, or once the
    /// dispatch worker is gone for good (a replacement worker could not be
    /// spawned).
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.lifecycle.is_stopped() || self.inner.executor.is_shut_down()
    }

    /// The last session state processed by the dispatch worker.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.lifecycle.state()
    }

    /// Registers `callback` for envelopes of class `class`.
    ///
    /// The same callback may be registered more than once; each registration
    /// receives its own copy of every matching envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Stopped`] if the connector is stopped.
    pub fn add_callback(
        &self,
        class: impl Into<String>,
        callback: Arc<dyn Callback>,
    ) -> Result<(), ConnectorError> {
        self.ensure_running()?;
        self.inner.registry.add(class, callback);
        Ok(())
    }

    /// Removes the first registration of `callback`.
    ///
    /// Returns `false` if it is not registered. Dispatches already queued may
    /// still reach it; none queued afterwards will.
    pub fn remove_callback(&self, callback: &Arc<dyn Callback>) -> bool {
        self.inner.registry.remove(callback)
    }

    /// Sends `envelope` without expecting a reply.
    ///
    /// Success means the session accepted the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Stopped`] if the connector is stopped, or the
    /// session's error if it refused the envelope.
    #[cfg_attr(feature = "observability", instrument(skip_all, fields(identity = %self.inner.identity, class = envelope.class())))]
    pub fn send(&self, envelope: &Envelope) -> Result<(), ConnectorError> {
        self.ensure_running()?;
        self.inner.session.send(envelope)?;
        self.inner.metrics.record_message_sent();
        Ok(())
    }

    /// Sends `request` and blocks up to `timeout` for its reply.
    ///
    /// A reply that arrives after the timeout is discarded; it is never
    /// delivered to callbacks.
    ///
    /// # Errors
    ///
    /// - [`CallError::Stopped`] if the connector is stopped
    /// - [`CallError::SendFailed`] if the session refused the request
    /// - [`CallError::Timeout`] if no reply arrived in time
    /// - [`CallError::Disconnected`] if the connection dropped while waiting
    #[cfg_attr(
        feature = "observability",
        instrument(skip_all, fields(identity = %self.inner.identity, class = request.class(), correlation_id))
    )]
    pub fn call(&self, request: Envelope, timeout: impl Into<Timeout>) -> Result<Envelope, CallError> {
        let slot = self.send_request(request)?;
        let result = slot.wait(timeout.into(), OnTimeout::Abandon);
        self.inner.slots.release(slot.id());

        let metrics = &self.inner.metrics;
        match &result {
            Ok(_) => metrics.record_call_succeeded(),
            Err(CallError::Timeout { .. }) => metrics.record_call_timed_out(),
            Err(_) => metrics.record_call_failed(),
        }

        #[cfg(feature = "observability")]
        {
            if let Err(error) = &result {
                debug!(error = %error, "Call failed");
            }
        }

        result
    }

    /// [`call`](Self::call) with the configured call timeout.
    ///
    /// # Errors
    ///
    /// As for [`call`](Self::call).
    pub fn call_default(&self, request: Envelope) -> Result<Envelope, CallError> {
        self.call(request, self.inner.config.call_timeout)
    }

    /// Sends `request` and returns a handle to wait for its reply later.
    ///
    /// # Errors
    ///
    /// [`CallError::Stopped`] if the connector is stopped, or
    /// [`CallError::SendFailed`] if the session refused the request.
    #[cfg_attr(
        feature = "observability",
        instrument(skip_all, fields(identity = %self.inner.identity, class = request.class(), correlation_id))
    )]
    pub fn begin_call(&self, request: Envelope) -> Result<CallHandle, CallError> {
        let slot = self.send_request(request)?;
        Ok(CallHandle::new(
            slot,
            Arc::clone(&self.inner.slots),
            Arc::clone(&self.inner.metrics),
        ))
    }

    fn send_request(&self, request: Envelope) -> Result<Arc<CallSlot>, CallError> {
        if self.is_stopped() {
            return Err(CallError::Stopped);
        }
        let inner = &self.inner;
        let slot = inner.slots.allocate();
        let request = slot.stamp(request);

        #[cfg(feature = "observability")]
        tracing::Span::current().record("correlation_id", slot.id().as_u64());

        inner.metrics.record_call_started();
        if let Err(error) = inner.session.send(&request) {
            inner.slots.release(slot.id());
            inner.metrics.record_call_failed();
            return Err(error.into());
        }
        inner.metrics.record_message_sent();
        Ok(slot)
    }

    /// Replaces the dispatch worker.
    ///
    /// Everything already queued runs first, then every registration receives
    /// [`Callback::on_thread_disconnect`] on the outgoing worker, then a fresh
    /// worker takes over. Envelopes arriving afterwards are dispatched on the
    /// new worker.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Stopped`] if the connector is stopped.
    pub fn recycle_dispatch_thread(&self) -> Result<(), ConnectorError> {
        self.ensure_running()?;
        let registry = Arc::clone(&self.inner.registry);
        self.inner.executor.recycle(move || {
            registry.notify_thread_disconnect();
        })?;
        self.inner.metrics.record_dispatch_recycle();

        #[cfg(feature = "observability")]
        debug!(identity = %self.inner.identity, generation = self.inner.executor.generation(), "Dispatch worker recycle requested");

        Ok(())
    }

    /// Calls allocated and not yet released.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.inner.slots.len()
    }

    /// Number of callback registrations.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Current values of the connector's counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    fn ensure_running(&self) -> Result<(), ConnectorError> {
        if self.is_stopped() {
            Err(ConnectorError::Stopped)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("identity", &self.inner.identity)
            .field("state", &self.state())
            .field("stopped", &self.is_stopped())
            .field("handles", &self.handle_count())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryConfig, MemorySessionFactory};
    use std::time::Duration;

    const WAIT: Timeout = Timeout::After(Duration::from_secs(5));

    fn started() -> (Connector, MemorySessionFactory) {
        let factory = MemorySessionFactory::new(MemoryConfig::default());
        let connector = Connector::start("Runtime", &factory).unwrap();
        assert!(connector.wait_for_startup(WAIT));
        (connector, factory)
    }

    #[test]
    fn test_handle_counting() {
        let (connector, _factory) = started();
        assert_eq!(connector.handle_count(), 1);
        let second = connector.retain();
        assert_eq!(connector.handle_count(), 2);
        second.release();
        assert_eq!(connector.handle_count(), 1);
        assert!(!connector.is_stopped());
    }

    #[test]
    fn test_operations_after_stop() {
        let (connector, _factory) = started();
        assert!(connector.stop());
        assert!(connector.is_stopped());
        assert!(!connector.wait_for_startup(Timeout::IMMEDIATE));

        struct Noop;
        impl Callback for Noop {
            fn on_message(&self, _envelope: &Envelope) {}
        }
        assert!(connector.add_callback("X", Arc::new(Noop)).unwrap_err().is_stopped());
        assert!(connector.send(&Envelope::new("X")).unwrap_err().is_stopped());
        assert!(matches!(
            connector.call(Envelope::new("X"), WAIT),
            Err(CallError::Stopped)
        ));
        assert!(connector.recycle_dispatch_thread().is_err());
    }

    #[test]
    fn test_lost_dispatch_worker_reports_stopped() {
        let (connector, _factory) = started();
        connector.inner.executor.fail_next_spawn();
        connector.recycle_dispatch_thread().unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !connector.is_stopped() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(connector.is_stopped());

        struct Noop;
        impl Callback for Noop {
            fn on_message(&self, _envelope: &Envelope) {}
        }
        assert!(connector.add_callback("X", Arc::new(Noop)).unwrap_err().is_stopped());
        assert!(matches!(
            connector.begin_call(Envelope::new("X")),
            Err(CallError::Stopped)
        ));
        // Stopping still closes the session.
        assert!(connector.stop());
    }

    #[test]
    fn test_send_reaches_peer() {
        let (connector, factory) = started();
        connector.send(&Envelope::new("Hello")).unwrap();
        let peer = factory.peer("Runtime").unwrap();
        let sent = peer.next_sent(Duration::from_secs(5)).unwrap();
        assert_eq!(sent.class(), Some("Hello"));
        assert_eq!(sent.correlation_id(), None);
        assert_eq!(connector.metrics().messages_sent, 1);
    }

    #[test]
    fn test_call_stamps_correlation_id() {
        let (connector, factory) = started();
        let handle = connector.begin_call(Envelope::new("Query")).unwrap();
        let peer = factory.peer("Runtime").unwrap();
        let sent = peer.next_sent(Duration::from_secs(5)).unwrap();
        assert_eq!(sent.correlation_id(), Some(handle.id()));
        assert_eq!(connector.pending_calls(), 1);
        drop(handle);
        assert_eq!(connector.pending_calls(), 0);
    }
}
