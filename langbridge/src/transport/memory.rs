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

//! In-memory transport implementation for testing.
//!
//! A [`MemorySession`] is the connector-facing half; a [`MemoryPeer`] plays the
//! remote runtime. Everything the peer produces (state transitions, inbound
//! envelopes) is queued to the session's I/O thread and delivered from there,
//! in order, exactly as a real transport would deliver from its socket thread.
//! Envelopes the connector sends are collected in an outbox the peer can read,
//! or answered on the spot by an installed responder.

use crate::envelope::Envelope;
use crate::transport::{ConnectionState, Session, SessionEvents, SessionFactory, TransportError};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[cfg(feature = "observability")]
use tracing::{debug, info, warn};

/// Global counter used to name session I/O threads.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Closure that answers an outbound envelope with an optional inbound one.
type Responder = dyn Fn(&Envelope) -> Option<Envelope> + Send + Sync;

/// Configuration for an in-memory session.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Report `Starting` then `Connected` as soon as the session starts.
    ///
    /// When `false` the session stays in `Starting` until
    /// [`MemoryPeer::connect`] is called.
    pub auto_connect: bool,

    /// Initial capacity of the outbound queue.
    pub queue_capacity_hint: usize,

    /// Pass every envelope through the JSON codec in both directions, as a
    /// byte-oriented transport would.
    pub encode_on_wire: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            auto_connect: true,
            queue_capacity_hint: 64,
            encode_on_wire: false,
        }
    }
}

impl MemoryConfig {
    /// A configuration that waits for [`MemoryPeer::connect`].
    #[must_use]
    pub fn manual() -> Self {
        Self {
            auto_connect: false,
            ..Self::default()
        }
    }

    /// Enables or disables the JSON round trip.
    #[must_use]
    pub fn with_encode_on_wire(mut self, encode: bool) -> Self {
        self.encode_on_wire = encode;
        self
    }
}

enum Event {
    State(ConnectionState),
    Message(Envelope),
    Barrier(Arc<Barrier>),
    Shutdown,
}

#[derive(Default)]
struct Barrier {
    reached: Mutex<bool>,
    cond: Condvar,
}

impl Barrier {
    fn release(&self) {
        *self.reached.lock() = true;
        self.cond.notify_all();
    }

    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut reached = self.reached.lock();
        while !*reached {
            if self.cond.wait_until(&mut reached, deadline).timed_out() {
                return *reached;
            }
        }
        true
    }
}

struct Shared {
    identity: String,
    config: MemoryConfig,
    state: Mutex<ConnectionState>,
    closed: AtomicBool,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<Event>>>,
    io_thread: Mutex<Option<JoinHandle<()>>>,
    outbox: Mutex<VecDeque<Envelope>>,
    outbox_ready: Condvar,
    responder: Mutex<Option<Arc<Responder>>>,
    fail_next_send: Mutex<Option<String>>,
}

impl Shared {
    fn enqueue(&self, event: Event) -> bool {
        self.events_tx.send(event).is_ok()
    }

    /// The envelope as the other side sees it.
    fn wire(&self, envelope: &Envelope) -> Result<Envelope, TransportError> {
        if !self.config.encode_on_wire {
            return Ok(envelope.clone());
        }
        let bytes = envelope.to_json_bytes()?;
        Ok(Envelope::from_json_bytes(&bytes)?)
    }

    fn deliver(&self, envelope: &Envelope) -> bool {
        match self.wire(envelope) {
            Ok(envelope) => self.enqueue(Event::Message(envelope)),
            Err(_err) => {
                #[cfg(feature = "observability")]
                warn!(identity = %self.identity, error = %_err, "Dropped undeliverable envelope");
                false
            }
        }
    }

    fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<Event>, events: Arc<dyn SessionEvents>) {
        while let Some(event) = rx.blocking_recv() {
            match event {
                Event::State(next) => {
                    let previous = std::mem::replace(&mut *self.state.lock(), next);
                    if previous != next {
                        #[cfg(feature = "observability")]
                        debug!(identity = %self.identity, %previous, %next, "Session state change");
                        events.on_state_change(previous, next);
                    }
                }
                Event::Message(envelope) => events.on_message(envelope),
                Event::Barrier(barrier) => barrier.release(),
                Event::Shutdown => break,
            }
        }

        // Anyone still waiting on a barrier would otherwise wait out its timeout.
        rx.close();
        while let Ok(event) = rx.try_recv() {
            if let Event::Barrier(barrier) = event {
                barrier.release();
            }
        }

        #[cfg(feature = "observability")]
        debug!(identity = %self.identity, "Session I/O thread exiting");
    }
}

/// Factory for connected in-memory session/peer pairs.
pub struct MemoryTransport;

impl MemoryTransport {
    /// Creates an unstarted session for `identity` and the peer that drives it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use langbridge::transport::{ConnectionState, MemoryConfig, MemoryTransport, Session};
    ///
    /// let (session, _peer) = MemoryTransport::pair("Runtime", MemoryConfig::default());
    /// assert_eq!(session.identity(), "Runtime");
    /// assert_eq!(session.state(), ConnectionState::Stopped);
    /// ```
    #[must_use]
    pub fn pair(identity: impl Into<String>, config: MemoryConfig) -> (MemorySession, MemoryPeer) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let outbox = VecDeque::with_capacity(config.queue_capacity_hint);
        let shared = Arc::new(Shared {
            identity: identity.into(),
            config,
            state: Mutex::new(ConnectionState::Stopped),
            closed: AtomicBool::new(false),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            io_thread: Mutex::new(None),
            outbox: Mutex::new(outbox),
            outbox_ready: Condvar::new(),
            responder: Mutex::new(None),
            fail_next_send: Mutex::new(None),
        });
        (
            MemorySession {
                shared: Arc::clone(&shared),
            },
            MemoryPeer { shared },
        )
    }
}

/// The connector-facing half of an in-memory connection.
///
/// Dropping the session closes it.
pub struct MemorySession {
    shared: Arc<Shared>,
}

impl Session for MemorySession {
    fn start(&self, events: Arc<dyn SessionEvents>) -> Result<(), TransportError> {
        let shared = &self.shared;
        if shared.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let Some(rx) = shared.events_rx.lock().take() else {
            return Err(TransportError::session_failed(
                shared.identity.as_str(),
                "session already started",
            ));
        };

        shared.enqueue(Event::State(ConnectionState::Starting));
        if shared.config.auto_connect {
            shared.enqueue(Event::State(ConnectionState::Connected));
        }

        let name = format!("memory-io-{}", NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let worker = Arc::clone(shared);
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || worker.run(rx, events))
            .map_err(|err| TransportError::session_failed(shared.identity.as_str(), err.to_string()))?;
        *shared.io_thread.lock() = Some(handle);

        #[cfg(feature = "observability")]
        info!(identity = %shared.identity, "Memory session started");

        Ok(())
    }

    fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let shared = &self.shared;
        if shared.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        if !shared.state.lock().is_connected() {
            return Err(TransportError::NotConnected);
        }
        if let Some(reason) = shared.fail_next_send.lock().take() {
            return Err(TransportError::send_failed(reason));
        }
        let envelope = shared.wire(envelope)?;

        let responder = shared.responder.lock().clone();
        match responder {
            Some(responder) => {
                if let Some(reply) = responder(&envelope) {
                    shared.deliver(&reply);
                }
            }
            None => {
                shared.outbox.lock().push_back(envelope);
                shared.outbox_ready.notify_all();
            }
        }
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        let shared = &self.shared;
        if shared.closed.swap(true, Ordering::AcqRel) {
            return Err(TransportError::Closed);
        }

        let handle = shared.io_thread.lock().take();
        let Some(handle) = handle else {
            // Never started: nobody is listening for the transition.
            *shared.state.lock() = ConnectionState::Stopped;
            return Ok(());
        };

        shared.enqueue(Event::State(ConnectionState::Stopping));
        shared.enqueue(Event::State(ConnectionState::Stopped));
        shared.enqueue(Event::Shutdown);

        if handle.thread().id() != thread::current().id() && handle.join().is_err() {
            #[cfg(feature = "observability")]
            warn!(identity = %shared.identity, "Session I/O thread panicked");
        }

        #[cfg(feature = "observability")]
        info!(identity = %shared.identity, "Memory session closed");

        Ok(())
    }

    fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    fn identity(&self) -> &str {
        &self.shared.identity
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// The remote half of an in-memory connection.
///
/// Cloning a peer yields another handle to the same connection.
#[derive(Clone)]
pub struct MemoryPeer {
    shared: Arc<Shared>,
}

impl MemoryPeer {
    /// Reports the session as connected.
    ///
    /// Returns `false` if the session's I/O thread has exited.
    pub fn connect(&self) -> bool {
        self.shared.enqueue(Event::State(ConnectionState::Connected))
    }

    /// Delivers `envelope` to the connector as if it came off the wire.
    ///
    /// Returns `false` if the session's I/O thread has exited or the envelope
    /// could not be encoded.
    pub fn deliver(&self, envelope: Envelope) -> bool {
        self.shared.deliver(&envelope)
    }

    /// Reports the connection as failed.
    pub fn fail(&self, reason: &str) -> bool {
        #[cfg(feature = "observability")]
        warn!(identity = %self.shared.identity, reason, "Memory peer failing session");
        #[cfg(not(feature = "observability"))]
        let _ = reason;

        self.shared.enqueue(Event::State(ConnectionState::Errored))
    }

    /// Reports the connection as closed by the remote side.
    pub fn disconnect(&self) -> bool {
        self.shared.enqueue(Event::State(ConnectionState::Stopped))
    }

    /// Waits until the session has delivered every event queued before this call.
    ///
    /// Returns `false` on timeout, which includes a session that was never
    /// started. Returns `true` immediately if the session has shut down.
    pub fn flush(&self, timeout: Duration) -> bool {
        let barrier = Arc::new(Barrier::default());
        if !self.shared.enqueue(Event::Barrier(Arc::clone(&barrier))) {
            return true;
        }
        barrier.wait(timeout)
    }

    /// Takes the oldest envelope the connector sent, waiting up to `timeout`.
    pub fn next_sent(&self, timeout: Duration) -> Option<Envelope> {
        let deadline = Instant::now() + timeout;
        let mut outbox = self.shared.outbox.lock();
        loop {
            if let Some(envelope) = outbox.pop_front() {
                return Some(envelope);
            }
            if self
                .shared
                .outbox_ready
                .wait_until(&mut outbox, deadline)
                .timed_out()
            {
                return outbox.pop_front();
            }
        }
    }

    /// Number of sent envelopes not yet taken with [`next_sent`](Self::next_sent).
    #[must_use]
    pub fn sent_len(&self) -> usize {
        self.shared.outbox.lock().len()
    }

    /// Answers every subsequent outbound envelope with `responder`.
    ///
    /// The responder runs on the sending thread. A returned envelope is
    /// delivered back to the connector through the I/O thread; envelopes
    /// handled by a responder do not appear in the outbox.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&Envelope) -> Option<Envelope> + Send + Sync + 'static,
    {
        *self.shared.responder.lock() = Some(Arc::new(responder));
    }

    /// Makes the session refuse the next outbound envelope with
    /// [`TransportError::SendFailed`].
    pub fn fail_next_send(&self, reason: impl Into<String>) {
        *self.shared.fail_next_send.lock() = Some(reason.into());
    }

    /// Removes the responder; outbound envelopes go to the outbox again.
    pub fn clear_responder(&self) {
        *self.shared.responder.lock() = None;
    }

    /// The session's current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// The logical identity of the session.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.shared.identity
    }
}

/// Creates [`MemorySession`]s on demand and keeps their peers for the caller.
#[derive(Default)]
pub struct MemorySessionFactory {
    config: MemoryConfig,
    peers: Mutex<HashMap<String, MemoryPeer>>,
    fail_next: Mutex<Option<String>>,
}

impl MemorySessionFactory {
    /// Creates a factory whose sessions use `config`.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            peers: Mutex::new(HashMap::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// The peer of the most recent session created for `identity`.
    #[must_use]
    pub fn peer(&self, identity: &str) -> Option<MemoryPeer> {
        self.peers.lock().get(identity).cloned()
    }

    /// Makes the next [`create`](SessionFactory::create) fail with `reason`.
    pub fn fail_next_create(&self, reason: impl Into<String>) {
        *self.fail_next.lock() = Some(reason.into());
    }
}

impl SessionFactory for MemorySessionFactory {
    fn create(&self, identity: &str) -> Result<Arc<dyn Session>, TransportError> {
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(TransportError::session_failed(identity, reason));
        }
        if identity.is_empty() {
            return Err(TransportError::InvalidConfiguration {
                reason: "session identity must not be empty".to_string(),
            });
        }

        let (session, peer) = MemoryTransport::pair(identity, self.config.clone());
        self.peers.lock().insert(identity.to_string(), peer);
        Ok(Arc::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;

    const WAIT: Duration = Duration::from_secs(5);

    struct Recorder {
        tx: Mutex<std_mpsc::Sender<String>>,
    }

    impl Recorder {
        fn new() -> (Arc<Self>, std_mpsc::Receiver<String>) {
            let (tx, rx) = std_mpsc::channel();
            (Arc::new(Self { tx: Mutex::new(tx) }), rx)
        }
    }

    impl SessionEvents for Recorder {
        fn on_state_change(&self, previous: ConnectionState, next: ConnectionState) {
            let _ = self.tx.lock().send(format!("{previous}->{next}"));
        }

        fn on_message(&self, envelope: Envelope) {
            let _ = self.tx.lock().send(format!("msg:{}", envelope.class().unwrap_or("-")));
        }
    }

    #[test]
    fn test_auto_connect_reports_transitions_in_order() {
        let (session, peer) = MemoryTransport::pair("R", MemoryConfig::default());
        let (events, rx) = Recorder::new();
        session.start(events).unwrap();
        assert!(peer.flush(WAIT));

        assert_eq!(rx.recv().unwrap(), "stopped->starting");
        assert_eq!(rx.recv().unwrap(), "starting->connected");
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_manual_connect() {
        let (session, peer) = MemoryTransport::pair("R", MemoryConfig::manual());
        let (events, _rx) = Recorder::new();
        session.start(events).unwrap();
        assert!(peer.flush(WAIT));
        assert_eq!(session.state(), ConnectionState::Starting);
        assert!(matches!(
            session.send(&Envelope::new("X")),
            Err(TransportError::NotConnected)
        ));

        peer.connect();
        assert!(peer.flush(WAIT));
        assert!(session.send(&Envelope::new("X")).is_ok());
    }

    #[test]
    fn test_deliver_preserves_order() {
        let (session, peer) = MemoryTransport::pair("R", MemoryConfig::default());
        let (events, rx) = Recorder::new();
        session.start(events).unwrap();
        peer.deliver(Envelope::new("A"));
        peer.deliver(Envelope::new("B"));
        assert!(peer.flush(WAIT));

        let seen: Vec<String> = rx.try_iter().filter(|e| e.starts_with("msg:")).collect();
        assert_eq!(seen, vec!["msg:A", "msg:B"]);
    }

    #[test]
    fn test_outbox_and_responder() {
        let (session, peer) = MemoryTransport::pair("R", MemoryConfig::default());
        let (events, rx) = Recorder::new();
        session.start(events).unwrap();
        assert!(peer.flush(WAIT));

        session.send(&Envelope::new("Out")).unwrap();
        assert_eq!(peer.next_sent(WAIT).unwrap().class(), Some("Out"));
        assert!(peer.next_sent(Duration::from_millis(10)).is_none());

        peer.set_responder(|request| Some(Envelope::new("Echo").with_body(request.body().clone())));
        session.send(&Envelope::new("Ping")).unwrap();
        assert!(peer.flush(WAIT));
        assert_eq!(peer.sent_len(), 0);
        assert!(rx.try_iter().any(|e| e == "msg:Echo"));
    }

    #[test]
    fn test_encode_on_wire_round_trips_envelopes() {
        let config = MemoryConfig::default().with_encode_on_wire(true);
        let (session, peer) = MemoryTransport::pair("R", config);
        let (events, _rx) = Recorder::new();
        session.start(events).unwrap();
        assert!(peer.flush(WAIT));

        let original = Envelope::new("Out")
            .with_body(serde_json::json!({ "nested": [1, 2, 3] }))
            .with_correlation_id(crate::envelope::CorrelationId::from(5));
        session.send(&original).unwrap();
        let sent = peer.next_sent(WAIT).unwrap();
        assert_eq!(sent, original);
        assert!(!sent.ptr_eq(&original));
    }

    #[test]
    fn test_fail_next_send() {
        let (session, peer) = MemoryTransport::pair("R", MemoryConfig::default());
        let (events, _rx) = Recorder::new();
        session.start(events).unwrap();
        assert!(peer.flush(WAIT));

        peer.fail_next_send("pipe full");
        match session.send(&Envelope::new("X")) {
            Err(TransportError::SendFailed { reason }) => assert_eq!(reason, "pipe full"),
            other => panic!("expected send failure, got {other:?}"),
        }
        assert!(session.send(&Envelope::new("X")).is_ok());
        assert_eq!(peer.sent_len(), 1);
    }

    #[test]
    fn test_close_is_terminal_and_idempotent() {
        let (session, peer) = MemoryTransport::pair("R", MemoryConfig::default());
        let (events, rx) = Recorder::new();
        session.start(events).unwrap();
        session.close().unwrap();

        assert_eq!(session.state(), ConnectionState::Stopped);
        assert!(rx.try_iter().any(|e| e == "stopping->stopped"));
        assert!(matches!(session.close(), Err(TransportError::Closed)));
        assert!(matches!(
            session.send(&Envelope::new("X")),
            Err(TransportError::Closed)
        ));
        assert!(!peer.deliver(Envelope::new("Late")));
        assert!(peer.flush(WAIT));
    }

    #[test]
    fn test_start_twice_fails() {
        let (session, _peer) = MemoryTransport::pair("R", MemoryConfig::default());
        let (events, _rx) = Recorder::new();
        session.start(events.clone()).unwrap();
        assert!(matches!(
            session.start(events),
            Err(TransportError::SessionFailed { .. })
        ));
    }

    #[test]
    fn test_factory_failures() {
        let factory = MemorySessionFactory::new(MemoryConfig::default());
        factory.fail_next_create("no runtime");
        assert!(factory.create("R").is_err());
        assert!(factory.create("R").is_ok());
        assert!(factory.peer("R").is_some());
        assert!(matches!(
            factory.create(""),
            Err(TransportError::InvalidConfiguration { .. })
        ));
    }
}
