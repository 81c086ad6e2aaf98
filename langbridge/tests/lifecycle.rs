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

//! Integration tests for connector startup, shutdown and handle lifetime.

mod common;

use common::{WAIT, eventually, init_tracing};
use langbridge::transport::{ConnectionState, MemoryConfig, MemoryPeer, MemorySessionFactory};
use langbridge::callback::Callback;
use langbridge::envelope::Envelope;
use langbridge::{Connector, Timeout};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn start_manual() -> (Connector, MemoryPeer) {
    init_tracing();
    let factory = MemorySessionFactory::new(MemoryConfig::manual());
    let connector = Connector::start("Runtime", &factory).unwrap();
    let peer = factory.peer("Runtime").unwrap();
    (connector, peer)
}

/// Test that a startup wait blocks until the peer connects.
#[test]
fn test_wait_for_startup_blocks_until_connected() {
    let (connector, peer) = start_manual();
    assert!(!connector.wait_for_startup(Timeout::IMMEDIATE));

    let connecting = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        peer.connect();
        peer
    });
    let started = Instant::now();
    assert!(connector.wait_for_startup(WAIT));
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(connector.state(), ConnectionState::Connected);

    let _peer = connecting.join().unwrap();
    connector.stop();
}

/// Test that a startup wait gives up at its timeout.
#[test]
fn test_wait_for_startup_times_out() {
    let (connector, _peer) = start_manual();
    let started = Instant::now();
    assert!(!connector.wait_for_startup(Duration::from_millis(60)));
    assert!(started.elapsed() >= Duration::from_millis(60));
    connector.stop();
}

/// Test that an errored session does not end a startup wait, but a later connect does.
#[test]
fn test_errored_session_keeps_startup_waiting() {
    let (connector, peer) = start_manual();

    let waiter = {
        let connector = connector.clone();
        thread::spawn(move || connector.wait_for_startup(WAIT))
    };
    peer.fail("first attempt failed");
    assert!(peer.flush(WAIT));
    assert!(eventually(WAIT, || connector.state() == ConnectionState::Errored));
    assert!(!waiter.is_finished());

    peer.connect();
    assert!(waiter.join().unwrap());
    connector.stop();
}

/// Test that stopping releases threads blocked in a startup wait.
#[test]
fn test_stop_releases_startup_waiters() {
    let (connector, _peer) = start_manual();
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let connector = connector.clone();
            thread::spawn(move || connector.wait_for_startup(Timeout::Infinite))
        })
        .collect();
    thread::sleep(Duration::from_millis(20));

    assert!(connector.stop());
    for waiter in waiters {
        assert!(!waiter.join().unwrap());
    }
}

/// Test that the default startup wait uses the configured timeout.
#[test]
fn test_wait_for_startup_default() {
    init_tracing();
    let factory = MemorySessionFactory::new(MemoryConfig::manual());
    let connector = Connector::builder("Runtime")
        .startup_timeout(Duration::from_millis(30))
        .start(&factory)
        .unwrap();
    assert_eq!(connector.config().startup_timeout, Timeout::from_millis(30));
    assert!(!connector.wait_for_startup_default());
    connector.stop();
}

/// Test that dropping the last handle stops the connector and closes the session.
#[test]
fn test_last_handle_stops_connector() {
    let (connector, peer) = start_manual();
    peer.connect();
    assert!(connector.wait_for_startup(WAIT));

    let second = connector.retain();
    assert_eq!(connector.handle_count(), 2);
    second.release();
    assert_eq!(connector.handle_count(), 1);
    assert_eq!(peer.state(), ConnectionState::Connected);

    drop(connector);
    assert_eq!(peer.state(), ConnectionState::Stopped);
    assert!(!peer.deliver(langbridge::Envelope::new("Tick")));
}

/// Test that an explicit stop leaves other handles valid and idempotent.
#[test]
fn test_stop_is_idempotent_across_handles() {
    let (connector, peer) = start_manual();
    let other = connector.clone();

    assert!(other.stop());
    assert!(!connector.stop());
    assert!(connector.is_stopped());
    assert_eq!(peer.state(), ConnectionState::Stopped);
    assert_eq!(connector.identity(), "Runtime");
}

/// Callback that waits for startup from the dispatch worker.
#[derive(Default)]
struct StartupWaiter {
    connector: Mutex<Option<Connector>>,
    on_message: Mutex<Vec<(bool, Duration)>>,
    on_disconnect: Mutex<Vec<(bool, Duration)>>,
}

impl StartupWaiter {
    fn wait(&self) -> Option<(bool, Duration)> {
        let connector = self.connector.lock().clone()?;
        let started = Instant::now();
        let connected = connector.wait_for_startup(WAIT);
        Some((connected, started.elapsed()))
    }
}

impl Callback for StartupWaiter {
    fn on_message(&self, _envelope: &Envelope) {
        if let Some(outcome) = self.wait() {
            self.on_message.lock().push(outcome);
        }
    }

    fn on_thread_disconnect(&self) {
        if let Some(outcome) = self.wait() {
            self.on_disconnect.lock().push(outcome);
        }
    }
}

/// Test that a startup wait inside a callback reports the current state without blocking.
#[test]
fn test_startup_wait_from_callback_does_not_block() {
    let (connector, peer) = start_manual();
    peer.connect();
    assert!(connector.wait_for_startup(WAIT));

    let callback = Arc::new(StartupWaiter::default());
    *callback.connector.lock() = Some(connector.clone());
    connector.add_callback("Tick", callback.clone()).unwrap();

    peer.deliver(Envelope::new("Tick"));
    assert!(eventually(WAIT, || !callback.on_message.lock().is_empty()));
    let (connected, elapsed) = callback.on_message.lock()[0];
    assert!(connected);
    assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");

    // The failure recycles the worker; the teardown runs on it.
    peer.fail("peer crashed");
    assert!(eventually(WAIT, || !callback.on_disconnect.lock().is_empty()));
    let (connected, elapsed) = callback.on_disconnect.lock()[0];
    assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");
    assert!(!connected);

    callback.connector.lock().take();
    connector.stop();
}
