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

//! Integration tests for dispatch worker recycling.

mod common;

use common::{Journal, Recorder, WAIT, connect, connect_default, eventually};
use langbridge::envelope::Envelope;
use langbridge::transport::ConnectionState;
use langbridge::{ConnectorConfig, ConnectorError};

fn expected(lines: &[(&str, &str, u64)]) -> Vec<String> {
    lines
        .iter()
        .map(|(who, what, generation)| format!("{who}:{what}@langbridge-dispatch-{generation}"))
        .collect()
}

/// Test that a recycle notifies every registration on the old worker before later dispatches.
#[test]
fn test_recycle_orders_disconnect_between_dispatches() {
    let (connector, peer) = connect_default("Runtime");
    let journal = Journal::new();
    let a = Recorder::new("a", &journal);
    let b = Recorder::new("b", &journal);
    connector.add_callback("Tick", a.as_callback()).unwrap();
    connector.add_callback("Tick", b.as_callback()).unwrap();

    peer.deliver(Envelope::new("Tick"));
    assert!(peer.flush(WAIT));
    connector.recycle_dispatch_thread().unwrap();
    peer.deliver(Envelope::new("Tick"));
    assert!(journal.wait_for(6, WAIT));

    assert_eq!(
        journal.lines(),
        expected(&[
            ("a", "message:Tick", 1),
            ("b", "message:Tick", 1),
            ("a", "disconnect", 1),
            ("b", "disconnect", 1),
            ("a", "message:Tick", 2),
            ("b", "message:Tick", 2),
        ])
    );
    assert_eq!(connector.metrics().dispatch_recycles, 1);
    connector.stop();
}

/// Test that a dropped connection recycles the worker once, and dispatch resumes after reconnecting.
#[test]
fn test_disconnect_recycles_worker() {
    let (connector, peer) = connect_default("Runtime");
    let journal = Journal::new();
    let a = Recorder::new("a", &journal);
    connector.add_callback("Tick", a.as_callback()).unwrap();

    peer.fail("peer crashed");
    // Already terminal; no second recycle.
    peer.disconnect();
    assert!(peer.flush(WAIT));
    assert!(journal.wait_for(1, WAIT));
    assert!(eventually(WAIT, || connector.state() == ConnectionState::Stopped));

    peer.connect();
    assert!(connector.wait_for_startup(WAIT));
    peer.deliver(Envelope::new("Tick"));
    assert!(journal.wait_for(2, WAIT));

    assert_eq!(
        journal.lines(),
        expected(&[("a", "disconnect", 1), ("a", "message:Tick", 2)])
    );
    assert_eq!(connector.metrics().dispatch_recycles, 1);
    assert_eq!(a.disconnects(), 1);
    connector.stop();
}

/// Test that recycling on disconnect can be turned off.
#[test]
fn test_disconnect_without_recycle() {
    let config = ConnectorConfig::new().with_recycle_on_disconnect(false);
    let (connector, peer) = connect("Runtime", config);
    let journal = Journal::new();
    let a = Recorder::new("a", &journal);
    connector.add_callback("Tick", a.as_callback()).unwrap();

    peer.fail("peer crashed");
    peer.connect();
    peer.deliver(Envelope::new("Tick"));
    assert!(journal.wait_for(1, WAIT));

    assert_eq!(journal.lines(), expected(&[("a", "message:Tick", 1)]));
    assert_eq!(connector.metrics().dispatch_recycles, 0);
    connector.stop();
}

/// Test that each recycle advances the worker generation.
#[test]
fn test_repeated_recycles() {
    let (connector, peer) = connect_default("Runtime");
    let journal = Journal::new();
    let a = Recorder::new("a", &journal);
    connector.add_callback("Tick", a.as_callback()).unwrap();

    for _ in 0..3 {
        connector.recycle_dispatch_thread().unwrap();
    }
    peer.deliver(Envelope::new("Tick"));
    assert!(journal.wait_for(4, WAIT));

    assert_eq!(
        journal.lines(),
        expected(&[
            ("a", "disconnect", 1),
            ("a", "disconnect", 2),
            ("a", "disconnect", 3),
            ("a", "message:Tick", 4),
        ])
    );
    connector.stop();
    assert_eq!(a.disconnects(), 4);
}

/// Test that a stopped connector refuses to recycle.
#[test]
fn test_recycle_after_stop_fails() {
    let (connector, _peer) = connect_default("Runtime");
    connector.stop();
    assert!(matches!(
        connector.recycle_dispatch_thread(),
        Err(ConnectorError::Stopped)
    ));
}
