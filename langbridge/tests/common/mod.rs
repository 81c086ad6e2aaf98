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

//! Shared helpers for the integration tests.

#![allow(dead_code)]

use langbridge::callback::Callback;
use langbridge::envelope::Envelope;
use langbridge::transport::{MemoryConfig, MemoryPeer, MemorySessionFactory};
use langbridge::{Connector, ConnectorConfig, Timeout};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::Once;
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound for anything that should happen "soon".
pub const WAIT: Duration = Duration::from_secs(5);

/// Installs a test subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Starts a connector over a memory session and waits for it to connect.
pub fn connect(identity: &str, config: ConnectorConfig) -> (Connector, MemoryPeer) {
    init_tracing();
    let factory = MemorySessionFactory::new(MemoryConfig::default());
    let connector = Connector::builder(identity)
        .config(config)
        .start(&factory)
        .expect("connector should start");
    assert!(connector.wait_for_startup(Timeout::from(WAIT)));
    let peer = factory.peer(identity).expect("factory keeps the peer");
    (connector, peer)
}

/// Starts a connector with the default configuration.
pub fn connect_default(identity: &str) -> (Connector, MemoryPeer) {
    connect(identity, ConnectorConfig::default())
}

/// Append-only log shared between recorders, used to check cross-callback order.
#[derive(Default)]
pub struct Journal {
    lines: Mutex<Vec<String>>,
    grew: Condvar,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, line: String) {
        self.lines.lock().push(line);
        self.grew.notify_all();
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Waits until the journal holds at least `count` lines.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut lines = self.lines.lock();
        while lines.len() < count {
            if self.grew.wait_until(&mut lines, deadline).timed_out() {
                return lines.len() >= count;
            }
        }
        true
    }
}

/// Callback that writes every event, with the thread it ran on, to a journal.
pub struct Recorder {
    name: String,
    journal: Arc<Journal>,
    messages: Mutex<Vec<Envelope>>,
    disconnects: Mutex<usize>,
}

impl Recorder {
    pub fn new(name: &str, journal: &Arc<Journal>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: Arc::clone(journal),
            messages: Mutex::new(Vec::new()),
            disconnects: Mutex::new(0),
        })
    }

    pub fn messages(&self) -> Vec<Envelope> {
        self.messages.lock().clone()
    }

    pub fn disconnects(&self) -> usize {
        *self.disconnects.lock()
    }

    pub fn as_callback(self: &Arc<Self>) -> Arc<dyn Callback> {
        self.clone()
    }
}

fn thread_name() -> String {
    thread::current().name().unwrap_or("<unnamed>").to_string()
}

impl Callback for Recorder {
    fn on_message(&self, envelope: &Envelope) {
        self.messages.lock().push(envelope.clone());
        self.journal.push(format!(
            "{}:message:{}@{}",
            self.name,
            envelope.class().unwrap_or("-"),
            thread_name()
        ));
    }

    fn on_thread_disconnect(&self) {
        *self.disconnects.lock() += 1;
        self.journal
            .push(format!("{}:disconnect@{}", self.name, thread_name()));
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
