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

//! Connection state as observed by the connector, and startup waits.

use crate::Timeout;
use crate::transport::ConnectionState;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Observed {
    state: ConnectionState,
    connected_epoch: u64,
    stopped: bool,
}

/// Monitor over the last observed session state.
///
/// Every transition into `Connected` bumps an epoch. A startup wait records
/// the epoch on entry under the same lock it then waits on, so a transition
/// that lands between the check and the wait is never missed.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    observed: Mutex<Observed>,
    changed: Condvar,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a transition. Returns the previously observed state.
    pub(crate) fn observe(&self, next: ConnectionState) -> ConnectionState {
        let mut observed = self.observed.lock();
        let previous = std::mem::replace(&mut observed.state, next);
        if next == ConnectionState::Connected && previous != ConnectionState::Connected {
            observed.connected_epoch += 1;
            self.changed.notify_all();
        }
        previous
    }

    /// Marks the connector stopped and wakes every waiter.
    ///
    /// Returns `false` if it was already stopped.
    pub(crate) fn stop(&self) -> bool {
        let mut observed = self.observed.lock();
        if observed.stopped {
            return false;
        }
        observed.stopped = true;
        self.changed.notify_all();
        true
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.observed.lock().stopped
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.observed.lock().state
    }

    /// Blocks until the session is observed `Connected`.
    ///
    /// Returns `true` at once if it already is. Returns `false` if the
    /// connector is or becomes stopped, or `timeout` elapses first. An
    /// `Errored` session does not end the wait, since the transport may still
    /// reconnect.
    pub(crate) fn wait_for_startup(&self, timeout: Timeout) -> bool {
        let deadline = timeout.deadline();
        let mut observed = self.observed.lock();
        let epoch = observed.connected_epoch;
        loop {
            if observed.stopped {
                return false;
            }
            if observed.state == ConnectionState::Connected || observed.connected_epoch != epoch {
                return true;
            }
            match deadline {
                None => self.changed.wait(&mut observed),
                Some(deadline) => {
                    if self.changed.wait_until(&mut observed, deadline).timed_out() {
                        return !observed.stopped
                            && (observed.state == ConnectionState::Connected
                                || observed.connected_epoch != epoch);
                    }
                }
            }
        }
    }
}
