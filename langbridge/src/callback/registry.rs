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

use crate::callback::Callback;
use crate::envelope::Envelope;
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[cfg(feature = "observability")]
use tracing::{debug, error};

/// One registration: a class name and the callback registered for it.
pub struct CallbackEntry {
    class: String,
    callback: Arc<dyn Callback>,
}

impl CallbackEntry {
    /// The class this entry receives.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The registered callback.
    #[must_use]
    pub fn callback(&self) -> &Arc<dyn Callback> {
        &self.callback
    }

    /// Returns `true` if this entry wraps `callback` (by identity).
    #[must_use]
    pub fn wraps(&self, callback: &Arc<dyn Callback>) -> bool {
        same_callback(&self.callback, callback)
    }
}

impl fmt::Debug for CallbackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

// Compare data pointers only; vtable pointers for one type may differ across
// codegen units.
fn same_callback(a: &Arc<dyn Callback>, b: &Arc<dyn Callback>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Ordered list of callback registrations.
///
/// Entries keep their registration order. Mutation happens under a short-held
/// lock; delivery works on a snapshot taken under that lock and runs with the
/// lock released, so a slow callback never blocks registration or removal.
///
/// The same callback may be registered several times, under the same or
/// different classes; each registration is a separate entry.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: Mutex<Vec<Arc<CallbackEntry>>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration of `callback` for `class`.
    pub fn add(&self, class: impl Into<String>, callback: Arc<dyn Callback>) {
        let entry = Arc::new(CallbackEntry {
            class: class.into(),
            callback,
        });
        #[cfg(feature = "observability")]
        debug!(class = %entry.class, "Callback registered");
        self.entries.lock().push(entry);
    }

    /// Removes the first registration of `callback`, whatever its class.
    ///
    /// Returns `false` if `callback` is not registered. A dispatch that took
    /// its snapshot before the removal may still deliver to it.
    pub fn remove(&self, callback: &Arc<dyn Callback>) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|entry| entry.wraps(callback)) {
            Some(index) => {
                let _entry = entries.remove(index);
                #[cfg(feature = "observability")]
                debug!(class = %_entry.class, "Callback removed");
                true
            }
            None => false,
        }
    }

    /// Snapshot of the entries registered for `class`, in registration order.
    #[must_use]
    pub fn matching(&self, class: &str) -> Vec<Arc<CallbackEntry>> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.class == class)
            .cloned()
            .collect()
    }

    /// Snapshot of every entry, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<CallbackEntry>> {
        self.entries.lock().clone()
    }

    /// Delivers `envelope` to every entry registered for its class.
    ///
    /// Returns the number of callbacks invoked. An envelope without a class
    /// matches nothing. A panicking callback is logged and does not prevent
    /// delivery to the rest.
    pub fn dispatch(&self, envelope: &Envelope) -> usize {
        let Some(class) = envelope.class() else {
            return 0;
        };
        let targets = self.matching(class);
        for entry in &targets {
            invoke(entry, "on_message", || entry.callback.on_message(envelope));
        }
        targets.len()
    }

    /// Calls [`Callback::on_thread_disconnect`] on every entry, in
    /// registration order. Returns the number of entries notified.
    pub fn notify_thread_disconnect(&self) -> usize {
        let targets = self.snapshot();
        for entry in &targets {
            invoke(entry, "on_thread_disconnect", || {
                entry.callback.on_thread_disconnect();
            });
        }
        targets.len()
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

fn invoke(_entry: &CallbackEntry, _hook: &str, call: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(call)).is_err() {
        #[cfg(feature = "observability")]
        error!(class = %_entry.class, hook = _hook, "Callback panicked");
    }
}
