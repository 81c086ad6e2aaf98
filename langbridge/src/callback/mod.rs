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

//! Class-keyed callbacks for inbound notifications.
//!
//! A [`Callback`] is registered under a class name. Every inbound envelope
//! that is not a reply is delivered to each callback registered for the
//! envelope's class, on the dispatch worker, in registration order.
//!
//! # Example
//!
//! ```rust
//! use langbridge::callback::{Callback, CallbackRegistry};
//! use langbridge::envelope::Envelope;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! impl Callback for Counter {
//!     fn on_message(&self, _envelope: &Envelope) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let registry = CallbackRegistry::new();
//! let counter = Arc::new(Counter::default());
//! registry.add("Tick", counter.clone());
//!
//! assert_eq!(registry.dispatch(&Envelope::new("Tick")), 1);
//! assert_eq!(registry.dispatch(&Envelope::new("Tock")), 0);
//! assert_eq!(counter.0.load(Ordering::Relaxed), 1);
//! ```

mod registry;

pub use registry::{CallbackEntry, CallbackRegistry};

use crate::envelope::Envelope;

/// Receiver of notifications for one or more classes.
///
/// Callbacks are shared: the registry holds one reference and every dispatch
/// in flight holds another, so a callback may still be running after it has
/// been removed.
pub trait Callback: Send + Sync {
    /// Handles an inbound notification. Runs on the dispatch worker.
    fn on_message(&self, envelope: &Envelope);

    /// The dispatch worker is about to exit, either because it is being
    /// recycled or because the connector is stopping.
    ///
    /// Runs on that worker, once per registration, before it exits.
    fn on_thread_disconnect(&self) {}
}
