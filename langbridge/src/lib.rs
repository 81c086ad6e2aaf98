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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # Crate Layout
//!
//! Leaf first:
//!
//! - [`envelope`]: the immutable [`Envelope`] exchanged with the peer and the
//!   [`CorrelationId`] that links a request to its reply
//! - [`transport`]: the [`Session`] seam, connection states, and the
//!   in-memory transport used by tests and benchmarks
//! - [`call`]: call slots, the slot allocator and [`CallHandle`]
//! - [`dispatch`]: the single-worker [`DispatchExecutor`]
//! - [`callback`]: the [`Callback`] trait and the class-keyed registry
//! - [`connector`]: [`Connector`], its builder and configuration
//! - [`observability`]: counters and error logging
//!
//! ## Feature Flags
//!
//! - `observability` (default): structured logging through `tracing` and
//!   counter export through `metrics`
//!
//! [`Envelope`]: envelope::Envelope
//! [`CorrelationId`]: envelope::CorrelationId
//! [`Session`]: transport::Session
//! [`CallHandle`]: call::CallHandle
//! [`DispatchExecutor`]: dispatch::DispatchExecutor
//! [`Callback`]: callback::Callback

pub mod call;
pub mod callback;
pub mod connector;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod observability;
pub mod timeout;
pub mod transport;

pub use call::{CallError, CallHandle};
pub use callback::Callback;
pub use connector::{Connector, ConnectorBuilder, ConnectorConfig};
pub use envelope::{CorrelationId, Envelope};
pub use error::ConnectorError;
pub use observability::{ConnectorMetrics, MetricsSnapshot, log_error};
pub use timeout::Timeout;
pub use transport::{ConnectionState, Session, SessionEvents, SessionFactory, TransportError};
