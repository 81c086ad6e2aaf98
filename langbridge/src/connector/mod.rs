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

//! The connector: lifecycle, call correlation and callback dispatch over one
//! session.
//!
//! # Threads
//!
//! - The **transport thread** (owned by the session) delivers state changes
//!   and inbound envelopes. Replies settle their call right there; all other
//!   work is queued to the dispatch worker.
//! - The **dispatch worker** runs callbacks and lifecycle reactions one at a
//!   time, in arrival order.
//! - **Application threads** call into the connector freely; only
//!   [`Connector::wait_for_startup`], [`Connector::call`] and
//!   [`CallHandle::wait_for_result`](crate::call::CallHandle::wait_for_result)
//!   block.

mod builder;
mod config;
#[allow(clippy::module_inception)]
mod connector;
mod lifecycle;
mod router;

pub use builder::ConnectorBuilder;
pub use config::ConnectorConfig;
pub use connector::Connector;
