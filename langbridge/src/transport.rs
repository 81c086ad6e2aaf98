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

//! Transport seam between the connector and the peer runtime.
//!
//! The connector never touches sockets, pipes or framing. It talks to a
//! [`Session`] that owns the connection, and receives the session's state
//! transitions and inbound envelopes through [`SessionEvents`]. Sessions are
//! built per logical identity by a [`SessionFactory`].
//!
//! This module ships one implementation, [`MemoryTransport`], which connects
//! a [`MemorySession`] to an in-process [`MemoryPeer`]. It is used by the
//! tests and benchmarks and is a working model of what a real transport has
//! to provide.
//!
//! # Example
//!
//! ```rust
//! use langbridge::transport::{MemoryConfig, MemorySessionFactory, SessionFactory};
//!
//! let factory = MemorySessionFactory::new(MemoryConfig::default());
//! let session = factory.create("Runtime").unwrap();
//! assert_eq!(session.identity(), "Runtime");
//! assert!(factory.peer("Runtime").is_some());
//! ```

mod error;
mod memory;
mod traits;
mod types;

pub use error::TransportError;
pub use memory::{MemoryConfig, MemoryPeer, MemorySession, MemorySessionFactory, MemoryTransport};
pub use traits::{Session, SessionEvents, SessionFactory};
pub use types::ConnectionState;
