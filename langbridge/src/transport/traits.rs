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

use crate::envelope::Envelope;
use crate::transport::{ConnectionState, TransportError};
use std::sync::Arc;

/// A connection to the peer runtime that exchanges whole envelopes.
///
/// The session owns whatever sits underneath (a pipe, a socket, an in-process
/// queue) along with its framing and reconnection policy. The connector sees
/// only the operations below plus the notifications delivered through
/// [`SessionEvents`].
///
/// # Threading
///
/// Notifications are delivered on a thread owned by the session, one at a
/// time and in the order the session observed them. `send` and `close` may be
/// called from any thread.
///
/// # Examples
///
/// ```rust
/// use langbridge::envelope::Envelope;
/// use langbridge::transport::{
///     ConnectionState, MemoryConfig, MemoryTransport, Session, SessionEvents,
/// };
/// use std::sync::Arc;
///
/// struct Quiet;
///
/// impl SessionEvents for Quiet {
///     fn on_state_change(&self, _previous: ConnectionState, _next: ConnectionState) {}
///     fn on_message(&self, _envelope: Envelope) {}
/// }
///
/// let (session, peer) = MemoryTransport::pair("Runtime", MemoryConfig::default());
/// session.start(Arc::new(Quiet)).unwrap();
/// peer.flush(std::time::Duration::from_secs(1));
/// assert_eq!(session.state(), ConnectionState::Connected);
/// ```
pub trait Session: Send + Sync {
    /// Begins establishing the connection.
    ///
    /// Returns as soon as establishment is underway; progress is reported
    /// through `events`.
    ///
    /// # Errors
    ///
    /// Fails if the session was already started or cannot begin establishing
    /// the connection at all.
    fn start(&self, events: Arc<dyn SessionEvents>) -> Result<(), TransportError>;

    /// Hands an envelope to the session for delivery to the peer.
    ///
    /// Success means the session accepted the envelope, not that the peer
    /// received it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotConnected`] while the session is not
    /// connected and [`TransportError::Closed`] after `close`.
    fn send(&self, envelope: &Envelope) -> Result<(), TransportError>;

    /// Moves the session toward [`ConnectionState::Stopped`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the session was already closed.
    fn close(&self) -> Result<(), TransportError>;

    /// The session's current state.
    fn state(&self) -> ConnectionState;

    /// The logical identity this session was created for.
    fn identity(&self) -> &str;
}

/// Receiver for session notifications.
///
/// Both methods run on the session's own thread and must not block.
pub trait SessionEvents: Send + Sync {
    /// The session moved from `previous` to `next`.
    fn on_state_change(&self, previous: ConnectionState, next: ConnectionState);

    /// An envelope arrived from the peer.
    fn on_message(&self, envelope: Envelope);
}

/// Builds sessions for logical identities.
pub trait SessionFactory: Send + Sync {
    /// Creates an unstarted session bound to `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be constructed. The connector
    /// reports this as a failed start.
    fn create(&self, identity: &str) -> Result<Arc<dyn Session>, TransportError>;
}
