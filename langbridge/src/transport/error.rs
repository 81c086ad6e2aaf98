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

//! Transport layer error types.
//!
//! Transport errors are the lowest layer of the connector's error hierarchy.
//! They describe failures of the session that owns the connection to the
//! peer runtime: the session could not be built, is not connected, or
//! refused an outbound envelope.
//!
//! # Recovery Strategy
//!
//! A transport error on a single `send` fails only that call. A session that
//! reaches a terminal state fails every outstanding call at once; whether the
//! session later reconnects is the transport's business, not the connector's.

use crate::envelope::EnvelopeError;
use thiserror::Error;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use langbridge::transport::TransportError;
///
/// let error = TransportError::NotConnected;
/// assert!(error.is_recoverable());
/// assert!(!error.should_close_transport());
///
/// let error = TransportError::Closed;
/// assert!(!error.is_recoverable());
/// assert!(error.should_close_transport());
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// The session is not (or not yet) connected to the peer.
    #[error("transport is not connected")]
    NotConnected,

    /// The session has been closed and will not accept further envelopes.
    #[error("transport is closed")]
    Closed,

    /// The session accepted the connection but could not hand over an envelope.
    #[error("send failed: {reason}")]
    SendFailed {
        /// Description of why the send failed
        reason: String,
    },

    /// The session for a logical identity could not be constructed or started.
    #[error("failed to start session for '{identity}': {reason}")]
    SessionFailed {
        /// The logical identity the session was created for
        identity: String,
        /// Description of the failure
        reason: String,
    },

    /// Invalid transport configuration.
    ///
    /// This is not recoverable and indicates a programming error.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// An envelope could not be encoded for, or decoded from, the wire.
    #[error("envelope encoding failed: {source}")]
    Encoding {
        /// The underlying envelope error
        #[from]
        source: EnvelopeError,
    },
}

impl TransportError {
    /// Creates a [`TransportError::SendFailed`] with the given reason.
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed {
            reason: reason.into(),
        }
    }

    /// Creates a [`TransportError::SessionFailed`] for `identity`.
    pub fn session_failed(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SessionFailed {
            identity: identity.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if retrying the operation later may succeed.
    ///
    /// A session that is not connected yet, or that dropped a single envelope,
    /// may recover; a closed or misconfigured one will not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::NotConnected
            | TransportError::SendFailed { .. }
            | TransportError::SessionFailed { .. } => true,

            TransportError::Closed
            | TransportError::InvalidConfiguration { .. }
            | TransportError::Encoding { .. } => false,
        }
    }

    /// Returns `true` if this error means the session is unusable.
    #[must_use]
    pub fn should_close_transport(&self) -> bool {
        match self {
            TransportError::Closed | TransportError::InvalidConfiguration { .. } => true,

            TransportError::NotConnected
            | TransportError::SendFailed { .. }
            | TransportError::SessionFailed { .. }
            | TransportError::Encoding { .. } => false,
        }
    }
}
