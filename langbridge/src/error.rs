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

//! Top-level error type for langbridge.
//!
//! [`ConnectorError`] composes the layer errors:
//!
//! 1. **Transport layer**: the session could not be created, started, or
//!    written to ([`TransportError`])
//! 2. **Call layer**: a correlated call produced no reply ([`CallError`])
//! 3. **Dispatch layer**: the dispatch worker is gone ([`DispatchError`])
//!
//! plus two connector-level conditions: the connector has been stopped, or
//! its configuration is invalid.
//!
//! # Error Handling Strategy
//!
//! - **Transport errors** fail the operation that hit them. A session that
//!   reaches a terminal state additionally fails every outstanding call.
//! - **Call errors** are local to their call and never affect other calls or
//!   registered callbacks.
//! - **Stopped** is final for the connector that reported it.
//!
//! Nothing in this crate retries; that is left to the caller.
//!
//! # Examples
//!
//! ```rust
//! use langbridge::ConnectorError;
//! use langbridge::call::CallError;
//! use langbridge::transport::TransportError;
//!
//! let error: ConnectorError = TransportError::NotConnected.into();
//! assert!(error.is_transport_error());
//! assert!(error.is_recoverable());
//!
//! let error: ConnectorError = CallError::Stopped.into();
//! assert!(error.is_stopped());
//! assert!(!error.is_recoverable());
//! ```

use crate::call::CallError;
use crate::dispatch::DispatchError;
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level connector error.
#[derive(Debug)]
pub enum ConnectorError {
    /// Session creation, start or send failed.
    Transport(TransportError),

    /// A correlated call failed.
    Call(CallError),

    /// The dispatch worker could not be started or has shut down.
    Dispatch(DispatchError),

    /// The connector has been stopped.
    Stopped,

    /// The connector configuration is invalid.
    InvalidConfiguration {
        /// Description of the problem
        reason: String,
    },
}

impl ConnectorError {
    /// Returns `true` for [`ConnectorError::Transport`].
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` for [`ConnectorError::Call`].
    #[must_use]
    pub const fn is_call_error(&self) -> bool {
        matches!(self, Self::Call(_))
    }

    /// Returns `true` for [`ConnectorError::Dispatch`].
    #[must_use]
    pub const fn is_dispatch_error(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }

    /// Returns `true` if the connector was stopped, at whatever layer that was
    /// noticed.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        match self {
            Self::Stopped => true,
            Self::Call(e) => matches!(e, CallError::Stopped),
            Self::Dispatch(e) => e.is_stopped(),
            Self::Transport(_) | Self::InvalidConfiguration { .. } => false,
        }
    }

    /// Returns `true` for a call that timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Call(e) if e.is_timeout())
    }

    /// Returns `true` if trying again later may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Call(e) => e.is_recoverable(),
            Self::Dispatch(_) | Self::Stopped | Self::InvalidConfiguration { .. } => false,
        }
    }
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Call(e) => write!(f, "call error: {}", e),
            Self::Dispatch(e) => write!(f, "dispatch error: {}", e),
            Self::Stopped => write!(f, "connector is stopped"),
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
        }
    }
}

impl StdError for ConnectorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Call(e) => Some(e),
            Self::Dispatch(e) => Some(e),
            Self::Stopped | Self::InvalidConfiguration { .. } => None,
        }
    }
}

impl From<TransportError> for ConnectorError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<CallError> for ConnectorError {
    fn from(error: CallError) -> Self {
        Self::Call(error)
    }
}

impl From<DispatchError> for ConnectorError {
    fn from(error: DispatchError) -> Self {
        Self::Dispatch(error)
    }
}
