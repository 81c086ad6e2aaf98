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

//! Call layer error types.

use crate::Timeout;
use crate::envelope::CorrelationId;
use crate::transport::TransportError;
use std::sync::Arc;
use thiserror::Error;

/// Why a correlated call produced no reply.
///
/// Call errors are local to one call: a timeout or a failed send never
/// affects other in-flight calls. Only a disconnect is broadcast, and then
/// every outstanding call receives its own [`CallError::Disconnected`].
///
/// The error is cheap to clone so that a resolved slot can hand the same
/// outcome to every waiter.
///
/// # Examples
///
/// ```rust
/// use langbridge::call::CallError;
/// use langbridge::envelope::CorrelationId;
/// use langbridge::Timeout;
///
/// let error = CallError::Timeout {
///     correlation_id: CorrelationId::from(4),
///     timeout: Timeout::from_millis(500),
/// };
/// assert!(error.is_timeout());
/// assert!(error.is_recoverable());
/// assert_eq!(error.to_string(), "Call(4) timed out after 500ms");
/// ```
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// No reply arrived within the timeout.
    #[error("{correlation_id} timed out after {timeout}")]
    Timeout {
        /// The call that timed out
        correlation_id: CorrelationId,
        /// The bound that elapsed
        timeout: Timeout,
    },

    /// The session went away while the call was outstanding.
    #[error("{correlation_id} failed: connection lost")]
    Disconnected {
        /// The call that was outstanding
        correlation_id: CorrelationId,
    },

    /// The call was cancelled before a reply arrived.
    #[error("{correlation_id} was cancelled")]
    Cancelled {
        /// The cancelled call
        correlation_id: CorrelationId,
    },

    /// The request could not be handed to the transport.
    #[error("failed to send request: {source}")]
    SendFailed {
        /// The transport's reason
        #[source]
        source: Arc<TransportError>,
    },

    /// The connector has been stopped.
    #[error("connector is stopped")]
    Stopped,
}

impl CallError {
    /// Returns `true` for [`CallError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` for [`CallError::Disconnected`].
    #[must_use]
    pub const fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }

    /// Returns `true` for [`CallError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns `true` if issuing the call again may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Disconnected { .. } => true,
            Self::SendFailed { source } => source.is_recoverable(),
            Self::Cancelled { .. } | Self::Stopped => false,
        }
    }

    /// The call this error belongs to, if it got far enough to have one.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            Self::Timeout { correlation_id, .. }
            | Self::Disconnected { correlation_id }
            | Self::Cancelled { correlation_id } => Some(*correlation_id),
            Self::SendFailed { .. } | Self::Stopped => None,
        }
    }
}

impl From<TransportError> for CallError {
    fn from(error: TransportError) -> Self {
        Self::SendFailed {
            source: Arc::new(error),
        }
    }
}
