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

use std::fmt;

/// Connection state reported by a [`Session`](super::Session).
///
/// The session originates every transition; the connector only reacts.
///
/// ```text
/// Stopped ──► Starting ──► Connected ──► Stopping ──► Stopped
///                │             │
///                └─────────────┴──────────► Errored
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not running. Also the initial state before `start`.
    #[default]
    Stopped,
    /// Establishing the connection.
    Starting,
    /// Connected; envelopes can be exchanged.
    Connected,
    /// Shutting down at the connector's request.
    Stopping,
    /// The connection failed.
    Errored,
}

impl ConnectionState {
    /// Returns `true` for states in which the session no longer carries traffic.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Errored)
    }

    /// Returns `true` if envelopes can currently be sent.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// A short lowercase name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Connected => "connected",
            Self::Stopping => "stopping",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
