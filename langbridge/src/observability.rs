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

//! Observability support for langbridge.
//!
//! Two pieces:
//!
//! - **[`ConnectorMetrics`]**: atomic counters for calls, messages, fan-out and
//!   worker recycles, readable at any time through a [`MetricsSnapshot`] and
//!   exported to the `metrics` crate when the `observability` feature is on.
//! - **[`log_error`]**: structured logging of a [`ConnectorError`] through
//!   `tracing`, at a level chosen from the error's layer and recoverability.
//!
//! Lifecycle transitions, dropped envelopes and worker panics are logged from
//! where they happen; install any `tracing` subscriber to see them.
//!
//! ```rust,no_run
//! tracing_subscriber::fmt()
//!     .with_env_filter("langbridge=debug")
//!     .init();
//! ```

mod metrics;

pub use metrics::{ConnectorMetrics, MetricsSnapshot};

use crate::ConnectorError;

/// Logs `error` with its layer and recoverability.
///
/// Transport and dispatch failures log at `error`, call failures at `warn`
/// when recoverable and `error` otherwise, and everything else at `info`.
#[cfg(feature = "observability")]
pub fn log_error(error: &ConnectorError) {
    match error {
        ConnectorError::Transport(e) => {
            tracing::error!(
                error = %e,
                recoverable = error.is_recoverable(),
                should_close_transport = e.should_close_transport(),
                "Transport error occurred"
            );
        }
        ConnectorError::Call(e) => {
            if e.is_recoverable() {
                tracing::warn!(
                    error = %e,
                    correlation_id = ?e.correlation_id(),
                    "Call failed"
                );
            } else {
                tracing::error!(
                    error = %e,
                    correlation_id = ?e.correlation_id(),
                    "Call failed permanently"
                );
            }
        }
        ConnectorError::Dispatch(e) => {
            tracing::error!(error = %e, "Dispatch error occurred");
        }
        ConnectorError::Stopped | ConnectorError::InvalidConfiguration { .. } => {
            tracing::info!(error = %error, "Connector rejected request");
        }
    }
}

/// No-op when the `observability` feature is disabled.
#[cfg(not(feature = "observability"))]
#[inline]
pub fn log_error(_error: &ConnectorError) {}
