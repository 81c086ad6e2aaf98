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

//! Configuration types for connectors.

use crate::{ConnectorError, Timeout};
use std::time::Duration;

/// Configuration for a [`Connector`](crate::Connector).
///
/// # Examples
///
/// ```rust
/// use langbridge::{ConnectorConfig, Timeout};
/// use std::time::Duration;
///
/// // Use default configuration
/// let config = ConnectorConfig::default();
/// assert!(config.validate().is_ok());
///
/// // Customize configuration
/// let config = ConnectorConfig::new()
///     .with_dispatch_thread_name("excel-dispatch")
///     .with_call_timeout(Duration::from_secs(5))
///     .with_recycle_on_disconnect(false);
/// assert_eq!(config.call_timeout, Timeout::from_millis(5000));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Base name of the dispatch worker threads.
    ///
    /// Workers are named `"{name}-{generation}"`.
    ///
    /// Default: `"langbridge-dispatch"`
    pub dispatch_thread_name: String,

    /// Timeout used by [`Connector::call_default`](crate::Connector::call_default).
    ///
    /// Default: 30 seconds
    pub call_timeout: Timeout,

    /// Timeout used by
    /// [`Connector::wait_for_startup_default`](crate::Connector::wait_for_startup_default).
    ///
    /// Default: infinite
    pub startup_timeout: Timeout,

    /// Recycle the dispatch worker when the session reaches a terminal state,
    /// so callbacks receive `on_thread_disconnect` for every lost connection.
    ///
    /// Default: true
    pub recycle_on_disconnect: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            dispatch_thread_name: "langbridge-dispatch".to_string(),
            call_timeout: Timeout::After(Duration::from_secs(30)),
            startup_timeout: Timeout::Infinite,
            recycle_on_disconnect: true,
        }
    }
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("dispatch_thread_name", &self.dispatch_thread_name)
            .field("call_timeout", &format_args!("{}", self.call_timeout))
            .field("startup_timeout", &format_args!("{}", self.startup_timeout))
            .field("recycle_on_disconnect", &self.recycle_on_disconnect)
            .finish()
    }
}

impl ConnectorConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dispatch worker thread name.
    #[must_use]
    pub fn with_dispatch_thread_name(mut self, name: impl Into<String>) -> Self {
        self.dispatch_thread_name = name.into();
        self
    }

    /// Sets the default call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.call_timeout = timeout.into();
        self
    }

    /// Sets the default startup timeout.
    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.startup_timeout = timeout.into();
        self
    }

    /// Enables or disables recycling the dispatch worker on disconnect.
    #[must_use]
    pub fn with_recycle_on_disconnect(mut self, recycle: bool) -> Self {
        self.recycle_on_disconnect = recycle;
        self
    }

    /// Checks the configuration for values a connector cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidConfiguration`] if the dispatch thread
    /// name is empty or contains a NUL byte.
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.dispatch_thread_name.trim().is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                reason: "dispatch thread name must not be empty".to_string(),
            });
        }
        if self.dispatch_thread_name.contains('\0') {
            return Err(ConnectorError::InvalidConfiguration {
                reason: "dispatch thread name must not contain NUL".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.dispatch_thread_name, "langbridge-dispatch");
        assert_eq!(config.call_timeout, Timeout::from_millis(30_000));
        assert!(config.startup_timeout.is_infinite());
        assert!(config.recycle_on_disconnect);
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let config = ConnectorConfig::new().with_dispatch_thread_name("  ");
        assert!(matches!(
            config.validate(),
            Err(ConnectorError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_debug_formats_timeouts() {
        let text = format!("{:?}", ConnectorConfig::default());
        assert!(text.contains("call_timeout: 30s"));
        assert!(text.contains("startup_timeout: infinite"));
    }
}
