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

//! Builder for configuring and starting connectors.

use crate::call::CallSlots;
use crate::callback::CallbackRegistry;
use crate::connector::config::ConnectorConfig;
use crate::connector::connector::{Connector, Inner};
use crate::connector::lifecycle::Lifecycle;
use crate::connector::router::Router;
use crate::dispatch::DispatchExecutor;
use crate::observability::ConnectorMetrics;
use crate::transport::SessionFactory;
use crate::{ConnectorError, Timeout};
use std::sync::Arc;

#[cfg(feature = "observability")]
use tracing::{info, instrument, warn};

/// Builder for a [`Connector`].
///
/// # Examples
///
/// ```rust
/// use langbridge::Connector;
/// use langbridge::transport::{MemoryConfig, MemorySessionFactory};
/// use std::time::Duration;
///
/// let factory = MemorySessionFactory::new(MemoryConfig::default());
/// let connector = Connector::builder("Runtime")
///     .dispatch_thread_name("runtime-dispatch")
///     .call_timeout(Duration::from_secs(2))
///     .start(&factory)
///     .unwrap();
///
/// assert_eq!(connector.config().dispatch_thread_name, "runtime-dispatch");
/// connector.stop();
/// ```
#[derive(Debug, Clone)]
pub struct ConnectorBuilder {
    identity: String,
    config: ConnectorConfig,
}

impl ConnectorBuilder {
    /// Creates a builder for `identity` with the default configuration.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            config: ConnectorConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the dispatch worker thread name.
    #[must_use]
    pub fn dispatch_thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.dispatch_thread_name = name.into();
        self
    }

    /// Sets the default call timeout.
    #[must_use]
    pub fn call_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.config.call_timeout = timeout.into();
        self
    }

    /// Sets the default startup timeout.
    #[must_use]
    pub fn startup_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.config.startup_timeout = timeout.into();
        self
    }

    /// Enables or disables recycling the dispatch worker on disconnect.
    #[must_use]
    pub fn recycle_on_disconnect(mut self, recycle: bool) -> Self {
        self.config.recycle_on_disconnect = recycle;
        self
    }

    /// Creates the session, spawns the dispatch worker and starts connecting.
    ///
    /// Returns without waiting for the connection.
    ///
    /// # Errors
    ///
    /// - [`ConnectorError::InvalidConfiguration`] if the configuration is invalid
    /// - [`ConnectorError::Transport`] if the session cannot be created or started
    /// - [`ConnectorError::Dispatch`] if the dispatch worker cannot be spawned
    #[cfg_attr(feature = "observability", instrument(skip_all, fields(identity = %self.identity)))]
    pub fn start(self, factory: &dyn SessionFactory) -> Result<Connector, ConnectorError> {
        self.config.validate()?;

        let session = factory.create(&self.identity)?;
        let executor = Arc::new(DispatchExecutor::new(
            self.config.dispatch_thread_name.as_str(),
        )?);
        let slots = Arc::new(CallSlots::new());
        let registry = Arc::new(CallbackRegistry::new());
        let lifecycle = Arc::new(Lifecycle::new());
        let metrics = Arc::new(ConnectorMetrics::new());

        let router = Arc::new(Router {
            identity: self.identity.clone(),
            slots: Arc::clone(&slots),
            registry: Arc::clone(&registry),
            executor: Arc::clone(&executor),
            lifecycle: Arc::clone(&lifecycle),
            metrics: Arc::clone(&metrics),
            recycle_on_disconnect: self.config.recycle_on_disconnect,
        });

        if let Err(error) = session.start(router) {
            #[cfg(feature = "observability")]
            warn!(identity = %self.identity, error = %error, "Session failed to start");

            let _ = session.close();
            executor.shutdown(|| {});
            return Err(error.into());
        }

        #[cfg(feature = "observability")]
        info!(identity = %self.identity, "Connector started");

        Ok(Connector::from_inner(Arc::new(Inner {
            identity: self.identity,
            config: self.config,
            session,
            slots,
            registry,
            executor,
            lifecycle,
            metrics,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryConfig, MemorySessionFactory};

    #[test]
    fn test_invalid_config_is_rejected_before_session_creation() {
        let factory = MemorySessionFactory::new(MemoryConfig::default());
        let result = ConnectorBuilder::new("Runtime")
            .dispatch_thread_name("")
            .start(&factory);
        assert!(matches!(
            result,
            Err(ConnectorError::InvalidConfiguration { .. })
        ));
        assert!(factory.peer("Runtime").is_none());
    }

    #[test]
    fn test_session_creation_failure() {
        let factory = MemorySessionFactory::new(MemoryConfig::default());
        factory.fail_next_create("runtime not installed");
        let error = ConnectorBuilder::new("Runtime").start(&factory).unwrap_err();
        assert!(error.is_transport_error());
    }

    #[test]
    fn test_config_is_kept() {
        let factory = MemorySessionFactory::new(MemoryConfig::default());
        let connector = ConnectorBuilder::new("Runtime")
            .recycle_on_disconnect(false)
            .startup_timeout(Timeout::from_millis(100))
            .start(&factory)
            .unwrap();
        assert!(!connector.config().recycle_on_disconnect);
        assert_eq!(connector.config().startup_timeout, Timeout::from_millis(100));
        assert_eq!(connector.identity(), "Runtime");
    }
}
