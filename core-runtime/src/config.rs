//! # Core Configuration Module
//!
//! Provides configuration management for the reconciliation engine.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the injected platform bridges and the network/batch
//! settings the engine needs. It enforces fail-fast validation so a missing
//! capability surfaces at startup, not in the middle of a batch run.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - required for catalog search and artwork download
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(ReqwestHttpClient::new()))
//!     .user_agent("my-tagger/1.0 (contact@example.com)")
//!     .batch_concurrency(8)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use bridge_traits::http::HttpClient;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default user agent sent to remote catalogs.
const DEFAULT_USER_AGENT: &str = "retag-core/0.1.0";

/// Default timeout for catalog search requests.
const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for artwork downloads.
const DEFAULT_ARTWORK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default batch worker pool width.
const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Default event bus capacity.
const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Assembled engine configuration.
///
/// Holds the platform bridges and settings shared by the engine services.
/// Construct through [`CoreConfig::builder`].
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP bridge used for catalog search and artwork download.
    pub http_client: Arc<dyn HttpClient>,
    /// User agent identifying this client to remote catalogs.
    pub user_agent: String,
    /// Timeout applied to each catalog search request.
    pub search_timeout: Duration,
    /// Timeout applied to each artwork download.
    pub artwork_timeout: Duration,
    /// Worker pool width for batch runs.
    pub batch_concurrency: usize,
    /// Event bus buffer capacity.
    pub event_capacity: usize,
}

impl CoreConfig {
    /// Create a builder for the configuration.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validate the assembled configuration.
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(Error::Config(
                "User agent must not be empty; remote catalogs require client identification"
                    .to_string(),
            ));
        }
        if self.batch_concurrency == 0 {
            return Err(Error::Config(
                "Batch concurrency must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config(
                "Event capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    user_agent: Option<String>,
    search_timeout: Option<Duration>,
    artwork_timeout: Option<Duration>,
    batch_concurrency: Option<usize>,
    event_capacity: Option<usize>,
}

impl CoreConfigBuilder {
    /// Inject the HTTP bridge implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the user agent sent to remote catalogs.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the catalog search timeout.
    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = Some(timeout);
        self
    }

    /// Set the artwork download timeout.
    pub fn artwork_timeout(mut self, timeout: Duration) -> Self {
        self.artwork_timeout = Some(timeout);
        self
    }

    /// Set the batch worker pool width.
    pub fn batch_concurrency(mut self, width: usize) -> Self {
        self.batch_concurrency = Some(width);
        self
    }

    /// Set the event bus buffer capacity.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Assemble and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityMissing` when no HTTP client was injected,
    /// or `Error::Config` when a setting fails validation.
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = self.http_client.ok_or_else(|| Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "No HTTP client implementation provided. \
                      Desktop: use bridge_desktop::ReqwestHttpClient. \
                      Other hosts: inject a platform-native adapter."
                .to_string(),
        })?;

        let config = CoreConfig {
            http_client,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            search_timeout: self.search_timeout.unwrap_or(DEFAULT_SEARCH_TIMEOUT),
            artwork_timeout: self.artwork_timeout.unwrap_or(DEFAULT_ARTWORK_TIMEOUT),
            batch_concurrency: self.batch_concurrency.unwrap_or(DEFAULT_BATCH_CONCURRENCY),
            event_capacity: self.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY),
        };

        config.validate()?;

        Ok(config)
    }
}
