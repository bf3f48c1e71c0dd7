//! Backend construction options

use crate::error::BackendError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default relay address, matching a relay started with no overrides
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000";

/// Default transport timeout. The core itself never times out a round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Callback invoked with every failed transition
pub type ErrorHandler = Arc<dyn Fn(&BackendError) + Send + Sync>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid api base {api_base:?}: {reason}")]
    InvalidApiBase { api_base: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

/// Options recognized when constructing an [`crate::OracleBackend`]
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the relay; requests go to `<api_base>/query`
    pub api_base: String,
    /// Receives every failed transition; defaults to logging it
    pub error_handler: ErrorHandler,
    /// Free-text description of the app, mentioned in the first prompt
    pub description: Option<String>,
    pub request_timeout: Duration,
    /// Install a listener that logs every committed state
    pub log_states: bool,
}

impl BackendConfig {
    /// Read overrides from `ORACLE_API_BASE`, `ORACLE_DESCRIPTION` and
    /// `ORACLE_REQUEST_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when the timeout is not a whole
    /// number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(api_base) = std::env::var("ORACLE_API_BASE") {
            config.api_base = api_base;
        }
        config.description = std::env::var("ORACLE_DESCRIPTION").ok();
        if let Ok(secs) = std::env::var("ORACLE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    name: "ORACLE_REQUEST_TIMEOUT_SECS",
                    reason: e.to_string(),
                }
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_error_handler(
        mut self,
        handler: impl Fn(&BackendError) + Send + Sync + 'static,
    ) -> Self {
        self.error_handler = Arc::new(handler);
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_state_logging(mut self, enabled: bool) -> Self {
        self.log_states = enabled;
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            error_handler: Arc::new(log_error),
            description: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            log_states: true,
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_base", &self.api_base)
            .field("description", &self.description)
            .field("request_timeout", &self.request_timeout)
            .field("log_states", &self.log_states)
            .finish_non_exhaustive()
    }
}

fn log_error(error: &BackendError) {
    tracing::error!(error = %error, raw_reply = ?error.raw_reply(), "Transition failed");
}
