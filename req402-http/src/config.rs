//! Reporter configuration.
//!
//! Values set explicitly take precedence over the process environment. The
//! API key is the only required setting; everything else has a default.
//!
//! # Environment Variables
//!
//! - `REQ402_API_KEY` — Collector API key (required unless set explicitly)
//! - `REQ402_BACKEND_URL` — Collector base URL (default: `https://req402-backend.onrender.com`)
//! - `REQ402_TIMEOUT_SECS` — Delivery timeout in whole seconds (default: `5`)
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use req402_http::config::ReporterConfig;
//!
//! let config = ReporterConfig::new("fk_live_123")
//!     .with_backend_url("https://collector.example")
//!     .with_timeout(Duration::from_secs(2));
//! assert_eq!(config.api_key.as_deref(), Some("fk_live_123"));
//! ```

use std::time::Duration;

use crate::constants::{API_KEY_ENV, BACKEND_URL_ENV, TIMEOUT_SECS_ENV};
use crate::error::ConfigError;

/// Configuration for [`EventReporter`](crate::reporter::EventReporter).
#[derive(Clone, Default)]
pub struct ReporterConfig {
    /// Collector API key, sent in the `X-API-Key` header.
    pub api_key: Option<String>,

    /// Collector base URL. Defaults to
    /// [`DEFAULT_BACKEND_URL`](crate::constants::DEFAULT_BACKEND_URL).
    pub backend_url: Option<String>,

    /// Per-delivery timeout. Defaults to
    /// [`DEFAULT_TIMEOUT`](crate::constants::DEFAULT_TIMEOUT).
    pub timeout: Option<Duration>,

    /// Optional pre-configured reqwest client, shared with the rest of the
    /// application. If `None`, a new client is built.
    pub http_client: Option<reqwest::Client>,
}

impl ReporterConfig {
    /// Creates a config with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Loads every setting from the process environment.
    ///
    /// A missing API key is not reported here but when the reporter is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] if `REQ402_TIMEOUT_SECS` is not
    /// a whole number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Fills unset fields from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] if `REQ402_TIMEOUT_SECS` is not
    /// a whole number.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_lookup(|name| std::env::var(name).ok())
    }

    /// Fills unset fields using `lookup` to resolve variable names.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] if the timeout variable is not
    /// a whole number.
    pub fn with_lookup<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = resolve(API_KEY_ENV);
        }
        if self.backend_url.is_none() {
            self.backend_url = resolve(BACKEND_URL_ENV);
        }
        if self.timeout.is_none()
            && let Some(value) = resolve(TIMEOUT_SECS_ENV)
        {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout { value })?;
            self.timeout = Some(Duration::from_secs(secs));
        }
        Ok(self)
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the collector base URL.
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Sets the per-delivery timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets a pre-configured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl std::fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("has_api_key", &self.api_key.is_some())
            .field("backend_url", &self.backend_url)
            .field("timeout", &self.timeout)
            .field("has_http_client", &self.http_client.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_lookup_fills_unset_fields() {
        let config = ReporterConfig::default()
            .with_lookup(env(&[
                ("REQ402_API_KEY", "fk_env"),
                ("REQ402_BACKEND_URL", "https://collector.example"),
                ("REQ402_TIMEOUT_SECS", "2"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("fk_env"));
        assert_eq!(config.backend_url.as_deref(), Some("https://collector.example"));
        assert_eq!(config.timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_explicit_values_win_over_lookup() {
        let config = ReporterConfig::new("fk_explicit")
            .with_timeout(Duration::from_millis(250))
            .with_lookup(env(&[
                ("REQ402_API_KEY", "fk_env"),
                ("REQ402_TIMEOUT_SECS", "9"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("fk_explicit"));
        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
        assert!(config.backend_url.is_none());
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = ReporterConfig::default()
            .with_lookup(env(&[("REQ402_API_KEY", "  ")]))
            .unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = ReporterConfig::default()
            .with_lookup(env(&[("REQ402_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { value } if value == "soon"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", ReporterConfig::new("fk_secret"));
        assert!(!rendered.contains("fk_secret"));
        assert!(rendered.contains("has_api_key: true"));
    }
}
