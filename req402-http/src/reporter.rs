//! Delivers [`PaymentEvent`]s to a remote collector over HTTP.
//!
//! [`EventReporter`] sends one `POST {backend_url}/webhook/event` per event
//! with the API key in the `X-API-Key` header and the event as JSON. There is
//! no retry: [`EventReporter::report`] makes exactly one attempt under the
//! configured timeout and returns what happened.
//!
//! Request handlers should not call the reporter directly; hand events to an
//! [`EventDispatcher`](crate::dispatcher::EventDispatcher), which runs
//! delivery off the response path and discards the outcome.
//!
//! ## Error Handling
//!
//! [`ReportError`] distinguishes
//! - timeouts
//! - transport failures
//! - non-success collector statuses

use std::time::Duration;

use http::header::{HeaderMap, HeaderValue};
use req402::PaymentEvent;
use reqwest::Client;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::ReporterConfig;
use crate::constants::{API_KEY_HEADER, DEFAULT_BACKEND_URL, DEFAULT_TIMEOUT, EVENT_WEBHOOK_PATH};
use crate::error::{ConfigError, ReportError};

/// A client for a req402 collector.
///
/// Immutable once built and cheap to clone; share one instance across
/// requests.
#[derive(Clone)]
pub struct EventReporter {
    /// Base URL of the collector (always ends with `/`)
    base_url: Url,
    /// Full URL for `POST /webhook/event`
    event_url: Url,
    /// Shared reqwest HTTP client
    client: Client,
    /// Headers sent with each delivery, including the API key
    headers: HeaderMap,
    /// Per-delivery timeout
    timeout: Duration,
}

impl EventReporter {
    /// Builds a reporter from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] if no API key is configured,
    /// [`ConfigError::InvalidApiKey`] if it cannot be sent as a header,
    /// [`ConfigError::InvalidBackendUrl`] if the backend URL does not parse, and
    /// [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn try_new(config: ReporterConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let mut api_key =
            HeaderValue::from_str(api_key).map_err(|_| ConfigError::InvalidApiKey)?;
        api_key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let raw_url = config
            .backend_url
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned());
        let (base_url, event_url) = event_urls(&raw_url)?;

        let timeout = config.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = match config.http_client {
            Some(client) => client,
            None => Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|source| ConfigError::HttpClient { source })?,
        };

        Ok(Self {
            base_url,
            event_url,
            client,
            headers,
            timeout,
        })
    }

    /// Builds a reporter from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `REQ402_API_KEY` is missing or any setting
    /// is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::try_new(ReporterConfig::from_env()?)
    }

    /// Returns the collector base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the computed `./webhook/event` URL.
    #[must_use]
    pub const fn event_url(&self) -> &Url {
        &self.event_url
    }

    /// Returns the per-delivery timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `event` to the collector once.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] on timeout, transport failure, or a non-2xx
    /// collector response.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "req402.reporter.report", skip_all, err, fields(endpoint = event.endpoint()))
    )]
    pub async fn report(&self, event: &PaymentEvent) -> Result<(), ReportError> {
        let response = self
            .client
            .post(self.event_url.clone())
            .headers(self.headers.clone())
            .timeout(self.timeout)
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ReportError::HttpStatus { status, body })
    }
}

impl std::fmt::Debug for EventReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReporter")
            .field("base_url", &self.base_url)
            .field("event_url", &self.event_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Normalizes `raw` to a base URL with a single trailing slash and joins the
/// webhook path onto it, keeping any path prefix. Query and fragment are
/// dropped.
fn event_urls(raw: &str) -> Result<(Url, Url), ConfigError> {
    let invalid = |source| ConfigError::InvalidBackendUrl {
        url: raw.to_owned(),
        source,
    };
    let mut base_url = Url::parse(raw.trim()).map_err(invalid)?;
    base_url.set_query(None);
    base_url.set_fragment(None);
    let path = format!("{}/", base_url.path().trim_end_matches('/'));
    base_url.set_path(&path);
    let event_url = base_url.join(EVENT_WEBHOOK_PATH).map_err(invalid)?;
    Ok((base_url, event_url))
}
