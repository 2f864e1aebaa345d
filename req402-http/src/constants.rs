//! HTTP-specific constants for collector reporting.

use std::time::Duration;

/// Header carrying the collector API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Collector path that ingests events, relative to the backend URL.
pub const EVENT_WEBHOOK_PATH: &str = "webhook/event";

/// Default collector backend URL.
pub const DEFAULT_BACKEND_URL: &str = "https://req402-backend.onrender.com";

/// Default timeout for a single delivery attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment variable holding the collector API key.
pub const API_KEY_ENV: &str = "REQ402_API_KEY";

/// Environment variable overriding the collector backend URL.
pub const BACKEND_URL_ENV: &str = "REQ402_BACKEND_URL";

/// Environment variable overriding the delivery timeout, in whole seconds.
pub const TIMEOUT_SECS_ENV: &str = "REQ402_TIMEOUT_SECS";
