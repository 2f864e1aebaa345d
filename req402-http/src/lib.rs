#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for req402 revenue events.
//!
//! Reports revenue from [x402](https://www.x402.org) paid routes to a req402
//! collector. Mount [`Req402Layer`] around the routes you charge for; every
//! successful paid request produces one event, delivered in the background
//! without affecting the response.
//!
//! # Modules
//!
//! - [`constants`] — Header name, webhook path, defaults, environment variables
//! - [`config`] — Reporter configuration from code or environment
//! - [`reporter`] — Single-attempt HTTP delivery to the collector
//! - [`dispatcher`] — Detached delivery with a shutdown/abandonment policy
//! - [`state`] — Per-request payment state shared with the verification step
//! - [`layer`] — Tower middleware wiring it all together
//! - [`error`] — Configuration and delivery error types
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod layer;
pub mod reporter;
pub mod state;

pub use config::ReporterConfig;
pub use dispatcher::{DeliveryOutcome, EventDispatcher};
pub use error::{ConfigError, ReportError};
pub use layer::{Req402Layer, Req402Service};
pub use reporter::EventReporter;
pub use state::PaymentState;

// Re-export core types for convenience.
pub use req402::{AttributeBag, Normalizer, PaymentEvent};
