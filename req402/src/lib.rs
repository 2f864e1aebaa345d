#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for reporting revenue from [x402](https://www.x402.org) paid requests.
//!
//! An upstream payment-verification step records what it learned about a
//! payment in a per-request [`AttributeBag`]. Once the protected handler has
//! produced a response, the [`Normalizer`] inspects that bag and decides
//! whether a billable [`PaymentEvent`] occurred.
//!
//! This crate has no HTTP dependencies. Delivery of events to a collector and
//! the `tower` middleware live in `req402-http`.
//!
//! # Modules
//!
//! - [`context`] - Request view and the untyped attribute bag
//! - [`event`] - The normalized [`PaymentEvent`] wire type
//! - [`strategy`] - Ordered extraction strategies over upstream record shapes
//! - [`normalizer`] - Status gate and strategy precedence chain
//! - [`coerce`] - Lenient conversion of untrusted JSON values
//! - [`error`] - Event construction errors
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring
//!
//! # Example
//!
//! ```rust
//! use req402::{AttributeBag, Normalizer, RequestInfo};
//! use serde_json::json;
//!
//! let mut attributes = AttributeBag::new();
//! attributes.insert("payment", json!({ "payer": "0xA", "amount_usd": 1.5 }));
//! let request = RequestInfo::new("/premium").with_attributes(attributes);
//!
//! let event = Normalizer::default().normalize(200, &request).expect("billable");
//! assert_eq!(event.payer_wallet(), "0xA");
//! assert!(event.tx_hash().is_none());
//! ```

pub mod coerce;
pub mod context;
pub mod error;
pub mod event;
pub mod normalizer;
pub mod strategy;

pub use context::{AttributeBag, RequestContext, RequestInfo};
pub use error::EventError;
pub use event::{EventType, PaymentEvent};
pub use normalizer::{Normalizer, SUCCESS_STATUS};
pub use strategy::{
    Candidate, ExtractionStrategy, PaymentProofHeaderStrategy, PaymentRecordStrategy,
    X402RecordStrategy,
};
