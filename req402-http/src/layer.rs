//! Tower middleware that reports revenue from x402 paid routes.
//!
//! [`Req402Layer`] wraps a service (an axum router, a single route, or any
//! `tower` service over `http` types). For every request it:
//!
//! 1. ensures the request carries a [`PaymentState`] for the verification
//!    step to record into,
//! 2. runs the inner service,
//! 3. normalizes the finished response and request into at most one
//!    [`PaymentEvent`](req402::PaymentEvent),
//! 4. hands that event to the [`EventDispatcher`] and returns the response
//!    untouched.
//!
//! Delivery happens in the background, so neither collector latency nor
//! collector failures reach the caller.
//!
//! ## Ordering
//!
//! Mount this layer *outside* the payment-verification layer so that it sees
//! the final response. If an outer layer already inserted a [`PaymentState`],
//! that handle is reused.
//!
//! ```rust,no_run
//! use axum::{Extension, Router, routing::get};
//! use req402_http::{PaymentState, Req402Layer};
//! use serde_json::json;
//!
//! async fn premium(Extension(payment): Extension<PaymentState>) -> &'static str {
//!     payment.record_x402(json!({ "payer_wallet": "0xA", "amount_usd": "0.01" }));
//!     "paid content"
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app: Router = Router::new()
//!     .route("/premium", get(premium))
//!     .layer(Req402Layer::from_env()?);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{HeaderName, Request, Response};
use req402::{AttributeBag, Normalizer, RequestContext};
use tower::{Layer, Service};

use crate::dispatcher::EventDispatcher;
use crate::error::ConfigError;
use crate::reporter::EventReporter;
use crate::state::PaymentState;

/// Layer that attaches revenue reporting to a service.
///
/// Create one per application; clones share the dispatcher.
#[derive(Clone, Debug)]
pub struct Req402Layer {
    dispatcher: EventDispatcher,
    normalizer: Normalizer,
}

impl Req402Layer {
    /// Creates a layer delivering through `dispatcher` with the default
    /// extraction strategies.
    #[must_use]
    pub fn new(dispatcher: EventDispatcher) -> Self {
        Self {
            dispatcher,
            normalizer: Normalizer::default(),
        }
    }

    /// Creates a layer with its own dispatcher around `reporter`.
    #[must_use]
    pub fn from_reporter(reporter: EventReporter) -> Self {
        Self::new(EventDispatcher::new(Arc::new(reporter)))
    }

    /// Creates a layer configured from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] if `REQ402_API_KEY` is unset, or
    /// another [`ConfigError`] if a setting is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::from_reporter(EventReporter::from_env()?))
    }

    /// Replaces the normalizer, e.g. to change strategy order.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Returns the dispatcher, for shutting it down with the server.
    #[must_use]
    pub const fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }
}

impl<S> Layer<S> for Req402Layer {
    type Service = Req402Service<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Req402Service {
            inner,
            dispatcher: self.dispatcher.clone(),
            normalizer: self.normalizer.clone(),
        }
    }
}

/// Service produced by [`Req402Layer`].
#[derive(Clone, Debug)]
pub struct Req402Service<S> {
    /// The wrapped service
    inner: S,
    /// Background delivery of extracted events
    dispatcher: EventDispatcher,
    /// Status gate and extraction strategies
    normalizer: Normalizer,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Req402Service<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    /// Delegates readiness polling to the wrapped inner service.
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let state = if let Some(state) = req.extensions().get::<PaymentState>() {
            state.clone()
        } else {
            let state = PaymentState::new();
            req.extensions_mut().insert(state.clone());
            state
        };
        let path = req.uri().path().to_owned();
        let header_names = req.headers().keys().cloned().collect();

        // The clone may not be ready; keep the instance that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let dispatcher = self.dispatcher.clone();
        let normalizer = self.normalizer.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            let snapshot = RequestSnapshot {
                path,
                header_names,
                attributes: state.snapshot(),
            };
            if let Some(event) = normalizer.normalize(response.status().as_u16(), &snapshot) {
                dispatcher.dispatch(event);
            }
            Ok(response)
        })
    }
}

/// What the normalizer sees of a request after the inner service ran.
struct RequestSnapshot {
    path: String,
    header_names: Vec<HeaderName>,
    attributes: AttributeBag,
}

impl RequestContext for RequestSnapshot {
    fn path(&self) -> &str {
        &self.path
    }

    fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    fn has_header(&self, name: &str) -> bool {
        self.header_names
            .iter()
            .any(|h| h.as_str().eq_ignore_ascii_case(name))
    }
}
