//! Per-request payment state shared between middleware layers.
//!
//! The reporting layer sits outside the payment-verification step, so it
//! cannot see extensions that inner layers add to a request they have taken
//! by value. Instead, [`PaymentState`] is a shared handle inserted into the
//! request extensions before the inner service runs. Inner layers and handlers
//! record what they verified into it, and the reporting layer reads it once
//! the response is ready.
//!
//! ```rust
//! use req402_http::PaymentState;
//! use serde_json::json;
//!
//! let mut request = http::Request::new(());
//! request.extensions_mut().insert(PaymentState::new());
//!
//! // ...inside the verification step:
//! if let Some(state) = request.extensions().get::<PaymentState>() {
//!     state.record_payment(json!({ "payer": "0xA", "amount_usd": 0.01 }));
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use req402::AttributeBag;
use req402::strategy::{PAYMENT_RECORD_KEY, X402_RECORD_KEY};
use serde_json::Value;

/// Shared handle over one request's [`AttributeBag`].
///
/// Clones refer to the same bag. The lock is never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct PaymentState {
    bag: Arc<Mutex<AttributeBag>>,
}

impl PaymentState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous record.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.lock().insert(key, value);
    }

    /// Stores a generic payment record under `"payment"`.
    pub fn record_payment(&self, record: Value) {
        self.insert(PAYMENT_RECORD_KEY, record);
    }

    /// Stores an x402 record under `"x402"`.
    pub fn record_x402(&self, record: Value) {
        self.insert(X402_RECORD_KEY, record);
    }

    /// Returns a copy of the record stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Returns a copy of the whole bag.
    #[must_use]
    pub fn snapshot(&self) -> AttributeBag {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, AttributeBag> {
        // A panic while holding the lock leaves the bag usable.
        self.bag.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<AttributeBag> for PaymentState {
    fn from(bag: AttributeBag) -> Self {
        Self {
            bag: Arc::new(Mutex::new(bag)),
        }
    }
}
