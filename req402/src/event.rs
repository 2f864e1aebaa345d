//! The normalized payment event reported to the collector.
//!
//! [`PaymentEvent`] serializes to the collector's fixed wire shape:
//!
//! ```json
//! {
//!   "endpoint": "/premium",
//!   "payer_wallet": "0xA",
//!   "amount_usd": 1.5,
//!   "tx_hash": null,
//!   "event_type": "revenue"
//! }
//! ```
//!
//! `tx_hash` is always present on the wire, as `null` when unknown.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EventError;

/// Kind of usage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A paid call was served and revenue was earned.
    Revenue,
}

impl EventType {
    /// Wire tag of this event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A billable payment observed on a completed request.
///
/// Constructed once per qualifying response and consumed by the reporter.
/// Fields are validated at construction and cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentEvent {
    endpoint: String,
    payer_wallet: String,
    amount_usd: f64,
    tx_hash: Option<String>,
    event_type: EventType,
}

impl PaymentEvent {
    /// Creates a revenue event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EmptyWallet`] if `payer_wallet` is blank and
    /// [`EventError::InvalidAmount`] if `amount_usd` is not a positive finite number.
    pub fn revenue(
        endpoint: impl Into<String>,
        payer_wallet: impl Into<String>,
        amount_usd: f64,
        tx_hash: Option<String>,
    ) -> Result<Self, EventError> {
        let payer_wallet = payer_wallet.into();
        if payer_wallet.trim().is_empty() {
            return Err(EventError::EmptyWallet);
        }
        if !amount_usd.is_finite() || amount_usd <= 0.0 {
            return Err(EventError::InvalidAmount);
        }
        Ok(Self {
            endpoint: endpoint.into(),
            payer_wallet,
            amount_usd,
            tx_hash,
            event_type: EventType::Revenue,
        })
    }

    /// Request path the payment was made for.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Wallet address of the payer.
    #[must_use]
    pub fn payer_wallet(&self) -> &str {
        &self.payer_wallet
    }

    /// Amount paid, in US dollars.
    #[must_use]
    pub const fn amount_usd(&self) -> f64 {
        self.amount_usd
    }

    /// Settlement transaction reference, if the upstream step provided one.
    #[must_use]
    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    /// Event type tag.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_keeps_null_tx_hash() {
        let event = PaymentEvent::revenue("/premium", "0xA", 1.5, None).unwrap();
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "endpoint": "/premium",
                "payer_wallet": "0xA",
                "amount_usd": 1.5,
                "tx_hash": null,
                "event_type": "revenue"
            })
        );
    }

    #[test]
    fn test_serialize_with_tx_hash() {
        let event = PaymentEvent::revenue("/a", "0xA", 0.01, Some("0xdead".into())).unwrap();
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["tx_hash"], "0xdead");
        assert_eq!(value["amount_usd"], 0.01);
    }

    #[test]
    fn test_rejects_blank_wallet() {
        assert_eq!(
            PaymentEvent::revenue("/a", "  ", 1.0, None),
            Err(EventError::EmptyWallet)
        );
    }

    #[test]
    fn test_rejects_non_positive_or_non_finite_amount() {
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                PaymentEvent::revenue("/a", "0xA", amount, None),
                Err(EventError::InvalidAmount)
            );
        }
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(EventType::Revenue.to_string(), "revenue");
    }
}
