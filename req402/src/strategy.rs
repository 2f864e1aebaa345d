//! Extraction strategies over upstream payment record shapes.
//!
//! Different verification libraries leave different traces on a request. Each
//! [`ExtractionStrategy`] knows one of those shapes and pulls a [`Candidate`]
//! out of the request context when its shape is present. The
//! [`Normalizer`](crate::Normalizer) walks the strategies in order.
//!
//! | Strategy | Looks for | Wallet | Amount |
//! |---|---|---|---|
//! | [`PaymentRecordStrategy`] | `"payment"` record | `payer`, then `from` | `amount_usd`, then `price` |
//! | [`X402RecordStrategy`] | `"x402"` record | `payer_wallet`, then `from` | `amount_usd` |
//! | [`PaymentProofHeaderStrategy`] | `x-payment-proof` header | - | - |

use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::coerce;
use crate::context::RequestContext;

/// Bag key used by middleware that records a generic payment object.
pub const PAYMENT_RECORD_KEY: &str = "payment";

/// Bag key used by x402-specific middleware.
pub const X402_RECORD_KEY: &str = "x402";

/// Header carrying a raw payment proof.
pub const PAYMENT_PROOF_HEADER: &str = "x-payment-proof";

/// Normalized fields pulled out of one upstream record.
///
/// Any field may be missing; the normalizer decides whether the candidate is
/// billable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    /// Payer wallet, already coerced to a non-empty string.
    pub payer_wallet: Option<String>,
    /// Amount in US dollars, already coerced to a positive finite number.
    pub amount_usd: Option<f64>,
    /// Settlement transaction reference.
    pub tx_hash: Option<String>,
}

impl Candidate {
    /// Returns the wallet and amount if both are present.
    #[must_use]
    pub fn billable(&self) -> Option<(&str, f64)> {
        Some((self.payer_wallet.as_deref()?, self.amount_usd?))
    }

    /// Builds a candidate from an object record.
    ///
    /// Wallet and amount take the first truthy field among their keys, so an
    /// empty `payer` falls through to `from`. Coercion happens after selection:
    /// a truthy but malformed first field is not skipped in favour of the next.
    fn from_record(
        record: &Map<String, Value>,
        wallet_keys: &[&str],
        amount_keys: &[&str],
    ) -> Self {
        Self {
            payer_wallet: coerce::first_truthy(record, wallet_keys).and_then(coerce::wallet),
            amount_usd: coerce::first_truthy(record, amount_keys).and_then(coerce::amount),
            tx_hash: record.get("tx_hash").and_then(coerce::tx_hash),
        }
    }
}

/// One way of recognizing a payment on a completed request.
///
/// Implementations must never panic on unexpected shapes.
pub trait ExtractionStrategy: Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Returns a candidate if this strategy's signal is present on the request.
    ///
    /// `None` means the signal is absent and the next strategy should be
    /// tried. A present but unusable signal yields an empty candidate, which
    /// claims the request without billing it.
    fn extract(&self, ctx: &dyn RequestContext) -> Option<Candidate>;
}

/// Reads the `"payment"` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentRecordStrategy;

impl ExtractionStrategy for PaymentRecordStrategy {
    fn name(&self) -> &'static str {
        "payment_record"
    }

    fn extract(&self, ctx: &dyn RequestContext) -> Option<Candidate> {
        let record = ctx.attributes().get(PAYMENT_RECORD_KEY)?;
        Some(record.as_object().map_or_else(Candidate::default, |record| {
            Candidate::from_record(record, &["payer", "from"], &["amount_usd", "price"])
        }))
    }
}

/// Reads the `"x402"` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct X402RecordStrategy;

impl ExtractionStrategy for X402RecordStrategy {
    fn name(&self) -> &'static str {
        "x402_record"
    }

    fn extract(&self, ctx: &dyn RequestContext) -> Option<Candidate> {
        let record = ctx.attributes().get(X402_RECORD_KEY)?;
        Some(record.as_object().map_or_else(Candidate::default, |record| {
            Candidate::from_record(record, &["payer_wallet", "from"], &["amount_usd"])
        }))
    }
}

/// Recognizes the `x-payment-proof` header but extracts nothing.
///
/// The header format is not settled, so its presence alone never bills.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentProofHeaderStrategy;

impl ExtractionStrategy for PaymentProofHeaderStrategy {
    fn name(&self) -> &'static str {
        "payment_proof_header"
    }

    fn extract(&self, ctx: &dyn RequestContext) -> Option<Candidate> {
        if !ctx.has_header(PAYMENT_PROOF_HEADER) {
            return None;
        }
        #[cfg(feature = "telemetry")]
        tracing::debug!(
            path = ctx.path(),
            "payment proof header present; header extraction is not supported"
        );
        Some(Candidate::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AttributeBag, RequestInfo};
    use serde_json::json;

    fn request_with(key: &str, record: Value) -> RequestInfo {
        let mut bag = AttributeBag::new();
        bag.insert(key, record);
        RequestInfo::new("/paid").with_attributes(bag)
    }

    #[test]
    fn test_payment_record_fallbacks() {
        let req = request_with(
            PAYMENT_RECORD_KEY,
            json!({"from": "0xB", "price": "0.10", "tx_hash": "0x01"}),
        );
        let candidate = PaymentRecordStrategy.extract(&req).unwrap();
        assert_eq!(candidate.payer_wallet.as_deref(), Some("0xB"));
        assert_eq!(candidate.amount_usd, Some(0.10));
        assert_eq!(candidate.tx_hash.as_deref(), Some("0x01"));
    }

    #[test]
    fn test_payment_record_primary_fields_win() {
        let req = request_with(
            PAYMENT_RECORD_KEY,
            json!({"payer": "0xA", "from": "0xB", "amount_usd": 2, "price": 9}),
        );
        let candidate = PaymentRecordStrategy.extract(&req).unwrap();
        assert_eq!(candidate.billable(), Some(("0xA", 2.0)));
    }

    #[test]
    fn test_zero_amount_falls_through_to_price() {
        let req = request_with(PAYMENT_RECORD_KEY, json!({"payer": "0xA", "amount_usd": 0, "price": 3}));
        let candidate = PaymentRecordStrategy.extract(&req).unwrap();
        assert_eq!(candidate.amount_usd, Some(3.0));
    }

    #[test]
    fn test_x402_record_ignores_price() {
        let req = request_with(X402_RECORD_KEY, json!({"payer_wallet": "0xC", "price": 1}));
        let candidate = X402RecordStrategy.extract(&req).unwrap();
        assert_eq!(candidate.payer_wallet.as_deref(), Some("0xC"));
        assert_eq!(candidate.amount_usd, None);
        assert!(candidate.billable().is_none());
    }

    #[test]
    fn test_x402_record_ignores_payer_key() {
        let req = request_with(X402_RECORD_KEY, json!({"payer": "0xA", "from": "0xD", "amount_usd": 1}));
        let candidate = X402RecordStrategy.extract(&req).unwrap();
        assert_eq!(candidate.payer_wallet.as_deref(), Some("0xD"));
    }

    #[test]
    fn test_non_object_record_is_present_but_empty() {
        let req = request_with(PAYMENT_RECORD_KEY, json!("paid"));
        let candidate = PaymentRecordStrategy.extract(&req).unwrap();
        assert_eq!(candidate, Candidate::default());
        assert!(candidate.billable().is_none());
    }

    #[test]
    fn test_missing_record_is_absent() {
        let req = RequestInfo::new("/paid");
        assert!(PaymentRecordStrategy.extract(&req).is_none());
        assert!(X402RecordStrategy.extract(&req).is_none());
    }

    #[test]
    fn test_payment_proof_header_is_inert() {
        let req = RequestInfo::new("/paid").with_header("X-Payment-Proof");
        let candidate = PaymentProofHeaderStrategy.extract(&req).unwrap();
        assert!(candidate.billable().is_none());
        assert!(PaymentProofHeaderStrategy.extract(&RequestInfo::new("/paid")).is_none());
    }
}
