//! Error types for payment event construction.

/// Reasons a [`PaymentEvent`](crate::PaymentEvent) cannot be constructed.
///
/// The normalizer never returns these; it maps them to "no event".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// The payer wallet was empty or whitespace.
    #[error("payer wallet must not be empty")]
    EmptyWallet,
    /// The amount was zero, negative, NaN or infinite.
    #[error("amount must be a positive finite number")]
    InvalidAmount,
}
