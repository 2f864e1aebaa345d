//! Decides whether a completed request produced a billable event.
//!
//! Only responses with status `200` are billable. For those, the configured
//! [`ExtractionStrategy`] list is walked in order and the first strategy whose
//! signal is present decides the outcome: its candidate becomes a
//! [`PaymentEvent`] only if it has both a payer wallet and an amount. Later
//! strategies are not consulted. Anything malformed results in no event;
//! nothing here returns an error.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::context::RequestContext;
use crate::event::PaymentEvent;
use crate::strategy::{
    ExtractionStrategy, PaymentProofHeaderStrategy, PaymentRecordStrategy, X402RecordStrategy,
};

/// The only response status that can produce an event.
pub const SUCCESS_STATUS: u16 = 200;

/// Turns a completed request into at most one [`PaymentEvent`].
///
/// Cheap to clone; strategies are shared.
#[derive(Clone)]
pub struct Normalizer {
    strategies: Arc<[Box<dyn ExtractionStrategy>]>,
}

impl Default for Normalizer {
    /// Installs the `payment` record, `x402` record and payment proof header
    /// strategies, in that order.
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(PaymentRecordStrategy),
            Box::new(X402RecordStrategy),
            Box::new(PaymentProofHeaderStrategy),
        ])
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Normalizer {
    /// Creates a normalizer with a custom strategy order.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self {
            strategies: strategies.into(),
        }
    }

    /// Names of the configured strategies, in precedence order.
    #[must_use]
    pub fn strategy_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|s| s.name())
    }

    /// Returns the billable event for a completed request, if any.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "req402.normalize", skip_all, fields(status = status, path = %ctx.path()))
    )]
    #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
    pub fn normalize<C: RequestContext>(&self, status: u16, ctx: &C) -> Option<PaymentEvent> {
        if status != SUCCESS_STATUS {
            return None;
        }
        let (strategy, candidate) = self
            .strategies
            .iter()
            .find_map(|strategy| strategy.extract(ctx).map(|candidate| (strategy, candidate)))?;
        let Some((wallet, amount)) = candidate.billable() else {
            #[cfg(feature = "telemetry")]
            tracing::debug!(strategy = strategy.name(), "payment record incomplete; no event");
            return None;
        };
        let event =
            PaymentEvent::revenue(ctx.path(), wallet, amount, candidate.tx_hash.clone()).ok()?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(strategy = strategy.name(), "payment event extracted");
        Some(event)
    }
}
