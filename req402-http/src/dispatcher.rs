//! Detached, best-effort delivery of payment events.
//!
//! [`EventDispatcher`] runs each delivery as its own Tokio task so the
//! response to the paying client is never held up by the collector. Each
//! event gets exactly one attempt; its outcome is logged (with the
//! `telemetry` feature) and otherwise discarded.
//!
//! # Shutdown
//!
//! Deliveries are tracked with a [`TaskTracker`]. On [`EventDispatcher::shutdown`]:
//!
//! 1. New events are dropped without an attempt.
//! 2. In-flight deliveries get a grace period to finish.
//! 3. Whatever is still pending after the grace period is cancelled and
//!    abandoned. Nothing is persisted or retried.

use std::sync::Arc;
use std::time::Duration;

use req402::PaymentEvent;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::reporter::EventReporter;

/// Final state of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The collector accepted the event.
    Sent,
    /// The attempt failed or was abandoned; the event is dropped.
    Discarded,
}

/// Fire-and-forget delivery of events through a shared [`EventReporter`].
///
/// Clones share the reporter, the task tracker and the shutdown token, so
/// shutting down any clone shuts down all of them.
#[derive(Clone, Debug)]
pub struct EventDispatcher {
    reporter: Arc<EventReporter>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl EventDispatcher {
    /// Creates a dispatcher that delivers through `reporter`.
    #[must_use]
    pub fn new(reporter: Arc<EventReporter>) -> Self {
        Self {
            reporter,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns the underlying reporter.
    #[must_use]
    pub fn reporter(&self) -> &EventReporter {
        &self.reporter
    }

    /// Number of deliveries still in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has started.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Makes one delivery attempt and reports how it ended.
    ///
    /// Never fails; errors are folded into [`DeliveryOutcome::Discarded`].
    pub async fn deliver(&self, event: &PaymentEvent) -> DeliveryOutcome {
        deliver(&self.reporter, event).await
    }

    /// Starts delivery of `event` in the background and returns immediately.
    ///
    /// Returns `false` if the event was dropped because the dispatcher is
    /// shutting down or no Tokio runtime is available.
    pub fn dispatch(&self, event: PaymentEvent) -> bool {
        if self.tracker.is_closed() {
            #[cfg(feature = "telemetry")]
            tracing::debug!(endpoint = event.endpoint(), "dispatcher closed; dropping payment event");
            return false;
        }
        let Ok(handle) = Handle::try_current() else {
            #[cfg(feature = "telemetry")]
            tracing::warn!(endpoint = event.endpoint(), "no Tokio runtime; dropping payment event");
            return false;
        };

        let reporter = Arc::clone(&self.reporter);
        let shutdown = self.shutdown.clone();
        self.tracker.spawn_on(
            async move {
                tokio::select! {
                    biased;
                    () = shutdown.cancelled() => {
                        #[cfg(feature = "telemetry")]
                        tracing::debug!(endpoint = event.endpoint(), "payment event abandoned at shutdown");
                        DeliveryOutcome::Discarded
                    }
                    outcome = deliver(&reporter, &event) => outcome,
                }
            },
            &handle,
        );
        true
    }

    /// Stops accepting events and waits up to `grace` for in-flight deliveries.
    ///
    /// Returns the number of deliveries abandoned because they outlived the
    /// grace period.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            return 0;
        }
        let abandoned = self.tracker.len();
        self.shutdown.cancel();
        self.tracker.wait().await;
        #[cfg(feature = "telemetry")]
        tracing::warn!(abandoned, "abandoned in-flight payment events at shutdown");
        abandoned
    }
}

#[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
async fn deliver(reporter: &EventReporter, event: &PaymentEvent) -> DeliveryOutcome {
    match reporter.report(event).await {
        Ok(()) => DeliveryOutcome::Sent,
        Err(err) => {
            #[cfg(feature = "telemetry")]
            tracing::debug!(error = %err, endpoint = event.endpoint(), "payment event discarded");
            DeliveryOutcome::Discarded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReporterConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> PaymentEvent {
        PaymentEvent::revenue("/v1/premium", "0xA", 0.25, None).unwrap()
    }

    fn dispatcher(server: &MockServer, timeout: Duration) -> EventDispatcher {
        let reporter = EventReporter::try_new(
            ReporterConfig::new("fk_test")
                .with_backend_url(server.uri())
                .with_timeout(timeout),
        )
        .unwrap();
        EventDispatcher::new(Arc::new(reporter))
    }

    #[tokio::test]
    async fn test_deliver_outcomes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/event"))
            .respond_with(ResponseTemplate::new(200))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webhook/event"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Duration::from_secs(5));
        assert_eq!(dispatcher.deliver(&event()).await, DeliveryOutcome::Sent);
        assert_eq!(dispatcher.deliver(&event()).await, DeliveryOutcome::Discarded);
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_background() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/event"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Duration::from_secs(5));
        assert!(dispatcher.dispatch(event()));
        assert_eq!(dispatcher.shutdown(Duration::from_secs(5)).await, 0);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/event"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Duration::from_secs(5));
        assert!(dispatcher.dispatch(event()));
        assert_eq!(dispatcher.shutdown(Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_abandons_slow_deliveries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/event"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Duration::from_secs(30));
        assert!(dispatcher.dispatch(event()));
        assert!(dispatcher.dispatch(event()));
        assert_eq!(dispatcher.pending(), 2);

        let abandoned = dispatcher.shutdown(Duration::from_millis(100)).await;
        assert_eq!(abandoned, 2);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server, Duration::from_secs(5));
        let clone = dispatcher.clone();
        dispatcher.shutdown(Duration::from_millis(10)).await;
        assert!(clone.is_closed());
        assert!(!clone.dispatch(event()));
    }

    #[test]
    fn test_dispatch_without_runtime_is_dropped() {
        let reporter = EventReporter::try_new(ReporterConfig::new("fk_test")).unwrap();
        let dispatcher = EventDispatcher::new(Arc::new(reporter));
        assert!(!dispatcher.dispatch(event()));
        assert_eq!(dispatcher.pending(), 0);
    }
}
