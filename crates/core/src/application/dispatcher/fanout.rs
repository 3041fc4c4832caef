// Subscriber Fan-out
// Concurrent, best-effort, single-attempt delivery of one message

use super::constants::DEFAULT_ATTEMPT_TIMEOUT;
use crate::domain::{MessageId, QueueId, Subscriber};
use crate::port::{DeliveryRequest, WebhookNotifier};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

/// Fans a message out to every subscriber of its queue.
///
/// Each subscriber gets its own task; the task waits on a shared gate before
/// calling out, so a burst of messages or a queue with many subscribers
/// queues up behind `max_in_flight` requests instead of opening an
/// unbounded number of connections. `deliver` itself never waits.
///
/// An attempt holds its permit for at most `attempt_timeout`; an endpoint
/// that never answers is abandoned after that and cannot starve the gate.
#[derive(Clone)]
pub struct FanOut {
    notifier: Arc<dyn WebhookNotifier>,
    gate: Arc<Semaphore>,
    max_in_flight: usize,
    attempt_timeout: Duration,
}

impl FanOut {
    pub fn new(notifier: Arc<dyn WebhookNotifier>, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            notifier,
            gate: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Override the per-attempt deadline (zero is treated as the default)
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        if !attempt_timeout.is_zero() {
            self.attempt_timeout = attempt_timeout;
        }
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Requests currently holding a gate permit
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.gate.available_permits()
    }

    /// Start one delivery attempt per subscriber and return immediately.
    ///
    /// Failures are logged inside the spawned task and go nowhere else. The
    /// returned handles may be dropped (the tasks keep running) or awaited.
    pub fn deliver(
        &self,
        queue_id: QueueId,
        message_id: MessageId,
        subscribers: &[Subscriber],
        body: Bytes,
    ) -> Vec<JoinHandle<()>> {
        subscribers
            .iter()
            .map(|subscriber| {
                let request = DeliveryRequest {
                    url: subscriber.webhook_url.clone(),
                    queue_id,
                    message_id,
                    body: body.clone(),
                };
                let span = info_span!(
                    "webhook_delivery",
                    queue_id = queue_id,
                    message_id = message_id,
                    subscriber_id = subscriber.id,
                    url = %subscriber.webhook_url,
                );
                let notifier = Arc::clone(&self.notifier);
                let gate = Arc::clone(&self.gate);
                let attempt_timeout = self.attempt_timeout;

                tokio::spawn(
                    async move {
                        let _permit = match gate.acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => {
                                warn!("Fan-out gate closed, dropping delivery attempt");
                                return;
                            }
                        };

                        match tokio::time::timeout(attempt_timeout, notifier.deliver(&request)).await
                        {
                            Ok(Ok(receipt)) => debug!(
                                status = receipt.status,
                                duration_ms = receipt.duration_ms,
                                "Webhook delivered"
                            ),
                            Ok(Err(e)) => warn!(error = %e, "Webhook delivery failed"),
                            Err(_) => warn!(
                                timeout_ms = attempt_timeout.as_millis() as u64,
                                "Webhook delivery abandoned after attempt timeout"
                            ),
                        }
                    }
                    .instrument(span),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::notifier::mocks::RecordingNotifier;
    use std::time::Duration;

    fn subscriber(id: i64, url: &str) -> Subscriber {
        Subscriber {
            id,
            queue_id: 1,
            webhook_url: url.to_string(),
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_one_attempt_per_subscriber() {
        let notifier = Arc::new(RecordingNotifier::new());
        let fanout = FanOut::new(notifier.clone(), 8);
        let subs = vec![
            subscriber(1, "http://a.test/hook"),
            subscriber(2, "http://b.test/hook"),
            subscriber(3, "http://c.test/hook"),
        ];

        let handles = fanout.deliver(1, 10, &subs, Bytes::from_static(b"hello"));
        assert_eq!(handles.len(), 3);
        for handle in handles {
            handle.await.unwrap();
        }

        let attempts = notifier.attempts();
        assert_eq!(attempts.len(), 3);
        assert!(attempts.iter().all(|a| a.body == Bytes::from_static(b"hello")));
        assert!(attempts.iter().all(|a| a.message_id == 10 && a.queue_id == 1));
    }

    #[tokio::test]
    async fn test_failure_does_not_affect_other_subscribers() {
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.fail_url("http://b.test/hook");
        let fanout = FanOut::new(notifier.clone(), 8);
        let subs = vec![
            subscriber(1, "http://a.test/hook"),
            subscriber(2, "http://b.test/hook"),
            subscriber(3, "http://c.test/hook"),
        ];

        for handle in fanout.deliver(1, 1, &subs, Bytes::from_static(b"x")) {
            handle.await.unwrap();
        }

        // Exactly one attempt each; the failing endpoint is not retried
        assert_eq!(notifier.attempts_for("http://a.test/hook"), 1);
        assert_eq!(notifier.attempts_for("http://b.test/hook"), 1);
        assert_eq!(notifier.attempts_for("http://c.test/hook"), 1);
    }

    #[tokio::test]
    async fn test_deliver_returns_before_attempts_complete() {
        let notifier = Arc::new(RecordingNotifier::with_latency(Duration::from_millis(200)));
        let fanout = FanOut::new(notifier.clone(), 8);
        let subs = vec![subscriber(1, "http://slow.test/hook")];

        let started = std::time::Instant::now();
        let handles = fanout.deliver(1, 1, &subs, Bytes::from_static(b"x"));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(notifier.attempt_count(), 0);

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(notifier.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_gate_bounds_in_flight_requests() {
        let notifier = Arc::new(RecordingNotifier::with_latency(Duration::from_millis(100)));
        let fanout = FanOut::new(notifier.clone(), 2);
        let subs: Vec<_> = (0..6)
            .map(|i| subscriber(i, &format!("http://s{i}.test/hook")))
            .collect();

        let handles = fanout.deliver(1, 1, &subs, Bytes::from_static(b"x"));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(fanout.in_flight() <= 2);

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(notifier.attempt_count(), 6);
        assert_eq!(fanout.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_hung_endpoint_releases_gate_for_other_queues() {
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.hang_url("http://hung.test/hook");
        let fanout =
            FanOut::new(notifier.clone(), 4).with_attempt_timeout(Duration::from_millis(100));

        let hung = vec![subscriber(1, "http://hung.test/hook")];
        let mut stalled = Vec::new();
        for message_id in 0..4 {
            stalled.extend(fanout.deliver(1, message_id, &hung, Bytes::from_static(b"x")));
        }

        let mut healthy = subscriber(2, "http://ok.test/hook");
        healthy.queue_id = 2;
        let handles = fanout.deliver(2, 99, &[healthy], Bytes::from_static(b"y"));

        tokio::time::timeout(Duration::from_secs(2), async {
            for handle in handles.into_iter().chain(stalled) {
                handle.await.unwrap();
            }
        })
        .await
        .expect("hung attempts must be abandoned");

        assert_eq!(notifier.attempts_for("http://ok.test/hook"), 1);
        assert_eq!(notifier.attempts_for("http://hung.test/hook"), 0);
        assert_eq!(fanout.in_flight(), 0);
    }

    #[test]
    fn test_zero_attempt_timeout_keeps_default() {
        let fanout = FanOut::new(Arc::new(RecordingNotifier::new()), 1)
            .with_attempt_timeout(Duration::ZERO);
        assert_eq!(fanout.attempt_timeout(), DEFAULT_ATTEMPT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_no_subscribers_no_attempts() {
        let notifier = Arc::new(RecordingNotifier::new());
        let fanout = FanOut::new(notifier.clone(), 4);
        let handles = fanout.deliver(1, 1, &[], Bytes::new());
        assert!(handles.is_empty());
        assert_eq!(notifier.attempt_count(), 0);
    }
}
