// Dispatcher - periodic sweep that drains every queue store through fan-out

pub mod constants;
mod fanout;
mod shutdown;

use constants::*;
pub use fanout::FanOut;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::domain::StoreKey;
use crate::error::{AppError, Result};
use crate::port::{Catalog, QueueStoreProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Dispatcher settings
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Time between the start of two sweeps
    pub interval: Duration,
    /// Lease taken on each message while it is being fanned out
    pub lease: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_DISPATCH_INTERVAL,
            lease: DEFAULT_DISPATCH_LEASE,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(AppError::Config(
                "dispatch interval must be greater than 0".to_string(),
            ));
        }
        if self.lease.is_zero() {
            return Err(AppError::Config(
                "dispatch lease must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// What one sweep did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub queues_scanned: usize,
    pub queues_failed: usize,
    pub messages_dispatched: usize,
    pub deliveries_started: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.messages_dispatched == 0 && self.queues_failed == 0
    }
}

/// Dispatcher drains queue stores and hands each message to fan-out.
///
/// Delivery is at-most-once: a message is deleted as soon as its fan-out
/// has been started, whatever the subscribers answer.
pub struct Dispatcher {
    catalog: Arc<dyn Catalog>,
    stores: Arc<dyn QueueStoreProvider>,
    fanout: FanOut,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        stores: Arc<dyn QueueStoreProvider>,
        fanout: FanOut,
        config: DispatchConfig,
    ) -> Self {
        Self {
            catalog,
            stores,
            fanout,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run sweeps every `interval` until shutdown is requested
    pub async fn run(&self, shutdown: ShutdownToken) -> Result<()> {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            lease_ms = self.config.lease.as_millis() as u64,
            max_in_flight = self.fanout.max_in_flight(),
            "Dispatcher started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stop = shutdown.clone();

        loop {
            if shutdown.is_shutdown() {
                break;
            }
            tokio::select! {
                _ = stop.cancelled() => {
                    info!("Dispatcher interrupted while idle");
                    break;
                }
                _ = ticker.tick() => {
                    match self.tick(&shutdown).await {
                        Ok(report) if !report.is_idle() => debug!(
                            queues_scanned = report.queues_scanned,
                            queues_failed = report.queues_failed,
                            messages_dispatched = report.messages_dispatched,
                            deliveries_started = report.deliveries_started,
                            "Dispatch tick completed"
                        ),
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Dispatch tick failed"),
                    }
                }
            }
        }

        info!("Dispatcher stopped");
        Ok(())
    }

    /// One sweep over every queue known to the catalog.
    ///
    /// A failing queue is logged and skipped; only a failure to list queues
    /// fails the sweep. Shutdown is checked between messages.
    pub async fn tick(&self, shutdown: &ShutdownToken) -> Result<TickReport> {
        let keys = self.catalog.list_store_keys().await?;
        let mut report = TickReport::default();

        for key in keys {
            if shutdown.is_shutdown() {
                break;
            }
            report.queues_scanned += 1;

            if let Err(e) = self.drain_queue(key, shutdown, &mut report).await {
                report.queues_failed += 1;
                warn!(
                    workspace_id = key.workspace_id,
                    queue_id = key.queue_id,
                    error = %e,
                    "Skipping queue for the rest of this tick"
                );
            }
        }

        Ok(report)
    }

    async fn drain_queue(
        &self,
        key: StoreKey,
        shutdown: &ShutdownToken,
        report: &mut TickReport,
    ) -> Result<()> {
        let store = self.stores.open(key).await?;

        while !shutdown.is_shutdown() {
            let Some(message) = store.receive(self.config.lease).await? else {
                break;
            };

            // Resolved per message so subscriber changes apply to pending messages.
            // On failure the message stays leased and is retried once the lease expires.
            let subscribers = self.catalog.list_subscribers(key.queue_id).await?;

            let handles =
                self.fanout
                    .deliver(key.queue_id, message.id, &subscribers, message.body.clone());
            report.deliveries_started += handles.len();

            match store.delete(message.id).await {
                Ok(()) => {}
                // Lease ran out and another consumer already removed it
                Err(e) if e.is_not_found() => warn!(
                    queue_id = key.queue_id,
                    message_id = message.id,
                    "Message vanished before delete"
                ),
                Err(e) => return Err(e),
            }
            report.messages_dispatched += 1;
        }

        Ok(())
    }
}
