//! Bounded asynchronous delivery of webhook notifications.
//!
//! Submission never blocks: a delivery either fits in the queue or is
//! dropped and counted. A single worker drains the queue and spawns each
//! delivery as its own task, holding a semaphore permit so that at most
//! `max_concurrent` requests are in flight. Failures are logged and
//! counted, never retried or reported to the submitter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::transport::NotificationTransport;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Deliveries that may wait in the queue.
    pub queue_capacity: usize,
    /// Deliveries that may run at once.
    pub max_concurrent: usize,
    /// How long `stop` waits for the queue to drain.
    pub drain_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_concurrent: 16,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// One payload bound for one URL.
#[derive(Debug, Clone)]
struct Delivery {
    url: String,
    payload: Arc<serde_json::Value>,
}

/// Delivery counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Deliveries accepted into the queue.
    pub submitted: AtomicU64,
    /// Deliveries the hook acknowledged.
    pub delivered: AtomicU64,
    /// Deliveries that failed in transport.
    pub failed: AtomicU64,
    /// Deliveries rejected because the queue was full or closed.
    pub dropped: AtomicU64,
}

impl DispatchStats {
    /// Get current counter values.
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStatsSnapshot {
    pub submitted: u64,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DispatchStatsSnapshot {
    /// Deliveries accepted but not yet finished.
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
    }
}

/// Webhook dispatcher for one ledger.
pub struct Dispatcher {
    /// Name used in log fields, usually the network.
    name: String,
    config: DispatcherConfig,
    transport: Arc<dyn NotificationTransport>,
    stats: Arc<DispatchStats>,
    /// Queue sender; `None` once stopped.
    tx: RwLock<Option<mpsc::Sender<Delivery>>>,
    /// Queue receiver, taken by the worker on start.
    rx: Arc<RwLock<Option<mpsc::Receiver<Delivery>>>>,
    worker: RwLock<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Create a dispatcher. Deliveries queue up until [`Dispatcher::start`].
    pub fn new(
        name: impl Into<String>,
        config: DispatcherConfig,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        Self {
            name: name.into(),
            config,
            transport,
            stats: Arc::new(DispatchStats::default()),
            tx: RwLock::new(Some(tx)),
            rx: Arc::new(RwLock::new(Some(rx))),
            worker: RwLock::new(None),
        }
    }

    /// Launch the worker. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let Some(rx) = self.rx.write().take() else {
            warn!(dispatcher = %self.name, "Dispatcher already started");
            return;
        };

        let worker = tokio::spawn(run_worker(
            self.name.clone(),
            rx,
            self.transport.clone(),
            Arc::new(Semaphore::new(self.config.max_concurrent.max(1))),
            self.stats.clone(),
        ));
        *self.worker.write() = Some(worker);

        info!(
            dispatcher = %self.name,
            queue_capacity = self.config.queue_capacity,
            max_concurrent = self.config.max_concurrent,
            "Dispatcher started"
        );
    }

    /// Close the queue and wait for the worker to hand off what is queued.
    pub async fn stop(&self) {
        self.tx.write().take();

        let worker = self.worker.write().take();
        if let Some(worker) = worker {
            if tokio::time::timeout(self.config.drain_timeout, worker)
                .await
                .is_err()
            {
                warn!(dispatcher = %self.name, "Dispatcher drain timed out");
            }
        }

        info!(dispatcher = %self.name, "Dispatcher stopped");
    }

    /// Queue one delivery. Returns false if it was dropped.
    pub fn submit(&self, url: &str, payload: Arc<serde_json::Value>) -> bool {
        let delivery = Delivery {
            url: url.to_string(),
            payload,
        };

        let result = match self.tx.read().as_ref() {
            Some(tx) => tx.try_send(delivery),
            None => Err(TrySendError::Closed(delivery)),
        };

        match result {
            Ok(()) => {
                self.stats.submitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(delivery)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(dispatcher = %self.name, url = %delivery.url, "Delivery queue full, dropping notification");
                false
            }
            Err(TrySendError::Closed(delivery)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(dispatcher = %self.name, url = %delivery.url, "Dispatcher stopped, dropping notification");
                false
            }
        }
    }

    /// Queue the same payload for every URL. Returns how many were accepted.
    pub fn broadcast(&self, urls: &[String], payload: serde_json::Value) -> usize {
        let payload = Arc::new(payload);
        urls.iter()
            .filter(|url| self.submit(url, payload.clone()))
            .count()
    }

    /// Delivery counters.
    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Check if the worker is running.
    pub fn is_running(&self) -> bool {
        self.worker.read().is_some()
    }
}

async fn run_worker(
    name: String,
    mut rx: mpsc::Receiver<Delivery>,
    transport: Arc<dyn NotificationTransport>,
    semaphore: Arc<Semaphore>,
    stats: Arc<DispatchStats>,
) {
    while let Some(delivery) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let name = name.clone();
        let transport = transport.clone();
        let stats = stats.clone();

        tokio::spawn(async move {
            let result = transport.deliver(&delivery.url, &delivery.payload).await;
            drop(permit);

            match result {
                Ok(()) => {
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                    debug!(dispatcher = %name, url = %delivery.url, "Notification delivered");
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(dispatcher = %name, url = %delivery.url, error = %e, "Notification delivery failed");
                }
            }
        });
    }

    debug!(dispatcher = %name, "Dispatch worker exiting");
}
