//! Per-chain operational counters.

use std::sync::atomic::{AtomicU64, Ordering};

use paywire_notifier::DispatchStatsSnapshot;

/// Counters for one network's ledger.
#[derive(Debug, Default)]
pub struct ChainMetrics {
    /// Accounts created.
    pub accounts_created: AtomicU64,
    /// Addresses issued.
    pub addresses_created: AtomicU64,
    /// Credits committed.
    pub credits: AtomicU64,
    /// Credits to addresses bound to no account.
    pub credits_unmatched: AtomicU64,
    /// Transfers committed.
    pub transfers: AtomicU64,
    /// Debits committed.
    pub debits: AtomicU64,
    /// Transaction ids reserved.
    pub reservations: AtomicU64,
    /// Operations rejected with an error.
    pub rejected: AtomicU64,
}

impl ChainMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_created(&self) {
        self.accounts_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn address_created(&self) {
        self.addresses_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn credit(&self) {
        self.credits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn credit_unmatched(&self) {
        self.credits_unmatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transfer(&self) {
        self.transfers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn debit(&self) {
        self.debits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reserved(&self, count: u64) {
        self.reservations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot, folding in the dispatcher counters.
    pub fn snapshot(&self, deliveries: DispatchStatsSnapshot) -> ChainMetricsSnapshot {
        ChainMetricsSnapshot {
            accounts_created: self.accounts_created.load(Ordering::Relaxed),
            addresses_created: self.addresses_created.load(Ordering::Relaxed),
            credits: self.credits.load(Ordering::Relaxed),
            credits_unmatched: self.credits_unmatched.load(Ordering::Relaxed),
            transfers: self.transfers.load(Ordering::Relaxed),
            debits: self.debits.load(Ordering::Relaxed),
            reservations: self.reservations.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            deliveries,
        }
    }
}

/// Snapshot of chain metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainMetricsSnapshot {
    pub accounts_created: u64,
    pub addresses_created: u64,
    pub credits: u64,
    pub credits_unmatched: u64,
    pub transfers: u64,
    pub debits: u64,
    pub reservations: u64,
    pub rejected: u64,
    pub deliveries: DispatchStatsSnapshot,
}

impl ChainMetricsSnapshot {
    /// Export metrics in Prometheus text format, labelled by network.
    pub fn to_prometheus(&self, network: &str) -> String {
        let counters: [(&str, &str, u64); 12] = [
            ("accounts_created", "Accounts created", self.accounts_created),
            ("addresses_created", "Deposit addresses issued", self.addresses_created),
            ("credits", "Credits committed", self.credits),
            ("credits_unmatched", "Credits to unbound addresses", self.credits_unmatched),
            ("transfers", "Transfers committed", self.transfers),
            ("debits", "Debits committed", self.debits),
            ("reservations", "Transaction ids reserved", self.reservations),
            ("rejected", "Operations rejected", self.rejected),
            ("deliveries_submitted", "Webhook deliveries queued", self.deliveries.submitted),
            ("deliveries_succeeded", "Webhook deliveries acknowledged", self.deliveries.delivered),
            ("deliveries_failed", "Webhook deliveries failed", self.deliveries.failed),
            ("deliveries_dropped", "Webhook deliveries dropped", self.deliveries.dropped),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP paywire_{name} {help}\n# TYPE paywire_{name} counter\npaywire_{name}{{network=\"{network}\"}} {value}\n\n"
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = ChainMetrics::new();

        metrics.account_created();
        metrics.account_created();
        metrics.transfer();
        metrics.reserved(3);

        let snapshot = metrics.snapshot(DispatchStatsSnapshot::default());
        assert_eq!(snapshot.accounts_created, 2);
        assert_eq!(snapshot.transfers, 1);
        assert_eq!(snapshot.reservations, 3);
        assert_eq!(snapshot.debits, 0);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = ChainMetrics::new();
        metrics.credit();

        let deliveries = DispatchStatsSnapshot {
            dropped: 2,
            ..Default::default()
        };
        let output = metrics.snapshot(deliveries).to_prometheus("mainnet");

        assert!(output.contains("# TYPE paywire_credits counter"));
        assert!(output.contains("paywire_credits{network=\"mainnet\"} 1"));
        assert!(output.contains("paywire_deliveries_dropped{network=\"mainnet\"} 2"));
    }
}
