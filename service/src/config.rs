//! Service configuration.

use std::time::Duration;

use paywire_ledger::{HookLimits, LedgerConfig, PageLimits, FEE_LABEL};
use paywire_notifier::transport::DEFAULT_DELIVERY_TIMEOUT;
use paywire_notifier::DispatcherConfig;

/// Webhook delivery configuration.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Queue and concurrency bounds of each network's dispatcher.
    pub dispatcher: DispatcherConfig,
    /// Per-request timeout of the HTTP transport.
    pub delivery_timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }
}

/// Main service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Label of the fee account each ledger starts with.
    pub fee_label: String,
    /// Page size bounds for listings.
    pub page_limits: PageLimits,
    /// Hook registry bounds.
    pub hook_limits: HookLimits,
    /// Delivery configuration.
    pub notify: NotifyConfig,
    /// Seed for id allocation; entropy when unset. Each network derives its
    /// own seed from it.
    pub id_seed: Option<u64>,
    /// Log level.
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            fee_label: FEE_LABEL.to_string(),
            page_limits: PageLimits::default(),
            hook_limits: HookLimits::default(),
            notify: NotifyConfig::default(),
            id_seed: None,
            log_level: "info".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.parse().ok())
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(label) = std::env::var("PAYWIRE_FEE_LABEL") {
            config.fee_label = label;
        }

        if let Some(limit) = env_parse("PAYWIRE_PAGE_DEFAULT_LIMIT") {
            config.page_limits.default_limit = limit;
        }

        if let Some(limit) = env_parse("PAYWIRE_PAGE_MAX_LIMIT") {
            config.page_limits.max_limit = limit;
        }

        if let Some(max) = env_parse("PAYWIRE_MAX_HOOKS") {
            config.hook_limits.max_hooks = max;
        }

        if let Some(capacity) = env_parse("PAYWIRE_DISPATCH_QUEUE_CAPACITY") {
            config.notify.dispatcher.queue_capacity = capacity;
        }

        if let Some(workers) = env_parse("PAYWIRE_DISPATCH_CONCURRENCY") {
            config.notify.dispatcher.max_concurrent = workers;
        }

        if let Some(millis) = env_parse("PAYWIRE_DELIVERY_TIMEOUT_MS") {
            config.notify.delivery_timeout = Duration::from_millis(millis);
        }

        if let Some(seed) = env_parse("PAYWIRE_ID_SEED") {
            config.id_seed = Some(seed);
        }

        if let Ok(level) = std::env::var("PAYWIRE_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.fee_label.is_empty() {
            return Err("Fee label cannot be empty".to_string());
        }

        if self.page_limits.default_limit == 0 {
            return Err("Default page limit cannot be 0".to_string());
        }

        if self.page_limits.default_limit > self.page_limits.max_limit {
            return Err("Default page limit cannot exceed max page limit".to_string());
        }

        if self.hook_limits.max_hooks == 0 {
            return Err("Max hooks cannot be 0".to_string());
        }

        if self.notify.dispatcher.queue_capacity == 0 {
            return Err("Dispatch queue capacity cannot be 0".to_string());
        }

        if self.notify.dispatcher.max_concurrent == 0 {
            return Err("Dispatch concurrency cannot be 0".to_string());
        }

        if self.notify.delivery_timeout.is_zero() {
            return Err("Delivery timeout cannot be 0".to_string());
        }

        Ok(())
    }

    /// Ledger configuration for one network.
    pub fn ledger_config(&self, seed_offset: u64) -> LedgerConfig {
        LedgerConfig {
            fee_label: self.fee_label.clone(),
            hook_limits: self.hook_limits,
            id_seed: self.id_seed.map(|seed| seed.wrapping_add(seed_offset)),
        }
    }
}
