//! Paywire Service
//!
//! Runs the mainnet and testnet3 ledgers side by side. Each network gets its
//! own [`Chain`]: a ledger, a webhook dispatcher and operational counters.
//! Nothing is shared between the two.

pub mod chain;
pub mod config;
pub mod metrics;
pub mod service;
pub mod state;

pub use chain::Chain;
pub use config::ServiceConfig;
pub use metrics::{ChainMetrics, ChainMetricsSnapshot};
pub use service::{Service, ServiceError};
pub use state::ServiceState;
