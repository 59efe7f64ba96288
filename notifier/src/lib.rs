//! Paywire Notifier
//!
//! Delivers ledger events to registered webhook URLs off the caller's path:
//! a bounded queue feeds a worker that runs a capped number of deliveries
//! at once over a pluggable transport.

pub mod dispatcher;
pub mod transport;

pub use dispatcher::{DispatchStats, DispatchStatsSnapshot, Dispatcher, DispatcherConfig};
pub use transport::{DeliveryError, HttpTransport, NotificationTransport};
