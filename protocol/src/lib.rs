//! Paywire Wire Payloads
//!
//! JSON message types shared by webhook notifications and any API layer
//! placed in front of the ledger.

pub mod messages;

pub use messages::*;
