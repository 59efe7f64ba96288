//! Paywire Common Types
//!
//! Shared types used across the Paywire ledger: identifiers, networks,
//! the ledger error taxonomy and timestamp helpers.

pub mod identifiers;
pub mod network;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use network::*;
pub use error::*;
pub use time::*;
