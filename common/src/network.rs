//! Networks served by independent ledger instances.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A payment network. Each network gets its own ledger, allocator and hook
/// registry; nothing is shared between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Production network.
    #[serde(rename = "mainnet")]
    MainNet,
    /// Public test network.
    #[serde(rename = "testnet3")]
    TestNet3,
}

impl Network {
    /// All supported networks.
    pub const ALL: [Network; 2] = [Network::MainNet, Network::TestNet3];

    /// Canonical network name, as used in URL paths.
    pub fn name(&self) -> &'static str {
        match self {
            Network::MainNet => "mainnet",
            Network::TestNet3 => "testnet3",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::MainNet),
            "testnet3" | "testnet" => Ok(Network::TestNet3),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}
