//! Simulation scenarios.
//!
//! Accounts are referred to by alias; the controller maps aliases to the
//! ids the ledger assigns.

use serde::{Deserialize, Serialize};

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// Expected result of a settlement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Accepted,
    Rejected,
}

/// A step in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Create an account under an alias.
    CreateAccount { alias: String },
    /// Issue a deposit address for an account.
    CreateAddress { account: String },
    /// Credit the account's most recent address.
    Deposit { account: String, value: i64 },
    /// Reserve an id and transfer between accounts.
    Transfer {
        from: String,
        to: String,
        value: i64,
        #[serde(default)]
        expect: Outcome,
    },
    /// Reserve an id and debit to a fresh external address.
    Debit {
        from: String,
        value: i64,
        #[serde(default)]
        expect: Outcome,
    },
    /// Register a webhook.
    RegisterHook { url: String },
    /// Check a condition.
    Assert { condition: AssertCondition },
}

/// Conditions that can be asserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum AssertCondition {
    /// Account balance equals.
    BalanceEquals { account: String, value: i64 },
    /// Number of transactions involving the account.
    TransactionCount { account: String, count: usize },
    /// Size of an accounts page.
    AccountPageSize { limit: usize, next: usize, count: usize },
    /// Balances equal credits minus debits.
    LedgerBalanced,
}

impl Scenario {
    /// Load a built-in scenario by name, or a JSON scenario from a path
    /// ending in `.json`.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        if name.ends_with(".json") {
            let text = std::fs::read_to_string(name)?;
            return Ok(serde_json::from_str(&text)?);
        }

        match name {
            "deposit-transfer" => Ok(Self::deposit_transfer()),
            "overdraft" => Ok(Self::overdraft()),
            "paging" => Ok(Self::paging()),
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Names of the built-in scenarios.
    pub fn builtin_names() -> &'static [&'static str] {
        &["deposit-transfer", "overdraft", "paging"]
    }

    /// Deposit into one account, then move part of it to another.
    fn deposit_transfer() -> Self {
        Self {
            name: "deposit-transfer".to_string(),
            description: "Credit a deposit address and transfer part of it".to_string(),
            steps: vec![
                ScenarioStep::CreateAccount { alias: "A".to_string() },
                ScenarioStep::CreateAddress { account: "A".to_string() },
                ScenarioStep::Deposit {
                    account: "A".to_string(),
                    value: 1000,
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BalanceEquals {
                        account: "A".to_string(),
                        value: 1000,
                    },
                },
                ScenarioStep::CreateAccount { alias: "B".to_string() },
                ScenarioStep::Transfer {
                    from: "A".to_string(),
                    to: "B".to_string(),
                    value: 400,
                    expect: Outcome::Accepted,
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BalanceEquals {
                        account: "A".to_string(),
                        value: 600,
                    },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BalanceEquals {
                        account: "B".to_string(),
                        value: 400,
                    },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::TransactionCount {
                        account: "A".to_string(),
                        count: 2,
                    },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::LedgerBalanced,
                },
            ],
        }
    }

    /// Transfers and debits beyond the balance are rejected without effect.
    fn overdraft() -> Self {
        Self {
            name: "overdraft".to_string(),
            description: "Reject spending beyond the balance".to_string(),
            steps: vec![
                ScenarioStep::CreateAccount { alias: "A".to_string() },
                ScenarioStep::CreateAccount { alias: "B".to_string() },
                ScenarioStep::CreateAddress { account: "A".to_string() },
                ScenarioStep::Deposit {
                    account: "A".to_string(),
                    value: 300,
                },
                ScenarioStep::Transfer {
                    from: "A".to_string(),
                    to: "B".to_string(),
                    value: 301,
                    expect: Outcome::Rejected,
                },
                ScenarioStep::Debit {
                    from: "A".to_string(),
                    value: 500,
                    expect: Outcome::Rejected,
                },
                ScenarioStep::Debit {
                    from: "A".to_string(),
                    value: 300,
                    expect: Outcome::Accepted,
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BalanceEquals {
                        account: "A".to_string(),
                        value: 0,
                    },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BalanceEquals {
                        account: "B".to_string(),
                        value: 0,
                    },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::LedgerBalanced,
                },
            ],
        }
    }

    /// Ten accounts (the fee account and nine more) split into two pages.
    fn paging() -> Self {
        let mut steps: Vec<ScenarioStep> = (1..=9)
            .map(|i| ScenarioStep::CreateAccount {
                alias: format!("acct-{}", i),
            })
            .collect();

        for (limit, next, count) in [(5, 0, 5), (5, 5, 5), (5, 8, 2), (5, 10, 0), (10, 0, 10)] {
            steps.push(ScenarioStep::Assert {
                condition: AssertCondition::AccountPageSize { limit, next, count },
            });
        }

        Self {
            name: "paging".to_string(),
            description: "Page through accounts in creation order".to_string(),
            steps,
        }
    }
}
