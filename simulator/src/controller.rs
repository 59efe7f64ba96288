//! Simulation controller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use paywire_common::{AccountId, Address, Network, Result as LedgerResult};
use paywire_crypto::{AddressGenerator, HashedAddressGenerator};
use paywire_service::{Chain, Service};

use crate::metrics::SimulationMetrics;
use crate::scenario::{AssertCondition, Outcome, Scenario, ScenarioStep};

/// Drives one network of a service with scenarios or random traffic.
pub struct SimulationController {
    /// Service under test.
    service: Arc<Service>,
    /// Network driven.
    network: Network,
    /// Random number generator.
    rng: StdRng,
    /// Generator for external debit destinations.
    external: HashedAddressGenerator,
    /// Scenario aliases.
    aliases: HashMap<String, AccountId>,
    /// Most recent address per alias.
    addresses: HashMap<String, Address>,
    /// Simulation metrics.
    metrics: SimulationMetrics,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(service: Arc<Service>, network: Network, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            service,
            network,
            rng,
            external: HashedAddressGenerator::new(),
            aliases: HashMap::new(),
            addresses: HashMap::new(),
            metrics: SimulationMetrics::new(),
        }
    }

    fn chain(&self) -> &Arc<Chain> {
        self.service.chain(self.network)
    }

    fn alias(&self, alias: &str) -> anyhow::Result<AccountId> {
        self.aliases
            .get(alias)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Unknown account alias: {}", alias))
    }

    fn record<T>(&mut self, started: Instant, result: &LedgerResult<T>) {
        let latency = started.elapsed().as_micros() as u64;
        match result {
            Ok(_) => self.metrics.record_success(latency),
            Err(e) => self.metrics.record_rejection(e.error_code(), latency),
        }
    }

    fn check_outcome<T>(step: &str, expect: Outcome, result: &LedgerResult<T>) -> anyhow::Result<()> {
        match (expect, result) {
            (Outcome::Accepted, Err(e)) => Err(anyhow::anyhow!("{} rejected unexpectedly: {}", step, e)),
            (Outcome::Rejected, Ok(_)) => Err(anyhow::anyhow!("{} accepted unexpectedly", step)),
            _ => Ok(()),
        }
    }

    /// Run a scenario, failing on the first unmet expectation.
    pub async fn run_scenario(&mut self, scenario: Scenario) -> anyhow::Result<()> {
        info!(
            network = %self.network,
            scenario = %scenario.name,
            "Running scenario: {}",
            scenario.description
        );

        for step in &scenario.steps {
            self.execute_step(step)?;
        }

        info!(scenario = %scenario.name, steps = scenario.steps.len(), "Scenario passed");
        Ok(())
    }

    /// Execute a single scenario step.
    fn execute_step(&mut self, step: &ScenarioStep) -> anyhow::Result<()> {
        let chain = self.chain().clone();

        match step {
            ScenarioStep::CreateAccount { alias } => {
                let account = chain.create_account();
                info!(alias = %alias, account_id = %account.id, "Created account");
                self.aliases.insert(alias.clone(), account.id);
            }
            ScenarioStep::CreateAddress { account } => {
                let id = self.alias(account)?;
                let address = chain.create_address(id)?;
                info!(alias = %account, address = %address, "Created address");
                self.addresses.insert(account.clone(), address);
            }
            ScenarioStep::Deposit { account, value } => {
                let address = self
                    .addresses
                    .get(account)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("No address for alias: {}", account))?;
                let started = Instant::now();
                let result = chain.credit_address(&address, *value);
                self.record(started, &result);
                if result?.is_none() {
                    anyhow::bail!("Deposit address of {} is not bound", account);
                }
            }
            ScenarioStep::Transfer {
                from,
                to,
                value,
                expect,
            } => {
                let (from_id, to_id) = (self.alias(from)?, self.alias(to)?);
                let reservation = chain.reserve_transaction_id();
                let started = Instant::now();
                let result = chain.transfer(reservation, from_id, to_id, *value);
                self.record(started, &result);
                Self::check_outcome("transfer", *expect, &result)?;
            }
            ScenarioStep::Debit { from, value, expect } => {
                let from_id = self.alias(from)?;
                let destination = self.external.generate(self.network)?;
                let reservation = chain.reserve_transaction_id();
                let started = Instant::now();
                let result = chain.debit(reservation, from_id, &destination, *value);
                self.record(started, &result);
                Self::check_outcome("debit", *expect, &result)?;
            }
            ScenarioStep::RegisterHook { url } => {
                chain.create_hook(url)?;
                info!(url = %url, "Registered hook");
            }
            ScenarioStep::Assert { condition } => self.check(&chain, condition)?,
        }

        Ok(())
    }

    fn check(&self, chain: &Chain, condition: &AssertCondition) -> anyhow::Result<()> {
        match condition {
            AssertCondition::BalanceEquals { account, value } => {
                let balance = chain.account(self.alias(account)?)?.balance;
                if balance != *value {
                    anyhow::bail!("Balance of {} is {}, expected {}", account, balance, value);
                }
            }
            AssertCondition::TransactionCount { account, count } => {
                let max = self.service.config().page_limits.max_limit;
                let found = chain
                    .account_transactions(self.alias(account)?, Some(max), None)?
                    .len();
                if found != *count {
                    anyhow::bail!("{} has {} transactions, expected {}", account, found, count);
                }
            }
            AssertCondition::AccountPageSize { limit, next, count } => {
                let found = chain.accounts(Some(*limit), Some(*next))?.len();
                if found != *count {
                    anyhow::bail!(
                        "Page limit={} next={} has {} accounts, expected {}",
                        limit,
                        next,
                        found,
                        count
                    );
                }
            }
            AssertCondition::LedgerBalanced => {
                if !chain.verify_integrity() {
                    anyhow::bail!("Ledger integrity check failed: {:?}", chain.totals());
                }
            }
        }

        Ok(())
    }

    /// Create `accounts` funded-by-deposit accounts and run `operations`
    /// random credits, transfers and debits spread over `tasks` blocking
    /// workers, then verify integrity.
    pub async fn run_traffic(
        &mut self,
        accounts: usize,
        operations: usize,
        tasks: usize,
    ) -> anyhow::Result<()> {
        if accounts == 0 {
            anyhow::bail!("Random traffic needs at least one account");
        }

        let chain = self.chain().clone();
        let mut population = Vec::with_capacity(accounts);
        for _ in 0..accounts {
            let account = chain.create_account();
            population.push((account.id, chain.create_address(account.id)?));
        }
        let population = Arc::new(population);
        let destination = self.external.generate(self.network)?;

        info!(
            network = %self.network,
            accounts,
            operations,
            tasks,
            "Running random traffic"
        );

        let tasks = tasks.max(1);
        let mut handles = Vec::with_capacity(tasks);
        for task in 0..tasks {
            let share = operations / tasks + usize::from(task < operations % tasks);
            let seed: u64 = self.rng.gen();
            let chain = chain.clone();
            let population = population.clone();
            let destination = destination.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                drive(&chain, &population, &destination, share, seed)
            }));
        }

        for handle in handles {
            self.metrics.merge(handle.await?);
        }

        if !chain.verify_integrity() {
            warn!(totals = ?chain.totals(), "Integrity check failed");
            anyhow::bail!("Ledger integrity check failed on {}", self.network);
        }

        info!(network = %self.network, totals = ?chain.totals(), "Integrity verified");
        Ok(())
    }

    /// Get simulation metrics.
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }
}

/// Issue random operations against one chain.
fn drive(
    chain: &Chain,
    population: &[(AccountId, Address)],
    destination: &Address,
    operations: usize,
    seed: u64,
) -> SimulationMetrics {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut metrics = SimulationMetrics::new();

    for _ in 0..operations {
        let (from, address) = &population[rng.gen_range(0..population.len())];
        let (to, _) = &population[rng.gen_range(0..population.len())];
        let value = rng.gen_range(1..=10_000);
        let roll = rng.gen_range(0..100);

        let started = Instant::now();
        let result = if roll < 30 {
            chain.credit_address(address, value).map(|_| ())
        } else if roll < 80 {
            let reservation = chain.reserve_transaction_id();
            chain.transfer(reservation, *from, *to, value).map(|_| ())
        } else {
            let reservation = chain.reserve_transaction_id();
            chain.debit(reservation, *from, destination, value).map(|_| ())
        };
        let latency = started.elapsed().as_micros() as u64;

        match result {
            Ok(()) => metrics.record_success(latency),
            Err(e) => metrics.record_rejection(e.error_code(), latency),
        }
    }

    metrics
}
