//! One network's ledger, dispatcher and counters.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use paywire_common::{AccountId, Address, Amount, LedgerError, Network, Result, TransactionId};
use paywire_crypto::AddressGenerator;
use paywire_ledger::{
    Account, FeeEstimate, Ledger, LedgerTotals, PageLimits, PageRequest, Transaction,
};
use paywire_notifier::{Dispatcher, NotificationTransport};
use paywire_protocol::credit_notification;

use crate::config::ServiceConfig;
use crate::metrics::{ChainMetrics, ChainMetricsSnapshot};

/// Ledger operations for one network, with request-level validation and
/// credit notifications.
pub struct Chain {
    network: Network,
    ledger: Ledger,
    generator: Arc<dyn AddressGenerator>,
    dispatcher: Dispatcher,
    metrics: ChainMetrics,
    page_limits: PageLimits,
}

impl Chain {
    /// Create a chain for `network`.
    pub fn new(
        network: Network,
        config: &ServiceConfig,
        seed_offset: u64,
        generator: Arc<dyn AddressGenerator>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        let ledger = Ledger::new(network, generator.clone(), config.ledger_config(seed_offset));
        let dispatcher = Dispatcher::new(network.name(), config.notify.dispatcher.clone(), transport);

        Self {
            network,
            ledger,
            generator,
            dispatcher,
            metrics: ChainMetrics::new(),
            page_limits: config.page_limits,
        }
    }

    /// Network served by this chain.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Underlying ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Webhook dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Count failures before handing the result back.
    fn tracked<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.metrics.rejected();
            debug!(
                network = %self.network,
                operation,
                error_code = e.error_code(),
                error = %e,
                "Operation rejected"
            );
        }
        result
    }

    fn page(&self, limit: Option<usize>, next: Option<usize>) -> Result<PageRequest> {
        PageRequest::from_query(limit, next, &self.page_limits)
    }

    /// Create a zero-balance account.
    pub fn create_account(&self) -> Account {
        let account = self.ledger.create_account();
        self.metrics.account_created();
        account
    }

    /// List accounts; `limit` defaults and is capped per configuration.
    pub fn accounts(&self, limit: Option<usize>, next: Option<usize>) -> Result<Vec<Account>> {
        let page = self.tracked("accounts", self.page(limit, next))?;
        Ok(self.ledger.accounts(page.limit, page.next))
    }

    /// Get an account by id.
    pub fn account(&self, id: AccountId) -> Result<Account> {
        self.tracked("account", self.ledger.account(id))
    }

    /// Get the account bound to a label.
    pub fn account_by_label(&self, label: &str) -> Result<Account> {
        self.tracked("account_by_label", self.ledger.account_by_label(label))
    }

    /// Issue a fresh deposit address bound to the account.
    pub fn create_address(&self, account_id: AccountId) -> Result<Address> {
        let address = self.tracked("create_address", self.ledger.create_address(account_id))?;
        self.metrics.address_created();
        Ok(address)
    }

    /// Credit an address and notify every registered hook.
    ///
    /// The notification is queued after the ledger has released its lock;
    /// delivery outcome never affects the credit.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn credit_address(&self, address: &Address, value: Amount) -> Result<Option<Transaction>> {
        let credited = self.tracked("credit_address", self.ledger.credit_address(address, value))?;

        let Some(transaction) = credited else {
            self.metrics.credit_unmatched();
            debug!(address = %address, "Credit to unbound address ignored");
            return Ok(None);
        };
        self.metrics.credit();

        let hooks = self.ledger.hooks();
        if !hooks.is_empty() {
            match serde_json::to_value(credit_notification(&transaction)) {
                Ok(payload) => {
                    let queued = self.dispatcher.broadcast(&hooks, payload);
                    debug!(transaction_id = %transaction.id, hooks = hooks.len(), queued, "Credit notification queued");
                }
                Err(e) => {
                    warn!(transaction_id = %transaction.id, error = %e, "Failed to encode credit notification");
                }
            }
        }

        Ok(Some(transaction))
    }

    /// Reserve one transaction id.
    pub fn reserve_transaction_id(&self) -> TransactionId {
        let id = self.ledger.reserve_transaction_id();
        self.metrics.reserved(1);
        id
    }

    /// Reserve `count` ids at once.
    pub fn reserve_transaction_ids(&self, count: usize) -> Result<Vec<TransactionId>> {
        let ids = self.tracked(
            "reserve_transaction_ids",
            self.ledger.reserve_transaction_ids(count),
        )?;
        self.metrics.reserved(ids.len() as u64);
        Ok(ids)
    }

    /// Get a transaction by id.
    pub fn transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.tracked("transaction", self.ledger.transaction(id))
    }

    /// List an account's transactions; `limit` defaults and is capped per
    /// configuration.
    pub fn account_transactions(
        &self,
        account_id: AccountId,
        limit: Option<usize>,
        next: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let page = self.tracked("account_transactions", self.page(limit, next))?;
        self.tracked(
            "account_transactions",
            self.ledger.account_transactions(account_id, page.limit, page.next),
        )
    }

    /// Move value between two accounts under a reserved id.
    pub fn transfer(
        &self,
        reservation: TransactionId,
        from: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<Transaction> {
        let transaction = self.tracked(
            "transfer",
            self.ledger.transfer(reservation, from, to, value),
        )?;
        self.metrics.transfer();
        Ok(transaction)
    }

    /// Debit to an external address, which must be well-formed for this
    /// chain's network.
    pub fn debit(
        &self,
        reservation: TransactionId,
        from: AccountId,
        to_address: &Address,
        value: Amount,
    ) -> Result<Transaction> {
        if !to_address.is_empty() && !self.generator.is_valid(self.network, to_address.as_str()) {
            return self.tracked(
                "debit",
                Err(LedgerError::invalid(
                    "toAddress",
                    format!("invalid address for {}", self.network),
                )),
            );
        }

        let transaction = self.tracked(
            "debit",
            self.ledger.debit(reservation, from, to_address, value),
        )?;
        self.metrics.debit();
        Ok(transaction)
    }

    /// Register a webhook URL.
    pub fn create_hook(&self, url: &str) -> Result<()> {
        self.tracked("create_hook", self.ledger.create_hook(url))
    }

    /// Registered webhook URLs.
    pub fn hooks(&self) -> Vec<String> {
        self.ledger.hooks()
    }

    /// Remove a webhook. Returns false if it was not registered.
    pub fn delete_hook(&self, url: &str) -> bool {
        self.ledger.delete_hook(url)
    }

    /// Current fee schedule.
    pub fn fees(&self) -> Vec<FeeEstimate> {
        self.ledger.fees()
    }

    /// Aggregate balances and flows.
    pub fn totals(&self) -> LedgerTotals {
        self.ledger.totals()
    }

    /// Check that balances equal credits minus debits.
    pub fn verify_integrity(&self) -> bool {
        self.ledger.verify_integrity()
    }

    /// Counters for this chain, including deliveries.
    pub fn metrics(&self) -> ChainMetricsSnapshot {
        self.metrics.snapshot(self.dispatcher.stats())
    }
}
