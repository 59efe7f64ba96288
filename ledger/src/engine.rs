//! Core ledger engine implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use paywire_common::{
    now, AccountId, Address, Amount, LedgerError, Network, Result, TransactionId,
};
use paywire_crypto::AddressGenerator;

use crate::account::Account;
use crate::allocator::IdAllocator;
use crate::balance::LedgerTotals;
use crate::fees::{fee_schedule, FeeEstimate};
use crate::hooks::{HookLimits, HookRegistry};
use crate::pagination::PageRequest;
use crate::transaction::{Transaction, TransactionKind};

/// Label of the account every ledger starts with to collect service fees.
pub const FEE_LABEL: &str = "_fee";

/// Largest number of reservations issued by one batch request.
pub const MAX_RESERVATION_BATCH: usize = 10;

/// Attempts made to obtain an unbound address from the generator.
const MAX_ADDRESS_ATTEMPTS: usize = 8;

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Label bound to the fee account created at startup.
    pub fee_label: String,
    /// Hook registry bounds.
    pub hook_limits: HookLimits,
    /// Seed for the id allocator; entropy when unset.
    pub id_seed: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fee_label: FEE_LABEL.to_string(),
            hook_limits: HookLimits::default(),
            id_seed: None,
        }
    }
}

/// Everything guarded by the ledger lock.
struct LedgerState {
    allocator: IdAllocator,
    accounts: HashMap<AccountId, Account>,
    account_order: Vec<AccountId>,
    labels: HashMap<String, AccountId>,
    addresses: HashMap<Address, AccountId>,
    transactions: HashMap<TransactionId, Transaction>,
    transaction_order: Vec<TransactionId>,
    reservations: HashSet<TransactionId>,
    hooks: HookRegistry,
}

impl LedgerState {
    fn new(config: &LedgerConfig) -> Self {
        let allocator = match config.id_seed {
            Some(seed) => IdAllocator::with_seed(seed),
            None => IdAllocator::new(),
        };

        Self {
            allocator,
            accounts: HashMap::new(),
            account_order: Vec::new(),
            labels: HashMap::new(),
            addresses: HashMap::new(),
            transactions: HashMap::new(),
            transaction_order: Vec::new(),
            reservations: HashSet::new(),
            hooks: HookRegistry::new(config.hook_limits),
        }
    }

    fn insert_account(&mut self) -> Account {
        let account = Account::new(AccountId::new(self.allocator.allocate()));
        self.accounts.insert(account.id, account);
        self.account_order.push(account.id);
        account
    }

    fn account(&self, id: AccountId) -> Result<Account> {
        self.accounts
            .get(&id)
            .copied()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    fn reserve(&mut self) -> TransactionId {
        let id = TransactionId::new(self.allocator.allocate());
        self.reservations.insert(id);
        id
    }

    fn ensure_reserved(&self, id: TransactionId) -> Result<()> {
        if self.reservations.contains(&id) {
            Ok(())
        } else {
            Err(LedgerError::InvalidReservation(id))
        }
    }

    fn set_balance(&mut self, id: AccountId, balance: Amount) {
        if let Some(account) = self.accounts.get_mut(&id) {
            account.balance = balance;
        }
    }

    fn record(&mut self, transaction: Transaction) {
        self.transaction_order.push(transaction.id);
        self.transactions.insert(transaction.id, transaction);
    }
}

fn ensure_positive(value: Amount) -> Result<()> {
    if value <= 0 {
        return Err(LedgerError::invalid("value", "value must be positive"));
    }
    Ok(())
}

/// In-memory ledger for one network.
///
/// All state sits behind one reader/writer lock. Lookups and listings share
/// it; every mutation holds it exclusively for its whole duration and
/// validates before touching anything, so a failed operation leaves no
/// trace.
pub struct Ledger {
    network: Network,
    generator: Arc<dyn AddressGenerator>,
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// Create a ledger holding only the labelled fee account.
    pub fn new(network: Network, generator: Arc<dyn AddressGenerator>, config: LedgerConfig) -> Self {
        let mut state = LedgerState::new(&config);
        let fee_account = state.insert_account();
        state.labels.insert(config.fee_label.clone(), fee_account.id);

        info!(
            network = %network,
            fee_account = %fee_account.id,
            "Ledger initialized"
        );

        Self {
            network,
            generator,
            state: RwLock::new(state),
        }
    }

    /// Network this ledger serves.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Create a zero-balance account.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn create_account(&self) -> Account {
        let account = self.state.write().insert_account();
        info!(account_id = %account.id, "Account created");
        account
    }

    /// List accounts in creation order.
    pub fn accounts(&self, limit: usize, next: usize) -> Vec<Account> {
        let state = self.state.read();
        let window = PageRequest::new(limit, next).window(state.account_order.len());
        state.account_order[window]
            .iter()
            .filter_map(|id| state.accounts.get(id).copied())
            .collect()
    }

    /// Number of accounts, including the fee account.
    pub fn account_count(&self) -> usize {
        self.state.read().account_order.len()
    }

    /// Get an account by id.
    pub fn account(&self, id: AccountId) -> Result<Account> {
        self.state.read().account(id)
    }

    /// Get the account bound to a label.
    pub fn account_by_label(&self, label: &str) -> Result<Account> {
        let state = self.state.read();
        let id = state
            .labels
            .get(label)
            .copied()
            .ok_or_else(|| LedgerError::LabelNotFound(label.to_string()))?;
        state.account(id)
    }

    /// Issue a fresh deposit address bound to the account.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn create_address(&self, account_id: AccountId) -> Result<Address> {
        let mut state = self.state.write();
        state.account(account_id)?;

        for _ in 0..MAX_ADDRESS_ATTEMPTS {
            let address = self
                .generator
                .generate(self.network)
                .map_err(|e| LedgerError::AddressGeneration(e.to_string()))?;

            if state.addresses.contains_key(&address) {
                warn!(address = %address, "Generated address already bound, retrying");
                continue;
            }

            state.addresses.insert(address.clone(), account_id);
            info!(account_id = %account_id, address = %address, "Address created");
            return Ok(address);
        }

        Err(LedgerError::AddressGeneration(format!(
            "no unbound address after {} attempts",
            MAX_ADDRESS_ATTEMPTS
        )))
    }

    /// Account an address is bound to, if any.
    pub fn address_owner(&self, address: &Address) -> Option<AccountId> {
        self.state.read().addresses.get(address).copied()
    }

    /// Credit value arriving at an address from outside the ledger.
    ///
    /// Returns `Ok(None)` without touching state when the address is not
    /// bound to any account.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn credit_address(&self, address: &Address, value: Amount) -> Result<Option<Transaction>> {
        let mut state = self.state.write();

        let Some(account_id) = state.addresses.get(address).copied() else {
            return Ok(None);
        };

        ensure_positive(value)?;
        let balance = state.account(account_id)?.credited(value)?;

        let id = TransactionId::new(state.allocator.allocate());
        let transaction = Transaction::credit(id, account_id, address.clone(), value, now());
        state.set_balance(account_id, balance);
        state.record(transaction.clone());

        info!(
            transaction_id = %id,
            account_id = %account_id,
            value,
            balance,
            "Address credited"
        );

        Ok(Some(transaction))
    }

    /// Reserve a transaction id for a later transfer or debit.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn reserve_transaction_id(&self) -> TransactionId {
        let id = self.state.write().reserve();
        info!(reservation = %id, "Transaction id reserved");
        id
    }

    /// Reserve `count` ids at once, `1..=MAX_RESERVATION_BATCH`.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn reserve_transaction_ids(&self, count: usize) -> Result<Vec<TransactionId>> {
        if count == 0 || count > MAX_RESERVATION_BATCH {
            return Err(LedgerError::invalid(
                "n",
                format!("n must be > 0 and <= {}", MAX_RESERVATION_BATCH),
            ));
        }

        let mut state = self.state.write();
        let ids: Vec<TransactionId> = (0..count).map(|_| state.reserve()).collect();
        info!(count, "Transaction ids reserved");
        Ok(ids)
    }

    /// Check whether a reservation is still outstanding.
    pub fn is_reserved(&self, id: TransactionId) -> bool {
        self.state.read().reservations.contains(&id)
    }

    /// Get a committed transaction.
    pub fn transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.state
            .read()
            .transactions
            .get(&id)
            .cloned()
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// List the transactions of an account in commit order.
    ///
    /// Only transactions where the account is source or destination are
    /// counted; `next` and `limit` apply to that filtered sequence.
    pub fn account_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
        next: usize,
    ) -> Result<Vec<Transaction>> {
        let state = self.state.read();
        state.account(account_id)?;

        let involved: Vec<&Transaction> = state
            .transaction_order
            .iter()
            .filter_map(|id| state.transactions.get(id))
            .filter(|tx| tx.involves(account_id))
            .collect();

        let window = PageRequest::new(limit, next).window(involved.len());
        Ok(involved[window].iter().map(|tx| (*tx).clone()).collect())
    }

    /// Move value between two accounts, consuming a reservation.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn transfer(
        &self,
        reservation: TransactionId,
        from: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<Transaction> {
        let mut state = self.state.write();

        state.ensure_reserved(reservation)?;
        let from_account = state.account(from)?;
        let to_account = state.account(to)?;
        ensure_positive(value)?;
        let from_balance = from_account.debited(value)?;

        let to_balance = if from == to {
            from_account.balance
        } else {
            to_account.credited(value)?
        };

        if from != to {
            state.set_balance(from, from_balance);
            state.set_balance(to, to_balance);
        }

        let transaction = Transaction::transfer(reservation, from, to, value, now());
        state.record(transaction.clone());
        state.reservations.remove(&reservation);

        info!(
            transaction_id = %reservation,
            from = %from,
            to = %to,
            value,
            "Transfer committed"
        );

        Ok(transaction)
    }

    /// Send value to an external address, consuming a reservation.
    ///
    /// The destination is not checked against this ledger's bindings; the
    /// value leaves the ledger.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn debit(
        &self,
        reservation: TransactionId,
        from: AccountId,
        to_address: &Address,
        value: Amount,
    ) -> Result<Transaction> {
        let mut state = self.state.write();

        state.ensure_reserved(reservation)?;
        let from_account = state.account(from)?;
        if to_address.is_empty() {
            return Err(LedgerError::invalid("toAddress", "no to address"));
        }
        ensure_positive(value)?;
        let from_balance = from_account.debited(value)?;

        state.set_balance(from, from_balance);
        let transaction = Transaction::debit(reservation, from, to_address.clone(), value, now());
        state.record(transaction.clone());
        state.reservations.remove(&reservation);

        info!(
            transaction_id = %reservation,
            from = %from,
            to_address = %to_address,
            value,
            "Debit committed"
        );

        Ok(transaction)
    }

    /// Register a webhook URL.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn create_hook(&self, url: &str) -> Result<()> {
        self.state.write().hooks.insert(url)?;
        info!(url, "Hook registered");
        Ok(())
    }

    /// Registered webhook URLs, unordered.
    pub fn hooks(&self) -> Vec<String> {
        self.state.read().hooks.urls()
    }

    /// Remove a webhook URL. Returns false if it was not registered.
    #[instrument(skip(self), fields(network = %self.network))]
    pub fn delete_hook(&self, url: &str) -> bool {
        let removed = self.state.write().hooks.remove(url);
        if removed {
            info!(url, "Hook deleted");
        }
        removed
    }

    /// Current fee schedule.
    pub fn fees(&self) -> Vec<FeeEstimate> {
        fee_schedule()
    }

    /// Aggregate balances and flows under one read lock.
    pub fn totals(&self) -> LedgerTotals {
        let state = self.state.read();
        let mut totals = LedgerTotals::default();

        for account in state.accounts.values() {
            totals.add_balance(account.balance);
        }

        for tx in state.transactions.values() {
            let value = i128::from(tx.value);
            match tx.kind {
                TransactionKind::Credit => totals.credited += value,
                TransactionKind::Debit => totals.debited += value,
                TransactionKind::Transfer => totals.transferred += value,
            }
        }

        totals
    }

    /// Verify ledger integrity: no negative balance, and balances equal
    /// credits minus debits.
    pub fn verify_integrity(&self) -> bool {
        let no_negative = self
            .state
            .read()
            .accounts
            .values()
            .all(|account| account.balance >= 0);
        no_negative && self.totals().is_balanced()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use paywire_common::ErrorKind;
    use paywire_crypto::{CryptoError, HashedAddressGenerator};
    use proptest::prelude::*;

    /// Hands out `addr-0`, `addr-1`, ...
    #[derive(Default)]
    struct SequentialGenerator {
        next: AtomicU64,
    }

    impl AddressGenerator for SequentialGenerator {
        fn generate(&self, network: Network) -> paywire_crypto::Result<Address> {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            Ok(Address::new(format!("{}-addr-{}", network, n)))
        }

        fn is_valid(&self, _network: Network, address: &str) -> bool {
            !address.is_empty()
        }
    }

    /// Always returns the same address.
    struct ConstantGenerator;

    impl AddressGenerator for ConstantGenerator {
        fn generate(&self, _network: Network) -> paywire_crypto::Result<Address> {
            Ok(Address::new("same"))
        }

        fn is_valid(&self, _network: Network, _address: &str) -> bool {
            true
        }
    }

    struct FailingGenerator;

    impl AddressGenerator for FailingGenerator {
        fn generate(&self, _network: Network) -> paywire_crypto::Result<Address> {
            Err(CryptoError::Randomness("no entropy".to_string()))
        }

        fn is_valid(&self, _network: Network, _address: &str) -> bool {
            false
        }
    }

    fn create_test_ledger() -> Ledger {
        Ledger::new(
            Network::TestNet3,
            Arc::new(SequentialGenerator::default()),
            LedgerConfig::default(),
        )
    }

    fn funded_account(ledger: &Ledger, value: Amount) -> (Account, Address) {
        let account = ledger.create_account();
        let address = ledger.create_address(account.id).unwrap();
        ledger.credit_address(&address, value).unwrap().unwrap();
        (ledger.account(account.id).unwrap(), address)
    }

    #[test]
    fn test_new_ledger_has_fee_account() {
        let ledger = create_test_ledger();

        let fee = ledger.account_by_label(FEE_LABEL).unwrap();
        assert_eq!(fee.balance, 0);
        assert_eq!(ledger.account_count(), 1);
        assert_eq!(ledger.accounts(10, 0), vec![fee]);

        let err = ledger.account_by_label("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_accounts_are_distinct_and_empty() {
        let ledger = create_test_ledger();
        let accounts: Vec<Account> = (0..200).map(|_| ledger.create_account()).collect();

        let ids: HashSet<AccountId> = accounts.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), accounts.len());
        assert!(accounts.iter().all(|a| a.balance == 0));
    }

    #[test]
    fn test_create_address_requires_account() {
        let ledger = create_test_ledger();
        let err = ledger.create_address(AccountId::new(12345)).unwrap_err();
        assert_eq!(err, LedgerError::AccountNotFound(AccountId::new(12345)));
    }

    #[test]
    fn test_create_address_binds_account() {
        let ledger = create_test_ledger();
        let account = ledger.create_account();

        let first = ledger.create_address(account.id).unwrap();
        let second = ledger.create_address(account.id).unwrap();

        assert_ne!(first, second);
        assert_eq!(ledger.address_owner(&first), Some(account.id));
        assert_eq!(ledger.address_owner(&second), Some(account.id));
    }

    #[test]
    fn test_create_address_never_rebinds() {
        let ledger = Ledger::new(
            Network::MainNet,
            Arc::new(ConstantGenerator),
            LedgerConfig::default(),
        );
        let a = ledger.create_account();
        let b = ledger.create_account();

        ledger.create_address(a.id).unwrap();
        let err = ledger.create_address(b.id).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(ledger.address_owner(&Address::new("same")), Some(a.id));
    }

    #[test]
    fn test_generator_failure_surfaces() {
        let ledger = Ledger::new(
            Network::MainNet,
            Arc::new(FailingGenerator),
            LedgerConfig::default(),
        );
        let account = ledger.create_account();

        let err = ledger.create_address(account.id).unwrap_err();
        assert!(matches!(err, LedgerError::AddressGeneration(_)));
    }

    #[test]
    fn test_credit_unbound_address_changes_nothing() {
        let ledger = create_test_ledger();
        let (account, _) = funded_account(&ledger, 100);
        let before = ledger.totals();

        let result = ledger.credit_address(&Address::new("nowhere"), 500).unwrap();

        assert!(result.is_none());
        assert_eq!(ledger.account(account.id).unwrap().balance, 100);
        assert_eq!(ledger.totals(), before);
    }

    #[test]
    fn test_credit_rejects_non_positive_value() {
        let ledger = create_test_ledger();
        let account = ledger.create_account();
        let address = ledger.create_address(account.id).unwrap();

        for value in [0, -5] {
            let err = ledger.credit_address(&address, value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(ledger.account(account.id).unwrap().balance, 0);
        assert!(ledger.account_transactions(account.id, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn test_deposit_then_transfer_scenario() {
        let ledger = create_test_ledger();
        let a = ledger.create_account();
        assert_eq!(a.balance, 0);

        let addr1 = ledger.create_address(a.id).unwrap();
        let credit = ledger.credit_address(&addr1, 1000).unwrap().unwrap();
        assert_eq!(credit.kind, TransactionKind::Credit);
        assert_eq!(ledger.account(a.id).unwrap().balance, 1000);
        assert_eq!(ledger.account_transactions(a.id, 10, 0).unwrap().len(), 1);

        let r1 = ledger.reserve_transaction_id();
        let b = ledger.create_account();
        let transfer = ledger.transfer(r1, a.id, b.id, 400).unwrap();

        assert_eq!(transfer.id, r1);
        assert_eq!(ledger.account(a.id).unwrap().balance, 600);
        assert_eq!(ledger.account(b.id).unwrap().balance, 400);

        let history = ledger.account_transactions(a.id, 10, 0).unwrap();
        let kinds: Vec<TransactionKind> = history.iter().map(|tx| tx.kind).collect();
        assert_eq!(kinds, vec![TransactionKind::Credit, TransactionKind::Transfer]);
        assert_eq!(ledger.transaction(r1).unwrap(), transfer);
        assert!(ledger.verify_integrity());
    }

    #[test]
    fn test_transfer_insufficient_funds_leaves_balances() {
        let ledger = create_test_ledger();
        let (a, _) = funded_account(&ledger, 300);
        let b = ledger.create_account();
        let reservation = ledger.reserve_transaction_id();

        let err = ledger.transfer(reservation, a.id, b.id, 301).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(ledger.account(a.id).unwrap().balance, 300);
        assert_eq!(ledger.account(b.id).unwrap().balance, 0);
        assert!(ledger.is_reserved(reservation));
        assert!(ledger.transaction(reservation).is_err());
    }

    #[test]
    fn test_transfer_validation_order() {
        let ledger = create_test_ledger();
        let (a, _) = funded_account(&ledger, 300);
        let b = ledger.create_account();
        let missing = AccountId::new(1);
        let reservation = ledger.reserve_transaction_id();

        assert_eq!(
            ledger.transfer(TransactionId::new(1), missing, b.id, 0).unwrap_err(),
            LedgerError::InvalidReservation(TransactionId::new(1))
        );
        assert_eq!(
            ledger.transfer(reservation, missing, b.id, 0).unwrap_err(),
            LedgerError::AccountNotFound(missing)
        );
        assert_eq!(
            ledger.transfer(reservation, a.id, missing, 0).unwrap_err(),
            LedgerError::AccountNotFound(missing)
        );
        assert_eq!(
            ledger.transfer(reservation, a.id, b.id, 0).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );

        // The failed attempts left the reservation usable.
        ledger.transfer(reservation, a.id, b.id, 300).unwrap();
        assert_eq!(ledger.account(b.id).unwrap().balance, 300);
    }

    #[test]
    fn test_reservation_commits_once() {
        let ledger = create_test_ledger();
        let (a, _) = funded_account(&ledger, 1000);
        let b = ledger.create_account();
        let reservation = ledger.reserve_transaction_id();

        ledger.transfer(reservation, a.id, b.id, 100).unwrap();
        assert!(!ledger.is_reserved(reservation));

        let err = ledger.transfer(reservation, a.id, b.id, 100).unwrap_err();
        assert_eq!(err, LedgerError::InvalidReservation(reservation));

        let err = ledger
            .debit(reservation, a.id, &Address::new("ext"), 100)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidReservation(reservation));

        assert_eq!(ledger.account(a.id).unwrap().balance, 900);
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let ledger = create_test_ledger();
        let (a, _) = funded_account(&ledger, 50);
        let reservation = ledger.reserve_transaction_id();

        ledger.transfer(reservation, a.id, a.id, 50).unwrap();
        assert_eq!(ledger.account(a.id).unwrap().balance, 50);
        assert_eq!(ledger.account_transactions(a.id, 10, 0).unwrap().len(), 2);
        assert!(ledger.verify_integrity());
    }

    #[test]
    fn test_debit_to_external_address() {
        let ledger = create_test_ledger();
        let (a, _) = funded_account(&ledger, 1000);
        let reservation = ledger.reserve_transaction_id();
        let external = Address::new("external-destination");

        let debit = ledger.debit(reservation, a.id, &external, 250).unwrap();

        assert_eq!(debit.kind, TransactionKind::Debit);
        assert_eq!(debit.to_address, Some(external));
        assert_eq!(debit.to_account_id, None);
        assert_eq!(ledger.account(a.id).unwrap().balance, 750);

        let totals = ledger.totals();
        assert_eq!(totals.credited, 1000);
        assert_eq!(totals.debited, 250);
        assert!(totals.is_balanced());
    }

    #[test]
    fn test_debit_validation() {
        let ledger = create_test_ledger();
        let (a, _) = funded_account(&ledger, 100);
        let reservation = ledger.reserve_transaction_id();

        let err = ledger.debit(reservation, a.id, &Address::new(""), 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = ledger
            .debit(reservation, a.id, &Address::new("ext"), -1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = ledger
            .debit(reservation, a.id, &Address::new("ext"), 101)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        assert_eq!(ledger.account(a.id).unwrap().balance, 100);
        assert!(ledger.is_reserved(reservation));
    }

    #[test]
    fn test_debit_from_unknown_account() {
        let ledger = create_test_ledger();
        let reservation = ledger.reserve_transaction_id();
        let missing = AccountId::new(3);

        let err = ledger
            .debit(reservation, missing, &Address::new("ext"), 1)
            .unwrap_err();

        assert_eq!(err, LedgerError::AccountNotFound(missing));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(ledger.is_reserved(reservation));
        assert!(ledger.transaction(reservation).is_err());
    }

    #[test]
    fn test_reserve_batch_bounds() {
        let ledger = create_test_ledger();

        let ids = ledger.reserve_transaction_ids(MAX_RESERVATION_BATCH).unwrap();
        let unique: HashSet<TransactionId> = ids.iter().copied().collect();
        assert_eq!(unique.len(), MAX_RESERVATION_BATCH);
        assert!(ids.iter().all(|id| ledger.is_reserved(*id)));

        assert!(ledger.reserve_transaction_ids(0).is_err());
        assert!(ledger.reserve_transaction_ids(MAX_RESERVATION_BATCH + 1).is_err());
    }

    #[test]
    fn test_ids_unique_across_entities() {
        let ledger = create_test_ledger();
        let mut seen = HashSet::new();

        for _ in 0..50 {
            let account = ledger.create_account();
            assert!(seen.insert(account.id.get()));
            let reservation = ledger.reserve_transaction_id();
            assert!(seen.insert(reservation.get()));
        }
    }

    #[test]
    fn test_accounts_pagination() {
        let ledger = create_test_ledger();
        for _ in 0..9 {
            ledger.create_account();
        }
        assert_eq!(ledger.account_count(), 10);

        let first = ledger.accounts(5, 0);
        let second = ledger.accounts(5, 5);
        let all = ledger.accounts(10, 0);

        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);
        assert!(first.iter().all(|a| !second.contains(a)));
        assert_eq!([first, second].concat(), all);

        assert_eq!(ledger.accounts(5, 8).len(), 2);
        assert!(ledger.accounts(5, 10).is_empty());
        assert!(ledger.accounts(5, 1000).is_empty());
        assert_eq!(ledger.accounts(10, 0), all);
    }

    #[test]
    fn test_account_transactions_filters_then_pages() {
        let ledger = create_test_ledger();
        let (a, addr_a) = funded_account(&ledger, 10);
        let (b, addr_b) = funded_account(&ledger, 10);

        for _ in 0..4 {
            ledger.credit_address(&addr_a, 1).unwrap();
            ledger.credit_address(&addr_b, 1).unwrap();
        }

        let all_a = ledger.account_transactions(a.id, 50, 0).unwrap();
        assert_eq!(all_a.len(), 5);
        assert!(all_a.iter().all(|tx| tx.involves(a.id)));

        let page = ledger.account_transactions(a.id, 2, 2).unwrap();
        assert_eq!(page, all_a[2..4].to_vec());
        assert!(ledger.account_transactions(b.id, 2, 5).unwrap().is_empty());

        let err = ledger
            .account_transactions(AccountId::new(1), 10, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_transaction_lookup() {
        let ledger = create_test_ledger();
        let reservation = ledger.reserve_transaction_id();

        let err = ledger.transaction(reservation).unwrap_err();
        assert_eq!(err, LedgerError::TransactionNotFound(reservation));
    }

    #[test]
    fn test_hooks_through_ledger() {
        let ledger = create_test_ledger();

        ledger.create_hook("https://example.com/a").unwrap();
        assert_eq!(
            ledger.create_hook("https://example.com/a").unwrap_err().kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ledger.hooks(), vec!["https://example.com/a".to_string()]);

        assert!(ledger.delete_hook("https://example.com/a"));
        assert!(!ledger.delete_hook("https://example.com/a"));
        assert!(ledger.hooks().is_empty());
    }

    #[test]
    fn test_fee_schedule() {
        let ledger = create_test_ledger();
        let fees = ledger.fees();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].fee_per_byte, 100);
        assert_eq!(fees[0].block_height, 451_000);
    }

    #[test]
    fn test_networks_are_independent() {
        let generator: Arc<dyn AddressGenerator> = Arc::new(HashedAddressGenerator::new());
        let mainnet = Ledger::new(Network::MainNet, generator.clone(), LedgerConfig::default());
        let testnet = Ledger::new(Network::TestNet3, generator, LedgerConfig::default());

        let account = mainnet.create_account();
        let address = mainnet.create_address(account.id).unwrap();

        assert!(testnet.account(account.id).is_err());
        assert!(testnet.credit_address(&address, 10).unwrap().is_none());
        assert_eq!(testnet.account_count(), 1);
    }

    #[test]
    fn test_concurrent_transfers_conserve_value() {
        let ledger = Arc::new(create_test_ledger());
        let (a, _) = funded_account(&ledger, 10_000);
        let (b, _) = funded_account(&ledger, 10_000);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let reservation = ledger.reserve_transaction_id();
                        let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
                        let _ = ledger.transfer(reservation, from, to, 7);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let a_balance = ledger.account(a.id).unwrap().balance;
        let b_balance = ledger.account(b.id).unwrap().balance;
        assert_eq!(a_balance + b_balance, 20_000);
        assert!(a_balance >= 0 && b_balance >= 0);
        assert!(ledger.verify_integrity());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Credit { account: usize, value: Amount },
        Transfer { from: usize, to: usize, value: Amount },
        Debit { from: usize, value: Amount },
    }

    fn op_strategy(accounts: usize) -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..accounts, -10i64..5_000).prop_map(|(account, value)| Op::Credit { account, value }),
            (0..accounts, 0..accounts, -10i64..5_000)
                .prop_map(|(from, to, value)| Op::Transfer { from, to, value }),
            (0..accounts, -10i64..5_000).prop_map(|(from, value)| Op::Debit { from, value }),
        ]
    }

    proptest! {
        #[test]
        fn prop_random_operations_conserve_value(ops in prop::collection::vec(op_strategy(4), 1..60)) {
            let ledger = create_test_ledger();
            let accounts: Vec<(AccountId, Address)> = (0..4)
                .map(|_| {
                    let account = ledger.create_account();
                    let address = ledger.create_address(account.id).unwrap();
                    (account.id, address)
                })
                .collect();

            for op in ops {
                match op {
                    Op::Credit { account, value } => {
                        let _ = ledger.credit_address(&accounts[account].1, value);
                    }
                    Op::Transfer { from, to, value } => {
                        let before_from = ledger.account(accounts[from].0).unwrap().balance;
                        let before_to = ledger.account(accounts[to].0).unwrap().balance;
                        let reservation = ledger.reserve_transaction_id();
                        let result = ledger.transfer(reservation, accounts[from].0, accounts[to].0, value);
                        let after_from = ledger.account(accounts[from].0).unwrap().balance;
                        let after_to = ledger.account(accounts[to].0).unwrap().balance;

                        if from == to {
                            prop_assert_eq!(after_from, before_from);
                        } else {
                            prop_assert_eq!(after_from + after_to, before_from + before_to);
                            if result.is_ok() {
                                prop_assert_eq!(after_from, before_from - value);
                                prop_assert_eq!(after_to, before_to + value);
                            } else {
                                prop_assert_eq!(after_from, before_from);
                                prop_assert_eq!(after_to, before_to);
                            }
                        }
                    }
                    Op::Debit { from, value } => {
                        let reservation = ledger.reserve_transaction_id();
                        let _ = ledger.debit(reservation, accounts[from].0, &Address::new("ext"), value);
                    }
                }
                prop_assert!(ledger.verify_integrity());
            }
        }
    }
}
