//! Common test utilities
//!
//! A fixed-rate scripted rate source and a fully wired application over
//! the in-memory stores, so the whole stack runs without a database or a
//! live rate service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use money_transfer::api::AppState;
use money_transfer::domain::{Account, Balance, TransactionRecord, User};
use money_transfer::engine::TransferEngine;
use money_transfer::rates::{CurrencyConverter, RateError, RateSource, RetryPolicy};
use money_transfer::service::{AccountService, UserFields, UserService};
use money_transfer::store::{
    AccountStore, InMemoryAccountStore, InMemoryTransactionLog, InMemoryUserStore, StoreError,
    TransactionLog, UserStore,
};

/// Rate source backed by a fixed rate table.
///
/// Failures can be queued with [`FixedRates::fail_next`]; they are played
/// back in order before the table answers again. Every call is counted,
/// including failed ones.
pub struct FixedRates {
    rates: HashMap<(String, String), Decimal>,
    failures: Mutex<Vec<RateError>>,
    calls: AtomicU32,
}

impl FixedRates {
    pub fn new() -> Self {
        let mut rates = HashMap::new();
        rates.insert(("USD".to_string(), "EUR".to_string()), dec!(0.90));
        rates.insert(("EUR".to_string(), "USD".to_string()), Decimal::ONE / dec!(0.90));
        rates.insert(("USD".to_string(), "GBP".to_string()), dec!(0.80));
        rates.insert(("GBP".to_string(), "USD".to_string()), Decimal::ONE / dec!(0.80));
        Self {
            rates,
            failures: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Queue errors to be returned by the next calls, in order.
    pub fn fail_next(&self, errors: Vec<RateError>) {
        self.failures.lock().unwrap().extend(errors);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_failure(&self) -> Option<RateError> {
        let mut failures = self.failures.lock().unwrap();
        if failures.is_empty() {
            None
        } else {
            Some(failures.remove(0))
        }
    }
}

#[async_trait]
impl RateSource for FixedRates {
    async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.next_failure() {
            return Err(err);
        }
        let rate = self
            .rates
            .get(&(from.to_string(), to.to_string()))
            .ok_or(RateError::Rejected { status: 400 })?;
        Ok(amount * rate)
    }

    async fn supported_currencies(&self) -> Result<HashMap<String, String>, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.next_failure() {
            return Err(err);
        }
        Ok(HashMap::from([
            ("USD".to_string(), "United States dollar".to_string()),
            ("EUR".to_string(), "Euro".to_string()),
            ("GBP".to_string(), "Pound sterling".to_string()),
        ]))
    }
}

/// Account store wrapper that can be told to fail saves for an account.
/// Used to exercise compensation paths in the engine.
pub struct FlakyAccountStore {
    inner: Arc<InMemoryAccountStore>,
    // account id -> number of saves still allowed before failing
    fail_saves: Mutex<HashMap<Uuid, u32>>,
}

impl FlakyAccountStore {
    pub fn new(inner: Arc<InMemoryAccountStore>) -> Self {
        Self {
            inner,
            fail_saves: Mutex::new(HashMap::new()),
        }
    }

    /// Fail every save of this account from now on.
    pub fn fail_saves_for(&self, id: Uuid) {
        self.fail_saves.lock().unwrap().insert(id, 0);
    }

    /// Allow `allowed` more saves of this account, then fail.
    pub fn fail_saves_for_after(&self, id: Uuid, allowed: u32) {
        self.fail_saves.lock().unwrap().insert(id, allowed);
    }
}

#[async_trait]
impl AccountStore for FlakyAccountStore {
    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.inner.get(id).await
    }

    async fn save(&self, account: &Account) -> Result<Account, StoreError> {
        if let Some(allowed) = self.fail_saves.lock().unwrap().get_mut(&account.id) {
            if *allowed == 0 {
                return Err(StoreError::Corrupt("injected save failure".to_string()));
            }
            *allowed -= 1;
        }
        self.inner.save(account).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StoreError> {
        self.inner.find_by_owner(owner_id).await
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        self.inner.list().await
    }
}

/// Transaction log wrapper that can be told to fail a number of appends.
pub struct FlakyTransactionLog {
    inner: Arc<InMemoryTransactionLog>,
    fail_appends: AtomicU32,
}

impl FlakyTransactionLog {
    pub fn new(inner: Arc<InMemoryTransactionLog>) -> Self {
        Self {
            inner,
            fail_appends: AtomicU32::new(0),
        }
    }

    pub fn fail_next_appends(&self, count: u32) {
        self.fail_appends.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionLog for FlakyTransactionLog {
    async fn append(&self, record: &TransactionRecord) -> Result<TransactionRecord, StoreError> {
        let remaining = self.fail_appends.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_appends.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Corrupt("injected append failure".to_string()));
        }
        self.inner.append(record).await
    }

    async fn find_by_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        self.inner.find_by_account(account_id).await
    }
}

/// A fully wired application over in-memory stores.
pub struct TestApp {
    pub accounts: Arc<InMemoryAccountStore>,
    pub users: Arc<InMemoryUserStore>,
    pub log: Arc<InMemoryTransactionLog>,
    pub rates: Arc<FixedRates>,
    pub engine: TransferEngine,
    pub account_service: AccountService,
    pub user_service: UserService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let log = Arc::new(InMemoryTransactionLog::new());
        let rates = Arc::new(FixedRates::new());

        let converter = CurrencyConverter::new(rates.clone(), policy);
        let engine = TransferEngine::new(accounts.clone(), log.clone(), converter.clone());
        let account_service = AccountService::new(
            accounts.clone(),
            users.clone(),
            log.clone(),
            engine.clone(),
            converter,
        );
        let user_service = UserService::new(users.clone(), accounts.clone(), account_service.clone());

        Self {
            accounts,
            users,
            log,
            rates,
            engine,
            account_service,
            user_service,
        }
    }

    /// Save a user directly, bypassing validation.
    pub async fn seed_user(&self) -> User {
        let fields = sample_user_fields();
        let user = User::new(
            fields.last_name,
            fields.first_name,
            fields.patronymic_name,
            fields.birth_date,
            fields.email,
            fields.phone_number,
        );
        self.users.save(&user).await.unwrap()
    }

    /// Save an account with the given currency and balance directly.
    pub async fn seed_account(&self, currency: &str, balance: Decimal) -> Account {
        let user = self.seed_user().await;
        let account = Account::new(user.id, currency.to_string())
            .with_balance(Balance::new(balance).unwrap());
        self.accounts.save(&account).await.unwrap()
    }

    /// Current balance of an account.
    pub async fn balance_of(&self, id: Uuid) -> Decimal {
        self.accounts
            .get(id)
            .await
            .unwrap()
            .expect("account missing")
            .balance
            .value()
    }

    pub fn state(&self) -> AppState {
        AppState {
            engine: self.engine.clone(),
            accounts: self.account_service.clone(),
            users: self.user_service.clone(),
        }
    }
}

pub fn sample_user_fields() -> UserFields {
    UserFields {
        last_name: "Petrov".to_string(),
        first_name: "Ivan".to_string(),
        patronymic_name: Some("Sergeevich".to_string()),
        birth_date: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        email: "ivan.petrov@example.com".to_string(),
        phone_number: "+7-915-1234567".to_string(),
    }
}
