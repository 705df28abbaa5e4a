#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use desk_core::{
    account::{Account, AccountStatus, BankProfile, LockUpdate, NewAccount},
    audit::{AuditEntry, AuditSink, NewAuditEntry},
    authorization::Actor,
    clock::DeskClock,
    config::DeskConfig,
    engine::{DeskBackend, RequestEngine},
    error::{DeskError, DeskResult},
    notification::{NewNotification, Notification, NotificationSink},
    request::{FundRequest, NewFundRequest, RequestFilter, Resolution},
    store::{AccountStore, DeskStore, RequestStore, UnitOfWork},
    types::{AccountId, ActorId, Amount, NotificationId, RequestId},
};
use std::cell::Cell;

// ── Helpers ──────────────────────────────────────────────────────────────────

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub fn memory_store() -> DeskStore {
    let store = DeskStore::in_memory().expect("in-memory store");
    store.migrate().expect("migrate");
    store
}

pub fn make_engine() -> RequestEngine<DeskStore> {
    init_logging();
    RequestEngine::new(memory_store(), DeskConfig::default_test()).with_clock(DeskClock::Fixed(t0()))
}

pub fn make_faulty_engine() -> RequestEngine<FaultyStore> {
    init_logging();
    RequestEngine::new(FaultyStore::new(memory_store()), DeskConfig::default_test())
        .with_clock(DeskClock::Fixed(t0()))
}

pub fn admin() -> Actor {
    Actor::administrator(9001, "Desk Admin")
}

pub fn agent(id: ActorId) -> Actor {
    Actor::agent(id, format!("Agent {id}"))
}

pub fn bank() -> BankProfile {
    BankProfile {
        bank_name: "BCA".into(),
        account_number: "0123456789".into(),
        account_name: "Sari Wulandari".into(),
    }
}

/// Register, activate and fund an account through the engine, so the
/// starting balance is backed by an approved deposit.
pub fn open_account<S: DeskBackend>(
    engine: &RequestEngine<S>,
    owner: Option<ActorId>,
    balance: Amount,
) -> Account {
    let account = engine
        .register_account(
            &NewAccount {
                name: "Sari Wulandari".into(),
                owner_agent_id: owner,
                bank: Some(bank()),
            },
            None,
        )
        .expect("register");
    engine
        .activate_account(account.account_id, &admin())
        .expect("activate");
    if balance > 0 {
        let deposit = engine
            .create_deposit(account.account_id, balance, Some("opening"), &admin())
            .expect("opening deposit");
        engine
            .approve_request(deposit.request_id, &admin())
            .expect("approve opening deposit");
    }
    engine.account(account.account_id).expect("reload")
}

pub fn balance_of<S: DeskBackend>(engine: &RequestEngine<S>, account_id: AccountId) -> Amount {
    engine.account(account_id).expect("account").balance
}

pub fn notification_titles<S: DeskBackend>(
    engine: &RequestEngine<S>,
    account_id: AccountId,
) -> Vec<String> {
    engine
        .store
        .notifications_for(account_id)
        .expect("notifications")
        .into_iter()
        .map(|n| n.title)
        .collect()
}

// ── Fault injection ──────────────────────────────────────────────────────────

/// Wraps a real store and fails selected writes on demand.
pub struct FaultyStore {
    pub inner: DeskStore,
    pub fail_request_insert: Cell<bool>,
    pub fail_credit: Cell<bool>,
    pub fail_notifications: Cell<bool>,
    pub fail_audit: Cell<bool>,
    /// Committed straight after the next account read, outside any unit,
    /// so the caller is left holding a stale snapshot.
    pub lock_after_next_read: Cell<Option<LockUpdate>>,
}

impl FaultyStore {
    pub fn new(inner: DeskStore) -> Self {
        Self {
            inner,
            fail_request_insert: Cell::new(false),
            fail_credit: Cell::new(false),
            fail_notifications: Cell::new(false),
            fail_audit: Cell::new(false),
            lock_after_next_read: Cell::new(None),
        }
    }
}

fn injected(what: &str) -> DeskError {
    DeskError::Other(anyhow::anyhow!("injected failure: {what}"))
}

impl AccountStore for FaultyStore {
    fn create_account(&self, new: &NewAccount, at: DateTime<Utc>) -> DeskResult<Account> {
        self.inner.create_account(new, at)
    }
    fn get_account(&self, account_id: AccountId) -> DeskResult<Account> {
        let account = self.inner.get_account(account_id)?;
        if let Some(update) = self.lock_after_next_read.take() {
            self.inner.set_locks(account_id, &update, Utc::now())?;
        }
        Ok(account)
    }
    fn find_account(&self, account_id: AccountId) -> DeskResult<Option<Account>> {
        self.inner.find_account(account_id)
    }
    fn list_accounts(&self) -> DeskResult<Vec<Account>> {
        self.inner.list_accounts()
    }
    fn accounts_owned_by(&self, agent_id: ActorId) -> DeskResult<Vec<Account>> {
        self.inner.accounts_owned_by(agent_id)
    }
    fn mutate_balance(
        &self,
        account_id: AccountId,
        delta: Amount,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        if delta > 0 && self.fail_credit.get() {
            return Err(injected("credit"));
        }
        self.inner.mutate_balance(account_id, delta, at)
    }
    fn set_locks(
        &self,
        account_id: AccountId,
        update: &LockUpdate,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        self.inner.set_locks(account_id, update, at)
    }
    fn set_status(
        &self,
        account_id: AccountId,
        status: AccountStatus,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        self.inner.set_status(account_id, status, at)
    }
    fn assign_agent(
        &self,
        account_id: AccountId,
        agent_id: Option<ActorId>,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        self.inner.assign_agent(account_id, agent_id, at)
    }
    fn update_bank_profile(
        &self,
        account_id: AccountId,
        bank: &BankProfile,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        self.inner.update_bank_profile(account_id, bank, at)
    }
    fn delete_account(&self, account_id: AccountId) -> DeskResult<()> {
        self.inner.delete_account(account_id)
    }
}

impl RequestStore for FaultyStore {
    fn insert_request(&self, new: &NewFundRequest) -> DeskResult<FundRequest> {
        if self.fail_request_insert.get() {
            return Err(injected("request insert"));
        }
        self.inner.insert_request(new)
    }
    fn get_request(&self, request_id: RequestId) -> DeskResult<FundRequest> {
        self.inner.get_request(request_id)
    }
    fn pending_withdrawal_for(&self, account_id: AccountId) -> DeskResult<Option<FundRequest>> {
        self.inner.pending_withdrawal_for(account_id)
    }
    fn resolve_request(
        &self,
        request_id: RequestId,
        resolution: &Resolution,
    ) -> DeskResult<FundRequest> {
        self.inner.resolve_request(request_id, resolution)
    }
    fn requests_for_accounts(
        &self,
        account_ids: &[AccountId],
        filter: &RequestFilter,
    ) -> DeskResult<Vec<FundRequest>> {
        self.inner.requests_for_accounts(account_ids, filter)
    }
    fn all_requests(&self, filter: &RequestFilter) -> DeskResult<Vec<FundRequest>> {
        self.inner.all_requests(filter)
    }
}

impl NotificationSink for FaultyStore {
    fn push_notification(&self, notification: &NewNotification) -> DeskResult<Notification> {
        if self.fail_notifications.get() {
            return Err(injected("notification"));
        }
        self.inner.push_notification(notification)
    }
    fn notifications_for(&self, account_id: AccountId) -> DeskResult<Vec<Notification>> {
        self.inner.notifications_for(account_id)
    }
    fn unread_count(&self, account_id: AccountId) -> DeskResult<i64> {
        self.inner.unread_count(account_id)
    }
    fn mark_read(&self, notification_id: NotificationId) -> DeskResult<()> {
        self.inner.mark_read(notification_id)
    }
    fn mark_all_read(&self, account_id: AccountId) -> DeskResult<usize> {
        self.inner.mark_all_read(account_id)
    }
}

impl AuditSink for FaultyStore {
    fn append_audit(&self, entry: &NewAuditEntry) -> DeskResult<AuditEntry> {
        if self.fail_audit.get() {
            return Err(injected("audit"));
        }
        self.inner.append_audit(entry)
    }
    fn audit_for_account(&self, account_id: AccountId) -> DeskResult<Vec<AuditEntry>> {
        self.inner.audit_for_account(account_id)
    }
    fn recent_audit(&self, limit: usize) -> DeskResult<Vec<AuditEntry>> {
        self.inner.recent_audit(limit)
    }
}

impl UnitOfWork for FaultyStore {
    fn atomically<T, F>(&self, work: F) -> DeskResult<T>
    where
        F: FnOnce(&Self) -> DeskResult<T>,
    {
        // Same connection, so the wrapper's writes join the inner transaction.
        self.inner.atomically(|_| work(self))
    }
}
