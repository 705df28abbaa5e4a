//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The engine calls the store traits below; it never executes SQL directly.
//!
//! Per-account serialization lives here, not in the engine: balances move
//! through one conditional `UPDATE ... SET balance = balance + ?`, request
//! status moves through a compare-and-set on `status = 'pending'`, and
//! multi-step units run inside `BEGIN IMMEDIATE`.

use crate::{
    account::{Account, AccountStatus, BankProfile, LockUpdate, NewAccount},
    audit::AuditAction,
    authorization::Role,
    config::DeskConfig,
    error::DeskResult,
    notification::Severity,
    request::{FundRequest, NewFundRequest, RequestFilter, RequestKind, RequestStatus, Resolution},
    types::{AccountId, ActorId, Amount, RequestId},
};
use chrono::{DateTime, Utc};
use rusqlite::{
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
    Connection, OpenFlags, Transaction, TransactionBehavior,
};
use std::time::Duration;

mod account;
mod audit;
mod notification;
mod request;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub struct DeskStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
    busy_timeout_ms: u64,
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    pub fn from_config(config: &DeskConfig) -> DeskResult<Self> {
        if config.database_path == ":memory:" {
            return Self::in_memory();
        }
        Self::open_with_timeout(&config.database_path, config.busy_timeout_ms)
    }

    pub fn open_with_timeout(path: &str, busy_timeout_ms: u64) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
            busy_timeout_ms,
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        })
    }

    /// Open a second connection to the same database, one per worker.
    /// For in-memory databases this returns a new, isolated database.
    pub fn reopen(&self) -> DeskResult<Self> {
        match &self.path {
            Some(p) => Self::open_with_timeout(p, self.busy_timeout_ms),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order. Safe to run more than once.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_accounts.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_fund_requests.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_notifications_audit.sql"))?;
        Ok(())
    }
}

// ── Store contracts ────────────────────────────────────────────

/// Exclusive owner of account rows.
pub trait AccountStore {
    /// New accounts start `pending` with a zero balance.
    fn create_account(&self, new: &NewAccount, at: DateTime<Utc>) -> DeskResult<Account>;

    fn get_account(&self, account_id: AccountId) -> DeskResult<Account>;

    fn find_account(&self, account_id: AccountId) -> DeskResult<Option<Account>>;

    fn list_accounts(&self) -> DeskResult<Vec<Account>>;

    fn accounts_owned_by(&self, agent_id: ActorId) -> DeskResult<Vec<Account>>;

    /// `balance += delta`, atomically. Fails with `InsufficientFunds` instead
    /// of going negative and leaves the row untouched in that case.
    fn mutate_balance(
        &self,
        account_id: AccountId,
        delta: Amount,
        at: DateTime<Utc>,
    ) -> DeskResult<Account>;

    fn set_locks(
        &self,
        account_id: AccountId,
        update: &LockUpdate,
        at: DateTime<Utc>,
    ) -> DeskResult<Account>;

    fn set_status(
        &self,
        account_id: AccountId,
        status: AccountStatus,
        at: DateTime<Utc>,
    ) -> DeskResult<Account>;

    fn assign_agent(
        &self,
        account_id: AccountId,
        agent_id: Option<ActorId>,
        at: DateTime<Utc>,
    ) -> DeskResult<Account>;

    fn update_bank_profile(
        &self,
        account_id: AccountId,
        bank: &BankProfile,
        at: DateTime<Utc>,
    ) -> DeskResult<Account>;

    /// Cascades to the account's requests and notifications.
    fn delete_account(&self, account_id: AccountId) -> DeskResult<()>;
}

/// Exclusive owner of fund request rows.
pub trait RequestStore {
    /// A second pending withdrawal for the same account fails with
    /// `DuplicatePending`.
    fn insert_request(&self, new: &NewFundRequest) -> DeskResult<FundRequest>;

    fn get_request(&self, request_id: RequestId) -> DeskResult<FundRequest>;

    fn pending_withdrawal_for(&self, account_id: AccountId) -> DeskResult<Option<FundRequest>>;

    /// Moves a pending request to its terminal status. A request that is no
    /// longer pending fails with `AlreadyProcessed`, even under a race.
    fn resolve_request(
        &self,
        request_id: RequestId,
        resolution: &Resolution,
    ) -> DeskResult<FundRequest>;

    /// Newest first. Callers scope `account_ids` by ownership beforehand.
    fn requests_for_accounts(
        &self,
        account_ids: &[AccountId],
        filter: &RequestFilter,
    ) -> DeskResult<Vec<FundRequest>>;

    /// Newest first.
    fn all_requests(&self, filter: &RequestFilter) -> DeskResult<Vec<FundRequest>>;
}

/// All-or-nothing execution of several store writes.
pub trait UnitOfWork {
    fn atomically<T, F>(&self, work: F) -> DeskResult<T>
    where
        F: FnOnce(&Self) -> DeskResult<T>;
}

impl UnitOfWork for DeskStore {
    fn atomically<T, F>(&self, work: F) -> DeskResult<T>
    where
        F: FnOnce(&Self) -> DeskResult<T>,
    {
        // IMMEDIATE takes the write lock up front so two workers never both
        // read a pending row and then race to write it.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        // Dropping `tx` on the error path rolls back.
        let out = work(self)?;
        tx.commit()?;
        Ok(out)
    }
}

// ── Text-backed enum columns ───────────────────────────────────

macro_rules! text_column {
    ($($ty:ty),+ $(,)?) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()
                    .and_then(|s| <$ty>::parse(s).ok_or(FromSqlError::InvalidType))
            }
        }
    )+};
}

text_column!(
    AccountStatus,
    RequestKind,
    RequestStatus,
    Severity,
    Role,
    AuditAction,
);

/// Rebuild an optional bank profile from three nullable columns.
fn bank_profile(
    bank_name: Option<String>,
    account_number: Option<String>,
    account_name: Option<String>,
) -> Option<BankProfile> {
    bank_name.map(|bank_name| BankProfile {
        bank_name,
        account_number: account_number.unwrap_or_default(),
        account_name: account_name.unwrap_or_default(),
    })
}
