use super::{bank_profile, AccountStore, DeskStore};
use crate::{
    account::{Account, AccountStatus, BankProfile, LockUpdate, NewAccount},
    error::{DeskError, DeskResult},
    types::{AccountId, ActorId, Amount},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

const ACCOUNT_COLUMNS: &str = "account_id, name, balance, status,
    deposit_locked, deposit_lock_reason, withdrawal_locked, withdrawal_lock_reason,
    owner_agent_id, bank_name, bank_account_number, bank_account_name,
    created_at, updated_at";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        account_id: row.get(0)?,
        name: row.get(1)?,
        balance: row.get(2)?,
        status: row.get(3)?,
        deposit_locked: row.get::<_, i32>(4)? != 0,
        deposit_lock_reason: row.get(5)?,
        withdrawal_locked: row.get::<_, i32>(6)? != 0,
        withdrawal_lock_reason: row.get(7)?,
        owner_agent_id: row.get(8)?,
        bank: bank_profile(row.get(9)?, row.get(10)?, row.get(11)?),
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl DeskStore {
    /// Run an `UPDATE ... RETURNING` against one account row.
    fn update_account_returning(
        &self,
        account_id: AccountId,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> DeskResult<Account> {
        self.conn
            .query_row(sql, params, account_from_row)
            .optional()?
            .ok_or_else(|| DeskError::account_not_found(account_id))
    }
}

impl AccountStore for DeskStore {
    // ── Account ───────────────────────────────────────────────────

    fn create_account(&self, new: &NewAccount, at: DateTime<Utc>) -> DeskResult<Account> {
        let bank = new.bank.as_ref();
        let sql = format!(
            "INSERT INTO account (
                name, balance, status, owner_agent_id,
                bank_name, bank_account_number, bank_account_name,
                created_at, updated_at
            ) VALUES (?1, 0, 'pending', ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {ACCOUNT_COLUMNS}"
        );
        let account = self.conn.query_row(
            &sql,
            params![
                new.name,
                new.owner_agent_id,
                bank.map(|b| b.bank_name.as_str()),
                bank.map(|b| b.account_number.as_str()),
                bank.map(|b| b.account_name.as_str()),
                at,
            ],
            account_from_row,
        )?;
        log::debug!("account {} registered", account.account_id);
        Ok(account)
    }

    fn get_account(&self, account_id: AccountId) -> DeskResult<Account> {
        self.find_account(account_id)?
            .ok_or_else(|| DeskError::account_not_found(account_id))
    }

    fn find_account(&self, account_id: AccountId) -> DeskResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE account_id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![account_id], account_from_row)
            .optional()?)
    }

    fn list_accounts(&self) -> DeskResult<Vec<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account ORDER BY account_id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], account_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn accounts_owned_by(&self, agent_id: ActorId) -> DeskResult<Vec<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account
             WHERE owner_agent_id = ?1 ORDER BY account_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![agent_id], account_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn mutate_balance(
        &self,
        account_id: AccountId,
        delta: Amount,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        // Read-modify-write happens inside SQLite in one statement; two
        // workers can never overwrite each other's delta.
        let sql = format!(
            "UPDATE account SET balance = balance + ?1, updated_at = ?2
             WHERE account_id = ?3 AND balance + ?1 >= 0
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let updated = self
            .conn
            .query_row(&sql, params![delta, at, account_id], account_from_row)
            .optional()?;
        match updated {
            Some(account) => Ok(account),
            None => {
                let current = self.get_account(account_id)?;
                Err(DeskError::InsufficientFunds {
                    account_id,
                    requested: -delta,
                    available: current.balance,
                })
            }
        }
    }

    fn set_locks(
        &self,
        account_id: AccountId,
        update: &LockUpdate,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        // Unlocking clears the stored reason.
        let sql = format!(
            "UPDATE account SET
                deposit_locked = COALESCE(?1, deposit_locked),
                deposit_lock_reason = CASE
                    WHEN ?1 IS NULL THEN deposit_lock_reason
                    WHEN ?1 = 1 THEN ?2
                    ELSE NULL END,
                withdrawal_locked = COALESCE(?3, withdrawal_locked),
                withdrawal_lock_reason = CASE
                    WHEN ?3 IS NULL THEN withdrawal_lock_reason
                    WHEN ?3 = 1 THEN ?4
                    ELSE NULL END,
                updated_at = ?5
             WHERE account_id = ?6
             RETURNING {ACCOUNT_COLUMNS}"
        );
        self.update_account_returning(
            account_id,
            &sql,
            params![
                update.deposit_locked,
                update.deposit_reason,
                update.withdrawal_locked,
                update.withdrawal_reason,
                at,
                account_id,
            ],
        )
    }

    fn set_status(
        &self,
        account_id: AccountId,
        status: AccountStatus,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        let sql = format!(
            "UPDATE account SET status = ?1, updated_at = ?2
             WHERE account_id = ?3
             RETURNING {ACCOUNT_COLUMNS}"
        );
        self.update_account_returning(account_id, &sql, params![status, at, account_id])
    }

    fn assign_agent(
        &self,
        account_id: AccountId,
        agent_id: Option<ActorId>,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        let sql = format!(
            "UPDATE account SET owner_agent_id = ?1, updated_at = ?2
             WHERE account_id = ?3
             RETURNING {ACCOUNT_COLUMNS}"
        );
        self.update_account_returning(account_id, &sql, params![agent_id, at, account_id])
    }

    fn update_bank_profile(
        &self,
        account_id: AccountId,
        bank: &BankProfile,
        at: DateTime<Utc>,
    ) -> DeskResult<Account> {
        let sql = format!(
            "UPDATE account SET
                bank_name = ?1, bank_account_number = ?2, bank_account_name = ?3,
                updated_at = ?4
             WHERE account_id = ?5
             RETURNING {ACCOUNT_COLUMNS}"
        );
        self.update_account_returning(
            account_id,
            &sql,
            params![
                bank.bank_name,
                bank.account_number,
                bank.account_name,
                at,
                account_id
            ],
        )
    }

    fn delete_account(&self, account_id: AccountId) -> DeskResult<()> {
        let deleted = self.conn.execute(
            "DELETE FROM account WHERE account_id = ?1",
            params![account_id],
        )?;
        if deleted == 0 {
            return Err(DeskError::account_not_found(account_id));
        }
        Ok(())
    }
}
