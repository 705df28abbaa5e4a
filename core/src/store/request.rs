use super::{bank_profile, DeskStore, RequestStore};
use crate::{
    error::{DeskError, DeskResult},
    request::{FundRequest, NewFundRequest, RequestFilter, RequestKind, Resolution},
    types::{AccountId, RequestId},
};
use rusqlite::{ffi, params, params_from_iter, types::Value, OptionalExtension, Row};

const REQUEST_COLUMNS: &str = "request_id, account_id, kind, amount, status,
    rejection_reason, processed_by, processed_at,
    dest_bank_name, dest_account_number, dest_account_name,
    note, created_at";

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<FundRequest> {
    Ok(FundRequest {
        request_id: row.get(0)?,
        account_id: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        status: row.get(4)?,
        rejection_reason: row.get(5)?,
        processed_by: row.get(6)?,
        processed_at: row.get(7)?,
        destination: bank_profile(row.get(8)?, row.get(9)?, row.get(10)?),
        note: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Append the optional kind/status filters to a WHERE clause.
fn push_filter(sql: &mut String, values: &mut Vec<Value>, filter: &RequestFilter) {
    if let Some(kind) = filter.kind {
        sql.push_str(" AND kind = ?");
        values.push(Value::Text(kind.as_str().to_string()));
    }
    if let Some(status) = filter.status {
        sql.push_str(" AND status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }
}

impl DeskStore {
    fn query_requests(&self, sql: &str, values: Vec<Value>) -> DeskResult<Vec<FundRequest>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values), request_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl RequestStore for DeskStore {
    // ── Fund requests ─────────────────────────────────────────────

    fn insert_request(&self, new: &NewFundRequest) -> DeskResult<FundRequest> {
        let dest = new.destination.as_ref();
        let sql = format!(
            "INSERT INTO fund_request (
                account_id, kind, amount, status,
                dest_bank_name, dest_account_number, dest_account_name,
                note, created_at
            ) VALUES (?1, ?2, ?3, 'pending', ?4, ?5, ?6, ?7, ?8)
            RETURNING {REQUEST_COLUMNS}"
        );
        let inserted = self.conn.query_row(
            &sql,
            params![
                new.account_id,
                new.kind,
                new.amount,
                dest.map(|d| d.bank_name.as_str()),
                dest.map(|d| d.account_number.as_str()),
                dest.map(|d| d.account_name.as_str()),
                new.note,
                new.created_at,
            ],
            request_from_row,
        );
        match inserted {
            Ok(request) => Ok(request),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    && new.kind == RequestKind::Withdrawal =>
            {
                let existing = self.pending_withdrawal_for(new.account_id)?;
                Err(DeskError::DuplicatePending {
                    account_id: new.account_id,
                    request_id: existing.map(|r| r.request_id),
                })
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Err(DeskError::account_not_found(new.account_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_request(&self, request_id: RequestId) -> DeskResult<FundRequest> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM fund_request WHERE request_id = ?1");
        self.conn
            .query_row(&sql, params![request_id], request_from_row)
            .optional()?
            .ok_or_else(|| DeskError::request_not_found(request_id))
    }

    fn pending_withdrawal_for(&self, account_id: AccountId) -> DeskResult<Option<FundRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM fund_request
             WHERE account_id = ?1 AND kind = 'withdrawal' AND status = 'pending'"
        );
        Ok(self
            .conn
            .query_row(&sql, params![account_id], request_from_row)
            .optional()?)
    }

    fn resolve_request(
        &self,
        request_id: RequestId,
        resolution: &Resolution,
    ) -> DeskResult<FundRequest> {
        let sql = format!(
            "UPDATE fund_request SET
                status = ?1, processed_by = ?2, processed_at = ?3, rejection_reason = ?4
             WHERE request_id = ?5 AND status = 'pending'
             RETURNING {REQUEST_COLUMNS}"
        );
        let resolved = self
            .conn
            .query_row(
                &sql,
                params![
                    resolution.status,
                    resolution.processed_by,
                    resolution.processed_at,
                    resolution.rejection_reason,
                    request_id,
                ],
                request_from_row,
            )
            .optional()?;
        match resolved {
            Some(request) => Ok(request),
            // Lost the compare-and-set: either the id is unknown or someone
            // else already moved it.
            None => {
                let current = self.get_request(request_id)?;
                Err(DeskError::AlreadyProcessed {
                    request_id,
                    status: current.status.to_string(),
                })
            }
        }
    }

    fn requests_for_accounts(
        &self,
        account_ids: &[AccountId],
        filter: &RequestFilter,
    ) -> DeskResult<Vec<FundRequest>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; account_ids.len()].join(", ");
        let mut sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM fund_request WHERE account_id IN ({placeholders})"
        );
        let mut values: Vec<Value> = account_ids.iter().map(|id| Value::Integer(*id)).collect();
        push_filter(&mut sql, &mut values, filter);
        sql.push_str(" ORDER BY request_id DESC");
        self.query_requests(&sql, values)
    }

    fn all_requests(&self, filter: &RequestFilter) -> DeskResult<Vec<FundRequest>> {
        let mut sql = format!("SELECT {REQUEST_COLUMNS} FROM fund_request WHERE 1 = 1");
        let mut values = Vec::new();
        push_filter(&mut sql, &mut values, filter);
        sql.push_str(" ORDER BY request_id DESC");
        self.query_requests(&sql, values)
    }
}
