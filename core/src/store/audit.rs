use super::DeskStore;
use crate::{
    audit::{AuditEntry, AuditSink, NewAuditEntry},
    error::DeskResult,
    types::AccountId,
};
use rusqlite::{params, Row};

const AUDIT_COLUMNS: &str =
    "audit_id, action, description, account_id, actor_id, actor_role, actor_name, created_at";

fn audit_from_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        audit_id: row.get(0)?,
        action: row.get(1)?,
        description: row.get(2)?,
        account_id: row.get(3)?,
        actor_id: row.get(4)?,
        actor_role: row.get(5)?,
        actor_name: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl AuditSink for DeskStore {
    // ── Audit log ─────────────────────────────────────────────────

    fn append_audit(&self, entry: &NewAuditEntry) -> DeskResult<AuditEntry> {
        let sql = format!(
            "INSERT INTO audit_log (
                action, description, account_id, actor_id, actor_role, actor_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {AUDIT_COLUMNS}"
        );
        let stored = self.conn.query_row(
            &sql,
            params![
                entry.action,
                entry.description,
                entry.account_id,
                entry.actor_id,
                entry.actor_role,
                entry.actor_name,
                entry.created_at,
            ],
            audit_from_row,
        )?;
        Ok(stored)
    }

    fn audit_for_account(&self, account_id: AccountId) -> DeskResult<Vec<AuditEntry>> {
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log
             WHERE account_id = ?1 ORDER BY audit_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![account_id], audit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn recent_audit(&self, limit: usize) -> DeskResult<Vec<AuditEntry>> {
        let sql = format!("SELECT {AUDIT_COLUMNS} FROM audit_log ORDER BY audit_id DESC LIMIT ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], audit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
