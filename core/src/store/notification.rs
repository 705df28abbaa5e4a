use super::DeskStore;
use crate::{
    error::{DeskError, DeskResult},
    notification::{NewNotification, Notification, NotificationSink},
    types::{AccountId, NotificationId},
};
use rusqlite::{params, Row};

const NOTIFICATION_COLUMNS: &str =
    "notification_id, account_id, title, message, severity, is_read, created_at";

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        notification_id: row.get(0)?,
        account_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        severity: row.get(4)?,
        is_read: row.get::<_, i32>(5)? != 0,
        created_at: row.get(6)?,
    })
}

impl NotificationSink for DeskStore {
    // ── Notifications ─────────────────────────────────────────────

    fn push_notification(&self, n: &NewNotification) -> DeskResult<Notification> {
        let sql = format!(
            "INSERT INTO notification (account_id, title, message, severity, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)
             RETURNING {NOTIFICATION_COLUMNS}"
        );
        let notification = self.conn.query_row(
            &sql,
            params![n.account_id, n.title, n.message, n.severity, n.created_at],
            notification_from_row,
        )?;
        Ok(notification)
    }

    fn notifications_for(&self, account_id: AccountId) -> DeskResult<Vec<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notification
             WHERE account_id = ?1 ORDER BY notification_id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![account_id], notification_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn unread_count(&self, account_id: AccountId) -> DeskResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notification WHERE account_id = ?1 AND is_read = 0",
            params![account_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn mark_read(&self, notification_id: NotificationId) -> DeskResult<()> {
        let updated = self.conn.execute(
            "UPDATE notification SET is_read = 1 WHERE notification_id = ?1",
            params![notification_id],
        )?;
        if updated == 0 {
            return Err(DeskError::NotFound {
                entity: "notification",
                id: notification_id,
            });
        }
        Ok(())
    }

    fn mark_all_read(&self, account_id: AccountId) -> DeskResult<usize> {
        let updated = self.conn.execute(
            "UPDATE notification SET is_read = 1 WHERE account_id = ?1 AND is_read = 0",
            params![account_id],
        )?;
        Ok(updated)
    }
}
