//! User-facing notifications, one stream per account.

use crate::{
    error::DeskResult,
    types::{AccountId, NotificationId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "success" => Some(Self::Success),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub notification_id: NotificationId,
    pub account_id: AccountId,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub account_id: AccountId,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn new(
        account_id: AccountId,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            title: title.into(),
            message: message.into(),
            severity,
            created_at,
        }
    }
}

/// Append-only notification log. The engine treats writes as best-effort.
pub trait NotificationSink {
    fn push_notification(&self, notification: &NewNotification) -> DeskResult<Notification>;

    /// Newest first.
    fn notifications_for(&self, account_id: AccountId) -> DeskResult<Vec<Notification>>;

    fn unread_count(&self, account_id: AccountId) -> DeskResult<i64>;

    fn mark_read(&self, notification_id: NotificationId) -> DeskResult<()>;

    /// Returns how many rows flipped.
    fn mark_all_read(&self, account_id: AccountId) -> DeskResult<usize>;
}
