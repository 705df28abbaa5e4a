//! Compliance trail: who did what to whom.

use crate::{
    authorization::{Actor, Role},
    error::DeskResult,
    types::{AccountId, ActorId, AuditId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every auditable action. Variants are append-only; the text form is
/// persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AccountRegistered,
    AccountStatusChanged,
    AccountDeleted,
    AgentAssigned,
    BankProfileUpdated,
    DepositRequested,
    DepositApproved,
    DepositRejected,
    WithdrawalRequested,
    WithdrawalApproved,
    WithdrawalRejected,
    WithdrawalLocked,
    WithdrawalUnlocked,
    DepositLocked,
    DepositUnlocked,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountRegistered => "account_registered",
            Self::AccountStatusChanged => "account_status_changed",
            Self::AccountDeleted => "account_deleted",
            Self::AgentAssigned => "agent_assigned",
            Self::BankProfileUpdated => "bank_profile_updated",
            Self::DepositRequested => "deposit_requested",
            Self::DepositApproved => "deposit_approved",
            Self::DepositRejected => "deposit_rejected",
            Self::WithdrawalRequested => "withdrawal_requested",
            Self::WithdrawalApproved => "withdrawal_approved",
            Self::WithdrawalRejected => "withdrawal_rejected",
            Self::WithdrawalLocked => "withdrawal_locked",
            Self::WithdrawalUnlocked => "withdrawal_unlocked",
            Self::DepositLocked => "deposit_locked",
            Self::DepositUnlocked => "deposit_unlocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let action = match s {
            "account_registered" => Self::AccountRegistered,
            "account_status_changed" => Self::AccountStatusChanged,
            "account_deleted" => Self::AccountDeleted,
            "agent_assigned" => Self::AgentAssigned,
            "bank_profile_updated" => Self::BankProfileUpdated,
            "deposit_requested" => Self::DepositRequested,
            "deposit_approved" => Self::DepositApproved,
            "deposit_rejected" => Self::DepositRejected,
            "withdrawal_requested" => Self::WithdrawalRequested,
            "withdrawal_approved" => Self::WithdrawalApproved,
            "withdrawal_rejected" => Self::WithdrawalRejected,
            "withdrawal_locked" => Self::WithdrawalLocked,
            "withdrawal_unlocked" => Self::WithdrawalUnlocked,
            "deposit_locked" => Self::DepositLocked,
            "deposit_unlocked" => Self::DepositUnlocked,
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub audit_id: AuditId,
    pub action: AuditAction,
    pub description: String,
    pub account_id: Option<AccountId>,
    pub actor_id: Option<ActorId>,
    pub actor_role: Option<Role>,
    pub actor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub description: String,
    pub account_id: Option<AccountId>,
    pub actor_id: Option<ActorId>,
    pub actor_role: Option<Role>,
    pub actor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn by(
        actor: &Actor,
        action: AuditAction,
        account_id: Option<AccountId>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            description: description.into(),
            account_id,
            actor_id: Some(actor.id),
            actor_role: Some(actor.role),
            actor_name: Some(actor.name.clone()),
            created_at,
        }
    }
}

/// Append-only audit log. Entries are never updated or deleted, and they
/// outlive the accounts they mention.
pub trait AuditSink {
    fn append_audit(&self, entry: &NewAuditEntry) -> DeskResult<AuditEntry>;

    /// Oldest first.
    fn audit_for_account(&self, account_id: AccountId) -> DeskResult<Vec<AuditEntry>>;

    /// Newest first.
    fn recent_audit(&self, limit: usize) -> DeskResult<Vec<AuditEntry>>;
}
