//! Customer account records and their status/lock state.

use crate::types::{AccountId, ActorId, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Pending,
    Active,
    Suspended,
    Rejected,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Administrative status moves. Rejected is terminal.
    pub fn can_become(&self, next: AccountStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Rejected)
                | (Self::Active, Self::Suspended)
                | (Self::Suspended, Self::Active)
        )
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination bank details. Copied onto each withdrawal at creation so later
/// profile edits never rewrite where an outstanding withdrawal goes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BankProfile {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub account_id: AccountId,
    pub name: String,
    pub balance: Amount,
    pub status: AccountStatus,
    pub deposit_locked: bool,
    pub deposit_lock_reason: Option<String>,
    pub withdrawal_locked: bool,
    pub withdrawal_lock_reason: Option<String>,
    pub owner_agent_id: Option<ActorId>,
    pub bank: Option<BankProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Fields supplied at registration. Balance and status are not caller-chosen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub owner_agent_id: Option<ActorId>,
    pub bank: Option<BankProfile>,
}

/// Partial lock update; `None` leaves a flag as it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockUpdate {
    pub deposit_locked: Option<bool>,
    pub deposit_reason: Option<String>,
    pub withdrawal_locked: Option<bool>,
    pub withdrawal_reason: Option<String>,
}

impl LockUpdate {
    pub fn lock_withdrawal(reason: &str) -> Self {
        Self {
            withdrawal_locked: Some(true),
            withdrawal_reason: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn unlock_withdrawal() -> Self {
        Self {
            withdrawal_locked: Some(false),
            ..Self::default()
        }
    }

    pub fn lock_deposit(reason: &str) -> Self {
        Self {
            deposit_locked: Some(true),
            deposit_reason: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn unlock_deposit() -> Self {
        Self {
            deposit_locked: Some(false),
            ..Self::default()
        }
    }
}
