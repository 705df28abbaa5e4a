//! Deposit and withdrawal requests.
//!
//! A request starts `pending` and moves exactly once to `approved` or
//! `rejected`. It is never re-opened.

use crate::{
    account::BankProfile,
    types::{AccountId, ActorId, Amount, RequestId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Deposit,
    Withdrawal,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(Self::Deposit),
            "withdrawal" => Some(Self::Withdrawal),
            _ => None,
        }
    }

    /// Capitalised label for notification titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundRequest {
    pub request_id: RequestId,
    pub account_id: AccountId,
    pub kind: RequestKind,
    pub amount: Amount,
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
    pub processed_by: Option<ActorId>,
    pub processed_at: Option<DateTime<Utc>>,
    /// Withdrawals only.
    pub destination: Option<BankProfile>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFundRequest {
    pub account_id: AccountId,
    pub kind: RequestKind,
    pub amount: Amount,
    pub destination: Option<BankProfile>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The single move out of `pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub status: RequestStatus,
    pub processed_by: ActorId,
    pub processed_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

impl Resolution {
    pub fn approve(processed_by: ActorId, processed_at: DateTime<Utc>) -> Self {
        Self {
            status: RequestStatus::Approved,
            processed_by,
            processed_at,
            rejection_reason: None,
        }
    }

    pub fn reject(processed_by: ActorId, processed_at: DateTime<Utc>, reason: &str) -> Self {
        Self {
            status: RequestStatus::Rejected,
            processed_by,
            processed_at,
            rejection_reason: Some(reason.to_string()),
        }
    }
}

/// Optional filters for request listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestFilter {
    pub kind: Option<RequestKind>,
    pub status: Option<RequestStatus>,
}
