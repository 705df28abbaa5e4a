use crate::types::{AccountId, ActorId, Amount, RequestId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Request {request_id} is already {status}")]
    AlreadyProcessed { request_id: RequestId, status: String },

    #[error("Actor {actor_id} ({role}) may not operate on account {account_id:?}")]
    Forbidden {
        actor_id: ActorId,
        role: String,
        account_id: Option<AccountId>,
    },

    #[error("Insufficient funds on account {account_id}: requested {requested}, available {available}")]
    InsufficientFunds {
        account_id: AccountId,
        requested: Amount,
        available: Amount,
    },

    #[error("Account {account_id} already has a pending withdrawal")]
    DuplicatePending {
        account_id: AccountId,
        request_id: Option<RequestId>,
    },

    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Amount),

    #[error("Account {account_id} is {status}, not active")]
    AccountInactive { account_id: AccountId, status: String },

    #[error("Account {account_id} has {capability} locked: {reason}")]
    Locked {
        account_id: AccountId,
        capability: &'static str,
        reason: String,
    },

    #[error("Account {account_id} has no destination bank details")]
    MissingBankDetails { account_id: AccountId },

    #[error("A rejection reason is required")]
    ReasonRequired,

    #[error("Account {account_id} cannot move from {from} to {to}")]
    InvalidTransition {
        account_id: AccountId,
        from: String,
        to: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    pub fn account_not_found(id: AccountId) -> Self {
        Self::NotFound { entity: "account", id }
    }

    pub fn request_not_found(id: RequestId) -> Self {
        Self::NotFound { entity: "request", id }
    }

    /// Stable code for the request layer. Never renamed once published.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "database_error",
            Self::Serialization(_) => "serialization_error",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyProcessed { .. } => "already_processed",
            Self::Forbidden { .. } => "forbidden",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::DuplicatePending { .. } => "duplicate_pending",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::AccountInactive { .. } => "account_inactive",
            Self::Locked { .. } => "locked",
            Self::MissingBankDetails { .. } => "missing_bank_details",
            Self::ReasonRequired => "reason_required",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Other(_) => "internal_error",
        }
    }

    /// True for errors the end user can fix by changing their input.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::DuplicatePending { .. }
                | Self::InvalidAmount(_)
                | Self::MissingBankDetails { .. }
                | Self::ReasonRequired
        )
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
