//! Who may act on which account.
//!
//! Every mutating engine operation goes through this guard before it touches
//! a store. A refusal surfaces as `DeskError::Forbidden`.

use crate::{
    account::Account,
    error::{DeskError, DeskResult},
    store::AccountStore,
    types::{AccountId, ActorId},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Root,
    Administrator,
    Agent,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Administrator => "administrator",
            Self::Agent => "agent",
            Self::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "root" => Some(Self::Root),
            "administrator" | "admin" => Some(Self::Administrator),
            "agent" => Some(Self::Agent),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    pub fn is_staff_admin(&self) -> bool {
        matches!(self, Self::Root | Self::Administrator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity an inbound action carries. A customer's id is their
/// account id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
    pub name: String,
}

impl Actor {
    pub fn new(id: ActorId, role: Role, name: impl Into<String>) -> Self {
        Self { id, role, name: name.into() }
    }

    pub fn root(id: ActorId) -> Self {
        Self::new(id, Role::Root, "root")
    }

    pub fn administrator(id: ActorId, name: impl Into<String>) -> Self {
        Self::new(id, Role::Administrator, name)
    }

    pub fn agent(id: ActorId, name: impl Into<String>) -> Self {
        Self::new(id, Role::Agent, name)
    }

    pub fn customer(account: &Account) -> Self {
        Self::new(account.account_id, Role::Customer, account.name.clone())
    }
}

pub struct AuthorizationGuard;

impl AuthorizationGuard {
    /// Root/administrator: always. Agent: only accounts assigned to them.
    /// Customer: only their own account.
    pub fn permits(role: Role, actor_id: ActorId, account: &Account) -> bool {
        match role {
            Role::Root | Role::Administrator => true,
            Role::Agent => account.owner_agent_id == Some(actor_id),
            Role::Customer => account.account_id == actor_id,
        }
    }

    /// Store-backed form of [`permits`](Self::permits).
    pub fn can_operate<S: AccountStore + ?Sized>(
        store: &S,
        role: Role,
        actor_id: ActorId,
        account_id: AccountId,
    ) -> DeskResult<bool> {
        let account = store.get_account(account_id)?;
        Ok(Self::permits(role, actor_id, &account))
    }

    /// Approve/reject. Customers never review requests, not even their own.
    pub fn can_review(actor: &Actor, account: &Account) -> bool {
        actor.role != Role::Customer && Self::permits(actor.role, actor.id, account)
    }

    pub fn require_operate(actor: &Actor, account: &Account) -> DeskResult<()> {
        if Self::permits(actor.role, actor.id, account) {
            Ok(())
        } else {
            Err(Self::forbidden(actor, Some(account.account_id)))
        }
    }

    pub fn require_review(actor: &Actor, account: &Account) -> DeskResult<()> {
        if Self::can_review(actor, account) {
            Ok(())
        } else {
            Err(Self::forbidden(actor, Some(account.account_id)))
        }
    }

    /// Status changes, deletion and agent assignment.
    pub fn require_admin(actor: &Actor, account_id: Option<AccountId>) -> DeskResult<()> {
        if actor.role.is_staff_admin() {
            Ok(())
        } else {
            Err(Self::forbidden(actor, account_id))
        }
    }

    /// Account ids the actor may list. `None` means unrestricted.
    pub fn visible_accounts<S: AccountStore + ?Sized>(
        store: &S,
        actor: &Actor,
    ) -> DeskResult<Option<Vec<AccountId>>> {
        match actor.role {
            Role::Root | Role::Administrator => Ok(None),
            Role::Agent => Ok(Some(
                store
                    .accounts_owned_by(actor.id)?
                    .into_iter()
                    .map(|a| a.account_id)
                    .collect(),
            )),
            Role::Customer => Ok(Some(vec![actor.id])),
        }
    }

    fn forbidden(actor: &Actor, account_id: Option<AccountId>) -> DeskError {
        log::warn!(
            "denied {} {} on account {:?}",
            actor.role,
            actor.id,
            account_id
        );
        DeskError::Forbidden {
            actor_id: actor.id,
            role: actor.role.to_string(),
            account_id,
        }
    }
}
