//! The request lifecycle engine. Every fund movement passes through here.
//!
//! Inbound actions (create, approve, reject, lock) all run the same way:
//!   1. Load the request/account it targets.
//!   2. Ask the AuthorizationGuard. A refusal ends the action here.
//!   3. Validate (amount, status, locks, funds). Still no writes.
//!   4. Write status and balance. These must succeed before continuing.
//!   5. Emit notifications and audit entries. Best-effort: a failed write
//!      is logged and never undoes step 4.
//!
//! RULES:
//!   - Deposits credit the balance on approval, never before.
//!   - Withdrawals debit the balance at creation (the hold) and refund it on
//!     rejection. Approval does not touch the balance again.
//!   - At most one pending withdrawal per account. The lock, pending and
//!     funds checks and the hold all happen under the same write lock.
//!   - A request leaves `pending` exactly once. Approving or rejecting it a
//!     second time fails with `AlreadyProcessed`.
//!   - Only store/ executes SQL; the engine holds no state beyond the store.

use crate::{
    account::{Account, AccountStatus, BankProfile, LockUpdate, NewAccount},
    audit::{AuditAction, AuditEntry, AuditSink, NewAuditEntry},
    authorization::{Actor, AuthorizationGuard, Role},
    clock::DeskClock,
    config::DeskConfig,
    error::{DeskError, DeskResult},
    notification::{NewNotification, Notification, NotificationSink, Severity},
    request::{FundRequest, NewFundRequest, RequestFilter, RequestKind, Resolution},
    store::{AccountStore, RequestStore, UnitOfWork},
    types::{AccountId, ActorId, Amount, NotificationId, RequestId},
};

/// Everything the engine needs from persistence, in one bound.
pub trait DeskBackend:
    AccountStore + RequestStore + NotificationSink + AuditSink + UnitOfWork
{
}

impl<T> DeskBackend for T where
    T: AccountStore + RequestStore + NotificationSink + AuditSink + UnitOfWork
{
}

/// Which capability a lock applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capability {
    Deposit,
    Withdrawal,
}

impl Capability {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

pub struct RequestEngine<S: DeskBackend> {
    pub store: S,
    config: DeskConfig,
    clock: DeskClock,
}

impl<S: DeskBackend> RequestEngine<S> {
    pub fn new(store: S, config: DeskConfig) -> Self {
        Self {
            store,
            config,
            clock: DeskClock::System,
        }
    }

    pub fn with_clock(mut self, clock: DeskClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock_mut(&mut self) -> &mut DeskClock {
        &mut self.clock
    }

    // ── Account lifecycle ─────────────────────────────────────────

    /// Register a customer account: `pending`, zero balance. An agent
    /// registering a customer becomes its owner; self-registration passes
    /// no actor.
    pub fn register_account(
        &self,
        new: &NewAccount,
        actor: Option<&Actor>,
    ) -> DeskResult<Account> {
        let mut fields = new.clone();
        if let Some(actor) = actor {
            match actor.role {
                Role::Agent => fields.owner_agent_id = Some(actor.id),
                Role::Customer => {
                    return Err(DeskError::Forbidden {
                        actor_id: actor.id,
                        role: actor.role.to_string(),
                        account_id: None,
                    })
                }
                _ => {}
            }
        }
        let account = self.store.create_account(&fields, self.clock.now())?;
        log::info!("registered account {} ({})", account.account_id, account.name);

        self.notify(
            account.account_id,
            Severity::Info,
            "Registration received",
            "Your account is waiting for approval.",
        );
        self.audit(
            actor,
            AuditAction::AccountRegistered,
            Some(account.account_id),
            format!("Registered account {} for {}", account.account_id, account.name),
        );
        Ok(account)
    }

    pub fn activate_account(&self, account_id: AccountId, actor: &Actor) -> DeskResult<Account> {
        let account = self.store.get_account(account_id)?;
        AuthorizationGuard::require_review(actor, &account)?;
        // Suspended accounts come back through `reinstate_account` only.
        if account.status != AccountStatus::Pending {
            return Err(DeskError::InvalidTransition {
                account_id,
                from: account.status.to_string(),
                to: AccountStatus::Active.to_string(),
            });
        }
        self.change_status(account, AccountStatus::Active, actor, None)
    }

    pub fn reject_account(
        &self,
        account_id: AccountId,
        reason: &str,
        actor: &Actor,
    ) -> DeskResult<Account> {
        let account = self.store.get_account(account_id)?;
        AuthorizationGuard::require_review(actor, &account)?;
        self.change_status(account, AccountStatus::Rejected, actor, Some(reason))
    }

    pub fn suspend_account(
        &self,
        account_id: AccountId,
        reason: &str,
        actor: &Actor,
    ) -> DeskResult<Account> {
        AuthorizationGuard::require_admin(actor, Some(account_id))?;
        let account = self.store.get_account(account_id)?;
        self.change_status(account, AccountStatus::Suspended, actor, Some(reason))
    }

    pub fn reinstate_account(&self, account_id: AccountId, actor: &Actor) -> DeskResult<Account> {
        AuthorizationGuard::require_admin(actor, Some(account_id))?;
        let account = self.store.get_account(account_id)?;
        if account.status != AccountStatus::Suspended {
            return Err(DeskError::InvalidTransition {
                account_id,
                from: account.status.to_string(),
                to: AccountStatus::Active.to_string(),
            });
        }
        self.change_status(account, AccountStatus::Active, actor, None)
    }

    fn change_status(
        &self,
        account: Account,
        next: AccountStatus,
        actor: &Actor,
        reason: Option<&str>,
    ) -> DeskResult<Account> {
        if !account.status.can_become(next) {
            return Err(DeskError::InvalidTransition {
                account_id: account.account_id,
                from: account.status.to_string(),
                to: next.to_string(),
            });
        }
        let updated = self
            .store
            .set_status(account.account_id, next, self.clock.now())?;
        log::info!(
            "account {} {} -> {} by {} {}",
            account.account_id,
            account.status,
            next,
            actor.role,
            actor.id
        );

        let suffix = reason.map(|r| format!(" Reason: {r}")).unwrap_or_default();
        let (severity, title, message) = match next {
            AccountStatus::Active if account.status == AccountStatus::Suspended => (
                Severity::Success,
                "Account reinstated",
                "Your account is active again.".to_string(),
            ),
            AccountStatus::Active => (
                Severity::Success,
                "Account approved",
                "Your account is now active.".to_string(),
            ),
            AccountStatus::Rejected => (
                Severity::Error,
                "Registration rejected",
                format!("Your registration was rejected.{suffix}"),
            ),
            AccountStatus::Suspended => (
                Severity::Warning,
                "Account suspended",
                format!("Your account has been suspended.{suffix}"),
            ),
            AccountStatus::Pending => (Severity::Info, "Account pending", String::new()),
        };
        self.notify(account.account_id, severity, title, message);
        self.audit(
            Some(actor),
            AuditAction::AccountStatusChanged,
            Some(account.account_id),
            format!(
                "Account {} moved from {} to {}{suffix}",
                account.account_id, account.status, next
            ),
        );
        Ok(updated)
    }

    /// Hand an account to another agent, or unassign it with `None`.
    pub fn assign_agent(
        &self,
        account_id: AccountId,
        agent_id: Option<ActorId>,
        actor: &Actor,
    ) -> DeskResult<Account> {
        AuthorizationGuard::require_admin(actor, Some(account_id))?;
        let before = self.store.get_account(account_id)?;
        let updated = self
            .store
            .assign_agent(account_id, agent_id, self.clock.now())?;
        self.audit(
            Some(actor),
            AuditAction::AgentAssigned,
            Some(account_id),
            format!(
                "Account {account_id} owner changed from {:?} to {:?}",
                before.owner_agent_id, agent_id
            ),
        );
        Ok(updated)
    }

    /// Outstanding withdrawals keep the destination they were created with.
    pub fn update_bank_profile(
        &self,
        account_id: AccountId,
        bank: &BankProfile,
        actor: &Actor,
    ) -> DeskResult<Account> {
        let account = self.store.get_account(account_id)?;
        AuthorizationGuard::require_operate(actor, &account)?;
        let updated = self
            .store
            .update_bank_profile(account_id, bank, self.clock.now())?;
        self.audit(
            Some(actor),
            AuditAction::BankProfileUpdated,
            Some(account_id),
            format!("Bank profile set to {} {}", bank.bank_name, bank.account_number),
        );
        Ok(updated)
    }

    /// Deletes the account with its requests and notifications. The audit
    /// trail survives.
    pub fn delete_account(&self, account_id: AccountId, actor: &Actor) -> DeskResult<()> {
        AuthorizationGuard::require_admin(actor, Some(account_id))?;
        let account = self.store.get_account(account_id)?;
        self.store.delete_account(account_id)?;
        log::info!("account {account_id} deleted by {} {}", actor.role, actor.id);
        if account.balance > 0 {
            log::warn!(
                "account {account_id} deleted with balance {}",
                account.balance
            );
        }
        self.audit(
            Some(actor),
            AuditAction::AccountDeleted,
            Some(account_id),
            format!(
                "Deleted account {account_id} ({}) with balance {}",
                account.name,
                self.config.format_amount(account.balance)
            ),
        );
        Ok(())
    }

    // ── Locks ─────────────────────────────────────────────────────

    pub fn lock_account_withdrawal(
        &self,
        account_id: AccountId,
        reason: &str,
        actor: &Actor,
    ) -> DeskResult<Account> {
        self.apply_lock(account_id, Capability::Withdrawal, Some(reason), actor)
    }

    pub fn unlock_account_withdrawal(
        &self,
        account_id: AccountId,
        actor: &Actor,
    ) -> DeskResult<Account> {
        self.apply_lock(account_id, Capability::Withdrawal, None, actor)
    }

    pub fn lock_account_deposit(
        &self,
        account_id: AccountId,
        reason: &str,
        actor: &Actor,
    ) -> DeskResult<Account> {
        self.apply_lock(account_id, Capability::Deposit, Some(reason), actor)
    }

    pub fn unlock_account_deposit(
        &self,
        account_id: AccountId,
        actor: &Actor,
    ) -> DeskResult<Account> {
        self.apply_lock(account_id, Capability::Deposit, None, actor)
    }

    /// `reason = Some(..)` locks, `None` unlocks.
    fn apply_lock(
        &self,
        account_id: AccountId,
        capability: Capability,
        reason: Option<&str>,
        actor: &Actor,
    ) -> DeskResult<Account> {
        let account = self.store.get_account(account_id)?;
        AuthorizationGuard::require_review(actor, &account)?;
        let update = match (capability, reason) {
            (Capability::Withdrawal, Some(r)) => LockUpdate::lock_withdrawal(r),
            (Capability::Withdrawal, None) => LockUpdate::unlock_withdrawal(),
            (Capability::Deposit, Some(r)) => LockUpdate::lock_deposit(r),
            (Capability::Deposit, None) => LockUpdate::unlock_deposit(),
        };
        let updated = self.store.set_locks(account_id, &update, self.clock.now())?;
        self.emit_lock_change(account_id, capability, reason, actor);
        Ok(updated)
    }

    fn emit_lock_change(
        &self,
        account_id: AccountId,
        capability: Capability,
        reason: Option<&str>,
        actor: &Actor,
    ) {
        let name = capability.as_str();
        let action = match (capability, reason.is_some()) {
            (Capability::Withdrawal, true) => AuditAction::WithdrawalLocked,
            (Capability::Withdrawal, false) => AuditAction::WithdrawalUnlocked,
            (Capability::Deposit, true) => AuditAction::DepositLocked,
            (Capability::Deposit, false) => AuditAction::DepositUnlocked,
        };
        match reason {
            Some(r) => {
                self.notify(
                    account_id,
                    Severity::Warning,
                    format!("{} locked", capitalize(name)),
                    format!("New {name} requests are blocked. Reason: {r}"),
                );
                self.audit(
                    Some(actor),
                    action,
                    Some(account_id),
                    format!("Locked {name} on account {account_id}: {r}"),
                );
            }
            None => {
                self.notify(
                    account_id,
                    Severity::Success,
                    format!("{} unlocked", capitalize(name)),
                    format!("You can submit {name} requests again."),
                );
                self.audit(
                    Some(actor),
                    action,
                    Some(account_id),
                    format!("Unlocked {name} on account {account_id}"),
                );
            }
        }
    }

    // ── Request creation ──────────────────────────────────────────

    /// Record a deposit request. The balance is untouched until approval.
    pub fn create_deposit(
        &self,
        account_id: AccountId,
        amount: Amount,
        note: Option<&str>,
        actor: &Actor,
    ) -> DeskResult<FundRequest> {
        validate_amount(amount)?;
        let account = self.store.get_account(account_id)?;
        AuthorizationGuard::require_operate(actor, &account)?;
        ensure_can_transact(&account, Capability::Deposit)?;

        let now = self.clock.now();
        // Status and lock are checked again under the write lock; a lock
        // committed after the first read still wins.
        let request = self.store.atomically(|s| {
            ensure_can_transact(&s.get_account(account_id)?, Capability::Deposit)?;
            s.insert_request(&NewFundRequest {
                account_id,
                kind: RequestKind::Deposit,
                amount,
                destination: None,
                note: note.map(String::from),
                created_at: now,
            })
        })?;
        log::debug!(
            "deposit {} of {amount} requested on account {account_id}",
            request.request_id
        );

        self.notify(
            account_id,
            Severity::Info,
            "Deposit submitted",
            format!(
                "Your deposit of {} is waiting for verification.",
                self.config.format_amount(amount)
            ),
        );
        self.audit(
            Some(actor),
            AuditAction::DepositRequested,
            Some(account_id),
            format!(
                "Deposit request #{} for {}",
                request.request_id,
                self.config.format_amount(amount)
            ),
        );
        Ok(request)
    }

    /// Record a withdrawal request and hold its amount immediately.
    ///
    /// `destination = None` snapshots the account's current bank profile.
    /// The status and lock checks, the pending check, the funds check, the
    /// hold and the insert run as one unit: if the insert fails the hold is
    /// rolled back before the error is returned.
    pub fn create_withdrawal(
        &self,
        account_id: AccountId,
        amount: Amount,
        destination: Option<BankProfile>,
        note: Option<&str>,
        actor: &Actor,
    ) -> DeskResult<FundRequest> {
        validate_amount(amount)?;
        let account = self.store.get_account(account_id)?;
        AuthorizationGuard::require_operate(actor, &account)?;
        ensure_can_transact(&account, Capability::Withdrawal)?;
        let destination = destination
            .or_else(|| account.bank.clone())
            .ok_or(DeskError::MissingBankDetails { account_id })?;

        let now = self.clock.now();
        let (request, held) = self.store.atomically(|s| {
            let current = s.get_account(account_id)?;
            ensure_can_transact(&current, Capability::Withdrawal)?;
            if let Some(existing) = s.pending_withdrawal_for(account_id)? {
                return Err(DeskError::DuplicatePending {
                    account_id,
                    request_id: Some(existing.request_id),
                });
            }
            if amount > current.balance {
                return Err(DeskError::InsufficientFunds {
                    account_id,
                    requested: amount,
                    available: current.balance,
                });
            }
            let held = s.mutate_balance(account_id, -amount, now)?;
            let inserted = s.insert_request(&NewFundRequest {
                account_id,
                kind: RequestKind::Withdrawal,
                amount,
                destination: Some(destination),
                note: note.map(String::from),
                created_at: now,
            });
            match inserted {
                Ok(request) => Ok((request, held)),
                Err(e) => {
                    log::warn!(
                        "withdrawal insert failed on account {account_id}; releasing hold of {amount}"
                    );
                    Err(e)
                }
            }
        })?;
        log::debug!(
            "withdrawal {} of {amount} held on account {account_id}, balance now {}",
            request.request_id,
            held.balance
        );

        self.notify(
            account_id,
            Severity::Info,
            "Withdrawal submitted",
            format!(
                "{} has been reserved for your withdrawal and is waiting for approval.",
                self.config.format_amount(amount)
            ),
        );
        self.audit(
            Some(actor),
            AuditAction::WithdrawalRequested,
            Some(account_id),
            format!(
                "Withdrawal request #{} for {}, held from balance",
                request.request_id,
                self.config.format_amount(amount)
            ),
        );
        Ok(request)
    }

    // ── Review ────────────────────────────────────────────────────

    /// Load a request and its account, then check the actor may review it
    /// and that it is still pending. No writes.
    fn load_for_review(
        &self,
        request_id: RequestId,
        actor: &Actor,
    ) -> DeskResult<(FundRequest, Account)> {
        let request = self.store.get_request(request_id)?;
        let account = self.store.get_account(request.account_id)?;
        AuthorizationGuard::require_review(actor, &account)?;
        if request.status.is_terminal() {
            return Err(DeskError::AlreadyProcessed {
                request_id,
                status: request.status.to_string(),
            });
        }
        Ok((request, account))
    }

    pub fn approve_request(&self, request_id: RequestId, actor: &Actor) -> DeskResult<FundRequest> {
        let (request, _) = self.load_for_review(request_id, actor)?;
        let now = self.clock.now();
        let resolution = Resolution::approve(actor.id, now);

        let approved = match request.kind {
            // Status flip and credit land together or not at all.
            RequestKind::Deposit => self.store.atomically(|s| {
                let approved = s.resolve_request(request_id, &resolution)?;
                s.mutate_balance(approved.account_id, approved.amount, now)?;
                Ok(approved)
            })?,
            // Funds were held at creation.
            RequestKind::Withdrawal => self.store.resolve_request(request_id, &resolution)?,
        };
        log::info!(
            "{} {} approved by {} {}",
            approved.kind,
            request_id,
            actor.role,
            actor.id
        );

        let amount = self.config.format_amount(approved.amount);
        let message = match approved.kind {
            RequestKind::Deposit => format!("Your deposit of {amount} has been credited."),
            RequestKind::Withdrawal => {
                format!("Your withdrawal of {amount} has been approved and is on its way.")
            }
        };
        self.notify(
            approved.account_id,
            Severity::Success,
            format!("{} approved", approved.kind.label()),
            message,
        );
        let action = match approved.kind {
            RequestKind::Deposit => AuditAction::DepositApproved,
            RequestKind::Withdrawal => AuditAction::WithdrawalApproved,
        };
        self.audit(
            Some(actor),
            action,
            Some(approved.account_id),
            format!("Approved {} request #{request_id} for {amount}", approved.kind),
        );
        Ok(approved)
    }

    /// Reject a pending request. A withdrawal's hold is refunded in the same
    /// unit of work; `lock_withdrawal` additionally blocks further
    /// withdrawals with `reason`. The flag is ignored for deposits.
    pub fn reject_request(
        &self,
        request_id: RequestId,
        actor: &Actor,
        reason: &str,
        lock_withdrawal: bool,
    ) -> DeskResult<FundRequest> {
        let (request, _) = self.load_for_review(request_id, actor)?;
        let reason = reason.trim();
        if self.config.require_rejection_reason && reason.is_empty() {
            return Err(DeskError::ReasonRequired);
        }
        let now = self.clock.now();
        let resolution = Resolution::reject(actor.id, now, reason);

        let rejected = match request.kind {
            RequestKind::Deposit => {
                if lock_withdrawal {
                    log::debug!("lock_withdrawal ignored for deposit {request_id}");
                }
                self.store.resolve_request(request_id, &resolution)?
            }
            RequestKind::Withdrawal => self.store.atomically(|s| {
                let rejected = s.resolve_request(request_id, &resolution)?;
                // Runs only after winning the pending -> rejected flip, so the
                // refund happens at most once per request.
                s.mutate_balance(rejected.account_id, rejected.amount, now)?;
                if lock_withdrawal {
                    s.set_locks(rejected.account_id, &LockUpdate::lock_withdrawal(reason), now)?;
                }
                Ok(rejected)
            })?,
        };
        log::info!(
            "{} {} rejected by {} {}: {reason}",
            rejected.kind,
            request_id,
            actor.role,
            actor.id
        );

        let account_id = rejected.account_id;
        let amount = self.config.format_amount(rejected.amount);
        if rejected.kind == RequestKind::Withdrawal {
            self.notify(
                account_id,
                Severity::Info,
                "Funds returned",
                format!("{amount} has been returned to your balance."),
            );
        }
        self.notify(
            account_id,
            Severity::Error,
            format!("{} rejected", rejected.kind.label()),
            format!(
                "Your {} of {amount} was rejected. Reason: {reason}",
                rejected.kind
            ),
        );
        let action = match rejected.kind {
            RequestKind::Deposit => AuditAction::DepositRejected,
            RequestKind::Withdrawal => AuditAction::WithdrawalRejected,
        };
        self.audit(
            Some(actor),
            action,
            Some(account_id),
            format!(
                "Rejected {} request #{request_id} for {amount}: {reason}",
                rejected.kind
            ),
        );
        if rejected.kind == RequestKind::Withdrawal && lock_withdrawal {
            self.emit_lock_change(account_id, Capability::Withdrawal, Some(reason), actor);
        }
        Ok(rejected)
    }

    // ── Read side ─────────────────────────────────────────────────

    pub fn account(&self, account_id: AccountId) -> DeskResult<Account> {
        self.store.get_account(account_id)
    }

    pub fn request(&self, request_id: RequestId) -> DeskResult<FundRequest> {
        self.store.get_request(request_id)
    }

    /// Callers filter `account_ids` by ownership before calling this.
    pub fn list_requests_for_accounts(
        &self,
        account_ids: &[AccountId],
        filter: &RequestFilter,
    ) -> DeskResult<Vec<FundRequest>> {
        self.store.requests_for_accounts(account_ids, filter)
    }

    pub fn list_requests_all(&self, filter: &RequestFilter) -> DeskResult<Vec<FundRequest>> {
        self.store.all_requests(filter)
    }

    /// Scope by the actor's visible accounts, then list.
    pub fn requests_visible_to(
        &self,
        actor: &Actor,
        filter: &RequestFilter,
    ) -> DeskResult<Vec<FundRequest>> {
        match AuthorizationGuard::visible_accounts(&self.store, actor)? {
            None => self.list_requests_all(filter),
            Some(ids) => self.list_requests_for_accounts(&ids, filter),
        }
    }

    /// Same as [`account`](Self::account), but only for actors allowed to
    /// operate on it.
    pub fn account_for(&self, account_id: AccountId, actor: &Actor) -> DeskResult<Account> {
        let account = self.store.get_account(account_id)?;
        AuthorizationGuard::require_operate(actor, &account)?;
        Ok(account)
    }

    /// Newest first, with the unread count.
    pub fn notifications_for(
        &self,
        account_id: AccountId,
        actor: &Actor,
    ) -> DeskResult<(Vec<Notification>, i64)> {
        self.account_for(account_id, actor)?;
        let items = self.store.notifications_for(account_id)?;
        let unread = self.store.unread_count(account_id)?;
        Ok((items, unread))
    }

    /// The notification must belong to `account_id`.
    pub fn mark_notification_read(
        &self,
        account_id: AccountId,
        notification_id: NotificationId,
        actor: &Actor,
    ) -> DeskResult<()> {
        self.account_for(account_id, actor)?;
        let owned = self
            .store
            .notifications_for(account_id)?
            .iter()
            .any(|n| n.notification_id == notification_id);
        if !owned {
            return Err(DeskError::NotFound {
                entity: "notification",
                id: notification_id,
            });
        }
        self.store.mark_read(notification_id)
    }

    pub fn mark_all_notifications_read(
        &self,
        account_id: AccountId,
        actor: &Actor,
    ) -> DeskResult<usize> {
        self.account_for(account_id, actor)?;
        self.store.mark_all_read(account_id)
    }

    /// One account's trail for anyone who may operate on it; the global
    /// tail for administrators only.
    pub fn audit_trail(
        &self,
        account_id: Option<AccountId>,
        limit: usize,
        actor: &Actor,
    ) -> DeskResult<Vec<AuditEntry>> {
        match account_id {
            Some(id) => {
                self.account_for(id, actor)?;
                self.store.audit_for_account(id)
            }
            None => {
                AuthorizationGuard::require_admin(actor, None)?;
                self.store.recent_audit(limit)
            }
        }
    }

    // ── Side effects ──────────────────────────────────────────────

    fn notify(
        &self,
        account_id: AccountId,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        let notification =
            NewNotification::new(account_id, severity, title, message, self.clock.now());
        if let Err(e) = self.store.push_notification(&notification) {
            log::warn!(
                "notification '{}' for account {account_id} dropped: {e}",
                notification.title
            );
        }
    }

    fn audit(
        &self,
        actor: Option<&Actor>,
        action: AuditAction,
        account_id: Option<AccountId>,
        description: String,
    ) {
        let now = self.clock.now();
        let entry = match actor {
            Some(actor) => NewAuditEntry::by(actor, action, account_id, description, now),
            None => NewAuditEntry {
                action,
                description,
                account_id,
                actor_id: None,
                actor_role: None,
                actor_name: None,
                created_at: now,
            },
        };
        if let Err(e) = self.store.append_audit(&entry) {
            log::warn!(
                "audit entry {} for account {account_id:?} dropped: {e}",
                action.as_str()
            );
        }
    }
}

fn validate_amount(amount: Amount) -> DeskResult<()> {
    if amount <= 0 {
        return Err(DeskError::InvalidAmount(amount));
    }
    Ok(())
}

/// Status and lock checks for new requests.
fn ensure_can_transact(account: &Account, capability: Capability) -> DeskResult<()> {
    if !account.is_active() {
        return Err(DeskError::AccountInactive {
            account_id: account.account_id,
            status: account.status.to_string(),
        });
    }
    let (locked, reason) = match capability {
        Capability::Deposit => (account.deposit_locked, &account.deposit_lock_reason),
        Capability::Withdrawal => (account.withdrawal_locked, &account.withdrawal_lock_reason),
    };
    if locked {
        return Err(DeskError::Locked {
            account_id: account.account_id,
            capability: capability.as_str(),
            reason: reason.clone().unwrap_or_default(),
        });
    }
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
