mod common;

use common::*;
use desk_core::{
    audit::{AuditAction, AuditSink},
    authorization::{Actor, Role},
    error::DeskResult,
    notification::{NotificationSink, Severity},
    request::RequestStatus,
};

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn deposit_lifecycle_notifies_and_audits() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, None, 0);
    let customer = Actor::customer(&account);

    let deposit = engine.create_deposit(account.account_id, 1_500, None, &customer)?;
    engine.approve_request(deposit.request_id, &admin())?;

    let notifications = engine.store.notifications_for(account.account_id)?;
    assert_eq!(notifications[0].title, "Deposit approved");
    assert_eq!(notifications[0].severity, Severity::Success);
    assert!(notifications[0].message.contains("1500 IDR"));
    assert_eq!(notifications[1].title, "Deposit submitted");

    let trail = engine.store.audit_for_account(account.account_id)?;
    let actions: Vec<_> = trail.iter().map(|e| e.action).collect();
    assert_eq!(
        &actions[actions.len() - 2..],
        &[AuditAction::DepositRequested, AuditAction::DepositApproved]
    );
    let requested = &trail[trail.len() - 2];
    assert_eq!(requested.actor_id, Some(account.account_id));
    assert_eq!(requested.actor_role, Some(Role::Customer));
    let approved = &trail[trail.len() - 1];
    assert_eq!(approved.actor_id, Some(admin().id));
    assert_eq!(approved.actor_name.as_deref(), Some("Desk Admin"));
    Ok(())
}

#[test]
fn locking_reject_emits_refund_rejection_and_lock() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, None, 8_000);
    let withdrawal = engine.create_withdrawal(account.account_id, 3_000, None, None, &admin())?;

    engine.reject_request(withdrawal.request_id, &admin(), "mule pattern", true)?;

    let titles = notification_titles(&engine, account.account_id);
    assert_eq!(
        &titles[..4],
        &[
            "Withdrawal locked",
            "Withdrawal rejected",
            "Funds returned",
            "Withdrawal submitted",
        ]
    );

    let trail = engine.store.audit_for_account(account.account_id)?;
    let actions: Vec<_> = trail.iter().map(|e| e.action).collect();
    assert_eq!(
        &actions[actions.len() - 3..],
        &[
            AuditAction::WithdrawalRequested,
            AuditAction::WithdrawalRejected,
            AuditAction::WithdrawalLocked,
        ]
    );
    assert!(trail[trail.len() - 2].description.contains("mule pattern"));
    Ok(())
}

/// Side-effect failures are logged and never undo the state change.
#[test]
fn notification_failure_does_not_fail_approval() -> DeskResult<()> {
    let engine = make_faulty_engine();
    let account = open_account(&engine, None, 1_000);
    let deposit = engine.create_deposit(account.account_id, 250, None, &admin())?;
    let before = engine.store.notifications_for(account.account_id)?.len();

    engine.store.fail_notifications.set(true);
    let approved = engine.approve_request(deposit.request_id, &admin())?;

    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(balance_of(&engine, account.account_id), 1_250);
    assert_eq!(engine.store.notifications_for(account.account_id)?.len(), before);
    Ok(())
}

#[test]
fn audit_failure_does_not_fail_rejection() -> DeskResult<()> {
    let engine = make_faulty_engine();
    let account = open_account(&engine, None, 1_000);
    let withdrawal = engine.create_withdrawal(account.account_id, 600, None, None, &admin())?;

    engine.store.fail_audit.set(true);
    engine.store.fail_notifications.set(true);
    let rejected = engine.reject_request(withdrawal.request_id, &admin(), "closed account", true)?;

    assert_eq!(rejected.status, RequestStatus::Rejected);
    let reloaded = engine.account(account.account_id)?;
    assert_eq!(reloaded.balance, 1_000);
    assert!(reloaded.withdrawal_locked);
    let last = engine.store.audit_for_account(account.account_id)?;
    assert_eq!(last.last().map(|e| e.action), Some(AuditAction::WithdrawalRequested));
    Ok(())
}

#[test]
fn failed_operations_leave_no_side_effects() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, None, 100);
    let notes_before = engine.store.notifications_for(account.account_id)?.len();
    let audit_before = engine.store.audit_for_account(account.account_id)?.len();

    assert!(engine.create_withdrawal(account.account_id, 500, None, None, &admin()).is_err());
    assert!(engine.create_deposit(account.account_id, 0, None, &admin()).is_err());

    assert_eq!(engine.store.notifications_for(account.account_id)?.len(), notes_before);
    assert_eq!(engine.store.audit_for_account(account.account_id)?.len(), audit_before);
    Ok(())
}

#[test]
fn unread_notifications_can_be_marked_read() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, None, 500);
    let total = engine.store.notifications_for(account.account_id)?.len() as i64;
    assert_eq!(engine.store.unread_count(account.account_id)?, total);

    let newest = engine.store.notifications_for(account.account_id)?[0].notification_id;
    engine.store.mark_read(newest)?;
    assert_eq!(engine.store.unread_count(account.account_id)?, total - 1);

    let flipped = engine.store.mark_all_read(account.account_id)?;
    assert_eq!(flipped as i64, total - 1);
    assert_eq!(engine.store.unread_count(account.account_id)?, 0);
    assert!(engine.store.mark_read(999_999).is_err());
    Ok(())
}

/// The audit trail outlives the account; notifications go with it.
#[test]
fn audit_trail_survives_account_deletion() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, None, 300);

    engine.delete_account(account.account_id, &admin())?;

    assert!(engine.account(account.account_id).is_err());
    assert!(engine.store.notifications_for(account.account_id)?.is_empty());
    let trail = engine.store.audit_for_account(account.account_id)?;
    assert_eq!(trail.first().map(|e| e.action), Some(AuditAction::AccountRegistered));
    assert_eq!(trail.last().map(|e| e.action), Some(AuditAction::AccountDeleted));

    let recent = engine.store.recent_audit(1)?;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].action, AuditAction::AccountDeleted);
    Ok(())
}
