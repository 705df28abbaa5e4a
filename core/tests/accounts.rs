mod common;

use common::*;
use desk_core::{
    account::{AccountStatus, NewAccount},
    authorization::Actor,
    error::{DeskError, DeskResult},
    request::RequestFilter,
    store::AccountStore,
};

fn new_account(name: &str) -> NewAccount {
    NewAccount {
        name: name.into(),
        owner_agent_id: None,
        bank: Some(bank()),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn registration_starts_pending_with_zero_balance() -> DeskResult<()> {
    let engine = make_engine();
    let account = engine.register_account(&new_account("Dewi"), None)?;

    assert_eq!(account.status, AccountStatus::Pending);
    assert_eq!(account.balance, 0);
    assert!(!account.deposit_locked && !account.withdrawal_locked);
    assert_eq!(account.created_at, t0());
    assert_eq!(account.bank, Some(bank()));
    Ok(())
}

#[test]
fn agent_registration_takes_ownership() -> DeskResult<()> {
    let engine = make_engine();
    let mut fields = new_account("Rudi");
    fields.owner_agent_id = Some(42);

    let account = engine.register_account(&fields, Some(&agent(7)))?;
    assert_eq!(account.owner_agent_id, Some(7));

    let by_admin = engine.register_account(&fields, Some(&admin()))?;
    assert_eq!(by_admin.owner_agent_id, Some(42));
    Ok(())
}

#[test]
fn customers_cannot_register_accounts_for_others() -> DeskResult<()> {
    let engine = make_engine();
    let existing = open_account(&engine, None, 0);

    let result = engine.register_account(&new_account("Other"), Some(&Actor::customer(&existing)));
    assert!(matches!(result, Err(DeskError::Forbidden { account_id: None, .. })));
    assert_eq!(engine.store.list_accounts()?.len(), 1);
    Ok(())
}

#[test]
fn registration_can_be_rejected_once() -> DeskResult<()> {
    let engine = make_engine();
    let account = engine.register_account(&new_account("Fake"), None)?;

    let rejected = engine.reject_account(account.account_id, "documents forged", &admin())?;
    assert_eq!(rejected.status, AccountStatus::Rejected);

    let activate = engine.activate_account(account.account_id, &admin());
    assert!(matches!(activate, Err(DeskError::InvalidTransition { .. })));
    Ok(())
}

#[test]
fn suspension_is_admin_only_and_reversible() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, Some(7), 1_000);

    let by_agent = engine.suspend_account(account.account_id, "review", &agent(7));
    assert!(matches!(by_agent, Err(DeskError::Forbidden { .. })));

    let suspended = engine.suspend_account(account.account_id, "review", &admin())?;
    assert_eq!(suspended.status, AccountStatus::Suspended);

    // Only reinstatement brings it back.
    let activate = engine.activate_account(account.account_id, &admin());
    assert!(matches!(activate, Err(DeskError::InvalidTransition { .. })));

    let back = engine.reinstate_account(account.account_id, &admin())?;
    assert_eq!(back.status, AccountStatus::Active);
    assert_eq!(back.balance, 1_000);

    let again = engine.reinstate_account(account.account_id, &admin());
    assert!(matches!(again, Err(DeskError::InvalidTransition { .. })));
    Ok(())
}

/// Requests created before a suspension can still be processed.
#[test]
fn pending_requests_survive_suspension() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, None, 2_000);
    let withdrawal = engine.create_withdrawal(account.account_id, 500, None, None, &admin())?;
    let deposit = engine.create_deposit(account.account_id, 300, None, &admin())?;

    engine.suspend_account(account.account_id, "kyc refresh", &admin())?;
    engine.reject_request(withdrawal.request_id, &admin(), "account suspended", false)?;
    engine.approve_request(deposit.request_id, &admin())?;

    assert_eq!(balance_of(&engine, account.account_id), 2_300);
    Ok(())
}

#[test]
fn reassigning_agent_moves_visibility() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, Some(7), 1_000);

    let denied = engine.assign_agent(account.account_id, Some(8), &agent(7));
    assert!(matches!(denied, Err(DeskError::Forbidden { .. })));

    engine.assign_agent(account.account_id, Some(8), &admin())?;
    assert!(engine
        .requests_visible_to(&agent(7), &RequestFilter::default())?
        .is_empty());
    assert_eq!(
        engine
            .requests_visible_to(&agent(8), &RequestFilter::default())?
            .len(),
        1
    );

    let unassigned = engine.assign_agent(account.account_id, None, &admin())?;
    assert_eq!(unassigned.owner_agent_id, None);
    Ok(())
}

#[test]
fn bank_profile_updates_follow_operate_rules() -> DeskResult<()> {
    let engine = make_engine();
    let mine = open_account(&engine, None, 0);
    let theirs = open_account(&engine, None, 0);
    let mut changed = bank();
    changed.account_number = "5555".into();

    let denied = engine.update_bank_profile(theirs.account_id, &changed, &Actor::customer(&mine));
    assert!(matches!(denied, Err(DeskError::Forbidden { .. })));

    let updated = engine.update_bank_profile(mine.account_id, &changed, &Actor::customer(&mine))?;
    assert_eq!(updated.bank, Some(changed));
    Ok(())
}

#[test]
fn deleting_requires_admin_and_removes_requests() -> DeskResult<()> {
    let engine = make_engine();
    let account = open_account(&engine, Some(7), 1_000);
    engine.create_withdrawal(account.account_id, 100, None, None, &admin())?;

    let denied = engine.delete_account(account.account_id, &agent(7));
    assert!(matches!(denied, Err(DeskError::Forbidden { .. })));

    engine.delete_account(account.account_id, &admin())?;
    assert!(engine.store.find_account(account.account_id)?.is_none());
    assert!(engine.list_requests_all(&RequestFilter::default())?.is_empty());

    let twice = engine.delete_account(account.account_id, &admin());
    assert!(matches!(twice, Err(DeskError::NotFound { entity: "account", .. })));
    Ok(())
}
