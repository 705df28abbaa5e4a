//! desk-runner: drive the request engine over JSON lines on stdin.
//!
//! Usage:
//!   desk-runner                      (uses ./desk.db)
//!   desk-runner --db desk.db
//!   desk-runner --db :memory:
//!   desk-runner --config desk.json
//!   echo '{"type":"create_deposit",...}' | desk-runner
//!
//! Each input line is one command; each output line is
//! `{"ok":true,"result":...}` or
//! `{"ok":false,"error":{"code":..,"message":..,"user_actionable":..}}`.

use anyhow::Result;
use desk_core::{
    account::{BankProfile, NewAccount},
    authorization::Actor,
    config::DeskConfig,
    engine::RequestEngine,
    error::DeskResult,
    request::RequestFilter,
    store::DeskStore,
    types::{AccountId, ActorId, Amount, NotificationId, RequestId},
};
use serde_json::{json, Value};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Command {
    // ── Account lifecycle ──────────────────────────────────────
    RegisterAccount {
        #[serde(default)]
        actor: Option<Actor>,
        name: String,
        #[serde(default)]
        owner_agent_id: Option<ActorId>,
        #[serde(default)]
        bank: Option<BankProfile>,
    },
    ActivateAccount {
        actor: Actor,
        account_id: AccountId,
    },
    RejectAccount {
        actor: Actor,
        account_id: AccountId,
        #[serde(default)]
        reason: String,
    },
    SuspendAccount {
        actor: Actor,
        account_id: AccountId,
        #[serde(default)]
        reason: String,
    },
    ReinstateAccount {
        actor: Actor,
        account_id: AccountId,
    },
    DeleteAccount {
        actor: Actor,
        account_id: AccountId,
    },
    AssignAgent {
        actor: Actor,
        account_id: AccountId,
        agent_id: Option<ActorId>,
    },
    UpdateBankProfile {
        actor: Actor,
        account_id: AccountId,
        bank: BankProfile,
    },

    // ── Requests ───────────────────────────────────────────────
    CreateDeposit {
        actor: Actor,
        account_id: AccountId,
        amount: Amount,
        #[serde(default)]
        note: Option<String>,
    },
    CreateWithdrawal {
        actor: Actor,
        account_id: AccountId,
        amount: Amount,
        #[serde(default)]
        destination: Option<BankProfile>,
        #[serde(default)]
        note: Option<String>,
    },
    Approve {
        actor: Actor,
        request_id: RequestId,
    },
    Reject {
        actor: Actor,
        request_id: RequestId,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        lock_withdrawal: bool,
    },

    // ── Locks ──────────────────────────────────────────────────
    LockWithdrawal {
        actor: Actor,
        account_id: AccountId,
        reason: String,
    },
    UnlockWithdrawal {
        actor: Actor,
        account_id: AccountId,
    },
    LockDeposit {
        actor: Actor,
        account_id: AccountId,
        reason: String,
    },
    UnlockDeposit {
        actor: Actor,
        account_id: AccountId,
    },

    // ── Reads ──────────────────────────────────────────────────
    ListRequests {
        actor: Actor,
        #[serde(default)]
        filter: RequestFilter,
    },
    Account {
        actor: Actor,
        account_id: AccountId,
    },
    Notifications {
        actor: Actor,
        account_id: AccountId,
    },
    MarkRead {
        actor: Actor,
        account_id: AccountId,
        notification_id: NotificationId,
    },
    MarkAllRead {
        actor: Actor,
        account_id: AccountId,
    },
    Audit {
        actor: Actor,
        #[serde(default)]
        account_id: Option<AccountId>,
        #[serde(default = "default_audit_limit")]
        limit: usize,
    },
    Quit,
}

fn default_audit_limit() -> usize {
    50
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match find_arg(&args, "--config") {
        Some(path) => DeskConfig::load(path)?,
        None => DeskConfig::default(),
    };
    if let Some(db) = find_arg(&args, "--db") {
        config.database_path = db.to_string();
    }
    config.busy_timeout_ms = parse_arg(&args, "--busy-timeout-ms", config.busy_timeout_ms);

    let store = DeskStore::from_config(&config)?;
    store.migrate()?;
    log::info!("desk-runner ready on {}", config.database_path);

    let engine = RequestEngine::new(store, config);
    run_loop(&engine)
}

fn run_loop(engine: &RequestEngine<DeskStore>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: Command = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let reply = json!({
                    "ok": false,
                    "error": {
                        "code": "bad_command",
                        "message": e.to_string(),
                        "user_actionable": true,
                    },
                });
                writeln!(stdout, "{reply}")?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, Command::Quit) {
            break;
        }

        let reply = match dispatch(engine, cmd) {
            Ok(result) => json!({ "ok": true, "result": result }),
            Err(e) => {
                if e.is_user_actionable() {
                    log::debug!("command refused: {e}");
                } else {
                    log::warn!("command failed: {e}");
                }
                json!({
                    "ok": false,
                    "error": {
                        "code": e.code(),
                        "message": e.to_string(),
                        "user_actionable": e.is_user_actionable(),
                    },
                })
            }
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn dispatch(engine: &RequestEngine<DeskStore>, cmd: Command) -> DeskResult<Value> {
    let value = match cmd {
        Command::RegisterAccount {
            actor,
            name,
            owner_agent_id,
            bank,
        } => {
            let new = NewAccount {
                name,
                owner_agent_id,
                bank,
            };
            serde_json::to_value(engine.register_account(&new, actor.as_ref())?)?
        }
        Command::ActivateAccount { actor, account_id } => {
            serde_json::to_value(engine.activate_account(account_id, &actor)?)?
        }
        Command::RejectAccount {
            actor,
            account_id,
            reason,
        } => serde_json::to_value(engine.reject_account(account_id, &reason, &actor)?)?,
        Command::SuspendAccount {
            actor,
            account_id,
            reason,
        } => serde_json::to_value(engine.suspend_account(account_id, &reason, &actor)?)?,
        Command::ReinstateAccount { actor, account_id } => {
            serde_json::to_value(engine.reinstate_account(account_id, &actor)?)?
        }
        Command::DeleteAccount { actor, account_id } => {
            engine.delete_account(account_id, &actor)?;
            json!({ "deleted": account_id })
        }
        Command::AssignAgent {
            actor,
            account_id,
            agent_id,
        } => serde_json::to_value(engine.assign_agent(account_id, agent_id, &actor)?)?,
        Command::UpdateBankProfile {
            actor,
            account_id,
            bank,
        } => serde_json::to_value(engine.update_bank_profile(account_id, &bank, &actor)?)?,
        Command::CreateDeposit {
            actor,
            account_id,
            amount,
            note,
        } => serde_json::to_value(engine.create_deposit(
            account_id,
            amount,
            note.as_deref(),
            &actor,
        )?)?,
        Command::CreateWithdrawal {
            actor,
            account_id,
            amount,
            destination,
            note,
        } => serde_json::to_value(engine.create_withdrawal(
            account_id,
            amount,
            destination,
            note.as_deref(),
            &actor,
        )?)?,
        Command::Approve { actor, request_id } => {
            serde_json::to_value(engine.approve_request(request_id, &actor)?)?
        }
        Command::Reject {
            actor,
            request_id,
            reason,
            lock_withdrawal,
        } => serde_json::to_value(engine.reject_request(
            request_id,
            &actor,
            &reason,
            lock_withdrawal,
        )?)?,
        Command::LockWithdrawal {
            actor,
            account_id,
            reason,
        } => serde_json::to_value(engine.lock_account_withdrawal(account_id, &reason, &actor)?)?,
        Command::UnlockWithdrawal { actor, account_id } => {
            serde_json::to_value(engine.unlock_account_withdrawal(account_id, &actor)?)?
        }
        Command::LockDeposit {
            actor,
            account_id,
            reason,
        } => serde_json::to_value(engine.lock_account_deposit(account_id, &reason, &actor)?)?,
        Command::UnlockDeposit { actor, account_id } => {
            serde_json::to_value(engine.unlock_account_deposit(account_id, &actor)?)?
        }
        Command::ListRequests { actor, filter } => {
            serde_json::to_value(engine.requests_visible_to(&actor, &filter)?)?
        }
        Command::Account { actor, account_id } => {
            serde_json::to_value(engine.account_for(account_id, &actor)?)?
        }
        Command::Notifications { actor, account_id } => {
            let (items, unread) = engine.notifications_for(account_id, &actor)?;
            json!({ "unread": unread, "items": items })
        }
        Command::MarkRead {
            actor,
            account_id,
            notification_id,
        } => {
            engine.mark_notification_read(account_id, notification_id, &actor)?;
            json!({ "marked": 1 })
        }
        Command::MarkAllRead { actor, account_id } => {
            json!({ "marked": engine.mark_all_notifications_read(account_id, &actor)? })
        }
        Command::Audit {
            actor,
            account_id,
            limit,
        } => serde_json::to_value(engine.audit_trail(account_id, limit, &actor)?)?,
        Command::Quit => Value::Null,
    };
    Ok(value)
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
