mod common;

use common::*;
use desk_core::{error::DeskResult, store::DeskStore};
use rusqlite::Connection;

// ── Tests ────────────────────────────────────────────────────────────────────

/// The schema itself refuses edits to the audit log and negative balances,
/// whoever holds the connection.
#[test]
fn schema_guards_audit_log_and_balances() -> DeskResult<()> {
    init_logging();
    let path = std::env::temp_dir().join(format!("desk_schema_{}.db", uuid::Uuid::new_v4()));
    let path_str = path.to_string_lossy().to_string();
    let second = {
        let store = DeskStore::open(&path_str)?;
        store.migrate()?;
        let engine = desk_core::engine::RequestEngine::new(
            store,
            desk_core::config::DeskConfig::default_test(),
        );
        open_account(&engine, None, 100);
        engine.store.reopen()?
    };

    let raw = Connection::open(&path_str)?;
    let update = raw.execute("UPDATE audit_log SET description = 'edited'", []);
    assert!(update.is_err());
    let delete = raw.execute("DELETE FROM audit_log", []);
    assert!(delete.is_err());
    let overdraw = raw.execute("UPDATE account SET balance = -1", []);
    assert!(overdraw.is_err());
    // A second connection to the same file sees the data and may migrate again.
    second.migrate()?;
    assert_eq!(
        desk_core::store::AccountStore::list_accounts(&second)?.len(),
        1
    );
    drop(raw);
    drop(second);

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
    }
    Ok(())
}
