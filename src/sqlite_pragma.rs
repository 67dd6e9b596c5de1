//! Connection tuning shared by every writer and reader

use rusqlite::Connection;
use std::time::Duration;

/// Apply the standard PRAGMA set: WAL journal, NORMAL sync, in-memory temp
/// store, 1000-page autocheckpoint and a busy timeout so separate generator
/// processes can share one database file.
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        log::warn!("⚠️  journal_mode is {} (WAL unavailable)", mode);
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "wal_autocheckpoint", 1000)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(())
}
