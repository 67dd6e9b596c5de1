//! SQLite persistence for readings and current-state tables
//!
//! One `SqliteStore` owns one connection for the lifetime of a run. Every
//! logical batch or live cycle is a single `rusqlite::Transaction`; a
//! transaction dropped without `commit()` rolls back, so a `?` anywhere in a
//! cycle discards that cycle's writes.
//!
//! ## Tables (names configurable, see `TableNames`)
//!
//! - `air_quality_readings`, `noise_level_readings`, `power_readings` -
//!   append-only, `id INTEGER PRIMARY KEY AUTOINCREMENT` so ids are never reused
//! - `junction_state`, `parking_spots` - one row per key, upserted
//! - `power_stats` - one row per `year_month`, upserted by monthly summaries

pub mod cursor;
pub mod queries;
pub mod retention;
pub mod state;
pub mod writer;

use crate::config::TableNames;
use crate::error::{EngineError, Result};
use crate::sqlite_pragma::apply_optimized_pragmas;
use rusqlite::{Connection, ErrorCode, Transaction};
use std::path::Path;

pub use cursor::{BackfillWindow, CursorSource, DateCursor};
pub use retention::{EnvironmentalTrim, MonthTrim};
pub use state::ParkingUpdate;
pub use writer::{Progress, ReadingBatch};

pub struct SqliteStore {
    conn: Connection,
    tables: TableNames,
}

impl SqliteStore {
    /// Open (or create) the database and make sure every table exists
    pub fn open(db_path: impl AsRef<Path>, tables: TableNames) -> Result<Self> {
        tables.validate()?;

        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path.as_ref())?;
        apply_optimized_pragmas(&conn)?;

        let store = Self { conn, tables };
        store.ensure_schema()?;

        log::info!("✅ SQLite store ready: {}", db_path.as_ref().display());
        Ok(store)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Begin the transaction for one batch or cycle
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Create tables and indexes (idempotent)
    fn ensure_schema(&self) -> Result<()> {
        let t = &self.tables;
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {air} (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                location    TEXT NOT NULL,
                pm25_level  REAL NOT NULL,
                pm10_level  REAL NOT NULL,
                ozone_level REAL NOT NULL,
                quality_index TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{air}_location_ts ON {air}(location, timestamp);
            CREATE INDEX IF NOT EXISTS idx_{air}_ts ON {air}(timestamp);

            CREATE TABLE IF NOT EXISTS {noise} (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp     TEXT NOT NULL,
                location      TEXT NOT NULL,
                decibel_level REAL NOT NULL,
                zone_type     TEXT NOT NULL,
                exceeds_limit INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{noise}_location_ts ON {noise}(location, timestamp);
            CREATE INDEX IF NOT EXISTS idx_{noise}_ts ON {noise}(timestamp);

            CREATE TABLE IF NOT EXISTS {power} (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                reading_date   TEXT NOT NULL,
                power_consumed REAL NOT NULL,
                fault_detected INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{power}_date ON {power}(reading_date);

            CREATE TABLE IF NOT EXISTS {stats} (
                year_month          TEXT PRIMARY KEY,
                total_consumption   REAL NOT NULL,
                fault_count         INTEGER NOT NULL,
                days_recorded       INTEGER NOT NULL,
                average_consumption REAL NOT NULL,
                last_updated        TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS {junction} (
                junction_id     TEXT PRIMARY KEY,
                lane_1_vehicles INTEGER NOT NULL,
                lane_2_vehicles INTEGER NOT NULL,
                lane_3_vehicles INTEGER NOT NULL,
                lane_4_vehicles INTEGER NOT NULL,
                green_lane_id   INTEGER NOT NULL,
                last_updated    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS {parking} (
                spot_id              TEXT PRIMARY KEY,
                location_description TEXT NOT NULL,
                is_occupied          INTEGER NOT NULL,
                last_updated         TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
            air = t.air_quality,
            noise = t.noise,
            power = t.power,
            stats = t.power_stats,
            junction = t.junction,
            parking = t.parking,
        );

        self.conn.execute_batch(&sql)?;
        Ok(())
    }
}

impl EngineError {
    /// Whether the error means the database itself is unusable
    ///
    /// Live loops stop on these; anything else is treated as a failed cycle.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            EngineError::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::CannotOpen
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::PermissionDenied
                    | ErrorCode::ReadOnly
            ),
            EngineError::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Fresh store in a temp directory; keep the `TempDir` alive for the test
    pub fn temp_store() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("city.db"), TableNames::default()).unwrap();
        (dir, store)
    }

    pub fn count_rows(store: &SqliteStore, table: &str) -> i64 {
        store
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }
}
