//! Append-only reading writer
//!
//! A `ReadingBatch` wraps one transaction. Rows are inserted through cached
//! prepared statements (values are always bound parameters), progress is
//! reported every `PROGRESS_INTERVAL` rows and on the final row, and nothing
//! becomes visible until `commit()`. Dropping a batch rolls it back.

use super::SqliteStore;
use crate::config::validate_identifier;
use crate::error::Result;
use crate::types::{AirQualitySample, NoiseSample, PowerSample};
use rusqlite::{params, Connection, Transaction};

/// Rows between progress reports
pub const PROGRESS_INTERVAL: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }
}

/// Decides which row counts are worth reporting
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    completed: u64,
    total: u64,
    interval: u64,
}

impl ProgressTracker {
    pub fn new(total: u64, interval: u64) -> Self {
        Self {
            completed: 0,
            total,
            interval: interval.max(1),
        }
    }

    /// Count one row; `Some` on every `interval`-th row and on the last one
    pub fn record(&mut self) -> Option<Progress> {
        self.completed += 1;
        if self.completed % self.interval == 0 || self.completed == self.total {
            Some(self.snapshot())
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> Progress {
        Progress {
            completed: self.completed,
            total: self.total,
        }
    }
}

pub fn insert_air_quality(conn: &Connection, table: &str, sample: &AirQualitySample) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {} (timestamp, location, pm25_level, pm10_level, ozone_level, quality_index)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        table
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.execute(params![
        sample.timestamp,
        sample.location,
        sample.pm25,
        sample.pm10,
        sample.ozone,
        sample.quality_index,
    ])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_noise(conn: &Connection, table: &str, sample: &NoiseSample) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {} (timestamp, location, decibel_level, zone_type, exceeds_limit)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        table
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.execute(params![
        sample.timestamp,
        sample.location,
        sample.decibel_level,
        sample.zone,
        sample.exceeds_limit,
    ])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_power(conn: &Connection, table: &str, sample: &PowerSample) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {} (reading_date, power_consumed, fault_detected) VALUES (?1, ?2, ?3)",
        table
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.execute(params![
        sample.reading_date,
        sample.power_consumed,
        sample.fault_detected,
    ])?;
    Ok(conn.last_insert_rowid())
}

/// One transactional unit of reading inserts
pub struct ReadingBatch<'a> {
    tx: Transaction<'a>,
    table: String,
    label: &'static str,
    tracker: ProgressTracker,
}

impl SqliteStore {
    /// Start a batch writing `total` rows into `table`
    ///
    /// `table` is spliced into the insert statements, so it must pass the
    /// same identifier check as the configured table names.
    pub fn begin_batch(
        &mut self,
        table: &str,
        label: &'static str,
        total: u64,
    ) -> Result<ReadingBatch<'_>> {
        validate_identifier(table)?;
        let table = table.to_string();
        let tx = self.transaction()?;
        Ok(ReadingBatch {
            tx,
            table,
            label,
            tracker: ProgressTracker::new(total, PROGRESS_INTERVAL),
        })
    }
}

impl<'a> ReadingBatch<'a> {
    pub fn append_air_quality(&mut self, sample: &AirQualitySample) -> Result<Option<Progress>> {
        insert_air_quality(&self.tx, &self.table, sample)?;
        Ok(self.advance())
    }

    pub fn append_noise(&mut self, sample: &NoiseSample) -> Result<Option<Progress>> {
        insert_noise(&self.tx, &self.table, sample)?;
        Ok(self.advance())
    }

    pub fn append_power(&mut self, sample: &PowerSample) -> Result<Option<Progress>> {
        insert_power(&self.tx, &self.table, sample)?;
        Ok(self.advance())
    }

    fn advance(&mut self) -> Option<Progress> {
        let progress = self.tracker.record();
        if let Some(p) = progress {
            log::info!(
                "📈 {} progress: {}/{} ({:.1}%)",
                self.label,
                p.completed,
                p.total,
                p.percent()
            );
        }
        progress
    }

    /// Commit every row in the batch; returns the row count
    pub fn commit(self) -> Result<u64> {
        let written = self.tracker.snapshot().completed;
        self.tx.commit()?;
        log::debug!("✅ Committed {} {} rows", written, self.label);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{count_rows, temp_store};
    use super::*;
    use crate::error::EngineError;
    use crate::types::{QualityIndex, ZoneType};
    use chrono::NaiveDate;

    fn air_sample(hour: u32) -> AirQualitySample {
        AirQualitySample {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            location: "Downtown".to_string(),
            pm25: 12.5,
            pm10: 30.0,
            ozone: 41.0,
            quality_index: QualityIndex::Moderate,
        }
    }

    #[test]
    fn test_progress_reported_on_interval_and_last_row() {
        let mut tracker = ProgressTracker::new(250, 100);
        let reported: Vec<u64> = (0..250)
            .filter_map(|_| tracker.record())
            .map(|p| p.completed)
            .collect();
        assert_eq!(reported, vec![100, 200, 250]);
    }

    #[test]
    fn test_progress_percent() {
        let p = Progress { completed: 1, total: 8 };
        assert!((p.percent() - 12.5).abs() < 1e-9);
        assert_eq!(Progress { completed: 0, total: 0 }.percent(), 100.0);
    }

    #[test]
    fn test_batch_commits_all_rows() {
        let (_dir, mut store) = temp_store();
        let table = store.tables().air_quality.clone();

        let mut batch = store.begin_batch(&table, "Air quality", 3).unwrap();
        assert!(batch.append_air_quality(&air_sample(0)).unwrap().is_none());
        assert!(batch.append_air_quality(&air_sample(8)).unwrap().is_none());
        let last = batch.append_air_quality(&air_sample(16)).unwrap();
        assert_eq!(last, Some(Progress { completed: 3, total: 3 }));
        assert_eq!(batch.commit().unwrap(), 3);

        assert_eq!(count_rows(&store, "air_quality_readings"), 3);
        let label: String = store
            .conn()
            .query_row(
                "SELECT quality_index FROM air_quality_readings ORDER BY id LIMIT 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(label, "Moderate");
    }

    #[test]
    fn test_batch_rejects_non_identifier_table() {
        let (_dir, mut store) = temp_store();
        for table in ["air_quality_readings; DROP TABLE power_readings", "", "1readings"] {
            let result = store.begin_batch(table, "Air quality", 1).map(|_| ());
            assert!(matches!(result, Err(EngineError::Config(_))), "{:?} accepted", table);
        }
        assert_eq!(count_rows(&store, "power_readings"), 0);
    }

    #[test]
    fn test_dropped_batch_rolls_back() {
        let (_dir, mut store) = temp_store();
        let table = store.tables().air_quality.clone();

        {
            let mut batch = store.begin_batch(&table, "Air quality", 2).unwrap();
            batch.append_air_quality(&air_sample(0)).unwrap();
            // Simulated mid-batch failure: batch goes out of scope uncommitted
        }

        assert_eq!(count_rows(&store, "air_quality_readings"), 0);
    }

    #[test]
    fn test_failed_write_discards_whole_batch() {
        let (_dir, mut store) = temp_store();

        let result: Result<u64> = (|| {
            let mut batch = store.begin_batch("noise_level_readings", "Noise", 2)?;
            batch.append_noise(&NoiseSample {
                timestamp: air_sample(1).timestamp,
                location: "Main Street".to_string(),
                decibel_level: 60.0,
                zone: ZoneType::Commercial,
                exceeds_limit: false,
            })?;
            // Wrong sample type for the table: the insert fails
            batch.append_air_quality(&air_sample(2))?;
            batch.commit()
        })();

        assert!(result.is_err());
        assert_eq!(count_rows(&store, "noise_level_readings"), 0);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let (_dir, mut store) = temp_store();
        let tx = store.transaction().unwrap();
        let first = insert_air_quality(&tx, "air_quality_readings", &air_sample(0)).unwrap();
        tx.execute("DELETE FROM air_quality_readings", []).unwrap();
        let second = insert_air_quality(&tx, "air_quality_readings", &air_sample(1)).unwrap();
        tx.commit().unwrap();
        assert!(second > first);
    }
}
