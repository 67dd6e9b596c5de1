//! Retention: bounded deletes of rows older than a cutoff
//!
//! Cutoffs are domain-specific:
//! - environmental readings keep the last N days
//! - power readings: live loops keep N days before today; the explicit
//!   cleanup keeps only the most recently observed month
//! - junction state keeps rows updated today
//!
//! Every trim reports the exact number of rows deleted. Zero is a normal
//! outcome, so trimming twice with the same cutoff is harmless.

use super::cursor::{max_date, time_minus_days};
use super::SqliteStore;
use crate::error::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, ToSql};
use serde::Serialize;

/// `DELETE FROM table WHERE column < cutoff`
pub fn delete_before(conn: &Connection, table: &str, column: &str, cutoff: &dyn ToSql) -> Result<usize> {
    let sql = format!("DELETE FROM {} WHERE {} < ?1", table, column);
    let deleted = conn.prepare_cached(&sql)?.execute(params![cutoff])?;
    Ok(deleted)
}

/// Delete power readings dated before `cutoff`
pub fn trim_power_before(conn: &Connection, table: &str, cutoff: NaiveDate) -> Result<usize> {
    delete_before(conn, table, "reading_date", &cutoff)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvironmentalTrim {
    pub cutoff: NaiveDateTime,
    pub air_quality: usize,
    pub noise: usize,
}

/// Outcome of the "keep only the latest month" power cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthTrim {
    /// Power table is empty
    NoData,
    Deleted { rows: usize, before: NaiveDate },
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

impl SqliteStore {
    /// Delete air-quality and noise readings older than `days_to_keep` days
    ///
    /// Both tables are trimmed in one transaction.
    pub fn trim_environmental(&mut self, days_to_keep: u32, now: NaiveDateTime) -> Result<EnvironmentalTrim> {
        let cutoff = time_minus_days(now, days_to_keep)?;
        let (air_table, noise_table) = (self.tables().air_quality.clone(), self.tables().noise.clone());

        let tx = self.transaction()?;
        let air_quality = delete_before(&tx, &air_table, "timestamp", &cutoff)?;
        let noise = delete_before(&tx, &noise_table, "timestamp", &cutoff)?;
        tx.commit()?;

        log::info!(
            "🧹 Environmental trim before {}: {} air quality, {} noise rows",
            cutoff,
            air_quality,
            noise
        );
        Ok(EnvironmentalTrim {
            cutoff,
            air_quality,
            noise,
        })
    }

    /// Delete power readings before the first day of the latest observed month
    pub fn trim_power_before_latest_month(&mut self) -> Result<MonthTrim> {
        let table = self.tables().power.clone();

        let tx = self.transaction()?;
        let Some(latest) = max_date(&tx, &table, "reading_date")? else {
            return Ok(MonthTrim::NoData);
        };
        let before = month_start(latest);
        let rows = trim_power_before(&tx, &table, before)?;
        tx.commit()?;

        log::info!("🧹 Power trim before {}: {} rows", before, rows);
        Ok(MonthTrim::Deleted { rows, before })
    }

    /// Delete junction state rows last updated before `today`
    pub fn trim_junction_states(&mut self, today: NaiveDate) -> Result<usize> {
        let table = self.tables().junction.clone();
        let tx = self.transaction()?;
        let rows = delete_before(&tx, &table, "last_updated", &today)?;
        tx.commit()?;

        log::info!("🧹 Junction trim before {}: {} rows", today, rows);
        Ok(rows)
    }
}
