//! Explicit cleanup and report actions for external callers
//!
//! Every action returns one message whose leading marker tells the caller
//! how it went: `Success:`, `Error:` or `Info:` (benign no-op such as an
//! empty table). Failures never escape as `Err`.

use crate::store::{MonthTrim, SqliteStore};
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Success,
    Error,
    Info,
}

impl Marker {
    pub fn prefix(&self) -> &'static str {
        match self {
            Marker::Success => "Success:",
            Marker::Error => "Error:",
            Marker::Info => "Info:",
        }
    }

    /// Marker a message starts with, if any
    pub fn of(message: &str) -> Option<Marker> {
        [Marker::Success, Marker::Error, Marker::Info]
            .into_iter()
            .find(|m| message.starts_with(m.prefix()))
    }

    fn message(&self, body: impl std::fmt::Display) -> String {
        format!("{} {}", self.prefix(), body)
    }
}

/// Delete air-quality and noise readings older than `days_to_keep` days
pub fn delete_old_environmental(store: &mut SqliteStore, days_to_keep: u32, now: NaiveDateTime) -> String {
    match store.trim_environmental(days_to_keep, now) {
        Ok(trim) => Marker::Success.message(format!(
            "deleted {} air quality readings and {} noise level readings older than {}.",
            trim.air_quality, trim.noise, trim.cutoff
        )),
        Err(e) => {
            log::error!("❌ Environmental cleanup failed: {}", e);
            Marker::Error.message(format!("could not delete old environmental readings: {}", e))
        }
    }
}

/// Keep only the month of the latest power reading
pub fn delete_power_before_latest_month(store: &mut SqliteStore) -> String {
    match store.trim_power_before_latest_month() {
        Ok(MonthTrim::Deleted { rows, before }) => {
            Marker::Success.message(format!("deleted {} reading(s) before {}.", rows, before))
        }
        Ok(MonthTrim::NoData) => Marker::Info.message("no power readings found; nothing to delete."),
        Err(e) => {
            log::error!("❌ Power cleanup failed: {}", e);
            Marker::Error.message(format!("could not delete old power readings: {}", e))
        }
    }
}

pub fn delete_old_junction_states(store: &mut SqliteStore, today: NaiveDate) -> String {
    match store.trim_junction_states(today) {
        Ok(rows) => Marker::Success.message(format!(
            "deleted {} old junction state record(s) before {}.",
            rows, today
        )),
        Err(e) => {
            log::error!("❌ Junction cleanup failed: {}", e);
            Marker::Error.message(format!("could not delete old junction states: {}", e))
        }
    }
}

/// Summarize (and record) the power month containing `day`, or the latest month
pub fn power_month_report(store: &mut SqliteStore, day: Option<NaiveDate>) -> String {
    let outcome = match day {
        Some(day) => store.record_power_month(day),
        None => store.record_latest_power_month(),
    };

    match outcome {
        Ok(Some(stats)) => Marker::Success.message(format!(
            "{}: {} day(s), {:.2} kWh total, {:.2} kWh/day average, {} fault day(s).",
            stats.year_month,
            stats.days_recorded,
            stats.total_consumption,
            stats.average_consumption,
            stats.fault_count
        )),
        Ok(None) => Marker::Info.message("no power readings for the requested month."),
        Err(e) => {
            log::error!("❌ Power report failed: {}", e);
            Marker::Error.message(format!("could not build power report: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("city.db"), Default::default()).unwrap();
        (dir, store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_marker_detection() {
        assert_eq!(Marker::of("Success: deleted 0"), Some(Marker::Success));
        assert_eq!(Marker::of("Error: boom"), Some(Marker::Error));
        assert_eq!(Marker::of("Info: nothing"), Some(Marker::Info));
        assert_eq!(Marker::of("deleted"), None);
    }

    #[test]
    fn test_zero_deleted_is_success() {
        let (_dir, mut store) = open();
        let now = date(2024, 3, 10).and_hms_opt(0, 0, 0).unwrap();
        let message = delete_old_environmental(&mut store, 7, now);
        assert_eq!(Marker::of(&message), Some(Marker::Success));
        assert!(message.contains("deleted 0 air quality readings and 0 noise level readings"));

        let message = delete_old_junction_states(&mut store, date(2024, 3, 10));
        assert_eq!(Marker::of(&message), Some(Marker::Success));
    }

    #[test]
    fn test_out_of_range_retention_is_error_message() {
        let (_dir, mut store) = open();
        let now = date(2024, 3, 10).and_hms_opt(0, 0, 0).unwrap();
        let message = delete_old_environmental(&mut store, u32::MAX, now);
        assert_eq!(Marker::of(&message), Some(Marker::Error));
    }

    #[test]
    fn test_power_actions_on_empty_table_are_info() {
        let (_dir, mut store) = open();
        assert_eq!(Marker::of(&delete_power_before_latest_month(&mut store)), Some(Marker::Info));
        assert_eq!(Marker::of(&power_month_report(&mut store, None)), Some(Marker::Info));
    }

    #[test]
    fn test_power_cleanup_and_report() {
        let (_dir, mut store) = open();
        for d in ["2024-01-15", "2024-02-01", "2024-02-02"] {
            store
                .conn()
                .execute(
                    "INSERT INTO power_readings (reading_date, power_consumed, fault_detected) VALUES (?1, 12.0, 0)",
                    [d],
                )
                .unwrap();
        }

        let report = power_month_report(&mut store, Some(date(2024, 1, 20)));
        assert!(report.starts_with("Success: 2024-01: 1 day(s)"), "{}", report);

        let message = delete_power_before_latest_month(&mut store);
        assert_eq!(message, "Success: deleted 1 reading(s) before 2024-02-01.");
    }

    #[test]
    fn test_failure_is_reported_as_error_message() {
        let (_dir, mut store) = open();
        store.conn().execute_batch("DROP TABLE power_readings;").unwrap();
        let message = delete_power_before_latest_month(&mut store);
        assert_eq!(Marker::of(&message), Some(Marker::Error));
    }
}
