//! Continuation: where generation resumes after a restart
//!
//! Date-stepped streams (power) resume at `MAX(reading_date) + 1 day`, or at
//! a configured default span before today when the table is empty. A failed
//! lookup never aborts a run: it falls back to the default start.
//!
//! Cadence-stepped streams (air quality, noise) do not keep a cursor. They
//! are backfilled over an explicit `BackfillWindow` each invocation.

use super::SqliteStore;
use crate::error::{EngineError, Result};
use chrono::{Days, Duration, Months, NaiveDate, NaiveDateTime};
use rusqlite::Connection;

/// How a cursor was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSource {
    /// Continues after the latest persisted date
    Resumed { latest: NaiveDate },
    /// Table was empty
    Default,
    /// Cursor query failed; default used instead
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCursor {
    pub next: NaiveDate,
    pub source: CursorSource,
}

/// `MAX(column)` over a date column, `None` for an empty table
pub fn max_date(conn: &Connection, table: &str, column: &str) -> Result<Option<NaiveDate>> {
    let sql = format!("SELECT MAX({}) FROM {}", column, table);
    let latest: Option<NaiveDate> = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(latest)
}

/// `date` minus `days` days; an out-of-range result is `InvalidArgument`
pub fn date_minus_days(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| EngineError::InvalidArgument(format!("{} days before {}", days, date)))
}

/// Same as `date_minus_days` for a timestamp
pub fn time_minus_days(now: NaiveDateTime, days: u32) -> Result<NaiveDateTime> {
    now.checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| EngineError::InvalidArgument(format!("{} days before {}", days, now)))
}

/// Default start point: `today` minus `span_months` calendar months
pub fn default_start(today: NaiveDate, span_months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(span_months))
        .unwrap_or(today)
}

/// Turn a cursor lookup into the next generation date
///
/// Pure so that the fallback path is testable without a broken database.
pub fn next_date(
    lookup: Result<Option<NaiveDate>>,
    today: NaiveDate,
    span_months: u32,
) -> DateCursor {
    match lookup {
        Ok(Some(latest)) => match latest.succ_opt() {
            Some(next) => DateCursor {
                next,
                source: CursorSource::Resumed { latest },
            },
            None => {
                log::warn!("⚠️  Latest date {} has no successor, using default start", latest);
                DateCursor {
                    next: default_start(today, span_months),
                    source: CursorSource::Fallback,
                }
            }
        },
        Ok(None) => DateCursor {
            next: default_start(today, span_months),
            source: CursorSource::Default,
        },
        Err(e) => {
            log::warn!("⚠️  Cursor lookup failed, using default start: {}", e);
            DateCursor {
                next: default_start(today, span_months),
                source: CursorSource::Fallback,
            }
        }
    }
}

impl SqliteStore {
    /// Next `reading_date` for the power stream
    pub fn resolve_power_cursor(&self, today: NaiveDate, span_months: u32) -> DateCursor {
        let lookup = max_date(self.conn(), &self.tables().power, "reading_date");
        let cursor = next_date(lookup, today, span_months);

        match cursor.source {
            CursorSource::Resumed { latest } => log::info!(
                "📅 Latest power reading {}; resuming at {}",
                latest,
                cursor.next
            ),
            CursorSource::Default => log::info!(
                "📅 No power readings yet; starting at {}",
                cursor.next
            ),
            CursorSource::Fallback => {}
        }

        cursor
    }
}

/// The simulated-time grid of one backfill run
///
/// Day `d` starts at midnight of `first_day + d`; reading `r` within it is
/// `r * (24 / readings_per_day)` whole hours later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillWindow {
    pub first_day: NaiveDate,
    pub days: u32,
    pub readings_per_day: u32,
}

impl BackfillWindow {
    /// Window of `days` days ending the day before `today`
    pub fn ending_before(today: NaiveDate, days: u32, readings_per_day: u32) -> Result<Self> {
        if days == 0 || !(1..=24).contains(&readings_per_day) {
            return Err(EngineError::InvalidArgument(format!(
                "backfill needs days >= 1 and 1..=24 readings per day (got {} x {})",
                days, readings_per_day
            )));
        }

        let first_day = date_minus_days(today, days)?;

        Ok(Self {
            first_day,
            days,
            readings_per_day,
        })
    }

    pub fn step_hours(&self) -> u32 {
        24 / self.readings_per_day
    }

    pub fn day_start(&self, day: u32) -> NaiveDateTime {
        (self.first_day + Days::new(u64::from(day))).and_time(chrono::NaiveTime::MIN)
    }

    pub fn timestamp(&self, day: u32, reading: u32) -> NaiveDateTime {
        self.day_start(day) + Duration::hours(i64::from(reading * self.step_hours()))
    }

    /// Rows a backfill over `locations` locations will write
    pub fn total_rows(&self, locations: usize) -> u64 {
        locations as u64 * u64::from(self.days) * u64::from(self.readings_per_day)
    }
}
