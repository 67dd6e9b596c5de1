//! Read-only accessors for the dashboard layer
//!
//! All of these are plain aggregate or projection queries over the tables the
//! generators write. Empty results are `Ok(vec![])` / `Ok(None)`; only a
//! failed query is an `Err`.

use super::cursor::{date_minus_days, time_minus_days};
use super::SqliteStore;
use crate::error::{EngineError, Result};
use crate::store::state::MonthlyPowerStats;
use crate::types::{
    AirQualityReading, JunctionState, NoiseReading, ParkingSpot, PowerReading, QualityIndex,
};
use chrono::{Months, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use serde::Serialize;

/// Averages and per-label counts for one air-quality location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualitySummary {
    pub location: String,
    pub since: NaiveDateTime,
    pub reading_count: u32,
    pub avg_pm25: f64,
    pub avg_pm10: f64,
    pub avg_ozone: f64,
    pub good: u32,
    pub moderate: u32,
    pub poor: u32,
    pub hazardous: u32,
}

impl AirQualitySummary {
    pub fn count_for(&self, label: QualityIndex) -> u32 {
        match label {
            QualityIndex::Good => self.good,
            QualityIndex::Moderate => self.moderate,
            QualityIndex::Poor => self.poor,
            QualityIndex::Hazardous => self.hazardous,
        }
    }
}

const AIR_COLUMNS: &str = "id, timestamp, location, pm25_level, pm10_level, ozone_level, quality_index";
const NOISE_COLUMNS: &str = "id, timestamp, location, decibel_level, zone_type, exceeds_limit";
const POWER_COLUMNS: &str = "id, reading_date, power_consumed, fault_detected";

fn air_row(row: &Row<'_>) -> rusqlite::Result<AirQualityReading> {
    Ok(AirQualityReading {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        location: row.get(2)?,
        pm25: row.get(3)?,
        pm10: row.get(4)?,
        ozone: row.get(5)?,
        quality_index: row.get(6)?,
    })
}

fn noise_row(row: &Row<'_>) -> rusqlite::Result<NoiseReading> {
    Ok(NoiseReading {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        location: row.get(2)?,
        decibel_level: row.get(3)?,
        zone: row.get(4)?,
        exceeds_limit: row.get(5)?,
    })
}

fn power_row(row: &Row<'_>) -> rusqlite::Result<PowerReading> {
    Ok(PowerReading {
        id: row.get(0)?,
        reading_date: row.get(1)?,
        power_consumed: row.get(2)?,
        fault_detected: row.get(3)?,
    })
}

/// Month aggregate over `[first_day, first_day + 1 month)`; `None` if no rows
pub fn summarize_power_month(
    conn: &Connection,
    table: &str,
    first_day: NaiveDate,
) -> Result<Option<MonthlyPowerStats>> {
    let next_month = first_day
        .checked_add_months(Months::new(1))
        .ok_or_else(|| EngineError::InvalidArgument(format!("month after {}", first_day)))?;
    let sql = format!(
        "SELECT COUNT(*), COALESCE(SUM(power_consumed), 0.0),
                COALESCE(SUM(CASE WHEN fault_detected THEN 1 ELSE 0 END), 0)
         FROM {} WHERE reading_date >= ?1 AND reading_date < ?2",
        table
    );
    let (days_recorded, total_consumption, fault_count): (u32, f64, u32) = conn
        .prepare_cached(&sql)?
        .query_row(params![first_day, next_month], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;

    if days_recorded == 0 {
        return Ok(None);
    }

    Ok(Some(MonthlyPowerStats {
        year_month: first_day.format("%Y-%m").to_string(),
        first_day,
        days_recorded,
        total_consumption,
        average_consumption: total_consumption / f64::from(days_recorded),
        fault_count,
    }))
}

impl SqliteStore {
    /// Most recent air-quality reading for each location
    pub fn latest_air_quality(&self) -> Result<Vec<AirQualityReading>> {
        let table = &self.tables().air_quality;
        let sql = format!(
            "SELECT {cols} FROM {t} WHERE (location, timestamp) IN
                (SELECT location, MAX(timestamp) FROM {t} GROUP BY location)
             ORDER BY location, id",
            cols = AIR_COLUMNS,
            t = table
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = stmt
            .query_map([], air_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Readings labelled with an alert index (`QualityIndex::is_alert`) from
    /// the last `days_back` days, newest first
    pub fn air_quality_alerts(&self, days_back: u32, now: NaiveDateTime) -> Result<Vec<AirQualityReading>> {
        let since = time_minus_days(now, days_back)?;
        let labels: Vec<QualityIndex> = QualityIndex::ALL.into_iter().filter(|q| q.is_alert()).collect();
        let placeholders: Vec<String> = (0..labels.len()).map(|i| format!("?{}", i + 2)).collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE timestamp >= ?1 AND quality_index IN ({})
             ORDER BY timestamp DESC, id DESC",
            AIR_COLUMNS,
            self.tables().air_quality,
            placeholders.join(", ")
        );

        let mut values: Vec<&dyn ToSql> = vec![&since as &dyn ToSql];
        values.extend(labels.iter().map(|q| q as &dyn ToSql));

        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = stmt
            .query_map(values.as_slice(), air_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn air_quality_summary(
        &self,
        location: &str,
        days_back: u32,
        now: NaiveDateTime,
    ) -> Result<Option<AirQualitySummary>> {
        let since = time_minus_days(now, days_back)?;
        let sql = format!(
            "SELECT COUNT(*), AVG(pm25_level), AVG(pm10_level), AVG(ozone_level),
                    COALESCE(SUM(quality_index = 'Good'), 0),
                    COALESCE(SUM(quality_index = 'Moderate'), 0),
                    COALESCE(SUM(quality_index = 'Poor'), 0),
                    COALESCE(SUM(quality_index = 'Hazardous'), 0)
             FROM {} WHERE location = ?1 AND timestamp >= ?2",
            self.tables().air_quality
        );

        let summary = self
            .conn()
            .prepare_cached(&sql)?
            .query_row(params![location, since], |row| {
                let reading_count: u32 = row.get(0)?;
                if reading_count == 0 {
                    return Ok(None);
                }
                Ok(Some(AirQualitySummary {
                    location: location.to_string(),
                    since,
                    reading_count,
                    avg_pm25: row.get(1)?,
                    avg_pm10: row.get(2)?,
                    avg_ozone: row.get(3)?,
                    good: row.get(4)?,
                    moderate: row.get(5)?,
                    poor: row.get(6)?,
                    hazardous: row.get(7)?,
                }))
            })?;
        Ok(summary)
    }

    /// Most recent noise reading for each location
    pub fn latest_noise(&self) -> Result<Vec<NoiseReading>> {
        let table = &self.tables().noise;
        let sql = format!(
            "SELECT {cols} FROM {t} WHERE (location, timestamp) IN
                (SELECT location, MAX(timestamp) FROM {t} GROUP BY location)
             ORDER BY location, id",
            cols = NOISE_COLUMNS,
            t = table
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = stmt
            .query_map([], noise_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Readings over their zone limit in the last `days_back` days, newest first
    pub fn noise_violations(&self, days_back: u32, now: NaiveDateTime) -> Result<Vec<NoiseReading>> {
        let since = time_minus_days(now, days_back)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE timestamp >= ?1 AND exceeds_limit = 1
             ORDER BY timestamp DESC, id DESC",
            NOISE_COLUMNS,
            self.tables().noise
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params![since], noise_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn latest_power_reading(&self) -> Result<Option<PowerReading>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY reading_date DESC, id DESC LIMIT 1",
            POWER_COLUMNS,
            self.tables().power
        );
        let reading = self
            .conn()
            .prepare_cached(&sql)?
            .query_row([], power_row)
            .optional()?;
        Ok(reading)
    }

    /// Fault days on or after `today - days`, newest first
    pub fn recent_power_faults(&self, days: u32, today: NaiveDate) -> Result<Vec<PowerReading>> {
        let since = date_minus_days(today, days)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE fault_detected = 1 AND reading_date >= ?1
             ORDER BY reading_date DESC, id DESC",
            POWER_COLUMNS,
            self.tables().power
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params![since], power_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Latest row per junction
    pub fn latest_junction_states(&self) -> Result<Vec<JunctionState>> {
        let table = &self.tables().junction;
        let sql = format!(
            "SELECT t1.junction_id, t1.lane_1_vehicles, t1.lane_2_vehicles, t1.lane_3_vehicles,
                    t1.lane_4_vehicles, t1.green_lane_id, t1.last_updated
             FROM {t} t1
             JOIN (SELECT junction_id, MAX(last_updated) AS max_updated FROM {t} GROUP BY junction_id) t2
               ON t1.junction_id = t2.junction_id AND t1.last_updated = t2.max_updated
             ORDER BY t1.junction_id",
            t = table
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(JunctionState {
                    junction_id: row.get(0)?,
                    lanes: [row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?],
                    green_lane: row.get(5)?,
                    last_updated: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn parking_spots(&self) -> Result<Vec<ParkingSpot>> {
        let sql = format!(
            "SELECT spot_id, location_description, is_occupied, last_updated FROM {} ORDER BY spot_id",
            self.tables().parking
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ParkingSpot {
                    spot_id: row.get(0)?,
                    location_description: row.get(1)?,
                    is_occupied: row.get(2)?,
                    last_updated: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
