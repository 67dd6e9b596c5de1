//! Row types for the reading streams and the current-state tables
//!
//! Reading rows are immutable once written; state rows are keyed and
//! overwritten in place (see `store::state`).

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Air-quality classification, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityIndex {
    Good,
    Moderate,
    Poor,
    Hazardous,
}

impl QualityIndex {
    pub const ALL: [QualityIndex; 4] = [
        QualityIndex::Good,
        QualityIndex::Moderate,
        QualityIndex::Poor,
        QualityIndex::Hazardous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityIndex::Good => "Good",
            QualityIndex::Moderate => "Moderate",
            QualityIndex::Poor => "Poor",
            QualityIndex::Hazardous => "Hazardous",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == s)
    }

    /// Labels that the dashboard raises as alerts
    pub fn is_alert(&self) -> bool {
        matches!(self, QualityIndex::Poor | QualityIndex::Hazardous)
    }
}

impl fmt::Display for QualityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Noise-monitoring zone; each carries its own legal limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneType {
    Residential,
    Commercial,
    Industrial,
    Silence,
}

impl ZoneType {
    /// Round-robin order used when assigning zones to noise locations
    pub const ROTATION: [ZoneType; 4] = [
        ZoneType::Residential,
        ZoneType::Commercial,
        ZoneType::Industrial,
        ZoneType::Silence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Residential => "Residential",
            ZoneType::Commercial => "Commercial",
            ZoneType::Industrial => "Industrial",
            ZoneType::Silence => "Silence Zone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ROTATION.into_iter().find(|z| z.as_str() == s)
    }

    /// Decibel limit for the zone
    pub fn limit_db(&self) -> f64 {
        match self {
            ZoneType::Residential => 55.0,
            ZoneType::Commercial => 65.0,
            ZoneType::Industrial => 75.0,
            ZoneType::Silence => 50.0,
        }
    }

    /// Multiplier applied to a location's baseline level
    pub fn baseline_factor(&self) -> f64 {
        match self {
            ZoneType::Industrial => 1.1,
            ZoneType::Commercial => 1.0,
            ZoneType::Residential => 0.9,
            ZoneType::Silence => 0.8,
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! text_column {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                <$ty>::parse(s).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {} label: {}", stringify!($ty), s).into())
                })
            }
        }
    };
}

text_column!(QualityIndex);
text_column!(ZoneType);

/// A noise-monitoring location together with its zone assignment
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSite {
    pub location: String,
    pub zone: ZoneType,
}

impl NoiseSite {
    /// Pair each location with a zone, cycling through `ZoneType::ROTATION` by index
    pub fn assign<S: AsRef<str>>(locations: &[S]) -> Vec<NoiseSite> {
        locations
            .iter()
            .enumerate()
            .map(|(i, loc)| NoiseSite {
                location: loc.as_ref().to_string(),
                zone: ZoneType::ROTATION[i % ZoneType::ROTATION.len()],
            })
            .collect()
    }
}

/// Generated air-quality sample, before storage assigns an id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualitySample {
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub pm25: f64,
    pub pm10: f64,
    pub ozone: f64,
    pub quality_index: QualityIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityReading {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub pm25: f64,
    pub pm10: f64,
    pub ozone: f64,
    pub quality_index: QualityIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseSample {
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub decibel_level: f64,
    pub zone: ZoneType,
    pub exceeds_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseReading {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub decibel_level: f64,
    pub zone: ZoneType,
    pub exceeds_limit: bool,
}

/// One simulated day of power consumption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSample {
    pub reading_date: NaiveDate,
    pub power_consumed: f64,
    pub fault_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerReading {
    pub id: i64,
    pub reading_date: NaiveDate,
    pub power_consumed: f64,
    pub fault_detected: bool,
}

/// Lane counts for one junction and the lane that gets the green light
///
/// `green_lane` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneSnapshot {
    pub lanes: [u32; 4],
    pub green_lane: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JunctionState {
    pub junction_id: String,
    pub lanes: [u32; 4],
    pub green_lane: u8,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingSpot {
    pub spot_id: String,
    pub location_description: String,
    pub is_occupied: bool,
    pub last_updated: NaiveDateTime,
}
