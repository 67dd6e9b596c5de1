//! Labels derived from generated values
//!
//! Both classifiers are total: every numeric input maps to exactly one label.
//! Thresholds use strict `>` comparisons throughout.

use crate::types::{QualityIndex, ZoneType};

/// (pm2.5, pm10, ozone) thresholds, checked worst-first
const QUALITY_THRESHOLDS: [(QualityIndex, f64, f64, f64); 3] = [
    (QualityIndex::Hazardous, 35.0, 150.0, 70.0),
    (QualityIndex::Poor, 25.0, 100.0, 55.0),
    (QualityIndex::Moderate, 15.0, 50.0, 40.0),
];

/// Classify a pollutant triple into a `QualityIndex`
///
/// A single pollutant over a threshold is enough to reach that band.
pub fn quality_index(pm25: f64, pm10: f64, ozone: f64) -> QualityIndex {
    QUALITY_THRESHOLDS
        .iter()
        .find(|(_, pm25_max, pm10_max, ozone_max)| {
            pm25 > *pm25_max || pm10 > *pm10_max || ozone > *ozone_max
        })
        .map(|(label, _, _, _)| *label)
        .unwrap_or(QualityIndex::Good)
}

/// Whether a decibel level is above the zone's limit
pub fn exceeds_limit(decibel_level: f64, zone: ZoneType) -> bool {
    decibel_level > zone.limit_db()
}
