//! Air-quality value model
//!
//! Each location has a fixed (pm2.5, pm10, ozone) baseline. A sample is the
//! baseline plus a centred uniform jitter, floored at a per-pollutant minimum.

use crate::classify::quality_index;
use crate::types::AirQualitySample;
use chrono::NaiveDateTime;
use rand::Rng;

/// Default monitoring locations
pub const AIR_QUALITY_LOCATIONS: [&str; 8] = [
    "Downtown",
    "Industrial Zone",
    "Residential Area",
    "City Park",
    "Shopping District",
    "University Campus",
    "Suburban Area",
    "Highway Junction",
];

/// Range, jitter width and floor for one pollutant
#[derive(Debug, Clone, Copy)]
pub struct Pollutant {
    pub min: f64,
    pub max: f64,
    pub spread: f64,
    pub floor: f64,
}

pub const PM25: Pollutant = Pollutant { min: 10.0, max: 30.0, spread: 15.0, floor: 1.0 };
pub const PM10: Pollutant = Pollutant { min: 20.0, max: 50.0, spread: 25.0, floor: 2.0 };
pub const OZONE: Pollutant = Pollutant { min: 30.0, max: 70.0, spread: 20.0, floor: 5.0 };

impl Pollutant {
    /// Baseline for a location; unknown locations sit at the range midpoint
    pub fn baseline(&self, location: &str) -> f64 {
        let (min, max) = (self.min, self.max);
        match location {
            "Industrial Zone" => max * 0.9,
            "Highway Junction" => max * 0.8,
            "Residential Area" => min * 1.5,
            "Suburban Area" => min * 1.3,
            "University Campus" => min * 1.2,
            "City Park" => min,
            _ => (min + max) / 2.0,
        }
    }

    /// Value for a unit draw `u` in `[0, 1)`
    pub fn value(&self, base: f64, u: f64) -> f64 {
        (base + u * self.spread - self.spread / 2.0).max(self.floor)
    }
}

/// Per-location baseline triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirBaseline {
    pub pm25: f64,
    pub pm10: f64,
    pub ozone: f64,
}

impl AirBaseline {
    pub fn for_location(location: &str) -> Self {
        Self {
            pm25: PM25.baseline(location),
            pm10: PM10.baseline(location),
            ozone: OZONE.baseline(location),
        }
    }

    /// Pollutant triple for three unit draws
    pub fn values(&self, draws: [f64; 3]) -> (f64, f64, f64) {
        (
            PM25.value(self.pm25, draws[0]),
            PM10.value(self.pm10, draws[1]),
            OZONE.value(self.ozone, draws[2]),
        )
    }
}

/// Generate one classified air-quality sample
pub fn sample<R: Rng + ?Sized>(
    rng: &mut R,
    baseline: &AirBaseline,
    location: &str,
    timestamp: NaiveDateTime,
) -> AirQualitySample {
    let draws = [rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()];
    let (pm25, pm10, ozone) = baseline.values(draws);

    AirQualitySample {
        timestamp,
        location: location.to_string(),
        pm25,
        pm10,
        ozone,
        quality_index: quality_index(pm25, pm10, ozone),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_baselines_follow_location_table() {
        assert_eq!(PM25.baseline("City Park"), 10.0);
        assert_eq!(PM25.baseline("Industrial Zone"), 27.0);
        assert_eq!(PM10.baseline("Downtown"), 35.0);
        assert_eq!(OZONE.baseline("Residential Area"), 45.0);
        // Unrecognised locations fall back to the midpoint
        assert_eq!(OZONE.baseline("Nowhere"), 50.0);
    }

    #[test]
    fn test_values_never_drop_below_floor() {
        for location in AIR_QUALITY_LOCATIONS.iter().chain(["Unknown"].iter()) {
            let base = AirBaseline::for_location(location);
            for u in [0.0, 0.25, 0.5, 0.999_999] {
                let (pm25, pm10, ozone) = base.values([u, u, u]);
                assert!(pm25 >= 1.0, "{location}: pm25 {pm25}");
                assert!(pm10 >= 2.0, "{location}: pm10 {pm10}");
                assert!(ozone >= 5.0, "{location}: ozone {ozone}");
            }
        }
    }

    #[test]
    fn test_floor_applies_to_low_baseline() {
        let low = AirBaseline { pm25: 0.5, pm10: 0.5, ozone: 0.5 };
        assert_eq!(low.values([0.0, 0.0, 0.0]), (1.0, 2.0, 5.0));
    }

    #[test]
    fn test_jitter_is_centred_on_baseline() {
        let base = AirBaseline::for_location("Downtown");
        let (pm25, pm10, ozone) = base.values([0.5, 0.5, 0.5]);
        assert_eq!((pm25, pm10, ozone), (20.0, 35.0, 50.0));
    }

    #[test]
    fn test_sample_is_deterministic_for_seed() {
        let base = AirBaseline::for_location("Highway Junction");
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();

        let a = sample(&mut StdRng::seed_from_u64(7), &base, "Highway Junction", ts);
        let b = sample(&mut StdRng::seed_from_u64(7), &base, "Highway Junction", ts);
        assert_eq!(a, b);
        assert_eq!(a.quality_index, quality_index(a.pm25, a.pm10, a.ozone));
    }
}
