//! Daily power-consumption value model

use crate::types::PowerSample;
use chrono::NaiveDate;
use rand::Rng;

pub const MIN_POWER_KWH: f64 = 10.0;
pub const POWER_RANGE_KWH: f64 = 5.0;
pub const FAULT_CHANCE_PERCENT: u8 = 5;

/// Consumption for a unit draw `u` in `[0, 1)`
pub fn consumption(u: f64) -> f64 {
    MIN_POWER_KWH + u * POWER_RANGE_KWH
}

pub fn sample<R: Rng + ?Sized>(rng: &mut R, reading_date: NaiveDate) -> PowerSample {
    let power_consumed = consumption(rng.gen::<f64>());
    let fault_detected = rng.gen_range(0..100u8) < FAULT_CHANCE_PERCENT;

    PowerSample {
        reading_date,
        power_consumed,
        fault_detected,
    }
}
