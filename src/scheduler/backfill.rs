//! Bounded historical generation for the cadence-stepped streams
//!
//! Rows are written in `(day, location, reading)` order inside one batch, so
//! each location's stream is strictly increasing in time and a failure
//! anywhere leaves nothing committed.

use crate::error::Result;
use crate::simulation::{air_quality, noise, AirBaseline};
use crate::store::{BackfillWindow, SqliteStore};
use crate::types::NoiseSite;
use rand::Rng;

/// Generate and persist air-quality readings for every location over `window`
///
/// Returns the number of committed rows, `locations × days × readings_per_day`.
pub fn backfill_air_quality<R, S>(
    store: &mut SqliteStore,
    rng: &mut R,
    window: &BackfillWindow,
    locations: &[S],
) -> Result<u64>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    let baselines: Vec<(&str, AirBaseline)> = locations
        .iter()
        .map(|l| (l.as_ref(), AirBaseline::for_location(l.as_ref())))
        .collect();
    let total = window.total_rows(baselines.len());

    log::info!(
        "🌫️  Air quality backfill: {} locations x {} days x {} readings from {} ({} rows)",
        baselines.len(),
        window.days,
        window.readings_per_day,
        window.first_day,
        total
    );

    let table = store.tables().air_quality.clone();
    let mut batch = store.begin_batch(&table, "Air quality", total)?;

    for day in 0..window.days {
        for (location, baseline) in &baselines {
            for reading in 0..window.readings_per_day {
                let sample = air_quality::sample(rng, baseline, location, window.timestamp(day, reading));
                batch.append_air_quality(&sample)?;
            }
        }
    }

    let written = batch.commit()?;
    log::info!("✅ Air quality backfill complete: {} rows", written);
    Ok(written)
}

/// Generate and persist noise readings for every site over `window`
pub fn backfill_noise<R: Rng + ?Sized>(
    store: &mut SqliteStore,
    rng: &mut R,
    window: &BackfillWindow,
    sites: &[NoiseSite],
) -> Result<u64> {
    let total = window.total_rows(sites.len());

    log::info!(
        "🔊 Noise backfill: {} locations x {} days x {} readings from {} ({} rows)",
        sites.len(),
        window.days,
        window.readings_per_day,
        window.first_day,
        total
    );

    let table = store.tables().noise.clone();
    let mut batch = store.begin_batch(&table, "Noise", total)?;

    for day in 0..window.days {
        for site in sites {
            for reading in 0..window.readings_per_day {
                let sample = noise::sample(rng, site, window.timestamp(day, reading));
                batch.append_noise(&sample)?;
            }
        }
    }

    let written = batch.commit()?;
    log::info!("✅ Noise backfill complete: {} rows", written);
    Ok(written)
}
