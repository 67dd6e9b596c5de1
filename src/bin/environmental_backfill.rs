//! Environmental Backfill - historical air quality and noise readings
//!
//! Generates `DAYS_TO_GENERATE` days ending yesterday at `READINGS_PER_DAY`
//! readings per location, one transaction per domain.
//!
//! Usage:
//!   cargo run --release --bin environmental_backfill [-- --domain air|noise|all]
//!
//! Environment variables: see `EngineConfig::from_env`

use chrono::Utc;
use cityfeed::scheduler::{backfill_air_quality, backfill_noise};
use cityfeed::simulation::{AIR_QUALITY_LOCATIONS, NOISE_LOCATIONS};
use cityfeed::store::BackfillWindow;
use cityfeed::types::NoiseSite;
use cityfeed::{EngineConfig, SqliteStore};
use dotenv::dotenv;
use log::{error, info};
use serde_json::json;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Domain {
    Air,
    Noise,
    All,
}

fn parse_domain_from_args() -> Result<Domain, String> {
    let args: Vec<String> = env::args().collect();

    match args.iter().position(|x| x == "--domain") {
        None => Ok(Domain::All),
        Some(idx) => match args.get(idx + 1).map(|s| s.as_str()) {
            Some("air") => Ok(Domain::Air),
            Some("noise") => Ok(Domain::Noise),
            Some("all") => Ok(Domain::All),
            other => Err(format!("--domain expects air, noise or all (got {:?})", other)),
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let domain = parse_domain_from_args()?;
    let config = EngineConfig::from_env().map_err(|e| {
        error!("❌ Configuration error: {}", e);
        e
    })?;

    info!("🚀 Environmental backfill");
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Domain: {:?}", domain);
    info!("   ├─ Days: {}", config.days_to_generate);
    info!("   └─ Readings per day: {}", config.readings_per_day);

    let mut store = SqliteStore::open(&config.db_path, config.tables.clone())?;
    let mut rng = config.rng();
    let window = BackfillWindow::ending_before(
        Utc::now().date_naive(),
        config.days_to_generate,
        config.readings_per_day,
    )?;

    let air_rows = if domain != Domain::Noise {
        Some(backfill_air_quality(&mut store, &mut rng, &window, &AIR_QUALITY_LOCATIONS)?)
    } else {
        None
    };

    let noise_rows = if domain != Domain::Air {
        let sites = NoiseSite::assign(&NOISE_LOCATIONS);
        Some(backfill_noise(&mut store, &mut rng, &window, &sites)?)
    } else {
        None
    };

    println!(
        "{}",
        json!({
            "first_day": window.first_day,
            "days": window.days,
            "readings_per_day": window.readings_per_day,
            "air_quality_rows": air_rows,
            "noise_rows": noise_rows,
        })
    );
    Ok(())
}
