//! Traffic Generator - live junction and parking state
//!
//! Seeds the parking spots once, then every `TRAFFIC_CYCLE_DELAY_MS` upserts
//! the junction lane counts and flips one random parking spot. Stops on
//! Ctrl+C or after `--cycles N`.
//!
//! Usage:
//!   cargo run --release --bin traffic_generator [-- --cycles N] [-- --trim-every N]

use cityfeed::scheduler::{run_live, LiveOptions, LoopExit, RetentionCadence, TrafficCycle};
use cityfeed::simulation::INITIAL_PARKING_SPOTS;
use cityfeed::{EngineConfig, SqliteStore};
use dotenv::dotenv;
use log::{error, info, warn};
use std::env;

fn parse_u64_arg(name: &str) -> Result<Option<u64>, String> {
    let args: Vec<String> = env::args().collect();

    match args.iter().position(|x| x == name) {
        None => Ok(None),
        Some(idx) => args
            .get(idx + 1)
            .and_then(|v| v.parse().ok())
            .map(Some)
            .ok_or_else(|| format!("{} expects a non-negative integer", name)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️  Ctrl+C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let max_cycles = parse_u64_arg("--cycles")?;
    // Junction history is only trimmed on request unless asked for here
    let trim_every = parse_u64_arg("--trim-every")?.unwrap_or(0);
    let config = EngineConfig::from_env().map_err(|e| {
        error!("❌ Configuration error: {}", e);
        e
    })?;

    info!("🚦 Traffic generator");
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Delay: {}ms", config.traffic_cycle_delay_ms);
    info!("   ├─ Parking update chance: {}%", config.parking_update_chance_percent);
    info!("   └─ Junction trim every: {} cycles (0 = on request)", trim_every);

    let mut store = SqliteStore::open(&config.db_path, config.tables.clone())?;
    let mut rng = config.rng();
    store.seed_parking_spots(&INITIAL_PARKING_SPOTS, &mut rng)?;

    let cadence = RetentionCadence::every(u32::try_from(trim_every).unwrap_or(u32::MAX));
    let mut cycle = TrafficCycle::new(rng, config.parking_update_chance_percent, cadence);
    let options = LiveOptions {
        delay: config.traffic_cycle_delay(),
        max_cycles,
    };

    match run_live(&mut store, &mut cycle, options, shutdown_signal()).await? {
        LoopExit::Interrupted { cycles } => info!("👋 Traffic generator stopped after {} cycles", cycles),
        LoopExit::Completed { cycles } => info!("✅ Traffic generator completed {} cycles", cycles),
    }
    Ok(())
}
