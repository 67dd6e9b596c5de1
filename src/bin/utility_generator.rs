//! Utility Generator - live daily power consumption
//!
//! Resumes the day after the latest stored `reading_date` (or
//! `POWER_DEFAULT_SPAN_MONTHS` before today), writes one simulated day per
//! `POWER_CYCLE_DELAY_MS`, and trims readings older than
//! `POWER_RETENTION_DAYS` every `POWER_TRIM_EVERY_CYCLES` cycles.
//!
//! Usage:
//!   cargo run --release --bin utility_generator [-- --cycles N]

use cityfeed::scheduler::{run_live, LiveOptions, LoopExit, PowerCycle, RetentionCadence};
use cityfeed::{EngineConfig, SqliteStore};
use dotenv::dotenv;
use log::{error, info, warn};
use std::env;

fn parse_cycles_from_args() -> Result<Option<u64>, String> {
    let args: Vec<String> = env::args().collect();

    match args.iter().position(|x| x == "--cycles") {
        None => Ok(None),
        Some(idx) => args
            .get(idx + 1)
            .and_then(|v| v.parse().ok())
            .map(Some)
            .ok_or_else(|| "--cycles expects a non-negative integer".to_string()),
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

    let max_cycles = parse_cycles_from_args()?;
    let config = EngineConfig::from_env().map_err(|e| {
        error!("❌ Configuration error: {}", e);
        e
    })?;

    info!("⚡ Utility generator");
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Delay: {}ms", config.power_cycle_delay_ms);
    info!(
        "   ├─ Trim: every {} cycles, keep {} days",
        config.power_trim_every_cycles, config.power_retention_days
    );
    info!("   └─ Default start: {} months back", config.power_default_span_months);

    let mut store = SqliteStore::open(&config.db_path, config.tables.clone())?;
    let mut cycle = PowerCycle::new(
        config.rng(),
        config.power_default_span_months,
        config.power_retention_days,
        RetentionCadence::every(config.power_trim_every_cycles),
    );
    let options = LiveOptions {
        delay: config.power_cycle_delay(),
        max_cycles,
    };

    match run_live(&mut store, &mut cycle, options, shutdown_signal()).await? {
        LoopExit::Interrupted { cycles } => info!("👋 Utility generator stopped after {} cycles", cycles),
        LoopExit::Completed { cycles } => info!("✅ Utility generator completed {} cycles", cycles),
    }
    if let Some(next) = cycle.cursor() {
        info!("📅 Next reading date: {}", next);
    }
    Ok(())
}
