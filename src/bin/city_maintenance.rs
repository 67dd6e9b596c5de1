//! City Maintenance - explicit cleanup actions and dashboard snapshots
//!
//! Usage:
//!   city_maintenance trim-environmental <days_to_keep>
//!   city_maintenance trim-power
//!   city_maintenance trim-junctions
//!   city_maintenance power-report [YYYY-MM]
//!   city_maintenance snapshot
//!   city_maintenance alerts <days_back>
//!   city_maintenance summary <location> <days_back>
//!   city_maintenance faults <days_back>
//!
//! Cleanup and report actions print one marker-prefixed line (`Success:`,
//! `Error:` or `Info:`); the query actions print JSON.

use chrono::{NaiveDate, Utc};
use cityfeed::config::MAX_DAY_SPAN;
use cityfeed::maintenance::{self, Marker};
use cityfeed::{EngineConfig, SqliteStore};
use dotenv::dotenv;
use log::error;
use serde_json::json;
use std::env;
use std::process::ExitCode;

enum Command {
    TrimEnvironmental { days: u32 },
    TrimPower,
    TrimJunctions,
    PowerReport { month: Option<NaiveDate> },
    Snapshot,
    Alerts { days: u32 },
    Summary { location: String, days: u32 },
    Faults { days: u32 },
}

fn parse_days(value: Option<&String>) -> Result<u32, String> {
    value
        .and_then(|v| v.parse().ok())
        .filter(|days| *days <= MAX_DAY_SPAN)
        .ok_or_else(|| format!("expected a day count up to {}", MAX_DAY_SPAN))
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let command = match args.first().map(|s| s.as_str()) {
        Some("trim-environmental") => Command::TrimEnvironmental {
            days: parse_days(args.get(1))?,
        },
        Some("trim-power") => Command::TrimPower,
        Some("trim-junctions") => Command::TrimJunctions,
        Some("power-report") => Command::PowerReport {
            month: args
                .get(1)
                .map(|m| {
                    NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d")
                        .map_err(|_| format!("expected YYYY-MM, got {}", m))
                })
                .transpose()?,
        },
        Some("snapshot") => Command::Snapshot,
        Some("alerts") => Command::Alerts {
            days: parse_days(args.get(1))?,
        },
        Some("summary") => Command::Summary {
            location: args.get(1).cloned().ok_or("expected a location")?,
            days: parse_days(args.get(2))?,
        },
        Some("faults") => Command::Faults {
            days: parse_days(args.get(1))?,
        },
        other => return Err(format!("unknown command {:?}", other)),
    };
    Ok(command)
}

fn run(store: &mut SqliteStore, command: Command) -> Result<String, Box<dyn std::error::Error>> {
    let now = Utc::now().naive_utc();

    let output = match command {
        Command::TrimEnvironmental { days } => maintenance::delete_old_environmental(store, days, now),
        Command::TrimPower => maintenance::delete_power_before_latest_month(store),
        Command::TrimJunctions => maintenance::delete_old_junction_states(store, now.date()),
        Command::PowerReport { month } => maintenance::power_month_report(store, month),
        Command::Snapshot => json!({
            "air_quality": store.latest_air_quality()?,
            "noise": store.latest_noise()?,
            "power": store.latest_power_reading()?,
            "junctions": store.latest_junction_states()?,
            "parking": store.parking_spots()?,
        })
        .to_string(),
        Command::Alerts { days } => json!({
            "air_quality_alerts": store.air_quality_alerts(days, now)?,
            "noise_violations": store.noise_violations(days, now)?,
        })
        .to_string(),
        Command::Summary { location, days } => {
            serde_json::to_string(&store.air_quality_summary(&location, days, now)?)?
        }
        Command::Faults { days } => serde_json::to_string(&store.recent_power_faults(days, now.date())?)?,
    };
    Ok(output)
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut store = match SqliteStore::open(&config.db_path, config.tables.clone()) {
        Ok(store) => store,
        Err(e) => {
            error!("❌ Failed to open database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&mut store, command) {
        Ok(output) => {
            println!("{}", output);
            if Marker::of(&output) == Some(Marker::Error) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("❌ Query failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
