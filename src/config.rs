//! Engine configuration from environment variables
//!
//! Loaded once at startup. Any problem here is fatal: binaries exit before a
//! single row is generated.

use crate::error::ConfigError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for day-count settings (about a century)
pub const MAX_DAY_SPAN: u32 = 36_500;

/// Longest identifier accepted for a configurable table name
const MAX_IDENTIFIER_LEN: usize = 64;

/// Check a configurable table name against `[A-Za-z_][A-Za-z0-9_]*`
///
/// Table names are spliced into SQL text, so anything else is rejected.
pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_head && valid_tail && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

/// Table identity per domain
#[derive(Debug, Clone, PartialEq)]
pub struct TableNames {
    pub air_quality: String,
    pub noise: String,
    pub power: String,
    pub power_stats: String,
    pub junction: String,
    pub parking: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            air_quality: "air_quality_readings".to_string(),
            noise: "noise_level_readings".to_string(),
            power: "power_readings".to_string(),
            power_stats: "power_stats".to_string(),
            junction: "junction_state".to_string(),
            parking: "parking_spots".to_string(),
        }
    }
}

impl TableNames {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [
            &self.air_quality,
            &self.noise,
            &self.power,
            &self.power_stats,
            &self.junction,
            &self.parking,
        ] {
            validate_identifier(name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite database file
    pub db_path: String,

    pub tables: TableNames,

    /// Backfill horizon in days
    pub days_to_generate: u32,

    /// Readings per location per simulated day (1..=24)
    pub readings_per_day: u32,

    pub traffic_cycle_delay_ms: u64,

    pub power_cycle_delay_ms: u64,

    /// Trim power history every N live cycles (0 = only on request)
    pub power_trim_every_cycles: u32,

    /// Days of power history the live trim keeps
    pub power_retention_days: u32,

    /// Power cursor default: today minus this many months
    pub power_default_span_months: u32,

    pub parking_update_chance_percent: u8,

    /// Fixed seed for reproducible runs
    pub rng_seed: Option<u64>,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `CITYFEED_DB_PATH` (required)
    /// - `DB_AIR_QUALITY_TABLE`, `DB_NOISE_TABLE`, `DB_POWER_TABLE`,
    ///   `DB_POWER_STATS_TABLE`, `DB_JUNCTION_TABLE`, `DB_PARKING_TABLE`
    /// - `DAYS_TO_GENERATE` (default: 30)
    /// - `READINGS_PER_DAY` (default: 4)
    /// - `TRAFFIC_CYCLE_DELAY_MS` (default: 5000)
    /// - `POWER_CYCLE_DELAY_MS` (default: 1000)
    /// - `POWER_TRIM_EVERY_CYCLES` (default: 100)
    /// - `POWER_RETENTION_DAYS` (default: 365)
    /// - `POWER_DEFAULT_SPAN_MONTHS` (default: 3)
    /// - `PARKING_UPDATE_CHANCE_PERCENT` (default: 100)
    /// - `RNG_SEED` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("CITYFEED_DB_PATH")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVariable("CITYFEED_DB_PATH".to_string()))?;

        let defaults = TableNames::default();
        let table = |key: &str, default: String| lookup(key).unwrap_or(default);
        let tables = TableNames {
            air_quality: table("DB_AIR_QUALITY_TABLE", defaults.air_quality),
            noise: table("DB_NOISE_TABLE", defaults.noise),
            power: table("DB_POWER_TABLE", defaults.power),
            power_stats: table("DB_POWER_STATS_TABLE", defaults.power_stats),
            junction: table("DB_JUNCTION_TABLE", defaults.junction),
            parking: table("DB_PARKING_TABLE", defaults.parking),
        };
        tables.validate()?;

        let config = Self {
            db_path,
            tables,
            days_to_generate: parse_var(&lookup, "DAYS_TO_GENERATE", 30)?,
            readings_per_day: parse_var(&lookup, "READINGS_PER_DAY", 4)?,
            traffic_cycle_delay_ms: parse_var(&lookup, "TRAFFIC_CYCLE_DELAY_MS", 5_000)?,
            power_cycle_delay_ms: parse_var(&lookup, "POWER_CYCLE_DELAY_MS", 1_000)?,
            power_trim_every_cycles: parse_var(&lookup, "POWER_TRIM_EVERY_CYCLES", 100)?,
            power_retention_days: parse_var(&lookup, "POWER_RETENTION_DAYS", 365)?,
            power_default_span_months: parse_var(&lookup, "POWER_DEFAULT_SPAN_MONTHS", 3)?,
            parking_update_chance_percent: parse_var(&lookup, "PARKING_UPDATE_CHANCE_PERCENT", 100)?,
            rng_seed: lookup("RNG_SEED")
                .map(|s| {
                    s.trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue(format!("RNG_SEED={}", s)))
                })
                .transpose()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.days_to_generate == 0 {
            return Err(ConfigError::InvalidValue(
                "DAYS_TO_GENERATE must be at least 1".to_string(),
            ));
        }

        if !(1..=24).contains(&self.readings_per_day) {
            return Err(ConfigError::InvalidValue(format!(
                "READINGS_PER_DAY must be between 1 and 24, got {}",
                self.readings_per_day
            )));
        }

        for (key, days) in [
            ("DAYS_TO_GENERATE", self.days_to_generate),
            ("POWER_RETENTION_DAYS", self.power_retention_days),
            ("POWER_DEFAULT_SPAN_MONTHS", self.power_default_span_months.saturating_mul(31)),
        ] {
            if days > MAX_DAY_SPAN {
                return Err(ConfigError::InvalidValue(format!(
                    "{} spans more than {} days",
                    key, MAX_DAY_SPAN
                )));
            }
        }

        if self.parking_update_chance_percent > 100 {
            return Err(ConfigError::InvalidValue(format!(
                "PARKING_UPDATE_CHANCE_PERCENT must be at most 100, got {}",
                self.parking_update_chance_percent
            )));
        }

        self.tables.validate()
    }

    pub fn traffic_cycle_delay(&self) -> Duration {
        Duration::from_millis(self.traffic_cycle_delay_ms)
    }

    pub fn power_cycle_delay(&self) -> Duration {
        Duration::from_millis(self.power_cycle_delay_ms)
    }

    /// Random source for generators: seeded when `RNG_SEED` is set
    pub fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{}={}", key, raw))),
    }
}
