//! cityfeed - synthetic data engine for a municipal dashboard
//!
//! Generates air quality, noise, junction/parking and power data, resumes
//! streams across restarts, keeps current-state tables at one row per key and
//! trims history under a retention policy. Everything lives in one SQLite
//! database reached through `store::SqliteStore`.

pub mod classify;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod scheduler;
pub mod simulation;
pub mod sqlite_pragma;
pub mod store;
pub mod types;

pub use config::{EngineConfig, TableNames};
pub use error::{ConfigError, EngineError, Result};
pub use store::SqliteStore;
