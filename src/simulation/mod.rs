//! Value models for each simulated domain
//!
//! Every function here is pure given its random source: no I/O, no hidden
//! state. Functions taking a unit draw `u` in `[0, 1)` are the deterministic
//! core; the `sample` helpers just feed them from an `Rng`.

pub mod air_quality;
pub mod noise;
pub mod power;
pub mod traffic;

pub use air_quality::{AirBaseline, AIR_QUALITY_LOCATIONS};
pub use noise::NOISE_LOCATIONS;
pub use traffic::{INITIAL_PARKING_SPOTS, JUNCTION_ID};
