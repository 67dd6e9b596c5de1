//! Cycle scheduling: bounded backfills and live loops
//!
//! Both modes are single-threaded and strictly sequential. Apparent
//! concurrency between domains comes from running separate processes.

pub mod backfill;
pub mod cadence;
pub mod live;

pub use backfill::{backfill_air_quality, backfill_noise};
pub use cadence::RetentionCadence;
pub use live::{run_live, CycleReport, LiveCycle, LiveOptions, LoopExit, PowerCycle, TrafficCycle};
