//! Unbounded real-time generation loops
//!
//! Each iteration is one `LiveCycle::run_cycle` call: generate, classify,
//! persist and maybe trim inside a single transaction. The loop then sleeps
//! for the configured delay. The sleep is the only suspension point and it
//! races the shutdown future, so an interrupt never lands mid-transaction.

use super::cadence::RetentionCadence;
use crate::error::Result;
use crate::simulation::{power, traffic, JUNCTION_ID};
use crate::store::cursor::date_minus_days;
use crate::store::retention::{delete_before, trim_power_before};
use crate::store::state::{update_random_parking_spot, upsert_junction};
use crate::store::writer::insert_power;
use crate::store::{ParkingUpdate, SqliteStore};
use crate::types::{LaneSnapshot, PowerSample};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// What one committed cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    Traffic {
        snapshot: LaneSnapshot,
        /// `None` when the cycle skipped the parking update
        parking: Option<ParkingUpdate>,
        /// Junction rows deleted, when the trim ran
        trimmed: Option<usize>,
    },
    Power {
        sample: PowerSample,
        trimmed: Option<usize>,
    },
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleReport::Traffic { snapshot, parking, trimmed } => {
                write!(f, "lanes {:?} green {}", snapshot.lanes, snapshot.green_lane)?;
                match parking {
                    Some(ParkingUpdate::Updated { spot_id, occupied }) => {
                        write!(f, ", {} occupied={}", spot_id, occupied)?
                    }
                    Some(ParkingUpdate::NoSpotsFound) => write!(f, ", no parking spots found")?,
                    None => {}
                }
                if let Some(rows) = trimmed {
                    write!(f, ", trimmed {} junction rows", rows)?;
                }
                Ok(())
            }
            CycleReport::Power { sample, trimmed } => {
                write!(
                    f,
                    "{} {:.2} kWh fault={}",
                    sample.reading_date, sample.power_consumed, sample.fault_detected
                )?;
                if let Some(rows) = trimmed {
                    write!(f, ", trimmed {} power rows", rows)?;
                }
                Ok(())
            }
        }
    }
}

/// One domain's live cycle
pub trait LiveCycle {
    fn name(&self) -> &'static str;

    /// Run and commit one cycle; on `Err` nothing from the cycle is persisted
    fn run_cycle(&mut self, store: &mut SqliteStore, now: NaiveDateTime) -> Result<CycleReport>;
}

/// Junction upsert plus an occasional random parking update
pub struct TrafficCycle<R> {
    rng: R,
    parking_chance_percent: u8,
    junction_trim: RetentionCadence,
}

impl<R: Rng> TrafficCycle<R> {
    pub fn new(rng: R, parking_chance_percent: u8, junction_trim: RetentionCadence) -> Self {
        Self {
            rng,
            parking_chance_percent,
            junction_trim,
        }
    }
}

impl<R: Rng> LiveCycle for TrafficCycle<R> {
    fn name(&self) -> &'static str {
        "Traffic"
    }

    fn run_cycle(&mut self, store: &mut SqliteStore, now: NaiveDateTime) -> Result<CycleReport> {
        let snapshot = traffic::lane_snapshot(&mut self.rng);
        let update_parking = traffic::parking_update_due(&mut self.rng, self.parking_chance_percent);
        let trim = self.junction_trim.tick();
        let (junction, parking) = (store.tables().junction.clone(), store.tables().parking.clone());

        let outcome = (|| -> Result<(Option<ParkingUpdate>, Option<usize>)> {
            let tx = store.transaction()?;
            // Trim first so the row written below is never the one deleted
            let trimmed = if trim {
                Some(delete_before(&tx, &junction, "last_updated", &now.date())?)
            } else {
                None
            };
            upsert_junction(&tx, &junction, JUNCTION_ID, &snapshot)?;
            let parking_update = if update_parking {
                Some(update_random_parking_spot(&tx, &parking, &mut self.rng)?)
            } else {
                None
            };
            tx.commit()?;
            Ok((parking_update, trimmed))
        })();

        match outcome {
            Ok((parking, trimmed)) => {
                if parking == Some(ParkingUpdate::NoSpotsFound) {
                    log::warn!("⚠️  No parking spots found to update");
                }
                Ok(CycleReport::Traffic {
                    snapshot,
                    parking,
                    trimmed,
                })
            }
            Err(e) => {
                self.junction_trim.rewind(trim);
                Err(e)
            }
        }
    }
}

/// One simulated day of power consumption per cycle
///
/// The date cursor is resolved from storage on the first cycle and only
/// advances after a commit, so a rolled-back cycle retries the same day.
pub struct PowerCycle<R> {
    rng: R,
    cursor: Option<NaiveDate>,
    default_span_months: u32,
    retention_days: u32,
    trim: RetentionCadence,
}

impl<R: Rng> PowerCycle<R> {
    pub fn new(rng: R, default_span_months: u32, retention_days: u32, trim: RetentionCadence) -> Self {
        Self {
            rng,
            cursor: None,
            default_span_months,
            retention_days,
            trim,
        }
    }

    /// Date the next cycle will generate, if already resolved
    pub fn cursor(&self) -> Option<NaiveDate> {
        self.cursor
    }
}

fn persist_power(
    store: &mut SqliteStore,
    sample: &PowerSample,
    trim_before: Option<NaiveDate>,
) -> Result<Option<usize>> {
    let table = store.tables().power.clone();
    let tx = store.transaction()?;
    insert_power(&tx, &table, sample)?;
    let trimmed = match trim_before {
        Some(cutoff) => Some(trim_power_before(&tx, &table, cutoff)?),
        None => None,
    };
    tx.commit()?;
    Ok(trimmed)
}

impl<R: Rng> LiveCycle for PowerCycle<R> {
    fn name(&self) -> &'static str {
        "Power"
    }

    fn run_cycle(&mut self, store: &mut SqliteStore, now: NaiveDateTime) -> Result<CycleReport> {
        let today = now.date();
        let date = match self.cursor {
            Some(date) => date,
            None => store.resolve_power_cursor(today, self.default_span_months).next,
        };

        let sample = power::sample(&mut self.rng, date);
        let trim = self.trim.tick();
        let written = match trim.then(|| date_minus_days(today, self.retention_days)).transpose() {
            Ok(cutoff) => persist_power(store, &sample, cutoff),
            Err(e) => Err(e),
        };

        match written {
            Ok(trimmed) => {
                // `None` past the last representable date: re-resolve next cycle
                self.cursor = date.succ_opt();
                Ok(CycleReport::Power { sample, trimmed })
            }
            Err(e) => {
                self.cursor = Some(date);
                self.trim.rewind(trim);
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Shutdown future resolved during the inter-cycle delay
    Interrupted { cycles: u64 },
    /// `max_cycles` reached
    Completed { cycles: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct LiveOptions {
    pub delay: Duration,
    /// `None` runs until shutdown
    pub max_cycles: Option<u64>,
}

impl LiveOptions {
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_cycles: None,
        }
    }
}

/// Drive `cycle` until shutdown, `max_cycles`, or a connection failure
///
/// Failed cycles are logged and the loop moves on; only errors for which
/// `is_connection_failure()` holds end the loop with `Err`.
pub async fn run_live<C, F>(
    store: &mut SqliteStore,
    cycle: &mut C,
    options: LiveOptions,
    shutdown: F,
) -> Result<LoopExit>
where
    C: LiveCycle + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let name = cycle.name();
    let mut cycles: u64 = 0;
    let mut failures: u64 = 0;

    log::info!(
        "⏰ Starting {} loop (delay: {}ms)",
        name,
        options.delay.as_millis()
    );

    loop {
        match cycle.run_cycle(store, Utc::now().naive_utc()) {
            Ok(report) => log::debug!("✅ {} cycle {}: {}", name, cycles + 1, report),
            Err(e) if e.is_connection_failure() => {
                log::error!("❌ {} loop stopping, database unavailable: {}", name, e);
                return Err(e);
            }
            Err(e) => {
                failures += 1;
                log::error!("❌ {} cycle {} rolled back: {}", name, cycles + 1, e);
            }
        }
        cycles += 1;

        if options.max_cycles.is_some_and(|max| cycles >= max) {
            log::info!("🏁 {} loop finished: {} cycles, {} failed", name, cycles, failures);
            return Ok(LoopExit::Completed { cycles });
        }

        tokio::select! {
            _ = &mut shutdown => {
                log::info!("🛑 {} loop interrupted after {} cycles ({} failed)", name, cycles, failures);
                return Ok(LoopExit::Interrupted { cycles });
            }
            _ = tokio::time::sleep(options.delay) => {}
        }
    }
}
