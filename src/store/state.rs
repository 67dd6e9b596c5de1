//! Current-state tables: one row per key
//!
//! - Parking spots are seeded with `INSERT OR IGNORE`, so re-seeding never
//!   duplicates a key or disturbs its attributes.
//! - The junction row is upserted (`ON CONFLICT DO UPDATE`) every cycle.
//! - A parking update picks one stored key client-side with the caller's
//!   random source and overwrites only its occupancy flag.
//! - Monthly power statistics are upserted per `year_month`.

use super::cursor::max_date;
use super::queries::summarize_power_month;
use super::retention::month_start;
use super::SqliteStore;
use crate::error::Result;
use crate::simulation::traffic::parking_flip;
use crate::types::LaneSnapshot;
use chrono::NaiveDate;
use rand::Rng;
use rusqlite::{params, Connection};
use serde::Serialize;

/// Outcome of one random parking update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParkingUpdate {
    Updated { spot_id: String, occupied: bool },
    /// The table holds no spots yet
    NoSpotsFound,
}

/// Insert each spot unless its key exists; returns how many were new
pub fn seed_parking_spots<R: Rng + ?Sized>(
    conn: &Connection,
    table: &str,
    spots: &[(&str, &str)],
    rng: &mut R,
) -> Result<usize> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (spot_id, location_description, is_occupied) VALUES (?1, ?2, ?3)",
        table
    );
    let mut stmt = conn.prepare_cached(&sql)?;

    let mut inserted = 0;
    for (spot_id, description) in spots {
        inserted += stmt.execute(params![spot_id, description, rng.gen_bool(0.5)])?;
    }
    Ok(inserted)
}

/// Insert-or-overwrite the lane counts and green lane for `junction_id`
pub fn upsert_junction(
    conn: &Connection,
    table: &str,
    junction_id: &str,
    snapshot: &LaneSnapshot,
) -> Result<usize> {
    let sql = format!(
        r#"
        INSERT INTO {} (
            junction_id, lane_1_vehicles, lane_2_vehicles, lane_3_vehicles,
            lane_4_vehicles, green_lane_id, last_updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, CURRENT_TIMESTAMP)
        ON CONFLICT(junction_id) DO UPDATE SET
            lane_1_vehicles = excluded.lane_1_vehicles,
            lane_2_vehicles = excluded.lane_2_vehicles,
            lane_3_vehicles = excluded.lane_3_vehicles,
            lane_4_vehicles = excluded.lane_4_vehicles,
            green_lane_id = excluded.green_lane_id,
            last_updated = CURRENT_TIMESTAMP
        "#,
        table
    );

    let [l1, l2, l3, l4] = snapshot.lanes;
    let changed = conn.prepare_cached(&sql)?.execute(params![
        junction_id,
        l1,
        l2,
        l3,
        l4,
        snapshot.green_lane,
    ])?;
    Ok(changed)
}

pub fn parking_keys(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let sql = format!("SELECT spot_id FROM {} ORDER BY spot_id", table);
    let mut stmt = conn.prepare_cached(&sql)?;
    let keys = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(keys)
}

/// Flip the occupancy of one uniformly chosen existing spot
pub fn update_random_parking_spot<R: Rng + ?Sized>(
    conn: &Connection,
    table: &str,
    rng: &mut R,
) -> Result<ParkingUpdate> {
    let keys = parking_keys(conn, table)?;

    let Some((spot_id, occupied)) = parking_flip(rng, &keys) else {
        return Ok(ParkingUpdate::NoSpotsFound);
    };

    let sql = format!(
        "UPDATE {} SET is_occupied = ?1, last_updated = CURRENT_TIMESTAMP WHERE spot_id = ?2",
        table
    );
    let changed = conn.prepare_cached(&sql)?.execute(params![occupied, spot_id])?;

    if changed == 0 {
        // Key vanished between the read and the write
        return Ok(ParkingUpdate::NoSpotsFound);
    }

    Ok(ParkingUpdate::Updated {
        spot_id: spot_id.to_string(),
        occupied,
    })
}

/// Aggregate of one calendar month of power readings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPowerStats {
    /// `YYYY-MM`
    pub year_month: String,
    pub first_day: NaiveDate,
    pub days_recorded: u32,
    pub total_consumption: f64,
    pub average_consumption: f64,
    pub fault_count: u32,
}

pub fn upsert_power_stats(conn: &Connection, table: &str, stats: &MonthlyPowerStats) -> Result<usize> {
    let sql = format!(
        r#"
        INSERT INTO {} (
            year_month, total_consumption, fault_count, days_recorded,
            average_consumption, last_updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP)
        ON CONFLICT(year_month) DO UPDATE SET
            total_consumption = excluded.total_consumption,
            fault_count = excluded.fault_count,
            days_recorded = excluded.days_recorded,
            average_consumption = excluded.average_consumption,
            last_updated = CURRENT_TIMESTAMP
        "#,
        table
    );
    let changed = conn.prepare_cached(&sql)?.execute(params![
        stats.year_month,
        stats.total_consumption,
        stats.fault_count,
        stats.days_recorded,
        stats.average_consumption,
    ])?;
    Ok(changed)
}

impl SqliteStore {
    /// Seed the configured parking spots in their own transaction
    pub fn seed_parking_spots<R: Rng + ?Sized>(
        &mut self,
        spots: &[(&str, &str)],
        rng: &mut R,
    ) -> Result<usize> {
        let table = self.tables().parking.clone();
        let tx = self.transaction()?;
        let inserted = seed_parking_spots(&tx, &table, spots, rng)?;
        tx.commit()?;

        log::info!(
            "🅿️  Parking seed: {} new of {} configured spots",
            inserted,
            spots.len()
        );
        Ok(inserted)
    }

    /// Summarize the month starting at `first_day` and upsert its stats row
    ///
    /// `None` when the month has no readings; nothing is written then.
    pub fn record_power_month(&mut self, first_day: NaiveDate) -> Result<Option<MonthlyPowerStats>> {
        let (power, stats_table) = (self.tables().power.clone(), self.tables().power_stats.clone());

        let tx = self.transaction()?;
        let Some(stats) = summarize_power_month(&tx, &power, month_start(first_day))? else {
            return Ok(None);
        };
        upsert_power_stats(&tx, &stats_table, &stats)?;
        tx.commit()?;

        log::info!(
            "📊 Power stats {}: {} days, {:.2} kWh total, {} faults",
            stats.year_month,
            stats.days_recorded,
            stats.total_consumption,
            stats.fault_count
        );
        Ok(Some(stats))
    }

    /// Same as `record_power_month` for the month of the latest reading
    pub fn record_latest_power_month(&mut self) -> Result<Option<MonthlyPowerStats>> {
        match max_date(self.conn(), &self.tables().power, "reading_date")? {
            Some(latest) => self.record_power_month(month_start(latest)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{count_rows, temp_store};
    use super::*;
    use crate::simulation::traffic::INITIAL_PARKING_SPOTS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seed_is_idempotent() {
        let (_dir, mut store) = temp_store();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(store.seed_parking_spots(&INITIAL_PARKING_SPOTS, &mut rng).unwrap(), 5);
        let before: Vec<(String, bool)> = occupancy(&store);

        // Different random draws the second time must not leak into existing rows
        let mut other_rng = StdRng::seed_from_u64(999);
        assert_eq!(store.seed_parking_spots(&INITIAL_PARKING_SPOTS, &mut other_rng).unwrap(), 0);

        assert_eq!(count_rows(&store, "parking_spots"), 5);
        assert_eq!(occupancy(&store), before);
    }

    fn occupancy(store: &SqliteStore) -> Vec<(String, bool)> {
        let mut stmt = store
            .conn()
            .prepare("SELECT spot_id, is_occupied FROM parking_spots ORDER BY spot_id")
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        rows
    }

    #[test]
    fn test_junction_upsert_keeps_single_row() {
        let (_dir, store) = temp_store();
        let first = LaneSnapshot { lanes: [3, 7, 7, 2], green_lane: 2 };
        let second = LaneSnapshot { lanes: [10, 0, 4, 12], green_lane: 4 };

        upsert_junction(store.conn(), "junction_state", "MainJunction", &first).unwrap();
        upsert_junction(store.conn(), "junction_state", "MainJunction", &second).unwrap();

        assert_eq!(count_rows(&store, "junction_state"), 1);
        let (lane4, green): (u32, u8) = store
            .conn()
            .query_row(
                "SELECT lane_4_vehicles, green_lane_id FROM junction_state WHERE junction_id = 'MainJunction'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((lane4, green), (12, 4));
    }

    #[test]
    fn test_parking_update_without_spots() {
        let (_dir, store) = temp_store();
        let mut rng = StdRng::seed_from_u64(4);
        let outcome = update_random_parking_spot(store.conn(), "parking_spots", &mut rng).unwrap();
        assert_eq!(outcome, ParkingUpdate::NoSpotsFound);
    }

    #[test]
    fn test_parking_update_touches_one_existing_spot() {
        let (_dir, mut store) = temp_store();
        let mut rng = StdRng::seed_from_u64(8);
        store.seed_parking_spots(&INITIAL_PARKING_SPOTS, &mut rng).unwrap();

        for _ in 0..20 {
            match update_random_parking_spot(store.conn(), "parking_spots", &mut rng).unwrap() {
                ParkingUpdate::Updated { spot_id, occupied } => {
                    let stored: bool = store
                        .conn()
                        .query_row(
                            "SELECT is_occupied FROM parking_spots WHERE spot_id = ?1",
                            [&spot_id],
                            |row| row.get(0),
                        )
                        .unwrap();
                    assert_eq!(stored, occupied);
                }
                ParkingUpdate::NoSpotsFound => panic!("spots were seeded"),
            }
        }
        assert_eq!(count_rows(&store, "parking_spots"), 5);
    }

    #[test]
    fn test_power_stats_upsert_overwrites_month() {
        let (_dir, store) = temp_store();
        let mut stats = MonthlyPowerStats {
            year_month: "2024-01".to_string(),
            first_day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days_recorded: 10,
            total_consumption: 120.0,
            average_consumption: 12.0,
            fault_count: 1,
        };
        upsert_power_stats(store.conn(), "power_stats", &stats).unwrap();
        stats.days_recorded = 11;
        upsert_power_stats(store.conn(), "power_stats", &stats).unwrap();

        assert_eq!(count_rows(&store, "power_stats"), 1);
        let days: u32 = store
            .conn()
            .query_row("SELECT days_recorded FROM power_stats", [], |row| row.get(0))
            .unwrap();
        assert_eq!(days, 11);
    }

    #[test]
    fn test_latest_month_stats_are_recorded() {
        let (_dir, mut store) = temp_store();
        assert_eq!(store.record_latest_power_month().unwrap(), None);
        assert_eq!(count_rows(&store, "power_stats"), 0);

        for (d, kwh, fault) in [("2024-01-31", 10.0, 0), ("2024-02-01", 11.0, 1), ("2024-02-02", 13.0, 0)] {
            store
                .conn()
                .execute(
                    "INSERT INTO power_readings (reading_date, power_consumed, fault_detected) VALUES (?1, ?2, ?3)",
                    params![d, kwh, fault],
                )
                .unwrap();
        }

        let stats = store.record_latest_power_month().unwrap().unwrap();
        assert_eq!(stats.year_month, "2024-02");
        assert_eq!(stats.days_recorded, 2);
        assert_eq!(stats.fault_count, 1);
        assert!((stats.total_consumption - 24.0).abs() < 1e-9);

        store.record_latest_power_month().unwrap();
        assert_eq!(count_rows(&store, "power_stats"), 1);
    }
}
