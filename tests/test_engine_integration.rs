//! End-to-end runs against a real SQLite file
//!
//! - backfill row counts and labels
//! - power stream resuming across "restarts" (fresh store on the same file)
//! - traffic loop with seeded spots, then the explicit cleanup actions

#[cfg(test)]
mod engine_integration_tests {
    use chrono::NaiveDate;
    use cityfeed::maintenance::{self, Marker};
    use cityfeed::scheduler::{
        backfill_air_quality, backfill_noise, run_live, LiveCycle, LiveOptions, LoopExit, PowerCycle,
        RetentionCadence, TrafficCycle,
    };
    use cityfeed::simulation::{INITIAL_PARKING_SPOTS, NOISE_LOCATIONS};
    use cityfeed::store::BackfillWindow;
    use cityfeed::types::{NoiseSite, QualityIndex};
    use cityfeed::{EngineConfig, SqliteStore, TableNames};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::time::Duration;

    fn count(store: &SqliteStore, table: &str) -> i64 {
        store
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_backfill_two_locations_two_days() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("city.db"), TableNames::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);

        let window = BackfillWindow::ending_before(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 2, 2).unwrap();
        let written = backfill_air_quality(&mut store, &mut rng, &window, &["City Park", "Industrial Zone"]).unwrap();
        assert_eq!(written, 8);
        assert_eq!(count(&store, "air_quality_readings"), 8);

        let labels: Vec<Option<String>> = {
            let mut stmt = store
                .conn()
                .prepare("SELECT quality_index FROM air_quality_readings ORDER BY id")
                .unwrap();
            let rows = stmt
                .query_map([], |row| row.get(0))
                .unwrap()
                .map(|r| r.unwrap())
                .collect();
            rows
        };
        assert_eq!(labels.len(), 8);
        for label in labels {
            let label = label.expect("quality label stored");
            assert!(QualityIndex::parse(&label).is_some(), "unexpected label {}", label);
        }

        let latest = store.latest_air_quality().unwrap();
        assert_eq!(latest.len(), 2);
        assert!(latest.iter().all(|r| r.timestamp == window.timestamp(1, 1)));
    }

    #[test]
    fn test_noise_backfill_over_default_catalogue() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("city.db"), TableNames::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let window = BackfillWindow::ending_before(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 3, 4).unwrap();
        let sites = NoiseSite::assign(&NOISE_LOCATIONS);
        assert_eq!(backfill_noise(&mut store, &mut rng, &window, &sites).unwrap(), 96);

        let below_floor: i64 = store
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM noise_level_readings WHERE decibel_level < 30.0",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(below_floor, 0);
        assert_eq!(store.latest_noise().unwrap().len(), NOISE_LOCATIONS.len());
    }

    #[test]
    fn test_power_stream_resumes_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("city.db");
        let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap().and_hms_opt(9, 0, 0).unwrap();

        {
            let mut store = SqliteStore::open(&path, TableNames::default()).unwrap();
            let mut cycle = PowerCycle::new(StdRng::seed_from_u64(1), 3, 365, RetentionCadence::OnRequest);
            for _ in 0..5 {
                cycle.run_cycle(&mut store, today).unwrap();
            }
        }

        let mut store = SqliteStore::open(&path, TableNames::default()).unwrap();
        let latest = store.latest_power_reading().unwrap().unwrap();
        assert_eq!(latest.reading_date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        let mut cycle = PowerCycle::new(StdRng::seed_from_u64(2), 3, 365, RetentionCadence::OnRequest);
        cycle.run_cycle(&mut store, today).unwrap();
        assert_eq!(cycle.cursor(), NaiveDate::from_ymd_opt(2024, 3, 6));

        let distinct: i64 = store
            .conn()
            .query_row("SELECT COUNT(DISTINCT reading_date) FROM power_readings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(distinct, 6);
        assert_eq!(count(&store, "power_readings"), 6);

        let message = maintenance::power_month_report(&mut store, None);
        assert!(message.starts_with("Success: 2024-03: 5 day(s)"), "{}", message);
        assert_eq!(count(&store, "power_stats"), 1);
    }

    #[tokio::test]
    async fn test_traffic_loop_then_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = HashMap::new();
        env.insert("CITYFEED_DB_PATH", dir.path().join("city.db").display().to_string());
        env.insert("DB_PARKING_TABLE", "parking_lots".to_string());
        env.insert("RNG_SEED", "99".to_string());
        let config = EngineConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        let mut store = SqliteStore::open(&config.db_path, config.tables.clone()).unwrap();
        let mut rng = config.rng();
        store.seed_parking_spots(&INITIAL_PARKING_SPOTS, &mut rng).unwrap();
        store.seed_parking_spots(&INITIAL_PARKING_SPOTS, &mut rng).unwrap();

        let mut cycle = TrafficCycle::new(rng, config.parking_update_chance_percent, RetentionCadence::OnRequest);
        let options = LiveOptions {
            delay: Duration::from_millis(1),
            max_cycles: Some(5),
        };
        let exit = run_live(&mut store, &mut cycle, options, std::future::pending()).await.unwrap();
        assert_eq!(exit, LoopExit::Completed { cycles: 5 });

        assert_eq!(count(&store, "junction_state"), 1);
        assert_eq!(count(&store, "parking_lots"), 5);
        assert_eq!(store.parking_spots().unwrap().len(), 5);
        assert_eq!(store.latest_junction_states().unwrap().len(), 1);

        let today = chrono::Utc::now().date_naive();
        let message = maintenance::delete_old_junction_states(&mut store, today);
        assert_eq!(Marker::of(&message), Some(Marker::Success));
        assert_eq!(count(&store, "junction_state"), 1);
    }
}
