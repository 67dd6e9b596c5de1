//! Junction and parking value models

use crate::types::LaneSnapshot;
use rand::seq::SliceRandom;
use rand::Rng;

pub const JUNCTION_LANES: usize = 4;
pub const MAX_VEHICLES_PER_LANE: u32 = 30;

/// The single live-updated junction
pub const JUNCTION_ID: &str = "MainJunction";

/// Spots seeded on startup: (spot_id, description)
pub const INITIAL_PARKING_SPOTS: [(&str, &str); 5] = [
    ("Spot-1", "Parking Spot 1"),
    ("Spot-2", "Parking Spot 2"),
    ("Spot-3", "Parking Spot 3"),
    ("Spot-4", "Parking Spot 4"),
    ("Spot-5", "Parking Spot 5"),
];

/// 1-based index of the busiest lane; the first lane wins ties
pub fn green_lane(lanes: &[u32; JUNCTION_LANES]) -> u8 {
    let mut best = 0;
    for (i, count) in lanes.iter().enumerate().skip(1) {
        if *count > lanes[best] {
            best = i;
        }
    }
    (best + 1) as u8
}

/// Draw lane counts independently from `0..=MAX_VEHICLES_PER_LANE`
pub fn lane_snapshot<R: Rng + ?Sized>(rng: &mut R) -> LaneSnapshot {
    let mut lanes = [0u32; JUNCTION_LANES];
    for lane in lanes.iter_mut() {
        *lane = rng.gen_range(0..=MAX_VEHICLES_PER_LANE);
    }
    LaneSnapshot {
        lanes,
        green_lane: green_lane(&lanes),
    }
}

/// Whether this cycle updates a parking spot at all
pub fn parking_update_due<R: Rng + ?Sized>(rng: &mut R, chance_percent: u8) -> bool {
    rng.gen_range(0..100u8) < chance_percent
}

/// Pick one spot uniformly among `keys` and a fresh occupancy flag
///
/// Returns `None` when there are no spots to choose from.
pub fn parking_flip<'a, R: Rng + ?Sized>(
    rng: &mut R,
    keys: &'a [String],
) -> Option<(&'a str, bool)> {
    let occupied = rng.gen_bool(0.5);
    keys.choose(rng).map(|key| (key.as_str(), occupied))
}
