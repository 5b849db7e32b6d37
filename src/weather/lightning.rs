//! Lightning: per-cell charge accumulation, probabilistic triggering and
//! strike geometry for the rendering side.
//!
//! Strike chances are rolled once per tick, so strike frequency follows the
//! tick rate.

use glam::DVec3;

use crate::weather::cell::CloudCell;
use crate::weather::events::LightningStrike;
use crate::weather::rng::RandomSource;
use crate::weather::sphere::any_perpendicular;
use crate::weather::WeatherState;

pub const STRIKE_DURATION: f64 = 0.3;

const STORM_CHARGE_RATE: f64 = 0.25;
const STORM_THRESHOLD: f64 = 1.0;
const STORM_STRIKE_CHANCE: f64 = 0.08;

const RAIN_CHARGE_RATE: f64 = 0.05;
const RAIN_THRESHOLD: f64 = 1.5;
const RAIN_STRIKE_CHANCE: f64 = 0.03;
const RAIN_MIN_MOISTURE: f64 = 0.7;

const MAIN_SEGMENTS: usize = 8;
const BRANCH_SEGMENTS: usize = 3;
const MAX_BRANCHES: usize = 3;
/// Sideways jitter as a fraction of segment length.
const JITTER: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct LightningController {
    planet_radius: f64,
    ground_offset: f64,
}

impl LightningController {
    pub fn new(planet_radius: f64) -> Self {
        Self {
            planet_radius,
            ground_offset: 0.5,
        }
    }

    /// Accrue charge for one tick. Returns true when the cell should strike.
    pub fn charge(&self, cell: &mut CloudCell, dt: f64, rng: &mut dyn RandomSource) -> bool {
        match cell.weather_state {
            WeatherState::Storm if cell.can_storm => {
                cell.lightning_charge += dt * STORM_CHARGE_RATE;
                cell.lightning_charge > STORM_THRESHOLD && rng.chance(STORM_STRIKE_CHANCE)
            }
            WeatherState::Rain if cell.can_storm && cell.moisture > RAIN_MIN_MOISTURE => {
                cell.lightning_charge += dt * RAIN_CHARGE_RATE;
                cell.lightning_charge > RAIN_THRESHOLD && rng.chance(RAIN_STRIKE_CHANCE)
            }
            _ => false,
        }
    }

    /// Discharge `cell` and build the strike event.
    pub fn trigger(&self, cell: &mut CloudCell, rng: &mut dyn RandomSource) -> LightningStrike {
        cell.lightning_charge = 0.0;

        let cloud_position = cell.position;
        let ground = cell.direction() * (self.planet_radius + self.ground_offset);
        let path = jagged_path(cloud_position, ground, MAIN_SEGMENTS, rng);

        let branch_count = 1 + ((rng.next_f64() * MAX_BRANCHES as f64) as usize).min(MAX_BRANCHES - 1);
        let branches = (0..branch_count)
            .map(|_| {
                let fork = 1 + ((rng.next_f64() * (MAIN_SEGMENTS - 1) as f64) as usize)
                    .min(MAIN_SEGMENTS - 2);
                let origin = path[fork];
                let remaining = ground - origin;
                let side = any_perpendicular(remaining)
                    * remaining.length()
                    * rng.range(-0.4, 0.4);
                let end = origin + remaining * rng.range(0.25, 0.5) + side;
                jagged_path(origin, end, BRANCH_SEGMENTS, rng)
            })
            .collect();

        LightningStrike {
            cell_index: cell.id,
            position: ground,
            cloud_position,
            intensity: cell.intensity,
            path,
            branches,
            duration: STRIKE_DURATION,
        }
    }
}

/// `segments + 1` points from `start` to `end`; interior points are pushed
/// sideways at random, the endpoints are exact.
fn jagged_path(start: DVec3, end: DVec3, segments: usize, rng: &mut dyn RandomSource) -> Vec<DVec3> {
    let span = end - start;
    let step = span.length() / segments as f64;
    let a = any_perpendicular(span);
    let b = span.normalize_or_zero().cross(a);

    let mut points = Vec::with_capacity(segments + 1);
    points.push(start);
    for i in 1..segments {
        let t = i as f64 / segments as f64;
        let offset = (a * rng.range(-1.0, 1.0) + b * rng.range(-1.0, 1.0)) * step * JITTER;
        points.push(start + span * t + offset);
    }
    points.push(end);
    points
}
