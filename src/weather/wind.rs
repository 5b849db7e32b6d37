use glam::DVec3;
use serde::Serialize;

use crate::weather::rng::RandomSource;
use crate::weather::sphere::{rotate_about_axis, VERTICAL};

const GUST_INTERVAL_MIN: f64 = 3.0;
const GUST_INTERVAL_MAX: f64 = 8.0;
const GUST_STRENGTH_MIN: f64 = 0.15;
const GUST_STRENGTH_MAX: f64 = 0.55;
const GUST_MAX_YAW: f64 = 0.25;
const STRENGTH_FLOOR: f64 = 0.1;
const STRENGTH_DECAY_PER_SEC: f64 = 0.05;

/// Single shared wind for the whole field. Cells read it during a tick; only
/// `advance` mutates it, and it runs before any cell moves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindModel {
    /// Unit vector, perpendicular to the vertical axis.
    pub direction: DVec3,
    /// Always >= 0.1.
    pub strength: f64,
    /// Seconds until the next gust.
    pub gust_timer: f64,
}

impl WindModel {
    pub fn new(rng: &mut dyn RandomSource) -> Self {
        let heading = rng.range(0.0, std::f64::consts::TAU);
        Self {
            direction: DVec3::new(heading.cos(), heading.sin(), 0.0),
            strength: rng.range(GUST_STRENGTH_MIN, GUST_STRENGTH_MAX),
            gust_timer: rng.range(GUST_INTERVAL_MIN, GUST_INTERVAL_MAX),
        }
    }

    /// Advance the wind by `dt` seconds: decay toward the floor, or regenerate on a gust.
    pub fn advance(&mut self, dt: f64, rng: &mut dyn RandomSource) {
        self.gust_timer -= dt;
        if self.gust_timer <= 0.0 {
            self.gust(rng);
        } else {
            self.strength = (self.strength - STRENGTH_DECAY_PER_SEC * dt).max(STRENGTH_FLOOR);
        }
    }

    fn gust(&mut self, rng: &mut dyn RandomSource) {
        self.strength = rng.range(GUST_STRENGTH_MIN, GUST_STRENGTH_MAX);
        let yaw = rng.range(-GUST_MAX_YAW, GUST_MAX_YAW);
        self.direction = rotate_about_axis(self.direction, VERTICAL, yaw).normalize_or(DVec3::X);
        self.gust_timer = rng.range(GUST_INTERVAL_MIN, GUST_INTERVAL_MAX);
    }

    /// Wind displacement for one tick, scaled by `drift_scale`.
    pub fn drift(&self, dt: f64, drift_scale: f64) -> DVec3 {
        self.direction * self.strength * drift_scale * dt
    }
}
