//! A single cloud cell: one self-contained parcel of moisture drifting on a
//! spherical shell above the terrain, with its own weather state machine.

use glam::DVec3;
use serde::Serialize;
use tracing::debug;

use crate::config::field::FieldParams;
use crate::terrain::TerrainSampler;
use crate::weather::rng::RandomSource;
use crate::weather::sphere::{random_unit_vector, rotate_about_axis};
use crate::weather::transition::{next_state, TransitionInput};
use crate::weather::wind::WindModel;
use crate::weather::WeatherState;

pub const STATE_TIMER_MIN: f64 = 20.0;
pub const STATE_TIMER_MAX: f64 = 60.0;

const EVAPORATION_RATE: f64 = 0.08;
const PRECIPITATION_RATE: f64 = 0.1;
const INTENSITY_RELAXATION: f64 = 0.5;

const ORBIT_SPEED_MIN: f64 = 0.005;
const ORBIT_SPEED_MAX: f64 = 0.02;
/// Fraction of the way the radius moves toward its hover target each tick.
const HOVER_BLEND: f64 = 0.05;
const BOB_AMPLITUDE: f64 = 0.3;
const BOB_FREQUENCY: f64 = 0.5;

/// Why a cell changed state; carried into the transition log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    Evaporation,
    Precipitation,
    Drying,
    Timer,
}

/// What a cell sees of the world during one tick.
pub struct CellEnvironment<'a> {
    pub wind: &'a WindModel,
    pub terrain: Option<&'a dyn TerrainSampler>,
    pub params: &'a FieldParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudCell {
    /// Stable handle: index in the owning field.
    pub id: usize,
    pub position: DVec3,
    pub weather_state: WeatherState,
    pub intensity: f64,
    pub target_intensity: f64,
    pub moisture: f64,
    pub is_over_water: bool,
    pub can_storm: bool,
    pub lightning_charge: f64,
    /// Seconds until the next timer-driven transition roll.
    pub state_timer: f64,
    /// Seconds since the last transition.
    pub state_progress: f64,
    pub orbit_axis: DVec3,
    /// Radians per second about `orbit_axis`.
    pub orbit_speed: f64,
    /// Extra hover height above `min_altitude`.
    pub altitude_offset: f64,
    pub bob_phase: f64,
}

impl CloudCell {
    /// Create a cell with randomized position, moisture and initial state.
    pub fn spawn(id: usize, params: &FieldParams, rng: &mut dyn RandomSource) -> Self {
        let direction = random_unit_vector(rng);
        let radius = params.planet_radius
            + params.cloud_altitude
            + rng.range(-params.altitude_jitter, params.altitude_jitter);
        let moisture = rng.range(0.2, 0.8);
        let state_roll = rng.next_f64();
        let weather_state = if state_roll < 0.5 {
            WeatherState::Clear
        } else if state_roll < 0.85 {
            WeatherState::Cloudy
        } else {
            WeatherState::Rain
        };
        let can_storm = rng.chance(params.storm_capable_ratio);
        let target = weather_state.target_intensity();

        let mut orbit_speed = rng.range(ORBIT_SPEED_MIN, ORBIT_SPEED_MAX);
        if rng.chance(0.5) {
            orbit_speed = -orbit_speed;
        }

        Self {
            id,
            position: direction * radius,
            weather_state,
            intensity: target,
            target_intensity: target,
            moisture,
            is_over_water: false,
            can_storm,
            lightning_charge: 0.0,
            state_timer: rng.range(STATE_TIMER_MIN, STATE_TIMER_MAX),
            state_progress: 0.0,
            orbit_axis: random_unit_vector(rng),
            orbit_speed,
            altitude_offset: rng.range(0.0, params.altitude_jitter),
            bob_phase: rng.range(0.0, std::f64::consts::TAU),
        }
    }

    /// Unit direction from the planet centre.
    pub fn direction(&self) -> DVec3 {
        self.position.normalize_or(DVec3::Z)
    }

    /// Advance movement, water cycle, timer transitions and intensity by `dt`.
    /// Lightning charge is handled by the field's `LightningController`.
    pub fn advance(&mut self, dt: f64, env: &CellEnvironment<'_>, rng: &mut dyn RandomSource) {
        self.state_progress += dt;
        let elevation = self.advance_position(dt, env);
        if !self.update_water_cycle(dt, elevation, env.params.water_level, rng) {
            self.tick_state_timer(dt, rng);
        }
        self.relax_intensity(dt);
    }

    /// Orbit, drift with the wind, then ease the radius toward the hover height.
    /// Returns the terrain elevation under the new position, if a sampler exists.
    fn advance_position(&mut self, dt: f64, env: &CellEnvironment<'_>) -> Option<f64> {
        let params = env.params;
        let angle = self.orbit_speed * params.move_speed_scale * dt;
        let moved = rotate_about_axis(self.position, self.orbit_axis, angle)
            + env.wind.drift(dt, params.wind_drift_scale);

        let direction = moved.normalize_or(self.direction());
        let elevation = env.terrain.map(|t| t.elevation(direction));
        let surface = elevation.map_or(0.0, |e| e.max(params.water_level));
        let bob = BOB_AMPLITUDE * (self.state_progress * BOB_FREQUENCY + self.bob_phase).sin();
        let target_radius =
            params.planet_radius + surface + params.min_altitude + self.altitude_offset + bob;

        let radius = moved.length() * (1.0 - HOVER_BLEND) + target_radius * HOVER_BLEND;
        self.position = direction * radius;
        elevation
    }

    /// Evaporation over water, precipitation over land. At most one
    /// threshold-driven transition per tick; returns true when one happened.
    fn update_water_cycle(
        &mut self,
        dt: f64,
        elevation: Option<f64>,
        water_level: f64,
        rng: &mut dyn RandomSource,
    ) -> bool {
        self.is_over_water = elevation.is_some_and(|e| e < water_level);

        if self.is_over_water {
            self.moisture = (self.moisture + dt * EVAPORATION_RATE).clamp(0.0, 1.0);
            if self.moisture > 0.6 && self.weather_state == WeatherState::Clear {
                self.enter_state(WeatherState::Cloudy, 0.4, TransitionCause::Evaporation, rng);
                return true;
            }
            return false;
        }

        match self.weather_state {
            WeatherState::Clear | WeatherState::Cloudy if self.moisture > 0.7 => {
                self.enter_state(WeatherState::Rain, 0.8, TransitionCause::Precipitation, rng);
                true
            }
            WeatherState::Rain | WeatherState::Storm => {
                self.moisture = (self.moisture - dt * PRECIPITATION_RATE).clamp(0.0, 1.0);
                if self.moisture < 0.2 {
                    let target = WeatherState::Cloudy.target_intensity();
                    self.enter_state(WeatherState::Cloudy, target, TransitionCause::Drying, rng);
                    return true;
                }
                false
            }
            WeatherState::Cloudy if self.moisture < 0.3 => {
                let target = WeatherState::Clear.target_intensity();
                self.enter_state(WeatherState::Clear, target, TransitionCause::Drying, rng);
                true
            }
            _ => false,
        }
    }

    fn tick_state_timer(&mut self, dt: f64, rng: &mut dyn RandomSource) {
        self.state_timer -= dt;
        if self.state_timer <= 0.0 {
            self.evaluate_transition(rng);
        }
    }

    /// Roll the transition table and enter the chosen state (possibly the
    /// current one), resetting the timer.
    pub fn evaluate_transition(&mut self, rng: &mut dyn RandomSource) -> WeatherState {
        let next = next_state(
            TransitionInput {
                state: self.weather_state,
                moisture: self.moisture,
                is_over_water: self.is_over_water,
                can_storm: self.can_storm,
            },
            rng,
        );
        self.enter_state(next, next.target_intensity(), TransitionCause::Timer, rng);
        next
    }

    fn enter_state(
        &mut self,
        state: WeatherState,
        target_intensity: f64,
        cause: TransitionCause,
        rng: &mut dyn RandomSource,
    ) {
        if state != self.weather_state {
            debug!(
                cell = self.id,
                from = %self.weather_state,
                to = %state,
                ?cause,
                moisture = self.moisture,
                "Cell transition"
            );
        }
        self.weather_state = state;
        self.target_intensity = target_intensity.clamp(0.0, 1.0);
        self.state_timer = rng.range(STATE_TIMER_MIN, STATE_TIMER_MAX);
        self.state_progress = 0.0;
    }

    /// Exponential approach toward the target; never overshoots.
    fn relax_intensity(&mut self, dt: f64) {
        let k = (dt * INTENSITY_RELAXATION).clamp(0.0, 1.0);
        self.intensity += (self.target_intensity - self.intensity) * k;
        self.intensity = self.intensity.clamp(0.0, 1.0);
    }

    /// Debug override: set state and its table intensity, bypassing the
    /// transition table. Leaves the timer alone unless one is given.
    pub fn force_state(&mut self, state: WeatherState, timer: Option<f64>) {
        debug!(cell = self.id, from = %self.weather_state, to = %state, "Forced cell state");
        self.weather_state = state;
        self.target_intensity = state.target_intensity();
        if let Some(t) = timer {
            self.state_timer = t;
        }
    }
}
