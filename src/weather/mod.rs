//! Procedural local weather: a field of independent cloud cells, each running
//! its own moisture-driven state machine, coupled to the terrain through a
//! water cycle and driven by a single shared wind.

pub mod cell;
pub mod events;
pub mod field;
pub mod lightning;
pub mod query;
pub mod rng;
pub mod sphere;
pub mod transition;
pub mod wind;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use cell::CloudCell;
pub use events::{LightningStrike, WeatherEvent};
pub use field::{WeatherField, WeatherInfo};
pub use query::LocalWeather;
pub use rng::{RandomSource, SeededRandom, SequenceRandom};
pub use wind::WindModel;

/// Discrete weather state of a cell, also used for the field-wide summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherState {
    Clear,
    Cloudy,
    Rain,
    Storm,
}

impl WeatherState {
    pub fn all() -> [WeatherState; 4] {
        [
            WeatherState::Clear,
            WeatherState::Cloudy,
            WeatherState::Rain,
            WeatherState::Storm,
        ]
    }

    /// Intensity a cell relaxes toward after entering this state.
    pub fn target_intensity(self) -> f64 {
        match self {
            WeatherState::Clear => 0.0,
            WeatherState::Cloudy => 0.3,
            WeatherState::Rain => 0.7,
            WeatherState::Storm => 1.0,
        }
    }

    pub fn is_precipitating(self) -> bool {
        matches!(self, WeatherState::Rain | WeatherState::Storm)
    }

    pub fn name(self) -> &'static str {
        match self {
            WeatherState::Clear => "clear",
            WeatherState::Cloudy => "cloudy",
            WeatherState::Rain => "rain",
            WeatherState::Storm => "storm",
        }
    }
}

impl fmt::Display for WeatherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeatherState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(WeatherState::Clear),
            "cloudy" => Ok(WeatherState::Cloudy),
            "rain" => Ok(WeatherState::Rain),
            "storm" => Ok(WeatherState::Storm),
            other => Err(format!(
                "unknown weather state '{}', expected one of clear, cloudy, rain, storm",
                other
            )),
        }
    }
}
