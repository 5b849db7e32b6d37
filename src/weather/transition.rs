//! Timer-driven state transitions.
//!
//! Evaluated only when a cell's state timer expires. Threshold crossings in
//! the water cycle bypass this table and switch state directly.

use crate::weather::rng::RandomSource;
use crate::weather::WeatherState;

/// The inputs the transition table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionInput {
    pub state: WeatherState,
    pub moisture: f64,
    pub is_over_water: bool,
    pub can_storm: bool,
}

impl TransitionInput {
    fn storm_eligible(&self) -> bool {
        self.can_storm && self.moisture > 0.5
    }
}

/// Pick the next state. Draws exactly one roll from `rng` for every input,
/// including the ones whose outcome the moisture alone decides, so scripted
/// sources stay aligned across branches.
pub fn next_state(input: TransitionInput, rng: &mut dyn RandomSource) -> WeatherState {
    let roll = rng.next_f64();
    match input.state {
        WeatherState::Clear => {
            if input.moisture > 0.5 || roll < 0.4 {
                WeatherState::Cloudy
            } else {
                WeatherState::Clear
            }
        }
        WeatherState::Cloudy => {
            if input.moisture < 0.3 {
                WeatherState::Clear
            } else if input.moisture > 0.6 && !input.is_over_water {
                if input.can_storm && roll >= 0.4 {
                    WeatherState::Storm
                } else {
                    WeatherState::Rain
                }
            } else if roll < 0.2 {
                WeatherState::Clear
            } else if roll < 0.6 {
                if input.moisture > 0.5 {
                    WeatherState::Rain
                } else {
                    WeatherState::Cloudy
                }
            } else if input.storm_eligible() {
                WeatherState::Storm
            } else {
                WeatherState::Cloudy
            }
        }
        WeatherState::Rain => {
            if input.moisture < 0.3 {
                WeatherState::Cloudy
            } else if roll < 0.2 {
                WeatherState::Cloudy
            } else if roll < 0.5 && input.storm_eligible() {
                WeatherState::Storm
            } else {
                WeatherState::Rain
            }
        }
        WeatherState::Storm => {
            if roll < 0.6 {
                WeatherState::Storm
            } else if roll < 0.8 {
                WeatherState::Rain
            } else {
                WeatherState::Cloudy
            }
        }
    }
}
