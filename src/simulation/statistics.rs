use std::collections::HashMap;

use serde::Serialize;

use crate::weather::{RandomSource, WeatherEvent, WeatherField, WeatherState};

/// Per-tick aggregate metrics for logging and introspection.
#[derive(Debug, Clone, Serialize)]
pub struct FieldStatistics {
    pub tick: u64,
    pub summary: WeatherState,
    pub state_distribution: HashMap<WeatherState, u32>,
    pub avg_moisture: f32,
    pub avg_intensity: f32,
    pub over_water_count: u32,
    pub storm_capable_count: u32,
    pub lightning_strikes: u32,
    pub tick_duration_ms: f32,
}

/// Compute statistics for the field after a tick. `events` are the events
/// that tick produced.
pub fn compute_statistics<R: RandomSource>(
    field: &WeatherField<R>,
    events: &[WeatherEvent],
    tick_duration_ms: f32,
) -> FieldStatistics {
    let cells = field.cells();
    let lightning_strikes = events
        .iter()
        .filter(|e| matches!(e, WeatherEvent::LightningStrike(_)))
        .count() as u32;

    let total = cells.len() as f64;
    if total == 0.0 {
        return FieldStatistics {
            tick: field.tick_count(),
            summary: field.summary(),
            state_distribution: HashMap::new(),
            avg_moisture: 0.0,
            avg_intensity: 0.0,
            over_water_count: 0,
            storm_capable_count: 0,
            lightning_strikes,
            tick_duration_ms,
        };
    }

    let mut distribution: HashMap<WeatherState, u32> = HashMap::new();
    let mut total_moisture = 0.0_f64;
    let mut total_intensity = 0.0_f64;
    let mut over_water = 0_u32;
    let mut storm_capable = 0_u32;

    for cell in cells {
        *distribution.entry(cell.weather_state).or_insert(0) += 1;
        total_moisture += cell.moisture;
        total_intensity += cell.intensity;
        if cell.is_over_water {
            over_water += 1;
        }
        if cell.can_storm {
            storm_capable += 1;
        }
    }

    FieldStatistics {
        tick: field.tick_count(),
        summary: field.summary(),
        state_distribution: distribution,
        avg_moisture: (total_moisture / total) as f32,
        avg_intensity: (total_intensity / total) as f32,
        over_water_count: over_water,
        storm_capable_count: storm_capable,
        lightning_strikes,
        tick_duration_ms,
    }
}

/// Fraction of cells in `state`, 0 for an empty distribution.
pub fn state_fraction(stats: &FieldStatistics, state: WeatherState) -> f32 {
    let total: u32 = stats.state_distribution.values().sum();
    if total == 0 {
        return 0.0;
    }
    *stats.state_distribution.get(&state).unwrap_or(&0) as f32 / total as f32
}
