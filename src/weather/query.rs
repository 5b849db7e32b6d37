use glam::DVec3;
use serde::Serialize;

use crate::weather::cell::CloudCell;
use crate::weather::WeatherState;

/// Weather felt at a world position, blended from nearby cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalWeather {
    /// Index of the closest cell inside the influence radius.
    pub nearest: Option<usize>,
    pub nearest_state: Option<WeatherState>,
    pub nearest_distance: Option<f64>,
    /// Influence-weighted mean intensity; 0 when no cell is in range.
    pub intensity: f64,
    pub is_raining: bool,
}

impl LocalWeather {
    fn none() -> Self {
        Self {
            nearest: None,
            nearest_state: None,
            nearest_distance: None,
            intensity: 0.0,
            is_raining: false,
        }
    }
}

/// Inverse-distance blend of every cell within `radius` of `position`.
/// Each cell contributes with weight `1 - dist / radius`.
pub fn query_at(cells: &[CloudCell], position: DVec3, radius: f64) -> LocalWeather {
    let mut total_influence = 0.0;
    let mut weighted_intensity = 0.0;
    let mut nearest: Option<(&CloudCell, f64)> = None;

    for cell in cells {
        let dist = cell.position.distance(position);
        if dist >= radius {
            continue;
        }
        let influence = 1.0 - dist / radius;
        total_influence += influence;
        weighted_intensity += influence * cell.intensity;
        if nearest.is_none_or(|(_, d)| dist < d) {
            nearest = Some((cell, dist));
        }
    }

    let Some((cell, dist)) = nearest else {
        return LocalWeather::none();
    };

    let intensity = if total_influence > 0.0 {
        (weighted_intensity / total_influence).clamp(0.0, 1.0)
    } else {
        0.0
    };

    LocalWeather {
        nearest: Some(cell.id),
        nearest_state: Some(cell.weather_state),
        nearest_distance: Some(dist),
        intensity,
        is_raining: intensity > 0.5,
    }
}
