use serde::{Deserialize, Serialize};

/// Parameters used to build a weather field (`[field]` table).
/// Stored on the field so a run can be reproduced from its resolved seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    /// 0 picks a random seed at construction.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_cell_count")]
    pub cell_count: u32,
    #[serde(default = "default_planet_radius")]
    pub planet_radius: f64,
    /// Nominal height of the cloud shell above the planet surface.
    #[serde(default = "default_cloud_altitude")]
    pub cloud_altitude: f64,
    /// Random +/- spread applied to each cell's starting altitude.
    #[serde(default = "default_altitude_jitter")]
    pub altitude_jitter: f64,
    /// Clearance kept above the terrain (or sea) under a cell.
    #[serde(default = "default_min_altitude")]
    pub min_altitude: f64,
    /// Terrain elevation below this reads as open water.
    #[serde(default)]
    pub water_level: f64,
    #[serde(default = "default_storm_capable_ratio")]
    pub storm_capable_ratio: f64,
    #[serde(default = "default_move_speed_scale")]
    pub move_speed_scale: f64,
    #[serde(default = "default_wind_drift_scale")]
    pub wind_drift_scale: f64,
    #[serde(default = "default_influence_radius")]
    pub influence_radius: f64,
}

fn default_cell_count() -> u32 {
    24
}
fn default_planet_radius() -> f64 {
    50.0
}
fn default_cloud_altitude() -> f64 {
    10.0
}
fn default_altitude_jitter() -> f64 {
    3.0
}
fn default_min_altitude() -> f64 {
    6.0
}
fn default_storm_capable_ratio() -> f64 {
    0.75
}
fn default_move_speed_scale() -> f64 {
    1.0
}
fn default_wind_drift_scale() -> f64 {
    0.5
}
fn default_influence_radius() -> f64 {
    20.0
}

impl Default for FieldParams {
    fn default() -> Self {
        FieldParams {
            seed: 0,
            cell_count: default_cell_count(),
            planet_radius: default_planet_radius(),
            cloud_altitude: default_cloud_altitude(),
            altitude_jitter: default_altitude_jitter(),
            min_altitude: default_min_altitude(),
            water_level: 0.0,
            storm_capable_ratio: default_storm_capable_ratio(),
            move_speed_scale: default_move_speed_scale(),
            wind_drift_scale: default_wind_drift_scale(),
            influence_radius: default_influence_radius(),
        }
    }
}

impl FieldParams {
    /// Validate parameter ranges, reporting every violation at once.
    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if !(1..=10_000).contains(&self.cell_count) {
            errors.push(format!(
                "field.cell_count must be 1-10000, got {}. Example: cell_count = 24",
                self.cell_count
            ));
        }
        if self.planet_radius <= 0.0 {
            errors.push(format!(
                "field.planet_radius must be > 0.0, got {}. Example: planet_radius = 50.0",
                self.planet_radius
            ));
        }
        if self.cloud_altitude <= 0.0 {
            errors.push(format!(
                "field.cloud_altitude must be > 0.0, got {}. Example: cloud_altitude = 10.0",
                self.cloud_altitude
            ));
        }
        if self.altitude_jitter < 0.0 || self.altitude_jitter >= self.cloud_altitude {
            errors.push(format!(
                "field.altitude_jitter must be >= 0.0 and below cloud_altitude, got {}. Example: altitude_jitter = 3.0",
                self.altitude_jitter
            ));
        }
        if self.min_altitude < 0.0 {
            errors.push(format!(
                "field.min_altitude must be >= 0.0, got {}. Example: min_altitude = 6.0",
                self.min_altitude
            ));
        }
        if !(0.0..=1.0).contains(&self.storm_capable_ratio) {
            errors.push(format!(
                "field.storm_capable_ratio must be 0.0-1.0, got {}. Example: storm_capable_ratio = 0.75",
                self.storm_capable_ratio
            ));
        }
        if self.move_speed_scale < 0.0 {
            errors.push(format!(
                "field.move_speed_scale must be >= 0.0, got {}. Example: move_speed_scale = 1.0",
                self.move_speed_scale
            ));
        }
        if self.wind_drift_scale < 0.0 {
            errors.push(format!(
                "field.wind_drift_scale must be >= 0.0, got {}. Example: wind_drift_scale = 0.5",
                self.wind_drift_scale
            ));
        }
        if self.influence_radius <= 0.0 {
            errors.push(format!(
                "field.influence_radius must be > 0.0, got {}. Example: influence_radius = 20.0",
                self.influence_radius
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FieldParams::default().validate().is_ok());
    }

    #[test]
    fn partial_table_fills_defaults() {
        let params: FieldParams = toml::from_str("cell_count = 8\nseed = 99").unwrap();
        assert_eq!(params.cell_count, 8);
        assert_eq!(params.seed, 99);
        assert_eq!(params.planet_radius, 50.0);
        assert_eq!(params.influence_radius, 20.0);
        assert_eq!(params.storm_capable_ratio, 0.75);
    }

    #[test]
    fn zero_cells_rejected() {
        let params = FieldParams {
            cell_count: 0,
            ..FieldParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("cell_count"));
    }

    #[test]
    fn storm_ratio_out_of_range_rejected() {
        let params = FieldParams {
            storm_capable_ratio: 1.5,
            ..FieldParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("storm_capable_ratio"));
    }

    #[test]
    fn jitter_must_stay_below_altitude() {
        let params = FieldParams {
            altitude_jitter: 12.0,
            ..FieldParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("altitude_jitter"));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let params = FieldParams {
            planet_radius: -1.0,
            influence_radius: 0.0,
            ..FieldParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("planet_radius"));
        assert!(err.contains("influence_radius"));
    }
}
