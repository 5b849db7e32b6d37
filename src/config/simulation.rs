use serde::Deserialize;
use std::path::Path;

use crate::config::field::FieldParams;
use crate::terrain::TerrainConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    /// Upper bound on the per-tick `dt` handed to the field.
    #[serde(default = "default_max_dt")]
    pub max_dt: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Log field statistics every N ticks.
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u32,
    #[serde(default)]
    pub field: FieldParams,
    #[serde(default)]
    pub terrain: TerrainConfig,
}

fn default_tick_rate() -> f32 {
    10.0
}
fn default_max_dt() -> f64 {
    0.25
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_stats_interval() -> u32 {
    100
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            tick_rate_hz: default_tick_rate(),
            max_dt: default_max_dt(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            stats_interval: default_stats_interval(),
            field: FieldParams::default(),
            terrain: TerrainConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Fixed simulation step for the configured tick rate, capped at `max_dt`.
    pub fn tick_dt(&self) -> f64 {
        (1.0 / self.tick_rate_hz as f64).min(self.max_dt)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.tick_rate_hz <= 0.0 {
            errors.push(format!(
                "tick_rate_hz must be > 0.0, got {}. Example: tick_rate_hz = 10.0",
                self.tick_rate_hz
            ));
        }

        if self.max_dt <= 0.0 {
            errors.push(format!(
                "max_dt must be > 0.0, got {}. Example: max_dt = 0.25",
                self.max_dt
            ));
        }

        if self.stats_interval == 0 {
            errors.push(format!(
                "stats_interval must be > 0, got {}. Example: stats_interval = 100",
                self.stats_interval
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            errors.push(format!(
                "log_format must be one of {:?}, got '{}'. Example: log_format = \"text\"",
                valid_formats, self.log_format
            ));
        }

        if self.terrain.octaves == 0 || self.terrain.octaves > 12 {
            errors.push(format!(
                "terrain.octaves must be 1-12, got {}. Example: octaves = 4",
                self.terrain.octaves
            ));
        }

        if self.terrain.frequency <= 0.0 {
            errors.push(format!(
                "terrain.frequency must be > 0.0, got {}. Example: frequency = 1.5",
                self.terrain.frequency
            ));
        }

        if let Err(e) = self.field.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
