use glam::DVec3;
use serde::Serialize;

use crate::weather::WeatherState;

/// Outbound notifications produced by `WeatherField::update`, drained by the
/// caller after each tick. Strikes are queued in cell-index order; a summary
/// change, if any, comes last.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WeatherEvent {
    SummaryChanged {
        from: WeatherState,
        to: WeatherState,
    },
    LightningStrike(LightningStrike),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightningStrike {
    pub cell_index: usize,
    /// Ground point under the cloud.
    pub position: DVec3,
    pub cloud_position: DVec3,
    pub intensity: f64,
    /// Jagged main channel from cloud to ground, inclusive of both ends.
    pub path: Vec<DVec3>,
    /// Forks leaving the main channel; geometry only.
    pub branches: Vec<Vec<DVec3>>,
    /// Seconds the flash stays visible.
    pub duration: f64,
}
