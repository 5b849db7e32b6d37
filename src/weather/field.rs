//! The weather field: owns every cloud cell and the shared wind, advances
//! them once per tick and classifies the result into a single summary.
//!
//! Single-threaded and tick-driven. Within `update` the wind advances first,
//! then every cell in index order, then the summary is computed, so the
//! summary always reflects a fully advanced tick.

use glam::DVec3;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::field::FieldParams;
use crate::terrain::TerrainSampler;
use crate::weather::cell::{CellEnvironment, CloudCell};
use crate::weather::events::WeatherEvent;
use crate::weather::lightning::LightningController;
use crate::weather::query::{self, LocalWeather};
use crate::weather::rng::{RandomSource, SeededRandom};
use crate::weather::wind::WindModel;
use crate::weather::WeatherState;

const FORCED_STORM_TIMER: f64 = 30.0;
const FORCED_CLEAR_TIMER: f64 = 60.0;
/// Active cells needed before the summary reads as rain.
const RAIN_ACTIVE_THRESHOLD: usize = 5;

/// Read-only snapshot of the field for UI and audio collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherInfo {
    pub summary: WeatherState,
    pub max_intensity: f64,
    pub active_cloud_count: usize,
    pub storm_count: usize,
    pub wind_strength: f64,
    pub wind_direction: DVec3,
    pub is_raining: bool,
    pub is_storming: bool,
}

pub struct WeatherField<R = SeededRandom> {
    params: FieldParams,
    cells: Vec<CloudCell>,
    wind: WindModel,
    lightning: LightningController,
    rng: R,
    last_summary: WeatherState,
    events: Vec<WeatherEvent>,
    tick_count: u64,
}

impl WeatherField<SeededRandom> {
    /// Build a field on a ChaCha stream seeded from `params.seed`. A zero seed
    /// is resolved to a random one and written back into `params()`.
    pub fn new(params: FieldParams) -> Self {
        let rng = SeededRandom::new(params.seed);
        let params = FieldParams {
            seed: rng.seed(),
            ..params
        };
        Self::with_rng(params, rng)
    }
}

impl<R: RandomSource> WeatherField<R> {
    pub fn with_rng(params: FieldParams, mut rng: R) -> Self {
        let wind = WindModel::new(&mut rng);
        let cells = (0..params.cell_count as usize)
            .map(|i| CloudCell::spawn(i, &params, &mut rng))
            .collect();
        let lightning = LightningController::new(params.planet_radius);
        Self {
            params,
            cells,
            wind,
            lightning,
            rng,
            last_summary: WeatherState::Clear,
            events: Vec::new(),
            tick_count: 0,
        }
    }

    /// Advance the whole field by `dt` seconds. `terrain` may be absent, in
    /// which case the world is flat and dry.
    pub fn update(&mut self, dt: f64, terrain: Option<&dyn TerrainSampler>) {
        self.wind.advance(dt, &mut self.rng);

        let env = CellEnvironment {
            wind: &self.wind,
            terrain,
            params: &self.params,
        };
        for cell in &mut self.cells {
            cell.advance(dt, &env, &mut self.rng);
            if self.lightning.charge(cell, dt, &mut self.rng) {
                let strike = self.lightning.trigger(cell, &mut self.rng);
                debug!(
                    cell = strike.cell_index,
                    intensity = strike.intensity,
                    branches = strike.branches.len(),
                    "Lightning strike"
                );
                self.events.push(WeatherEvent::LightningStrike(strike));
            }
        }

        self.tick_count += 1;

        let summary = summarize(&self.cells);
        if summary != self.last_summary {
            info!(from = %self.last_summary, to = %summary, tick = self.tick_count, "Weather summary changed");
            self.events.push(WeatherEvent::SummaryChanged {
                from: self.last_summary,
                to: summary,
            });
            self.last_summary = summary;
        }
    }

    /// Take every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<WeatherEvent> {
        std::mem::take(&mut self.events)
    }

    /// Summary as of the last completed `update`.
    pub fn summary(&self) -> WeatherState {
        self.last_summary
    }

    pub fn weather_info(&self) -> WeatherInfo {
        let summary = summarize(&self.cells);
        let max_intensity = self
            .cells
            .iter()
            .map(|c| c.intensity)
            .fold(0.0_f64, f64::max);
        WeatherInfo {
            summary,
            max_intensity,
            active_cloud_count: active_count(&self.cells),
            storm_count: storm_count(&self.cells),
            wind_strength: self.wind.strength,
            wind_direction: self.wind.direction,
            is_raining: summary.is_precipitating(),
            is_storming: summary == WeatherState::Storm,
        }
    }

    /// Local weather at `position`, blended from cells within the influence radius.
    pub fn query_at(&self, position: DVec3) -> LocalWeather {
        query::query_at(&self.cells, position, self.params.influence_radius)
    }

    /// Force one cell into `state`. Out-of-range indices are ignored.
    pub fn set_cloud_weather(&mut self, index: i64, state: WeatherState) {
        let Some(cell) = usize::try_from(index)
            .ok()
            .and_then(|i| self.cells.get_mut(i))
        else {
            warn!(index, cells = self.cells.len(), "Ignoring weather override for unknown cell");
            return;
        };
        cell.force_state(state, None);
    }

    /// Push every storm-capable cell into a storm for a while.
    pub fn trigger_storm(&mut self) {
        let mut forced = 0;
        for cell in self.cells.iter_mut().filter(|c| c.can_storm) {
            cell.force_state(WeatherState::Storm, Some(FORCED_STORM_TIMER));
            forced += 1;
        }
        info!(cells = forced, "Storm triggered");
    }

    /// Clear the sky over the whole field for a while.
    pub fn clear_weather(&mut self) {
        for cell in &mut self.cells {
            cell.force_state(WeatherState::Clear, Some(FORCED_CLEAR_TIMER));
        }
        info!(cells = self.cells.len(), "Weather cleared");
    }

    pub fn cells(&self) -> &[CloudCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&CloudCell> {
        self.cells.get(index)
    }

    pub fn wind(&self) -> &WindModel {
        &self.wind
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[cfg(test)]
    pub(crate) fn cells_mut(&mut self) -> &mut [CloudCell] {
        &mut self.cells
    }
}

fn active_count(cells: &[CloudCell]) -> usize {
    cells
        .iter()
        .filter(|c| c.weather_state != WeatherState::Clear)
        .count()
}

fn storm_count(cells: &[CloudCell]) -> usize {
    cells
        .iter()
        .filter(|c| c.weather_state == WeatherState::Storm)
        .count()
}

/// Field-wide classification: any storm wins, then more than five active
/// cells reads as rain, then any activity is cloudy.
pub fn summarize(cells: &[CloudCell]) -> WeatherState {
    classify(active_count(cells), storm_count(cells))
}

fn classify(active: usize, storms: usize) -> WeatherState {
    if storms > 0 {
        WeatherState::Storm
    } else if active > RAIN_ACTIVE_THRESHOLD {
        WeatherState::Rain
    } else if active > 0 {
        WeatherState::Cloudy
    } else {
        WeatherState::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{NoiseTerrain, TerrainConfig};
    use crate::weather::cell::{STATE_TIMER_MAX, STATE_TIMER_MIN};
    use crate::weather::rng::SequenceRandom;

    fn params(cell_count: u32) -> FieldParams {
        FieldParams {
            seed: 42,
            cell_count,
            ..FieldParams::default()
        }
    }

    /// All cells calm and dry enough to stay put for a few ticks.
    fn settled_field(cell_count: u32) -> WeatherField {
        let mut field = WeatherField::new(params(cell_count));
        for cell in field.cells_mut() {
            cell.weather_state = WeatherState::Clear;
            cell.target_intensity = 0.0;
            cell.intensity = 0.0;
            cell.moisture = 0.5;
            cell.state_timer = 1000.0;
            cell.lightning_charge = 0.0;
        }
        field
    }

    fn set_states(field: &mut WeatherField, states: &[WeatherState]) {
        for (cell, &state) in field.cells_mut().iter_mut().zip(states) {
            cell.weather_state = state;
            cell.target_intensity = state.target_intensity();
        }
    }

    #[test]
    fn classify_precedence() {
        assert_eq!(classify(7, 2), WeatherState::Storm);
        assert_eq!(classify(6, 0), WeatherState::Rain);
        assert_eq!(classify(5, 0), WeatherState::Cloudy);
        assert_eq!(classify(1, 0), WeatherState::Cloudy);
        assert_eq!(classify(0, 0), WeatherState::Clear);
    }

    #[test]
    fn new_field_spawns_requested_cells_with_stable_ids() {
        let field = WeatherField::new(params(16));
        assert_eq!(field.cells().len(), 16);
        for (i, cell) in field.cells().iter().enumerate() {
            assert_eq!(cell.id, i);
        }
        assert_eq!(field.params().seed, 42);
        assert_eq!(field.tick_count(), 0);
    }

    #[test]
    fn zero_seed_is_resolved() {
        let field = WeatherField::new(FieldParams::default());
        let replay = WeatherField::new(FieldParams {
            seed: field.params().seed,
            ..FieldParams::default()
        });
        assert_eq!(field.cells(), replay.cells());
    }

    #[test]
    fn same_seed_same_history() {
        let terrain = NoiseTerrain::new(&TerrainConfig::default());
        let mut a = WeatherField::new(params(12));
        let mut b = WeatherField::new(params(12));
        for _ in 0..300 {
            a.update(0.1, Some(&terrain));
            b.update(0.1, Some(&terrain));
        }
        assert_eq!(a.cells(), b.cells());
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn storms_outrank_rain_in_summary() {
        // 10 cells: 3 storms, 6 active in total
        let mut field = settled_field(10);
        set_states(
            &mut field,
            &[
                WeatherState::Storm,
                WeatherState::Storm,
                WeatherState::Storm,
                WeatherState::Rain,
                WeatherState::Cloudy,
                WeatherState::Cloudy,
                WeatherState::Clear,
                WeatherState::Clear,
                WeatherState::Clear,
                WeatherState::Clear,
            ],
        );
        field.update(0.1, None);

        let info = field.weather_info();
        assert_eq!(info.active_cloud_count, 6);
        assert_eq!(info.storm_count, 3);
        assert_eq!(info.summary, WeatherState::Storm);
        assert!(info.is_storming);
        assert!(info.is_raining);
        assert_eq!(field.summary(), WeatherState::Storm);
        assert!(field.drain_events().contains(&WeatherEvent::SummaryChanged {
            from: WeatherState::Clear,
            to: WeatherState::Storm,
        }));
    }

    #[test]
    fn summary_change_is_reported_once() {
        let mut field = settled_field(8);
        set_states(&mut field, &[WeatherState::Cloudy]);
        field.update(0.1, None);
        let events = field.drain_events();
        assert_eq!(
            events,
            vec![WeatherEvent::SummaryChanged {
                from: WeatherState::Clear,
                to: WeatherState::Cloudy,
            }]
        );

        field.update(0.1, None);
        assert!(field.drain_events().is_empty());
    }

    #[test]
    fn many_active_cells_read_as_rain() {
        let mut field = settled_field(8);
        set_states(&mut field, &[WeatherState::Cloudy; 6]);
        field.update(0.1, None);
        assert_eq!(field.summary(), WeatherState::Rain);
    }

    #[test]
    fn drain_empties_queue() {
        let mut field = settled_field(3);
        set_states(&mut field, &[WeatherState::Cloudy]);
        field.update(0.1, None);
        assert!(!field.drain_events().is_empty());
        assert!(field.drain_events().is_empty());
    }

    #[test]
    fn strike_resets_charge_within_the_tick() {
        let mut field = WeatherField::with_rng(params(1), SequenceRandom::constant(0.0));
        {
            let cell = &mut field.cells_mut()[0];
            cell.weather_state = WeatherState::Storm;
            cell.can_storm = true;
            cell.moisture = 0.9;
            cell.state_timer = 1000.0;
            cell.lightning_charge = 2.0;
        }
        field.update(0.1, None);

        assert_eq!(field.cells()[0].lightning_charge, 0.0);
        let events = field.drain_events();
        assert!(matches!(
            events.first(),
            Some(WeatherEvent::LightningStrike(s)) if s.cell_index == 0
        ));
        // strike first, summary last
        assert!(matches!(
            events.last(),
            Some(WeatherEvent::SummaryChanged { to: WeatherState::Storm, .. })
        ));
    }

    #[test]
    fn out_of_range_override_is_a_noop() {
        let mut field = WeatherField::new(params(6));
        let before = field.cells().to_vec();
        field.set_cloud_weather(-1, WeatherState::Storm);
        field.set_cloud_weather(9999, WeatherState::Storm);
        field.set_cloud_weather(6, WeatherState::Storm);
        assert_eq!(field.cells(), &before[..]);
    }

    #[test]
    fn override_sets_state_and_target() {
        let mut field = settled_field(4);
        field.set_cloud_weather(2, WeatherState::Rain);
        let cell = field.cell(2).unwrap();
        assert_eq!(cell.weather_state, WeatherState::Rain);
        assert_eq!(cell.target_intensity, 0.7);
        assert_eq!(cell.state_timer, 1000.0);
    }

    #[test]
    fn trigger_storm_only_touches_capable_cells() {
        let mut field = settled_field(20);
        for (i, cell) in field.cells_mut().iter_mut().enumerate() {
            cell.can_storm = i % 2 == 0;
        }
        field.trigger_storm();
        for cell in field.cells() {
            if cell.can_storm {
                assert_eq!(cell.weather_state, WeatherState::Storm);
                assert_eq!(cell.target_intensity, 1.0);
                assert_eq!(cell.state_timer, 30.0);
            } else {
                assert_eq!(cell.weather_state, WeatherState::Clear);
                assert_eq!(cell.state_timer, 1000.0);
            }
        }
    }

    #[test]
    fn clear_weather_clears_everything() {
        let mut field = WeatherField::new(params(20));
        field.trigger_storm();
        field.clear_weather();
        for cell in field.cells() {
            assert_eq!(cell.weather_state, WeatherState::Clear);
            assert_eq!(cell.target_intensity, 0.0);
            assert_eq!(cell.state_timer, 60.0);
        }
        assert_eq!(field.weather_info().active_cloud_count, 0);
    }

    #[test]
    fn weather_info_reports_wind_and_max_intensity() {
        let mut field = settled_field(3);
        field.cells_mut()[1].intensity = 0.65;
        let info = field.weather_info();
        assert_eq!(info.max_intensity, 0.65);
        assert_eq!(info.wind_strength, field.wind().strength);
        assert_eq!(info.wind_direction, field.wind().direction);
        assert_eq!(info.summary, WeatherState::Clear);
        assert!(!info.is_raining);
    }

    #[test]
    fn query_uses_configured_radius() {
        let mut field = settled_field(2);
        let p = field.cells()[0].position;
        field.cells_mut()[0].intensity = 0.9;
        field.cells_mut()[1].position = p * 3.0;
        let local = field.query_at(p);
        assert_eq!(local.nearest, Some(0));
        assert!((local.intensity - 0.9).abs() < 1e-12);
        assert!(local.is_raining);

        let far = field.query_at(p * 10.0);
        assert_eq!(far.nearest, None);
        assert_eq!(far.intensity, 0.0);
    }

    #[test]
    fn long_run_keeps_every_cell_in_bounds() {
        let terrain = NoiseTerrain::new(&TerrainConfig::default());
        let mut field = WeatherField::new(params(40));
        for tick in 0..3000 {
            let dt = if tick % 7 == 0 { 0.5 } else { 0.05 };
            field.update(dt, Some(&terrain));
            for cell in field.cells() {
                assert!((0.0..=1.0).contains(&cell.moisture), "moisture {}", cell.moisture);
                assert!((0.0..=1.0).contains(&cell.intensity));
                assert!((0.0..=1.0).contains(&cell.target_intensity));
                assert!(cell.lightning_charge >= 0.0);
                assert!(cell.state_timer > 0.0 && cell.state_timer < STATE_TIMER_MAX);
            }
            assert!(field.wind().strength >= 0.1);
        }
        field.drain_events();
    }

    #[test]
    fn transitions_leave_fresh_timers() {
        let terrain = NoiseTerrain::new(&TerrainConfig::default());
        let mut field = WeatherField::new(params(30));
        let mut seen = 0;
        for _ in 0..2000 {
            let before: Vec<WeatherState> = field.cells().iter().map(|c| c.weather_state).collect();
            field.update(0.1, Some(&terrain));
            for (cell, prev) in field.cells().iter().zip(before) {
                if cell.weather_state != prev {
                    seen += 1;
                    assert_eq!(cell.state_progress, 0.0);
                    assert!(cell.state_timer >= STATE_TIMER_MIN);
                    assert!(cell.state_timer < STATE_TIMER_MAX);
                }
            }
        }
        assert!(seen > 0, "expected at least one transition");
    }
}
