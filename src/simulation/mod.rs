pub mod statistics;

use std::time::Instant;

use tracing::warn;

use crate::simulation::statistics::FieldStatistics;
use crate::terrain::TerrainSampler;
use crate::weather::{RandomSource, WeatherEvent, WeatherField};

/// Result of executing a single tick.
#[derive(Debug)]
pub struct TickResult {
    pub statistics: FieldStatistics,
    /// Events raised during the tick, in emission order.
    pub events: Vec<WeatherEvent>,
}

/// Execute a single simulation tick on the field.
///
/// Advances the field, drains its event queue, then computes statistics
/// over the fully advanced state. Non-finite or negative `dt` is treated as 0.
pub fn execute_tick<R: RandomSource>(
    field: &mut WeatherField<R>,
    terrain: Option<&dyn TerrainSampler>,
    dt: f64,
) -> TickResult {
    let tick_start = Instant::now();

    let dt = if dt.is_finite() && dt >= 0.0 {
        dt
    } else {
        warn!(dt, tick = field.tick_count(), "Rejected invalid dt, using 0");
        0.0
    };

    field.update(dt, terrain);
    let events = field.drain_events();

    let tick_duration = tick_start.elapsed().as_secs_f32() * 1000.0;
    let statistics = statistics::compute_statistics(field, &events, tick_duration);

    TickResult { statistics, events }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::field::FieldParams;
    use crate::terrain::{NoiseTerrain, TerrainConfig};
    use crate::weather::WeatherState;

    fn field(cell_count: u32) -> WeatherField {
        WeatherField::new(FieldParams {
            seed: 7,
            cell_count,
            ..FieldParams::default()
        })
    }

    #[test]
    fn single_tick_advances_tick_count() {
        let mut f = field(10);
        let result = execute_tick(&mut f, None, 0.1);
        assert_eq!(result.statistics.tick, 1);
        assert_eq!(f.tick_count(), 1);
        let result = execute_tick(&mut f, None, 0.1);
        assert_eq!(result.statistics.tick, 2);
    }

    #[test]
    fn events_are_handed_to_caller() {
        let mut f = field(10);
        f.trigger_storm();
        let result = execute_tick(&mut f, None, 0.1);
        assert!(result.events.iter().any(|e| matches!(
            e,
            WeatherEvent::SummaryChanged { to: WeatherState::Storm, .. }
        )));
        // field queue is empty afterwards
        assert!(f.drain_events().is_empty());
    }

    #[test]
    fn invalid_dt_is_neutralised() {
        let mut f = field(5);
        let before = f.cells().to_vec();
        let result = execute_tick(&mut f, None, f64::NAN);
        assert_eq!(result.statistics.tick, 1);
        for (a, b) in before.iter().zip(f.cells()) {
            assert_eq!(a.moisture, b.moisture);
            assert_eq!(a.intensity, b.intensity);
        }
    }

    #[test]
    fn storm_run_produces_lightning() {
        let terrain = NoiseTerrain::new(&TerrainConfig::default());
        let mut f = field(30);
        let mut strikes = 0;
        for _ in 0..600 {
            if f.tick_count() % 100 == 0 {
                f.trigger_storm();
            }
            let result = execute_tick(&mut f, Some(&terrain), 0.1);
            assert_eq!(result.statistics.lightning_strikes as usize, result
                .events
                .iter()
                .filter(|e| matches!(e, WeatherEvent::LightningStrike(_)))
                .count());
            strikes += result.statistics.lightning_strikes;
        }
        assert!(strikes > 0, "forced storms should strike");
    }
}
