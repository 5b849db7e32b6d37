use std::io::Write;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::simulation::SimulationConfig;
use crate::simulation::{self, statistics};
use crate::terrain::{NoiseTerrain, TerrainSampler};
use crate::weather::sphere::{angular_distance, lat_lon_to_unit, to_lat_lon};
use crate::weather::{WeatherEvent, WeatherField, WeatherState};

/// A debug override applied from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum GodAction {
    Storm,
    Clear,
    Set { index: i64, state: WeatherState },
}

/// Closest other cell to `index` by great-circle angle, in degrees.
fn nearest_neighbour(field: &WeatherField, index: usize) -> Option<(usize, f64)> {
    let origin = field.cell(index)?.position;
    field
        .cells()
        .iter()
        .filter(|c| c.id != index)
        .map(|c| (c.id, angular_distance(origin, c.position).to_degrees()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn build_terrain(config: &SimulationConfig) -> Option<NoiseTerrain> {
    config
        .terrain
        .enabled
        .then(|| NoiseTerrain::new(&config.terrain))
}

fn build_field(config: &SimulationConfig) -> WeatherField {
    let field = WeatherField::new(config.field.clone());
    info!(
        seed = field.params().seed,
        cells = field.cells().len(),
        planet_radius = field.params().planet_radius,
        terrain = config.terrain.enabled,
        "Weather field created"
    );
    field
}

/// Run `ticks` fixed steps as fast as possible. Returns the number of strikes seen.
fn run_headless(
    field: &mut WeatherField,
    terrain: Option<&dyn TerrainSampler>,
    dt: f64,
    ticks: u64,
) -> u32 {
    let mut strikes = 0;
    for _ in 0..ticks {
        let result = simulation::execute_tick(field, terrain, dt);
        strikes += result.statistics.lightning_strikes;
    }
    strikes
}

fn write_event(out: &mut impl Write, event: &WeatherEvent) -> Result<(), String> {
    let line = serde_json::to_string(event).map_err(|e| format!("Cannot encode event: {}", e))?;
    writeln!(out, "{}", line).map_err(|e| format!("Cannot write event: {}", e))
}

/// Run the simulation in real time, streaming events to stdout as JSON lines
/// until Ctrl-C or `max_ticks`.
pub async fn run_simulation(config: &SimulationConfig, max_ticks: Option<u64>) -> Result<(), String> {
    let terrain = build_terrain(config);
    let terrain_ref = terrain.as_ref().map(|t| t as &dyn TerrainSampler);
    let mut field = build_field(config);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let dt = config.tick_dt();
    let tick_interval = Duration::from_secs_f64(1.0 / config.tick_rate_hz as f64);
    let mut stdout = std::io::stdout();

    info!(
        tick_rate_hz = config.tick_rate_hz,
        dt,
        stats_interval = config.stats_interval,
        "Simulation running"
    );

    loop {
        let tick_start = Instant::now();

        let result = simulation::execute_tick(&mut field, terrain_ref, dt);
        for event in &result.events {
            write_event(&mut stdout, event)?;
        }

        let stats = &result.statistics;
        if stats.tick % config.stats_interval as u64 == 0 {
            info!(
                tick = stats.tick,
                summary = %stats.summary,
                avg_moisture = stats.avg_moisture,
                avg_intensity = stats.avg_intensity,
                over_water = stats.over_water_count,
                storm_fraction = statistics::state_fraction(stats, WeatherState::Storm),
                tick_ms = stats.tick_duration_ms,
                "Field statistics"
            );
        }

        if max_ticks.is_some_and(|max| stats.tick >= max) {
            break;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < tick_interval {
            tokio::select! {
                _ = tokio::time::sleep(tick_interval - elapsed) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        } else {
            warn!(
                tick = stats.tick,
                elapsed_ms = elapsed.as_secs_f32() * 1000.0,
                "Tick overran its interval"
            );
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = tokio::time::sleep(Duration::ZERO) => {}
            }
        }
    }

    info!(tick = field.tick_count(), summary = %field.summary(), "Simulation stopped");
    Ok(())
}

/// Simulate headlessly, then print the field summary and cell table (or one cell).
pub fn inspect(config: &SimulationConfig, ticks: u64, cell: Option<usize>) -> Result<(), String> {
    let terrain = build_terrain(config);
    let terrain_ref = terrain.as_ref().map(|t| t as &dyn TerrainSampler);
    let mut field = build_field(config);
    let strikes = run_headless(&mut field, terrain_ref, config.tick_dt(), ticks);

    if let Some(index) = cell {
        let c = field.cell(index).ok_or_else(|| {
            format!("Cell {} not found (field has {} cells)", index, field.cells().len())
        })?;
        let (lat, lon) = to_lat_lon(c.position);
        println!("=== Cell {} ===", c.id);
        println!("Position: lat {:.1}°, lon {:.1}°, radius {:.2}", lat, lon, c.position.length());
        println!("State: {} (timer {:.1}s, {:.1}s in state)", c.weather_state, c.state_timer, c.state_progress);
        println!("Intensity: {:.3} -> {:.3}", c.intensity, c.target_intensity);
        println!("Moisture: {:.3}", c.moisture);
        println!("Over water: {}", c.is_over_water);
        println!("Storm capable: {}", c.can_storm);
        println!("Lightning charge: {:.3}", c.lightning_charge);
        if let Some((id, degrees)) = nearest_neighbour(&field, index) {
            println!("Nearest neighbour: cell {} ({:.1}° away)", id, degrees);
        }
        return Ok(());
    }

    print_field_summary(&field, strikes);
    println!();
    println!(
        "{:>4} {:>7} {:>8} {:>7} {:>7} {:>6} {:>6} {:>6}",
        "Cell", "State", "Moist", "Intens", "Charge", "Water", "Storm", "Lat"
    );
    println!("{}", "-".repeat(60));
    for c in field.cells() {
        let (lat, _) = to_lat_lon(c.position);
        println!(
            "{:>4} {:>7} {:>8.3} {:>7.3} {:>7.3} {:>6} {:>6} {:>6.1}",
            c.id,
            c.weather_state.name(),
            c.moisture,
            c.intensity,
            c.lightning_charge,
            if c.is_over_water { "yes" } else { "no" },
            if c.can_storm { "yes" } else { "no" },
            lat
        );
    }
    Ok(())
}

/// Simulate headlessly, then report the local weather at ground level under (lat, lon).
pub fn query(config: &SimulationConfig, ticks: u64, lat: f64, lon: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("lat must be -90..90, got {}", lat));
    }
    let terrain = build_terrain(config);
    let terrain_ref = terrain.as_ref().map(|t| t as &dyn TerrainSampler);
    let mut field = build_field(config);
    run_headless(&mut field, terrain_ref, config.tick_dt(), ticks);

    let direction = lat_lon_to_unit(lat, lon);
    let elevation = terrain_ref.map_or(0.0, |t| t.elevation(direction));
    let ground = direction * (field.params().planet_radius + elevation.max(field.params().water_level));
    let local = field.query_at(ground);

    let json = serde_json::to_string_pretty(&local).map_err(|e| format!("Cannot encode result: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Apply a debug override to a fresh field, simulate, and print the summary.
pub fn god(config: &SimulationConfig, action: &GodAction, ticks: u64) -> Result<(), String> {
    let terrain = build_terrain(config);
    let terrain_ref = terrain.as_ref().map(|t| t as &dyn TerrainSampler);
    let mut field = build_field(config);

    match action {
        GodAction::Storm => field.trigger_storm(),
        GodAction::Clear => field.clear_weather(),
        GodAction::Set { index, state } => field.set_cloud_weather(*index, *state),
    }

    let strikes = run_headless(&mut field, terrain_ref, config.tick_dt(), ticks);
    print_field_summary(&field, strikes);
    Ok(())
}

fn print_field_summary(field: &WeatherField, strikes: u32) {
    let info = field.weather_info();
    let (wind_lat, wind_lon) = to_lat_lon(info.wind_direction);
    println!("=== Weather Field ===");
    println!("Seed: {}", field.params().seed);
    println!("Tick: {}", field.tick_count());
    println!("Summary: {}", info.summary);
    println!("Active clouds: {} / {}", info.active_cloud_count, field.cells().len());
    println!("Storm cells: {}", info.storm_count);
    println!("Max intensity: {:.3}", info.max_intensity);
    println!("Raining: {}  Storming: {}", info.is_raining, info.is_storming);
    println!(
        "Wind: {:.2} toward ({:.1}°, {:.1}°)",
        info.wind_strength, wind_lat, wind_lon
    );
    println!("Lightning strikes: {}", strikes);
}
