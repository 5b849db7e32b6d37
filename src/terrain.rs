//! Terrain collaborator seam.
//!
//! The weather core never owns terrain data. It asks a `TerrainSampler` for
//! the elevation under a unit-sphere direction; elevation is relative to the
//! planet surface, so anything below the field's water level reads as sea.

use glam::DVec3;
use noise::{NoiseFn, Perlin};
use serde::Deserialize;

pub trait TerrainSampler {
    /// Elevation above the planet's reference radius at unit direction `direction`.
    fn elevation(&self, direction: DVec3) -> f64;
}

impl<F> TerrainSampler for F
where
    F: Fn(DVec3) -> f64,
{
    fn elevation(&self, direction: DVec3) -> f64 {
        self(direction)
    }
}

/// Settings for the built-in procedural terrain (`[terrain]` table).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerrainConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_seed")]
    pub seed: u32,
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
}

fn default_enabled() -> bool {
    true
}
fn default_seed() -> u32 {
    7
}
fn default_frequency() -> f64 {
    1.5
}
fn default_amplitude() -> f64 {
    4.0
}
fn default_octaves() -> u32 {
    4
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            enabled: default_enabled(),
            seed: default_seed(),
            frequency: default_frequency(),
            amplitude: default_amplitude(),
            octaves: default_octaves(),
        }
    }
}

/// Fractal Perlin terrain sampled on the unit sphere. Roughly half of the
/// surface sits below zero, giving the water cycle both oceans and land.
pub struct NoiseTerrain {
    perlin: Perlin,
    frequency: f64,
    amplitude: f64,
    octaves: u32,
}

impl NoiseTerrain {
    pub fn new(config: &TerrainConfig) -> Self {
        Self {
            perlin: Perlin::new(config.seed),
            frequency: config.frequency,
            amplitude: config.amplitude,
            octaves: config.octaves.max(1),
        }
    }
}

impl TerrainSampler for NoiseTerrain {
    fn elevation(&self, direction: DVec3) -> f64 {
        let mut total = 0.0;
        let mut freq = self.frequency;
        let mut amp = 1.0;
        let mut max_amp = 0.0;
        for _ in 0..self.octaves {
            total += self
                .perlin
                .get([direction.x * freq, direction.y * freq, direction.z * freq])
                * amp;
            max_amp += amp;
            freq *= 2.0;
            amp *= 0.5;
        }
        (total / max_amp) * self.amplitude
    }
}
