//! Spherical helpers for cloud positions.
//!
//! Coordinate convention: x=cos(lat)*cos(lon), y=cos(lat)*sin(lon), z=sin(lat).
//! The world's vertical axis is +Z.

use glam::{DQuat, DVec3};

use crate::weather::rng::RandomSource;

pub const VERTICAL: DVec3 = DVec3::Z;

/// Rotate `v` about `axis` by `angle` radians. A degenerate axis leaves `v` unchanged.
pub fn rotate_about_axis(v: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    let axis = axis.normalize_or_zero();
    if axis == DVec3::ZERO || angle == 0.0 {
        return v;
    }
    DQuat::from_axis_angle(axis, angle) * v
}

/// Uniformly distributed unit vector.
pub fn random_unit_vector(rng: &mut dyn RandomSource) -> DVec3 {
    let z = rng.range(-1.0, 1.0);
    let theta = rng.range(0.0, std::f64::consts::TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    DVec3::new(r * theta.cos(), r * theta.sin(), z)
}

/// Any unit vector perpendicular to `v`.
pub fn any_perpendicular(v: DVec3) -> DVec3 {
    let v = v.normalize_or_zero();
    if v == DVec3::ZERO {
        return DVec3::X;
    }
    v.any_orthonormal_vector()
}

/// Convert lat/lon (degrees) to a unit vector.
pub fn lat_lon_to_unit(lat: f64, lon: f64) -> DVec3 {
    let lat = lat.to_radians();
    let lon = lon.to_radians();
    DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Convert any non-zero vector to lat/lon (degrees) of its direction.
pub fn to_lat_lon(v: DVec3) -> (f64, f64) {
    let n = v.normalize_or_zero();
    let lat = n.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = n.y.atan2(n.x).to_degrees();
    (lat, lon)
}

/// Great-circle angular distance (radians) between the directions of two vectors.
pub fn angular_distance(a: DVec3, b: DVec3) -> f64 {
    let dot = a.normalize_or_zero().dot(b.normalize_or_zero()).clamp(-1.0, 1.0);
    dot.acos()
}
