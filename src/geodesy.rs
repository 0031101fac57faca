// Geodesy module - great-circle distance between runner positions.
//
// Uses the haversine formula on a spherical Earth. Accuracy is well within
// what a live dashboard needs; errors are ~0.5% worst case against an
// ellipsoid model.

use crate::constants::EARTH_RADIUS_M;

/// A validated (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Position { lat, lon }
    }
}

/// Returns the great-circle distance in meters between two positions.
///
/// Haversine formula on a mean Earth radius of 6,371,000 m. Pure; the caller
/// guarantees numeric inputs (coordinates come out of the validator).
///
/// # Example
/// ```
/// use race_tracker::geodesy::{haversine_m, Position};
/// let d = haversine_m(
///     Position::new(51.5074, -0.1278), // London
///     Position::new(48.8566, 2.3522),  // Paris
/// );
/// assert!((d - 344_000.0).abs() < 5_000.0);
/// ```
pub fn haversine_m(a: Position, b: Position) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
