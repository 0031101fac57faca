// Coordinate validation.
//
// Telemetry payloads are loosely shaped: latitude may arrive as "lat" or
// "latitude", longitude as "lon", "lng" or "longitude", and either may be a
// JSON number or a numeric string. This module turns that union of shapes
// into a validated Position or a typed rejection. Rejection is the single
// most common legitimate failure mode of the feed and must never crash the
// pipeline; callers log and drop.

use serde_json::Value;
use thiserror::Error;

use crate::geodesy::Position;

/// Accepted field names for latitude, in priority order.
const LAT_KEYS: [&str; 2] = ["lat", "latitude"];
/// Accepted field names for longitude, in priority order.
const LON_KEYS: [&str; 3] = ["lon", "lng", "longitude"];

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("no latitude field present")]
    MissingLatitude,
    #[error("no longitude field present")]
    MissingLongitude,
    #[error("latitude is not a number: {0}")]
    BadLatitude(String),
    #[error("longitude is not a number: {0}")]
    BadLongitude(String),
    #[error("coordinates out of range: ({lat}, {lon})")]
    OutOfRange { lat: f64, lon: f64 },
}

/// Coerces a JSON value to a float. Accepts numbers and numeric strings.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Returns the first present key from `keys` in `obj`, with its value.
fn first_present<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(k))
}

/// Checks that a coordinate pair is finite and within range.
pub fn check_range(lat: f64, lon: f64) -> Result<Position, CoordinateError> {
    if !lat.is_finite()
        || !lon.is_finite()
        || !(-90.0..=90.0).contains(&lat)
        || !(-180.0..=180.0).contains(&lon)
    {
        return Err(CoordinateError::OutOfRange { lat, lon });
    }
    Ok(Position::new(lat, lon))
}

/// Extracts and validates a position from a telemetry payload object.
///
/// Tries each accepted field-name alias, coerces strings to numbers, then
/// range-checks. Does not mutate anything; on failure the caller decides
/// whether to drop the whole event.
pub fn extract_position(payload: &Value) -> Result<Position, CoordinateError> {
    let lat_raw = first_present(payload, &LAT_KEYS)
        .ok_or(CoordinateError::MissingLatitude)?;
    let lon_raw = first_present(payload, &LON_KEYS)
        .ok_or(CoordinateError::MissingLongitude)?;

    let lat = coerce_number(lat_raw)
        .ok_or_else(|| CoordinateError::BadLatitude(lat_raw.to_string()))?;
    let lon = coerce_number(lon_raw)
        .ok_or_else(|| CoordinateError::BadLongitude(lon_raw.to_string()))?;

    check_range(lat, lon)
}
