// Feed message classification and normalization.
//
// Inbound payloads do not share one shape: the payload of interest may sit
// under a "message" or "payload" wrapper key, or be the top-level object;
// ids arrive as strings or integers; metric fields go by several names.
// Everything is normalized here into one canonical Telemetry record before
// it touches any state.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// One normalized telemetry record: the canonical internal shape for the
/// union of observed wire shapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    pub runner_id: String,
    pub name: Option<String>,
    pub distance_m: Option<f64>,
    pub pace_min_km: Option<f64>,
    pub speed_kmh: Option<f64>,
    /// Wire-supplied event timestamp, distinct from arrival time.
    pub timestamp: Option<String>,
}

/// An inbound feed event after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Informational text from the server; logged, no state change.
    Info(String),
    /// Server liveness probe; answered with a pong-style reply.
    Ping,
    /// Reply to our own keep-alive; ignored.
    Pong,
    /// Single-runner telemetry. The payload is kept raw so the coordinate
    /// validator can apply its own alias/coercion rules.
    PositionUpdate { telemetry: Telemetry, payload: Value },
    /// Batch metric merge for multiple runners, no positions.
    LeaderboardSnapshot(Vec<Telemetry>),
    /// Recognized-but-uninteresting or unknown type; logged and dropped.
    Ignored(String),
}

/// Messages sent from the tracker to the feed server.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// Keep-alive probe with the current epoch time in milliseconds.
    Ping { time: u64 },
    /// Reply to a server ping.
    Pong {},
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed message body: {0}")]
    BadJson(#[from] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("message has no string \"type\" field")]
    MissingType,
    #[error("telemetry has no runner identity")]
    MissingIdentity,
}

/// Unwraps the payload of interest: try "message", then "payload", then the
/// envelope itself.
pub fn payload_of(envelope: &Value) -> &Value {
    envelope
        .get("message")
        .filter(|v| v.is_object())
        .or_else(|| envelope.get("payload").filter(|v| v.is_object()))
        .unwrap_or(envelope)
}

/// Normalizes the runner identity: first non-null of `runner_id`/`id`,
/// strings and integers both accepted, rendered as a string key.
fn extract_identity(payload: &Value) -> Option<String> {
    ["runner_id", "id"].iter().find_map(|k| {
        match payload.get(*k) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    })
}

fn extract_f64(payload: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| payload.get(*k).and_then(Value::as_f64))
}

fn extract_string(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Builds a canonical Telemetry record from one payload object.
pub fn normalize(payload: &Value) -> Result<Telemetry, ParseError> {
    let runner_id = extract_identity(payload).ok_or(ParseError::MissingIdentity)?;
    Ok(Telemetry {
        runner_id,
        name: extract_string(payload, "name"),
        distance_m: extract_f64(payload, &["distance_m"]),
        pace_min_km: extract_f64(payload, &["pace_spm", "pace_min_km", "pace_m_per_km"]),
        speed_kmh: extract_f64(payload, &["speed_kmh"]),
        timestamp: extract_string(payload, "timestamp"),
    })
}

/// Classifies one raw frame into a FeedEvent.
///
/// Malformed JSON or a missing type is a ParseError; unrecognized types are
/// not errors, they classify as Ignored.
pub fn classify(raw: &str) -> Result<FeedEvent, ParseError> {
    let envelope: Value = serde_json::from_str(raw)?;
    if !envelope.is_object() {
        return Err(ParseError::NotAnObject);
    }
    let kind = envelope
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingType)?;

    match kind {
        "info" => {
            let text = envelope
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            Ok(FeedEvent::Info(text))
        }
        "ping" => Ok(FeedEvent::Ping),
        "pong" => Ok(FeedEvent::Pong),
        "race_update" => {
            let payload = payload_of(&envelope).clone();
            let telemetry = normalize(&payload)?;
            Ok(FeedEvent::PositionUpdate { telemetry, payload })
        }
        "leaderboard_snapshot" | "leaderboard_update" => {
            let entries = envelope
                .get("data")
                .and_then(Value::as_array)
                .map(|rows| rows.iter().filter_map(|r| normalize(r).ok()).collect())
                .unwrap_or_default();
            Ok(FeedEvent::LeaderboardSnapshot(entries))
        }
        other => Ok(FeedEvent::Ignored(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_info() {
        let event = classify(r#"{"type": "info", "message": "race started"}"#).unwrap();
        assert_eq!(event, FeedEvent::Info("race started".to_string()));
    }

    #[test]
    fn test_classify_ping_pong() {
        assert_eq!(classify(r#"{"type": "ping"}"#).unwrap(), FeedEvent::Ping);
        assert_eq!(classify(r#"{"type": "pong"}"#).unwrap(), FeedEvent::Pong);
    }

    #[test]
    fn test_unknown_type_is_ignored_not_error() {
        let event = classify(r#"{"type": "weather_update"}"#).unwrap();
        assert_eq!(event, FeedEvent::Ignored("weather_update".to_string()));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(classify("{not json").is_err());
        assert!(classify(r#"{"no_type": 1}"#).is_err());
    }

    #[test]
    fn test_race_update_under_message_wrapper() {
        let raw = json!({
            "type": "race_update",
            "message": {
                "runner_id": 7, "name": "Ana",
                "lat": 31.5, "lon": 74.3,
                "distance_m": 120.5, "pace_spm": 320.0,
                "timestamp": "10:15:00"
            }
        })
        .to_string();
        match classify(&raw).unwrap() {
            FeedEvent::PositionUpdate { telemetry, payload } => {
                assert_eq!(telemetry.runner_id, "7");
                assert_eq!(telemetry.name.as_deref(), Some("Ana"));
                assert_eq!(telemetry.distance_m, Some(120.5));
                assert_eq!(telemetry.pace_min_km, Some(320.0));
                assert_eq!(telemetry.timestamp.as_deref(), Some("10:15:00"));
                assert_eq!(payload.get("lat").and_then(Value::as_f64), Some(31.5));
            }
            other => panic!("expected PositionUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_race_update_under_payload_wrapper() {
        let raw = json!({
            "type": "race_update",
            "payload": { "id": "12", "latitude": 31.5, "lng": 74.3 }
        })
        .to_string();
        match classify(&raw).unwrap() {
            FeedEvent::PositionUpdate { telemetry, .. } => {
                assert_eq!(telemetry.runner_id, "12");
            }
            other => panic!("expected PositionUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_race_update_flat_payload() {
        let raw = json!({ "type": "race_update", "runner_id": 3, "lat": 1.0, "lon": 2.0 })
            .to_string();
        match classify(&raw).unwrap() {
            FeedEvent::PositionUpdate { telemetry, .. } => {
                assert_eq!(telemetry.runner_id, "3");
            }
            other => panic!("expected PositionUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_race_update_without_identity_is_error() {
        let raw = json!({ "type": "race_update", "message": { "lat": 1.0, "lon": 2.0 } })
            .to_string();
        assert!(matches!(classify(&raw), Err(ParseError::MissingIdentity)));
    }

    #[test]
    fn test_pace_aliases() {
        for key in ["pace_spm", "pace_min_km", "pace_m_per_km"] {
            let payload = json!({ "runner_id": 1, key: 5.2 });
            let t = normalize(&payload).unwrap();
            assert_eq!(t.pace_min_km, Some(5.2), "alias {} not accepted", key);
        }
    }

    #[test]
    fn test_leaderboard_snapshot() {
        let raw = json!({
            "type": "leaderboard_snapshot",
            "data": [
                { "runner_id": 1, "distance_m": 900.0 },
                { "runner_id": 2, "distance_m": 1200.0, "speed_kmh": 11.5 },
                { "no_id_here": true }
            ]
        })
        .to_string();
        match classify(&raw).unwrap() {
            FeedEvent::LeaderboardSnapshot(entries) => {
                // The identity-less row is skipped, not fatal
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].runner_id, "1");
                assert_eq!(entries[1].speed_kmh, Some(11.5));
            }
            other => panic!("expected LeaderboardSnapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_leaderboard_update_is_same_shape() {
        let raw = json!({ "type": "leaderboard_update", "data": [{ "id": "9" }] }).to_string();
        assert!(matches!(
            classify(&raw).unwrap(),
            FeedEvent::LeaderboardSnapshot(entries) if entries.len() == 1
        ));
    }

    #[test]
    fn test_serialize_outbound_ping() {
        let json = serde_json::to_string(&OutboundMessage::Ping { time: 1700000000000 }).unwrap();
        assert!(json.contains("\"type\":\"ping\""));
        assert!(json.contains("\"time\":1700000000000"));
    }
}
