// Leaderboard ranking - a pure function over a store snapshot.

use std::cmp::Ordering;
use std::time::{Duration, SystemTime};

use crate::store::RunnerRecord;

/// One rendered leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub distance_m: f64,
    /// Formatted pace, "-" when the metric is absent.
    pub pace: String,
    /// Formatted speed, "-" when the metric is absent.
    pub speed: String,
    /// Human-readable time since the last accepted event.
    pub last_seen: String,
}

/// What the leaderboard view receives: ordered rows, or an explicit
/// empty-state signal (never a silently empty list).
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardUpdate {
    Rows(Vec<LeaderboardRow>),
    NoRunnersYet,
}

/// Formats an optional metric, with a placeholder for absent values.
/// Absent is not the same as zero: a genuine 0.0 renders as "0.00".
fn metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

/// Formats the age of a record's last update relative to `now`.
pub fn relative_age(then: SystemTime, now: SystemTime) -> String {
    let elapsed = now.duration_since(then).unwrap_or(Duration::ZERO);
    let secs = elapsed.as_secs();
    if secs < 2 {
        "just now".to_string()
    } else if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

/// Produces the ranked leaderboard for a snapshot of runners.
///
/// Total order: cumulative distance descending, ties broken by id ascending.
/// Deterministic and stable across repeated computation with unchanged
/// input. Tolerates records with missing derived metrics.
pub fn rank(mut records: Vec<RunnerRecord>, now: SystemTime) -> LeaderboardUpdate {
    if records.is_empty() {
        return LeaderboardUpdate::NoRunnersYet;
    }

    records.sort_by(|a, b| {
        b.distance_m
            .partial_cmp(&a.distance_m)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let rows = records
        .into_iter()
        .enumerate()
        .map(|(i, r)| LeaderboardRow {
            rank: i + 1,
            id: r.id,
            name: r.name,
            distance_m: r.distance_m,
            pace: metric(r.pace_min_km),
            speed: metric(r.speed_kmh),
            last_seen: relative_age(r.last_update, now),
        })
        .collect();

    LeaderboardUpdate::Rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::messages::Telemetry;
    use crate::store::{DistanceSource, RunnerStore};

    fn records(entries: &[(&str, f64)]) -> Vec<RunnerRecord> {
        let mut store = RunnerStore::new(100.0, DistanceSource::ServerReported);
        for (id, distance) in entries {
            store.upsert(&Telemetry {
                runner_id: id.to_string(),
                distance_m: Some(*distance),
                ..Telemetry::default()
            });
        }
        store.snapshot_all()
    }

    #[test]
    fn test_empty_set_is_explicit() {
        assert_eq!(
            rank(Vec::new(), SystemTime::now()),
            LeaderboardUpdate::NoRunnersYet
        );
    }

    #[test]
    fn test_larger_distance_ranks_first() {
        let update = rank(records(&[("1", 500.0), ("2", 1200.0)]), SystemTime::now());
        match update {
            LeaderboardUpdate::Rows(rows) => {
                assert_eq!(rows[0].id, "2");
                assert_eq!(rows[0].rank, 1);
                assert_eq!(rows[1].id, "1");
                assert_eq!(rows[1].rank, 2);
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_ties_break_by_id_ascending() {
        let update = rank(
            records(&[("20", 800.0), ("3", 800.0), ("11", 800.0)]),
            SystemTime::now(),
        );
        match update {
            LeaderboardUpdate::Rows(rows) => {
                // Lexicographic id order for equal distances
                let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
                assert_eq!(ids, ["11", "20", "3"]);
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_order_is_stable_across_recomputation() {
        let snapshot = records(&[("a", 10.0), ("b", 10.0), ("c", 30.0)]);
        let now = SystemTime::now();
        let first = rank(snapshot.clone(), now);
        let second = rank(snapshot, now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_metrics_render_placeholder() {
        let update = rank(records(&[("7", 100.0)]), SystemTime::now());
        match update {
            LeaderboardUpdate::Rows(rows) => {
                assert_eq!(rows[0].pace, "-");
                assert_eq!(rows[0].speed, "-");
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_genuine_zero_is_not_placeholder() {
        assert_eq!(metric(Some(0.0)), "0.00");
        assert_eq!(metric(None), "-");
    }

    #[test]
    fn test_relative_age_buckets() {
        let now = SystemTime::now();
        assert_eq!(relative_age(now, now), "just now");
        assert_eq!(relative_age(now - Duration::from_secs(12), now), "12s ago");
        assert_eq!(relative_age(now - Duration::from_secs(180), now), "3m ago");
        assert_eq!(relative_age(now - Duration::from_secs(7200), now), "2h ago");
        // A record "from the future" (clock skew) must not panic
        assert_eq!(relative_age(now + Duration::from_secs(5), now), "just now");
    }
}
