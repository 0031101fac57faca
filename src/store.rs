// Runner state store - the authoritative runner identity -> metrics mapping.
//
// Owns all mutation. Confined to the single feed task, so it needs no
// internal locking; every event is applied serially in arrival order.

use std::collections::HashMap;
use std::time::SystemTime;

use clap::ValueEnum;

use crate::geodesy::{haversine_m, Position};
use crate::net::messages::Telemetry;

/// Which value is authoritative for a runner's cumulative distance.
///
/// Never mixed or averaged: one source of truth per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DistanceSource {
    /// Teleport-filtered local accumulation of validated position deltas.
    /// A server-supplied distance_m only seeds a record that has no
    /// validated position yet.
    LocalAccumulation,
    /// The server-supplied distance_m field, merged last-write-wins.
    /// Position deltas update the position but are never accumulated.
    ServerReported,
}

/// One tracked runner.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerRecord {
    pub id: String,
    /// Display label; defaults to "Runner {id}" until a name arrives.
    pub name: String,
    /// Last validated position. None until the first valid fix.
    pub position: Option<Position>,
    /// Cumulative distance in meters. Never decremented.
    pub distance_m: f64,
    pub pace_min_km: Option<f64>,
    pub speed_kmh: Option<f64>,
    /// Arrival wall-clock of the last accepted event. Informational only;
    /// never used for ordering (events may arrive out of order).
    pub last_update: SystemTime,
    /// Wire-supplied event timestamp, if any.
    pub event_timestamp: Option<String>,
}

impl RunnerRecord {
    fn new(id: &str, now: SystemTime) -> Self {
        RunnerRecord {
            id: id.to_string(),
            name: format!("Runner {}", id),
            position: None,
            distance_m: 0.0,
            pace_min_km: None,
            speed_kmh: None,
            last_update: now,
            event_timestamp: None,
        }
    }
}

/// Authoritative store of all RunnerRecords for one race session.
pub struct RunnerStore {
    runners: HashMap<String, RunnerRecord>,
    teleport_ceiling_m: f64,
    distance_source: DistanceSource,
}

impl RunnerStore {
    pub fn new(teleport_ceiling_m: f64, distance_source: DistanceSource) -> Self {
        RunnerStore {
            runners: HashMap::new(),
            teleport_ceiling_m,
            distance_source,
        }
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RunnerRecord> {
        self.runners.get(id)
    }

    /// Merges a telemetry record into the store, creating the runner on
    /// first mention. Last-write-wins per field: every field present in the
    /// incoming record overwrites the stored value, absent fields are
    /// preserved. `last_update` is always set to now.
    ///
    /// Position fields are never touched here; they go through
    /// `apply_position_delta` after validation.
    pub fn upsert(&mut self, telemetry: &Telemetry) -> &RunnerRecord {
        let now = SystemTime::now();
        let record = self
            .runners
            .entry(telemetry.runner_id.clone())
            .or_insert_with(|| RunnerRecord::new(&telemetry.runner_id, now));

        if let Some(name) = &telemetry.name {
            record.name = name.clone();
        }
        if let Some(pace) = telemetry.pace_min_km {
            record.pace_min_km = Some(pace);
        }
        if let Some(speed) = telemetry.speed_kmh {
            record.speed_kmh = Some(speed);
        }
        if let Some(ts) = &telemetry.timestamp {
            record.event_timestamp = Some(ts.clone());
        }
        if let Some(distance) = telemetry.distance_m {
            match self.distance_source {
                DistanceSource::ServerReported => record.distance_m = distance,
                // Seed only: once a validated position exists, the local
                // accumulation is authoritative.
                DistanceSource::LocalAccumulation if record.position.is_none() => {
                    record.distance_m = distance;
                }
                DistanceSource::LocalAccumulation => {}
            }
        }
        record.last_update = now;
        record
    }

    /// Applies a validated position to a runner. Returns the distance
    /// credited to the cumulative total (0.0 when filtered or not
    /// accumulating).
    ///
    /// Teleport filter: a step larger than the configured ceiling is treated
    /// as a GPS glitch or session jump. Its distance contribution is
    /// discarded but the position still updates to the new value.
    pub fn apply_position_delta(&mut self, id: &str, new_position: Position) -> f64 {
        let now = SystemTime::now();
        let record = self
            .runners
            .entry(id.to_string())
            .or_insert_with(|| RunnerRecord::new(id, now));

        let mut credited = 0.0;
        if self.distance_source == DistanceSource::LocalAccumulation {
            if let Some(last) = record.position {
                let d = haversine_m(last, new_position);
                if d <= self.teleport_ceiling_m {
                    record.distance_m += d;
                    credited = d;
                }
            }
        }
        record.position = Some(new_position);
        record.last_update = now;
        credited
    }

    /// Bulk merge of partial records from a leaderboard snapshot. Same
    /// last-write-wins semantics as `upsert`; positions are never touched
    /// (snapshot entries carry no coordinates).
    pub fn apply_leaderboard_snapshot(&mut self, entries: &[Telemetry]) {
        for entry in entries {
            self.upsert(entry);
        }
    }

    /// Immutable-at-call-time view of all runners, for ranking.
    pub fn snapshot_all(&self) -> Vec<RunnerRecord> {
        self.runners.values().cloned().collect()
    }
}
