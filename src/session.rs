// Race session - one race feed's authoritative state and its presentation.
//
// Replaces the source design's global runner map and global socket: every
// RaceSession is an independent instance owning its store, animator and
// collaborator handles, so multiple races never collide.
//
// Concurrency discipline: all methods run on the single feed task. Events
// mutate the store serially; the frame tick touches only presentation state
// (marker positions), never RunnerRecords. That separation is what keeps
// "what we know" and "what is shown" free of races.

use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, warn};

use crate::geodesy::Position;
use crate::interpolate::MarkerAnimator;
use crate::net::messages::{FeedEvent, Telemetry};
use crate::output::{LeaderboardView, MapSurface};
use crate::ranking::{self, LeaderboardUpdate};
use crate::store::{DistanceSource, RunnerStore};
use crate::validate;
use crate::constants::FIRST_FIX_ZOOM;

pub struct RaceSession {
    store: RunnerStore,
    animator: MarkerAnimator,
    map: Box<dyn MapSurface>,
    leaderboard: Box<dyn LeaderboardView>,
    /// The view is centered once, on the first validated fix.
    centered: bool,
    /// Cached last-rendered leaderboard, so unchanged output is not
    /// re-rendered on every cadence tick.
    last_rendered: Option<LeaderboardUpdate>,
}

impl RaceSession {
    pub fn new(
        teleport_ceiling_m: f64,
        distance_source: DistanceSource,
        glide: Duration,
        map: Box<dyn MapSurface>,
        leaderboard: Box<dyn LeaderboardView>,
    ) -> Self {
        RaceSession {
            store: RunnerStore::new(teleport_ceiling_m, distance_source),
            animator: MarkerAnimator::new(glide),
            map,
            leaderboard,
            centered: false,
            last_rendered: None,
        }
    }

    pub fn runner_count(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &RunnerStore {
        &self.store
    }

    /// Applies one classified feed event. Ping/pong replies are the feed
    /// loop's business; everything state-bearing lands here.
    pub fn handle_event(&mut self, event: FeedEvent, now: Instant) {
        match event {
            FeedEvent::Info(text) => info!("feed: {}", text),
            FeedEvent::Ping | FeedEvent::Pong => {}
            FeedEvent::Ignored(kind) => debug!("ignoring message type \"{}\"", kind),
            FeedEvent::LeaderboardSnapshot(entries) => {
                debug!("leaderboard snapshot: {} entries", entries.len());
                self.store.apply_leaderboard_snapshot(&entries);
                self.refresh_leaderboard();
            }
            FeedEvent::PositionUpdate { telemetry, payload } => {
                // Minimal-safe policy: a race_update without a valid
                // position is dropped whole, name corrections included.
                match validate::extract_position(&payload) {
                    Ok(position) => self.apply_position_update(telemetry, position, now),
                    Err(e) => {
                        warn!("dropping update for runner {}: {}", telemetry.runner_id, e);
                    }
                }
            }
        }
    }

    fn apply_position_update(&mut self, telemetry: Telemetry, position: Position, now: Instant) {
        let id = telemetry.runner_id.clone();
        let previous = self.store.get(&id).and_then(|r| r.position);

        self.store.upsert(&telemetry);
        self.store.apply_position_delta(&id, position);

        let record = match self.store.get(&id) {
            Some(r) => r,
            None => return,
        };

        match previous {
            None => {
                self.map.create_marker(&id, position, &record.name);
                if !self.centered {
                    self.map.center_view(position, FIRST_FIX_ZOOM);
                    self.centered = true;
                }
            }
            Some(last_rendered) => {
                self.animator.retarget(&id, last_rendered, position, now);
            }
        }

        let popup = match &record.event_timestamp {
            Some(ts) => format!("{}<br>{}", record.name, ts),
            None => record.name.clone(),
        };
        self.map.set_popup(&id, &popup);

        self.refresh_leaderboard();
    }

    /// Samples all in-flight marker glides once and issues the resulting
    /// move commands. Called on every frame tick.
    pub fn tick_frame(&mut self, now: Instant) {
        for (id, position) in self.animator.tick(now) {
            self.map.move_marker(&id, position);
        }
    }

    /// Recomputes the ranking and pushes it to the view when it changed.
    /// Also called on a fixed cadence so the "last seen" column ages
    /// without traffic.
    pub fn refresh_leaderboard(&mut self) {
        let update = ranking::rank(self.store.snapshot_all(), SystemTime::now());
        if self.last_rendered.as_ref() != Some(&update) {
            self.leaderboard.render(&update);
            self.last_rendered = Some(update);
        }
    }

    /// Cancels in-flight animation on teardown.
    pub fn shutdown(&mut self) {
        self.animator.clear();
    }
}
