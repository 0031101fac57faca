// Marker motion interpolation.
//
// A marker glides from its last rendered position to a new authoritative
// position over a fixed duration instead of snapping, so irregular update
// cadence doesn't produce jarring jumps. The math here is pure; the frame
// cadence comes from the feed loop's cooperative tick, never a blocking
// sleep. Presentation state only: nothing here touches RunnerRecords.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::geodesy::Position;

/// One in-progress glide between two positions.
#[derive(Debug, Clone)]
struct Glide {
    from: Position,
    to: Position,
    start: Instant,
    duration: Duration,
}

impl Glide {
    /// Elapsed-time fraction in [0, 1].
    fn fraction(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Linear interpolation in lat/lon space at time `now`.
    fn sample(&self, now: Instant) -> Position {
        let t = self.fraction(now);
        Position::new(
            self.from.lat + (self.to.lat - self.from.lat) * t,
            self.from.lon + (self.to.lon - self.from.lon) * t,
        )
    }

    fn finished(&self, now: Instant) -> bool {
        self.fraction(now) >= 1.0
    }
}

/// Drives all marker glides for a session. At most one glide per marker;
/// a marker is "animating" exactly while it has an entry here.
pub struct MarkerAnimator {
    active: HashMap<String, Glide>,
    duration: Duration,
}

impl MarkerAnimator {
    pub fn new(duration: Duration) -> Self {
        MarkerAnimator {
            active: HashMap::new(),
            duration,
        }
    }

    pub fn is_animating(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Starts a glide toward `target`. If a glide for this marker is already
    /// in progress, the new one starts from the marker's current
    /// *interpolated* position rather than the old target, so a superseding
    /// update redirects the motion without a visual stutter. Otherwise it
    /// starts from `resting`, the marker's last rendered position.
    pub fn retarget(&mut self, id: &str, resting: Position, target: Position, now: Instant) {
        let from = match self.active.get(id) {
            Some(glide) => glide.sample(now),
            None => resting,
        };
        self.active.insert(
            id.to_string(),
            Glide {
                from,
                to: target,
                start: now,
                duration: self.duration,
            },
        );
    }

    /// Samples every active glide once. Returns the marker positions to
    /// render this frame. Glides that have reached their target emit the
    /// final position and are removed, leaving nothing scheduled.
    pub fn tick(&mut self, now: Instant) -> Vec<(String, Position)> {
        let mut frame = Vec::with_capacity(self.active.len());
        let mut done = Vec::new();
        for (id, glide) in &self.active {
            frame.push((id.clone(), glide.sample(now)));
            if glide.finished(now) {
                done.push(id.clone());
            }
        }
        for id in done {
            self.active.remove(&id);
        }
        frame
    }

    /// Cancels all in-flight glides (session teardown).
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
