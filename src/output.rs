// Collaborator interfaces for the presentation layer.
//
// The engine issues commands through these traits and owns no rendering
// logic. The binary wires in the logging implementations below; a real
// frontend (or a test double) supplies its own.

use tracing::{debug, info};

use crate::geodesy::Position;
use crate::ranking::LeaderboardUpdate;

/// The map rendering surface.
pub trait MapSurface: Send {
    fn create_marker(&mut self, id: &str, position: Position, label: &str);
    fn move_marker(&mut self, id: &str, position: Position);
    fn set_popup(&mut self, id: &str, content: &str);
    fn center_view(&mut self, position: Position, zoom: u8);
}

/// The leaderboard display.
pub trait LeaderboardView: Send {
    fn render(&mut self, update: &LeaderboardUpdate);
}

/// Map surface that logs every command.
pub struct LogMapSurface;

impl MapSurface for LogMapSurface {
    fn create_marker(&mut self, id: &str, position: Position, label: &str) {
        info!(
            "map: create marker {} \"{}\" at ({:.5}, {:.5})",
            id, label, position.lat, position.lon
        );
    }

    fn move_marker(&mut self, id: &str, position: Position) {
        // Per-frame; keep this quiet unless debugging
        debug!("map: move marker {} to ({:.6}, {:.6})", id, position.lat, position.lon);
    }

    fn set_popup(&mut self, id: &str, content: &str) {
        debug!("map: popup for {}: {}", id, content);
    }

    fn center_view(&mut self, position: Position, zoom: u8) {
        info!(
            "map: center view on ({:.5}, {:.5}) zoom {}",
            position.lat, position.lon, zoom
        );
    }
}

/// Leaderboard view that logs the ranked rows.
pub struct LogLeaderboardView;

impl LeaderboardView for LogLeaderboardView {
    fn render(&mut self, update: &LeaderboardUpdate) {
        match update {
            LeaderboardUpdate::NoRunnersYet => info!("leaderboard: no runners yet"),
            LeaderboardUpdate::Rows(rows) => {
                for row in rows {
                    info!(
                        "leaderboard: #{} {} {} {:.1}m pace={} speed={} seen={}",
                        row.rank, row.id, row.name, row.distance_m,
                        row.pace, row.speed, row.last_seen
                    );
                }
            }
        }
    }
}
