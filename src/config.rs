use clap::Parser;

use crate::constants;
use crate::store::DistanceSource;

/// Live race tracker configuration
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// WebSocket endpoint of the race feed server, e.g. wss://races.example.com
    #[arg(long, value_name = "URL")]
    pub server: String,

    /// Race session identifier; opaque, only composes the feed URL.
    #[arg(long, value_name = "ID")]
    pub race_id: String,

    /// Maximum single-step distance (m) credited to a runner's total.
    #[arg(long, default_value_t = constants::TELEPORT_CEILING_M)]
    pub teleport_ceiling_m: f64,

    /// Source of truth for cumulative distance.
    #[arg(long, value_enum, default_value = "local-accumulation")]
    pub distance_source: DistanceSource,

    /// Marker glide duration in milliseconds.
    #[arg(long, default_value_t = constants::MARKER_GLIDE_MS)]
    pub marker_glide_ms: u64,

    /// Leaderboard refresh cadence in seconds.
    #[arg(long, default_value_t = constants::LEADERBOARD_REFRESH_SECS)]
    pub leaderboard_refresh_secs: u64,

    /// Keep-alive probe interval in seconds.
    #[arg(long, default_value_t = constants::HEARTBEAT_INTERVAL_SECS)]
    pub heartbeat_secs: u64,

    /// Reconnect delay in seconds (constant, fuzzed by ±10%).
    #[arg(long, default_value_t = constants::RECONNECT_DELAY_SECS)]
    pub reconnect_delay_secs: u64,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Composes the full feed URL from server and race id.
    pub fn feed_url(&self) -> String {
        format!(
            "{}/ws/race/{}/",
            self.server.trim_end_matches('/'),
            self.race_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_composition() {
        let config = Config::parse_from(["race-tracker", "--server", "ws://host:8000", "--race-id", "42"]);
        assert_eq!(config.feed_url(), "ws://host:8000/ws/race/42/");
    }

    #[test]
    fn test_trailing_slash_collapsed() {
        let config = Config::parse_from(["race-tracker", "--server", "wss://host/", "--race-id", "x"]);
        assert_eq!(config.feed_url(), "wss://host/ws/race/x/");
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["race-tracker", "--server", "ws://h", "--race-id", "1"]);
        assert_eq!(config.teleport_ceiling_m, 100.0);
        assert_eq!(config.distance_source, DistanceSource::LocalAccumulation);
        assert_eq!(config.heartbeat_secs, 25);
        assert!(!config.verbose);
    }
}
