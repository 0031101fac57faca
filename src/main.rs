// Race Tracker - Main Entry Point
// Connects to a live race feed and drives the map surface and leaderboard.

use std::time::Duration;

use clap::Parser;
use race_tracker::config::Config;
use race_tracker::net::feed::{FeedClient, FeedConfig};
use race_tracker::output::{LogLeaderboardView, LogMapSurface};
use race_tracker::session::RaceSession;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_logging(config.verbose);

    info!("Starting race tracker");
    info!("Race: {}", config.race_id);

    let session = RaceSession::new(
        config.teleport_ceiling_m,
        config.distance_source,
        Duration::from_millis(config.marker_glide_ms),
        Box::new(LogMapSurface),
        Box::new(LogLeaderboardView),
    );

    let mut feed_config = FeedConfig::new(config.feed_url());
    feed_config.heartbeat = Duration::from_secs(config.heartbeat_secs);
    feed_config.reconnect_delay = Duration::from_secs(config.reconnect_delay_secs);
    feed_config.leaderboard_refresh = Duration::from_secs(config.leaderboard_refresh_secs);

    let mut client = FeedClient::new(feed_config, session);

    // The feed loop runs until Ctrl-C; cancelling it tears down all timers
    // and in-flight marker glides.
    tokio::select! {
        _ = client.run() => {}
        result = signal::ctrl_c() => {
            result?;
            info!("Received shutdown signal (Ctrl+C)");
        }
    }

    info!("Shutting down...");
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}
