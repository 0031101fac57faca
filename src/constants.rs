// Shared constants and tunable defaults for the race tracker.

/// Mean Earth radius in meters, used by the haversine distance.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Maximum single-step distance (m) credited to a runner's cumulative total.
/// Larger jumps are treated as GPS glitches or session jumps: the position
/// still updates but the distance contribution is discarded.
pub const TELEPORT_CEILING_M: f64 = 100.0;

/// Duration of a marker glide between two authoritative positions (ms).
pub const MARKER_GLIDE_MS: u64 = 900;

/// Cooperative frame tick driving marker interpolation (ms), ~30 fps.
pub const FRAME_INTERVAL_MS: u64 = 33;

/// Leaderboard recompute cadence (s). Decoupled from event arrival so the
/// "last seen" column stays live even without traffic.
pub const LEADERBOARD_REFRESH_SECS: u64 = 5;

/// Outbound keep-alive probe interval (s). Prevents intermediaries from
/// idling out the connection.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 25;

/// Delay before a reconnect attempt after the feed drops (s). Constant, not
/// exponential; fuzzed by ±10% to avoid thundering reconnects.
pub const RECONNECT_DELAY_SECS: u64 = 4;

/// Zoom level used when centering the map on the first validated fix.
pub const FIRST_FIX_ZOOM: u8 = 14;
