// Network layer: wire message handling and the feed lifecycle.

pub mod feed;
pub mod messages;
