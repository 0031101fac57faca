// Feed reconciler - owns the WebSocket lifecycle and routes inbound events.
//
// Connection state machine: Disconnected -> Connecting -> Open, back to
// Disconnected on close or error, with a fixed fuzzed delay before the next
// attempt. The sequential loop guarantees at most one live connection
// attempt at any instant, so a flapping server can never cause a
// connection storm. No failure here is fatal to the process.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use futures_util::{Sink, SinkExt, StreamExt};
use rand::Rng;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::messages::{self, FeedEvent, OutboundMessage};
use crate::constants::{FRAME_INTERVAL_MS, HEARTBEAT_INTERVAL_SECS, LEADERBOARD_REFRESH_SECS};
use crate::session::RaceSession;

/// Transport lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

pub struct FeedConfig {
    /// Full feed endpoint, e.g. `ws://host/ws/race/42/`.
    pub url: String,
    pub heartbeat: Duration,
    pub reconnect_delay: Duration,
    pub leaderboard_refresh: Duration,
    pub frame_interval: Duration,
}

impl FeedConfig {
    pub fn new(url: String) -> Self {
        FeedConfig {
            url,
            heartbeat: Duration::from_secs(HEARTBEAT_INTERVAL_SECS),
            reconnect_delay: Duration::from_secs(crate::constants::RECONNECT_DELAY_SECS),
            leaderboard_refresh: Duration::from_secs(LEADERBOARD_REFRESH_SECS),
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
        }
    }
}

/// Random delay in [0.9*d, 1.1*d], so a fleet of dashboards reconnecting
/// after a server restart spreads out.
fn fuzzy(d: Duration) -> Duration {
    let secs = d.as_secs_f64();
    Duration::from_secs_f64(rand::thread_rng().gen_range(0.9 * secs..=1.1 * secs))
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct FeedClient {
    config: FeedConfig,
    session: RaceSession,
    state: ConnectionState,
}

impl FeedClient {
    pub fn new(config: FeedConfig, session: RaceSession) -> Self {
        FeedClient {
            config,
            session,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connects and reconnects forever. Cancelling this future (Ctrl-C in
    /// the binary) tears down all timers and in-flight glides.
    pub async fn run(&mut self) {
        loop {
            self.state = ConnectionState::Connecting;
            info!("connecting to {}", self.config.url);

            match connect_async(self.config.url.as_str()).await {
                Ok((ws, _response)) => {
                    self.state = ConnectionState::Open;
                    info!("feed connected");
                    self.drive(ws).await;
                }
                Err(e) => {
                    warn!("connect failed: {}", e);
                }
            }

            self.state = ConnectionState::Disconnected;
            self.session.shutdown();
            let delay = fuzzy(self.config.reconnect_delay);
            info!("reconnecting in {:.1}s", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }

    /// Steady-state loop for one open connection. Suspension points:
    /// the next frame, the next heartbeat, the next leaderboard refresh,
    /// the next inbound message. Returns when the connection drops.
    async fn drive<S>(&mut self, ws: tokio_tungstenite::WebSocketStream<S>)
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (mut sink, mut stream) = ws.split();

        // First tick fires immediately: the initial liveness probe on open.
        let mut heartbeat = tokio::time::interval(self.config.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut refresh = tokio::time::interval(self.config.leaderboard_refresh);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut frame = tokio::time::interval(self.config.frame_interval);
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                inbound = stream.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(reply) = self.handle_text(&text) {
                                if let Err(e) = send(&mut sink, &reply).await {
                                    warn!("write failed: {}", e);
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            // Protocol-level ping; answered at the frame layer
                            if sink.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(close))) => {
                            info!("feed closed by server: {:?}", close);
                            break;
                        }
                        Some(Ok(_)) => {} // binary/pong frames: ignore
                        Some(Err(e)) => {
                            warn!("feed read error: {}", e);
                            break;
                        }
                        None => {
                            info!("feed EOF");
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    let probe = OutboundMessage::Ping { time: epoch_ms() };
                    if let Err(e) = send(&mut sink, &probe).await {
                        warn!("heartbeat write failed: {}", e);
                        break;
                    }
                }
                _ = refresh.tick() => {
                    self.session.refresh_leaderboard();
                }
                _ = frame.tick() => {
                    self.session.tick_frame(Instant::now());
                }
            }
        }
    }

    /// Classifies one text frame and applies it. Returns an optional reply
    /// to send (pong for an application-level ping). Parse failures are
    /// logged and dropped, never propagated.
    fn handle_text(&mut self, text: &str) -> Option<OutboundMessage> {
        match messages::classify(text) {
            Ok(FeedEvent::Ping) => {
                debug!("feed ping, replying pong");
                Some(OutboundMessage::Pong {})
            }
            Ok(event) => {
                self.session.handle_event(event, Instant::now());
                None
            }
            Err(e) => {
                warn!("dropping message: {}", e);
                None
            }
        }
    }
}

async fn send<S>(
    sink: &mut S,
    message: &OutboundMessage,
) -> Result<(), tokio_tungstenite::tungstenite::Error>
where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(message)
        .map_err(|e| tokio_tungstenite::tungstenite::Error::Io(std::io::Error::other(e)))?;
    sink.send(Message::Text(json)).await
}
