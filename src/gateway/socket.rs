//! Discord Gateway websocket session.
//!
//! Keeps a gateway connection alive (hello, identify, heartbeat), records
//! the text channels of every guild the bot joins, and hands chat messages
//! to the [`CommandRouter`]. Dropped sessions are re-established after a
//! fixed delay; sessions are never resumed.

use super::{ChannelDirectory, CommandRouter, IncomingMessage};
use crate::error::GatewayError;
use futures::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

/// Guild text channel.
const CHANNEL_TYPE_TEXT: u64 = 0;

/// Connection settings for the gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub url: String,
    pub token: String,
    pub intents: u64,
    pub activity: String,
    pub reconnect_delay: Duration,
}

/// One frame of the gateway protocol.
#[derive(Debug, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

/// Why a session stopped without a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Closed { code: Option<u16>, reason: String },
    ReconnectRequested,
    InvalidSession,
    MissedHeartbeatAck,
}

impl SessionEnd {
    /// Close codes after which reconnecting cannot succeed
    /// (bad token, bad shard, disallowed intents, ...).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionEnd::Closed {
                code: Some(4004 | 4010 | 4011 | 4012 | 4013 | 4014),
                ..
            }
        )
    }
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::Closed { code: Some(code), reason } => {
                write!(f, "closed by server ({}: {})", code, reason)
            }
            SessionEnd::Closed { code: None, .. } => write!(f, "connection closed"),
            SessionEnd::ReconnectRequested => write!(f, "server requested reconnect"),
            SessionEnd::InvalidSession => write!(f, "session invalidated"),
            SessionEnd::MissedHeartbeatAck => write!(f, "heartbeat not acknowledged"),
        }
    }
}

/// Build the Identify payload.
pub fn identify_payload(settings: &GatewaySettings) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": settings.token,
            "intents": settings.intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "seafbot",
                "device": "seafbot",
            },
            "presence": {
                "activities": [{ "name": settings.activity, "type": 0 }],
                "status": "online",
                "since": null,
                "afk": false,
            },
        },
    })
}

/// Build a heartbeat carrying the last sequence number seen.
pub fn heartbeat_payload(sequence: Option<u64>) -> Value {
    json!({ "op": OP_HEARTBEAT, "d": sequence })
}

/// Text channels listed in a `GUILD_CREATE` payload, as (name, id).
pub fn text_channels(guild: &Value) -> Vec<(String, String)> {
    guild["channels"]
        .as_array()
        .map(|channels| channels.iter().filter_map(text_channel).collect())
        .unwrap_or_default()
}

fn text_channel(channel: &Value) -> Option<(String, String)> {
    if channel["type"].as_u64()? != CHANNEL_TYPE_TEXT {
        return None;
    }
    let name = channel["name"].as_str()?;
    let id = channel["id"].as_str()?;
    Some((name.to_string(), id.to_string()))
}

/// Extract the fields we care about from a `MESSAGE_CREATE` payload.
pub fn parse_message(data: &Value) -> Option<IncomingMessage> {
    Some(IncomingMessage {
        channel_id: data["channel_id"].as_str()?.to_string(),
        author: data["author"]["username"].as_str().unwrap_or_default().to_string(),
        author_is_bot: data["author"]["bot"].as_bool().unwrap_or(false),
        content: data["content"].as_str().unwrap_or_default().to_string(),
    })
}

/// Delay before the first heartbeat: `period` scaled by `jitter` in [0, 1].
pub fn first_heartbeat_delay(period: Duration, jitter: f64) -> Duration {
    period.mul_f64(jitter.clamp(0.0, 1.0))
}

/// Read frames until the next JSON payload, or how the socket closed.
async fn next_payload<S>(read: &mut S) -> Result<Result<GatewayPayload, SessionEnd>, GatewayError>
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = read.next().await {
        match frame? {
            Message::Text(text) => return Ok(Ok(serde_json::from_str(&text)?)),
            Message::Close(frame) => {
                let (code, reason) = match frame {
                    Some(f) => (Some(u16::from(f.code)), f.reason.to_string()),
                    None => (None, String::new()),
                };
                return Ok(Err(SessionEnd::Closed { code, reason }));
            }
            // Ping/Pong handled by tungstenite
            _ => {}
        }
    }
    Ok(Err(SessionEnd::Closed {
        code: None,
        reason: String::new(),
    }))
}

/// Long-lived gateway connection.
pub struct GatewaySession {
    settings: GatewaySettings,
    channels: ChannelDirectory,
    router: CommandRouter,
}

impl GatewaySession {
    pub fn new(settings: GatewaySettings, channels: ChannelDirectory, router: CommandRouter) -> Self {
        Self {
            settings,
            channels,
            router,
        }
    }

    /// Keep a session open, reconnecting after every drop. Only returns when
    /// the gateway closes with a code that rules out reconnecting.
    pub async fn run_forever(self) -> Result<(), GatewayError> {
        loop {
            match self.run_session().await {
                Ok(end) if end.is_fatal() => {
                    error!("Gateway session ended: {}. Not reconnecting.", end);
                    return Err(GatewayError::Rejected(end.to_string()));
                }
                Ok(end) => warn!("Gateway session ended: {}", end),
                Err(e) => error!("Gateway session failed: {}", e),
            }

            info!(
                "Reconnecting to gateway in {}s",
                self.settings.reconnect_delay.as_secs()
            );
            tokio::time::sleep(self.settings.reconnect_delay).await;
        }
    }

    /// Run one connection from hello to disconnect.
    async fn run_session(&self) -> Result<SessionEnd, GatewayError> {
        info!("Connecting to Discord gateway");
        let (stream, _response) = connect_async(self.settings.url.as_str()).await?;
        let (mut write, mut read) = stream.split();

        let hello = match next_payload(&mut read).await? {
            Ok(payload) => payload,
            Err(end) => return Ok(end),
        };
        if hello.op != OP_HELLO {
            return Err(GatewayError::Protocol(format!(
                "expected hello, got op {}",
                hello.op
            )));
        }
        let period = hello.d["heartbeat_interval"]
            .as_u64()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or_else(|| GatewayError::Protocol("hello without heartbeat_interval".to_string()))?;
        debug!("Heartbeat interval {}ms", period.as_millis());

        write
            .send(Message::Text(identify_payload(&self.settings).to_string()))
            .await?;

        let first = first_heartbeat_delay(period, rand::random::<f64>());
        let mut heartbeat = interval_at(Instant::now() + first, period);
        let mut sequence: Option<u64> = None;
        let mut awaiting_ack = false;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if awaiting_ack {
                        return Ok(SessionEnd::MissedHeartbeatAck);
                    }
                    write.send(Message::Text(heartbeat_payload(sequence).to_string())).await?;
                    awaiting_ack = true;
                }
                payload = next_payload(&mut read) => {
                    let payload = match payload? {
                        Ok(payload) => payload,
                        Err(end) => return Ok(end),
                    };
                    if payload.s.is_some() {
                        sequence = payload.s;
                    }

                    match payload.op {
                        OP_DISPATCH => {
                            if let Some(event) = payload.t.as_deref() {
                                self.handle_dispatch(event, &payload.d);
                            }
                        }
                        OP_HEARTBEAT => {
                            write.send(Message::Text(heartbeat_payload(sequence).to_string())).await?;
                        }
                        OP_HEARTBEAT_ACK => awaiting_ack = false,
                        OP_RECONNECT => return Ok(SessionEnd::ReconnectRequested),
                        OP_INVALID_SESSION => return Ok(SessionEnd::InvalidSession),
                        other => debug!("Ignoring gateway op {}", other),
                    }
                }
            }
        }
    }

    /// Apply one dispatch event.
    pub fn handle_dispatch(&self, event: &str, data: &Value) {
        match event {
            "READY" => {
                info!(
                    "Bot is ready! Logged in as {}",
                    data["user"]["username"].as_str().unwrap_or("<unknown>")
                );
            }
            "GUILD_CREATE" => {
                let channels = text_channels(data);
                for (name, id) in &channels {
                    self.channels.insert(name, id);
                }
                info!(
                    "Joined guild {} ({} text channels, {} known)",
                    data["name"].as_str().unwrap_or("<unknown>"),
                    channels.len(),
                    self.channels.len()
                );
            }
            "CHANNEL_CREATE" | "CHANNEL_UPDATE" => {
                if let Some((name, id)) = text_channel(data) {
                    self.channels.insert(&name, &id);
                }
            }
            "MESSAGE_CREATE" => {
                if let Some(message) = parse_message(data) {
                    debug!(
                        "Received message: {:?} from {} in channel {}",
                        message.content, message.author, message.channel_id
                    );
                    self.router.dispatch(&message);
                }
            }
            _ => {}
        }
    }
}
