use serde::{Serialize, Deserialize};
use serde_aux::prelude::*;
use serde_json::Value;
use crate::types::GuildId;
use super::track::Exception;

/// Close codes after which the voice join is sent again.
pub const RECONNECT_CLOSE_CODES: [u16; 2] = [4015, 4009];

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GatewayEvent {
    pub op: String,
    #[serde(rename = "type")]
    pub event_type: Option<String>
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ready {
    #[serde(default)]
    pub resumed: bool,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Cpu {
    pub cores: i64,
    #[serde(rename = "systemLoad")]
    pub system_load: f64,
    #[serde(rename = "lavalinkLoad")]
    pub lavalink_load: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FrameStats {
    pub sent: i64,
    pub deficit: i64,
    pub nulled: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Memory {
    pub reservable: i64,
    pub used: i64,
    pub free: i64,
    pub allocated: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Stats {
    #[serde(rename = "playingPlayers")]
    pub playing_players: i64,
    pub memory: Memory,
    #[serde(rename = "frameStats")]
    pub frame_stats: Option<FrameStats>,
    pub players: i64,
    pub cpu: Cpu,
    pub uptime: i64,
}

/// Telemetry carried by `playerUpdate`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct State {
    pub time: i64,
    pub position: u64,
    pub connected: bool,
    pub ping: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerUpdate {
    pub state: State,
    #[serde(rename = "guildId")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: GuildId,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackStart {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: GuildId,
    #[serde(default)]
    pub encoded_track: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackEnd {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: GuildId,
    #[serde(default)]
    pub encoded_track: Option<String>,
    pub reason: TrackEndReason,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackException {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: GuildId,
    #[serde(default)]
    pub encoded_track: Option<String>,
    pub exception: Exception,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackStuck {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: GuildId,
    #[serde(default)]
    pub encoded_track: Option<String>,
    pub threshold_ms: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketClosed {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: GuildId,
    pub code: u16,
    pub reason: String,
    pub by_remote: bool
}

impl WebSocketClosed {
    pub fn can_reconnect(&self) -> bool {
        RECONNECT_CLOSE_CODES.contains(&self.code)
    }
}

/// Why a track could not keep playing.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackFailure {
    Stuck(TrackStuck),
    Exception(TrackException),
}

/// Lifecycle notifications pushed by the node under the `event` op.
#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleEvent {
    TrackStart(TrackStart),
    TrackEnd(TrackEnd),
    TrackStuck(TrackStuck),
    TrackException(TrackException),
    WebSocketClosed(WebSocketClosed),
    /// An event type this client does not know about yet.
    Unknown {
        guild_id: GuildId,
        kind: String,
        data: Value
    },
}

#[derive(Deserialize)]
struct EventHeader {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "guildId")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    guild_id: GuildId,
}

impl LifecycleEvent {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let header = EventHeader::deserialize(&value)?;

        Ok(match header.kind.as_str() {
            "TrackStartEvent" => Self::TrackStart(serde_json::from_value(value)?),
            "TrackEndEvent" => Self::TrackEnd(serde_json::from_value(value)?),
            "TrackStuckEvent" => Self::TrackStuck(serde_json::from_value(value)?),
            "TrackExceptionEvent" => Self::TrackException(serde_json::from_value(value)?),
            "WebSocketClosedEvent" => Self::WebSocketClosed(serde_json::from_value(value)?),
            _ => Self::Unknown {
                guild_id: header.guild_id,
                kind: header.kind,
                data: value
            },
        })
    }

    pub fn guild_id(&self) -> GuildId {
        match self {
            Self::TrackStart(e) => e.guild_id,
            Self::TrackEnd(e) => e.guild_id,
            Self::TrackStuck(e) => e.guild_id,
            Self::TrackException(e) => e.guild_id,
            Self::WebSocketClosed(e) => e.guild_id,
            Self::Unknown { guild_id, .. } => *guild_id,
        }
    }
}

/// A decoded socket message.
#[derive(Clone, Debug)]
pub enum Incoming {
    Ready(Ready),
    Stats(Stats),
    PlayerUpdate(PlayerUpdate),
    Event(LifecycleEvent),
    /// Ops ignored by this client.
    Other(String),
}

impl Incoming {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let value = serde_json::from_str::<Value>(text)?;
        let header = GatewayEvent::deserialize(&value)?;

        Ok(match header.op.as_str() {
            "ready" => Self::Ready(serde_json::from_value(value)?),
            "stats" => Self::Stats(serde_json::from_value(value)?),
            "playerUpdate" => Self::PlayerUpdate(serde_json::from_value(value)?),
            "event" => Self::Event(LifecycleEvent::from_value(value)?),
            _ => Self::Other(header.op),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ready_and_player_update() {
        match Incoming::parse(r#"{"op":"ready","resumed":false,"sessionId":"abc"}"#).unwrap() {
            Incoming::Ready(ready) => assert_eq!(ready.session_id, "abc"),
            other => panic!("unexpected {:?}", other),
        }

        let raw = r#"{"op":"playerUpdate","guildId":"42","state":{"time":1500,"position":6000,"connected":true,"ping":31}}"#;
        match Incoming::parse(raw).unwrap() {
            Incoming::PlayerUpdate(update) => {
                assert_eq!(update.guild_id, 42);
                assert_eq!(update.state, State { time: 1500, position: 6000, connected: true, ping: 31 });
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_lifecycle_events() {
        let raw = r#"{"op":"event","type":"TrackEndEvent","guildId":"42","encodedTrack":"QAAA","track":"QAAA","reason":"FINISHED"}"#;
        match Incoming::parse(raw).unwrap() {
            Incoming::Event(LifecycleEvent::TrackEnd(end)) => {
                assert_eq!(end.guild_id, 42);
                assert_eq!(end.encoded_track.as_deref(), Some("QAAA"));
                assert_eq!(end.reason, TrackEndReason::Finished);
            },
            other => panic!("unexpected {:?}", other),
        }

        let raw = r#"{"op":"event","type":"TrackStartEvent","guildId":"42","encodedTrack":"QAAA","track":"QAAA"}"#;
        match Incoming::parse(raw).unwrap() {
            Incoming::Event(LifecycleEvent::TrackStart(start)) => assert_eq!(start.encoded_track.as_deref(), Some("QAAA")),
            other => panic!("unexpected {:?}", other),
        }

        let raw = r#"{"op":"event","type":"TrackStuckEvent","guildId":"42","encodedTrack":"QAAA","track":"QAAA","thresholdMs":10000}"#;
        match Incoming::parse(raw).unwrap() {
            Incoming::Event(LifecycleEvent::TrackStuck(stuck)) => assert_eq!(stuck.threshold_ms, 10000),
            other => panic!("unexpected {:?}", other),
        }

        let raw = r#"{"op":"event","type":"WebSocketClosedEvent","guildId":"42","code":4015,"reason":"","byRemote":true}"#;
        match Incoming::parse(raw).unwrap() {
            Incoming::Event(LifecycleEvent::WebSocketClosed(closed)) => assert!(closed.can_reconnect()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_event_types_are_kept_raw() {
        let raw = r#"{"op":"event","type":"SegmentSkipped","guildId":"7","segment":{}}"#;
        let event = match Incoming::parse(raw).unwrap() {
            Incoming::Event(event) => event,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(event.guild_id(), 7);
        match event {
            LifecycleEvent::Unknown { kind, data, .. } => {
                assert_eq!(kind, "SegmentSkipped");
                assert!(data.get("segment").is_some());
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unhandled_ops_are_reported() {
        match Incoming::parse(r#"{"op":"pong"}"#).unwrap() {
            Incoming::Other(op) => assert_eq!(op, "pong"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
