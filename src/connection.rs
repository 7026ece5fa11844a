use serde::{Serialize, Deserialize};
use serde_json::{json, Value};
use tracing::info;
use crate::{
    model::update::VoiceSession,
    types::{ChannelId, GuildId},
};

/// Voice state update sent through the gateway shard of the guild (op 4).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VoiceStateUpdate {
    pub guild_id: GuildId,
    pub channel_id: Option<ChannelId>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

impl VoiceStateUpdate {
    pub fn to_payload(&self) -> Value {
        json!({
            "op": 4,
            "d": {
                "guild_id": self.guild_id.to_string(),
                "channel_id": self.channel_id.map(|id| id.to_string()),
                "self_mute": self.self_mute,
                "self_deaf": self.self_deaf,
            }
        })
    }
}

/// Whatever forwards voice state updates to the gateway.
pub trait VoiceSender: Send + Sync + 'static {
    fn send(&self, update: VoiceStateUpdate);
}

impl<F> VoiceSender for F
where
    F: Fn(VoiceStateUpdate) + Send + Sync + 'static
{
    fn send(&self, update: VoiceStateUpdate) {
        self(update)
    }
}

/// `VOICE_SERVER_UPDATE` half of the handshake.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceServer {
    pub token: String,
    /// `None` while the voice server is being reallocated.
    pub endpoint: Option<String>,
}

/// `VOICE_STATE_UPDATE` half of the handshake, for the bot user.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceState {
    pub session_id: String,
    pub channel_id: Option<ChannelId>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Connection {
    pub channel_id: Option<ChannelId>,
    pub self_mute: bool,
    pub self_deaf: bool,
    pub connected: bool,
    session_id: Option<String>,
    server: Option<VoiceServer>,
}

impl Connection {
    pub fn new(channel_id: Option<ChannelId>, self_mute: bool, self_deaf: bool) -> Self {
        Self {
            channel_id,
            self_mute,
            self_deaf,
            ..Default::default()
        }
    }

    pub fn join(&mut self, guild_id: GuildId, channel_id: ChannelId, self_mute: bool, self_deaf: bool) -> VoiceStateUpdate {
        self.channel_id = Some(channel_id);
        self.self_mute = self_mute;
        self.self_deaf = self_deaf;
        self.connected = true;

        self.rejoin(guild_id)
    }

    /// Join signal built from the stored channel and flags.
    pub fn rejoin(&self, guild_id: GuildId) -> VoiceStateUpdate {
        VoiceStateUpdate {
            guild_id,
            channel_id: self.channel_id,
            self_mute: self.self_mute,
            self_deaf: self.self_deaf,
        }
    }

    pub fn leave(&mut self, guild_id: GuildId) -> VoiceStateUpdate {
        self.connected = false;
        self.channel_id = None;
        self.session_id = None;
        self.server = None;

        VoiceStateUpdate {
            guild_id,
            channel_id: None,
            self_mute: false,
            self_deaf: false,
        }
    }

    pub fn set_server_update(&mut self, guild_id: GuildId, server: VoiceServer) -> Option<VoiceSession> {
        info!("guild {} got voice server half", guild_id);
        self.server = Some(server);

        self.session()
    }

    pub fn set_state_update(&mut self, guild_id: GuildId, state: VoiceState) -> Option<VoiceSession> {
        info!("guild {} got voice state half", guild_id);

        if state.channel_id.is_none() {
            self.connected = false;
            self.channel_id = None;
            self.session_id = None;
            return None;
        }

        self.channel_id = state.channel_id;
        self.self_mute = state.self_mute;
        self.self_deaf = state.self_deaf;
        self.session_id = Some(state.session_id);

        self.session()
    }

    /// Both halves, once they are present.
    fn session(&self) -> Option<VoiceSession> {
        let server = self.server.as_ref()?;

        Some(VoiceSession {
            token: server.token.clone(),
            endpoint: server.endpoint.clone()?,
            session_id: self.session_id.clone()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(channel: Option<ChannelId>) -> VoiceState {
        VoiceState {
            session_id: "session".to_string(),
            channel_id: channel,
            self_mute: false,
            self_deaf: true,
        }
    }

    fn server(endpoint: Option<&str>) -> VoiceServer {
        VoiceServer {
            token: "token".to_string(),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn join_and_leave_signals() {
        let mut connection = Connection::new(None, false, false);

        let join = connection.join(1, 2, false, true);
        assert_eq!(join, VoiceStateUpdate { guild_id: 1, channel_id: Some(2), self_mute: false, self_deaf: true });
        assert!(connection.connected);

        let leave = connection.leave(1);
        assert_eq!(leave.channel_id, None);
        assert!(!leave.self_deaf);
        assert!(!connection.connected);
        assert_eq!(connection.channel_id, None);
    }

    #[test]
    fn payload_uses_gateway_shape() {
        let update = VoiceStateUpdate { guild_id: 1, channel_id: None, self_mute: true, self_deaf: false };

        assert_eq!(update.to_payload(), json!({
            "op": 4,
            "d": { "guild_id": "1", "channel_id": null, "self_mute": true, "self_deaf": false }
        }));
    }

    #[test]
    fn session_needs_both_halves_in_any_order() {
        let mut connection = Connection::default();
        assert!(connection.set_state_update(1, state(Some(2))).is_none());
        let session = connection.set_server_update(1, server(Some("eu.discord.media"))).unwrap();
        assert_eq!(session.session_id, "session");
        assert_eq!(session.endpoint, "eu.discord.media");

        let mut connection = Connection::default();
        assert!(connection.set_server_update(1, server(Some("eu.discord.media"))).is_none());
        assert!(connection.set_state_update(1, state(Some(2))).is_some());
        assert_eq!(connection.channel_id, Some(2));
    }

    #[test]
    fn missing_endpoint_or_channel_yields_nothing() {
        let mut connection = Connection::default();
        connection.set_state_update(1, state(Some(2)));
        assert!(connection.set_server_update(1, server(None)).is_none());

        connection.connected = true;
        assert!(connection.set_state_update(1, state(None)).is_none());
        assert!(!connection.connected);
        assert_eq!(connection.channel_id, None);
    }
}
