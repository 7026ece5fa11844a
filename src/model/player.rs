use std::str::FromStr;
use crate::{
    connection::Connection,
    error::PlayerError,
    types::{ChannelId, GuildId},
};
use super::{gateway::State, track::Track};

pub const MAX_VOLUME: u16 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopMode {
    None,
    Track,
    Queue,
}

impl Default for LoopMode {
    fn default() -> Self {
        LoopMode::None
    }
}

impl FromStr for LoopMode {
    type Err = PlayerError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "NONE" => Ok(LoopMode::None),
            "TRACK" => Ok(LoopMode::Track),
            "QUEUE" => Ok(LoopMode::Queue),
            "" => Err(PlayerError::InvalidArgument("a loop mode must be provided".to_string())),
            other => Err(PlayerError::InvalidArgument(format!("loop mode must be NONE, TRACK or QUEUE, got `{}`", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
    Destroyed,
}

#[derive(Clone, Debug, Default)]
pub struct PlayerOptions {
    pub guild_id: GuildId,
    pub voice_channel: Option<ChannelId>,
    pub text_channel: Option<ChannelId>,
    pub mute: Option<bool>,
    pub deaf: Option<bool>,
}

impl PlayerOptions {
    pub fn new(guild_id: impl Into<GuildId>) -> Self {
        Self {
            guild_id: guild_id.into(),
            ..Default::default()
        }
    }

    pub fn voice_channel(mut self, channel: impl Into<ChannelId>) -> Self {
        self.voice_channel = Some(channel.into());
        self
    }

    pub fn text_channel(mut self, channel: impl Into<ChannelId>) -> Self {
        self.text_channel = Some(channel.into());
        self
    }

    pub fn mute(mut self, mute: bool) -> Self {
        self.mute = Some(mute);
        self
    }

    pub fn deaf(mut self, deaf: bool) -> Self {
        self.deaf = Some(deaf);
        self
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            voice_channel: self.voice_channel,
            mute: self.mute,
            deaf: self.deaf,
        }
    }
}

/// Overrides for `connect`. Unset flags fall back to the ones the player already holds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConnectOptions {
    pub voice_channel: Option<ChannelId>,
    pub mute: Option<bool>,
    pub deaf: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct PlayerState {
    pub guild_id: GuildId,
    pub text_channel: Option<ChannelId>,
    pub current: Option<Track>,
    pub previous: Option<Track>,
    pub playing: bool,
    pub paused: bool,
    pub loop_mode: LoopMode,
    /// Milliseconds into `current`.
    pub position: u64,
    pub ping: i64,
    pub timestamp: Option<i64>,
    pub volume: u16,
    pub connection: Connection,
    pub destroyed: bool,
}

impl PlayerState {
    pub fn new(options: &PlayerOptions) -> Self {
        Self {
            guild_id: options.guild_id,
            text_channel: options.text_channel,
            current: None,
            previous: None,
            playing: false,
            paused: false,
            loop_mode: LoopMode::None,
            position: 0,
            ping: 0,
            timestamp: None,
            volume: 100,
            connection: Connection::new(
                options.voice_channel,
                options.mute.unwrap_or(false),
                options.deaf.unwrap_or(true),
            ),
            destroyed: false,
        }
    }

    pub fn voice_channel(&self) -> Option<ChannelId> {
        self.connection.channel_id
    }

    pub fn connected(&self) -> bool {
        self.connection.connected
    }

    pub fn mute(&self) -> bool {
        self.connection.self_mute
    }

    pub fn deaf(&self) -> bool {
        self.connection.self_deaf
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.destroyed {
            PlaybackStatus::Destroyed
        } else if self.current.is_none() {
            PlaybackStatus::Idle
        } else if self.paused {
            PlaybackStatus::Paused
        } else if self.playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Idle
        }
    }

    /// Applies a `playerUpdate` push. Playback flags and loop mode are untouched.
    pub fn apply_telemetry(&mut self, state: &State) {
        self.connection.connected = state.connected;
        self.position = state.position;
        self.ping = state.ping;
        self.timestamp = Some(state.time);
    }
}
