use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use crate::{
    model::{
        gateway::{Stats, TrackEnd, TrackFailure, WebSocketClosed},
        track::Track,
    },
    types::GuildId,
};

pub type EventSender = UnboundedSender<PlayerEvent>;

#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Periodic event that returns the statistics of the server.
    async fn stats(&self, _event: Stats) {}
    /// Event that triggers when a track starts playing.
    async fn track_started(&self, _guild_id: GuildId, _track: Option<Track>) {}
    /// Event that triggers when a track finishes and the player moves on.
    async fn track_ended(&self, _guild_id: GuildId, _track: Option<Track>, _event: TrackEnd) {}
    /// Event triggered when a track gets stuck or throws, the player is stopped afterwards.
    async fn player_error(&self, _guild_id: GuildId, _track: Option<Track>, _failure: TrackFailure) {}
    /// Event triggered when the audio web socket is closed by discord
    async fn player_closed(&self, _guild_id: GuildId, _track: Option<Track>, _event: WebSocketClosed) {}
    /// Event triggered when the queue runs dry or the player is destroyed.
    async fn player_disconnected(&self, _guild_id: GuildId) {}
    async fn debug(&self, _guild_id: GuildId, _message: String) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    Stats(Stats),
    TrackStarted {
        guild_id: GuildId,
        track: Option<Track>,
    },
    TrackEnded {
        guild_id: GuildId,
        track: Option<Track>,
        event: TrackEnd,
    },
    PlayerError {
        guild_id: GuildId,
        track: Option<Track>,
        failure: TrackFailure,
    },
    PlayerClosed {
        guild_id: GuildId,
        track: Option<Track>,
        event: WebSocketClosed,
    },
    PlayerDisconnected {
        guild_id: GuildId,
    },
    Debug {
        guild_id: GuildId,
        message: String,
    },
}

/// Hands every notification to the handler, one at a time and in emission order.
pub(crate) async fn process(handler: Arc<dyn EventHandler>, mut events: UnboundedReceiver<PlayerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            PlayerEvent::Stats(e) => handler.stats(e).await,
            PlayerEvent::TrackStarted { guild_id, track } => handler.track_started(guild_id, track).await,
            PlayerEvent::TrackEnded { guild_id, track, event } => handler.track_ended(guild_id, track, event).await,
            PlayerEvent::PlayerError { guild_id, track, failure } => handler.player_error(guild_id, track, failure).await,
            PlayerEvent::PlayerClosed { guild_id, track, event } => handler.player_closed(guild_id, track, event).await,
            PlayerEvent::PlayerDisconnected { guild_id } => handler.player_disconnected(guild_id).await,
            PlayerEvent::Debug { guild_id, message } => handler.debug(guild_id, message).await,
        }
    }
}
