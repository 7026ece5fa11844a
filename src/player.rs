use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::{
    connection::{VoiceSender, VoiceServer, VoiceState},
    error::{PlayerError, PlayerResult},
    events::{EventSender, PlayerEvent},
    model::{
        gateway::{LifecycleEvent, State, TrackEnd, TrackFailure, WebSocketClosed},
        player::{ConnectOptions, LoopMode, PlayerOptions, PlayerState, MAX_VOLUME},
        queue::Queue,
        track::{LoadResult, ResolveOptions},
        update::UpdatePlayer,
    },
    node::NodeClient,
    registry::PlayerRegistry,
    types::{ChannelId, GuildId},
};

/// Playback state of one guild and the rules that move it.
///
/// Commands update the local state optimistically and then forward the change
/// to the node, pushes from the node are reconciled through [`Player::handle_event`]
/// and [`Player::handle_update`]. Callers must not run two of these at once,
/// [`PlayerHandle`](crate::handle::PlayerHandle) takes care of that.
pub struct Player {
    state: PlayerState,
    queue: Queue,
    node: Arc<dyn NodeClient>,
    voice: Arc<dyn VoiceSender>,
    registry: Arc<dyn PlayerRegistry>,
    events: EventSender,
}

impl Player {
    pub fn new(
        options: PlayerOptions,
        node: Arc<dyn NodeClient>,
        voice: Arc<dyn VoiceSender>,
        registry: Arc<dyn PlayerRegistry>,
        events: EventSender,
    ) -> Self {
        Self {
            state: PlayerState::new(&options),
            queue: Queue::new(),
            node,
            voice,
            registry,
            events,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.state.guild_id
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Queue {
        &mut self.queue
    }

    pub fn node(&self) -> &Arc<dyn NodeClient> {
        &self.node
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.destroyed
    }

    fn emit(&self, event: PlayerEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    pub(crate) fn debug(&self, message: impl ToString) {
        let message = message.to_string();
        debug!("guild {}: {}", self.guild_id(), message);

        self.emit(PlayerEvent::Debug {
            guild_id: self.guild_id(),
            message,
        });
    }

    async fn send_update(&self, update: UpdatePlayer) -> PlayerResult<()> {
        self.node.update_player(self.guild_id(), update).await?;
        Ok(())
    }

    /// Starts the next queued track. Does nothing when the queue is empty.
    ///
    /// A track that fails to resolve is dropped from the queue and the error returned.
    pub async fn play(&mut self) -> PlayerResult<()> {
        let mut track = match self.queue.dequeue_front() {
            Some(track) => track,
            None => return Ok(()),
        };

        track.resolve(&*self.node).await?;

        let encoded = match track.encoded.clone() {
            Some(encoded) => encoded,
            None => return Err(PlayerError::Resolution(track.info.title)),
        };

        info!("guild {} playing `{}`", self.guild_id(), track.info.title);

        self.state.current = Some(track);
        self.state.playing = true;
        self.state.paused = false;
        self.state.position = 0;

        self.send_update(UpdatePlayer::play(encoded)).await
    }

    pub fn connect(&mut self, options: ConnectOptions) -> PlayerResult<()> {
        let channel = match options.voice_channel.or(self.state.connection.channel_id) {
            Some(channel) => channel,
            None => return Err(PlayerError::InvalidArgument("a voice channel is needed to connect".to_string())),
        };

        let guild_id = self.guild_id();
        let update = self.state.connection.join(
            guild_id,
            channel,
            options.mute.unwrap_or(self.state.connection.self_mute),
            options.deaf.unwrap_or(self.state.connection.self_deaf),
        );
        self.voice.send(update);

        self.debug("Player has been connected");
        Ok(())
    }

    /// Leaves the voice channel, pausing playback first.
    pub async fn disconnect(&mut self) -> PlayerResult<()> {
        if self.state.connection.channel_id.is_none() {
            return Ok(());
        }

        let paused = self.pause(true).await;

        let guild_id = self.guild_id();
        let update = self.state.connection.leave(guild_id);
        self.voice.send(update);

        self.debug("Player has been disconnected");
        paused
    }

    /// Tears the player down. Teardown completes even when the node rejects a command,
    /// the first such error is returned.
    pub async fn destroy(&mut self) -> PlayerResult<()> {
        if self.state.destroyed {
            return Ok(());
        }

        let disconnected = self.disconnect().await;
        let destroyed = self.node.destroy_player(self.guild_id()).await.map_err(PlayerError::from);

        self.state.destroyed = true;
        self.emit(PlayerEvent::PlayerDisconnected { guild_id: self.guild_id() });
        self.debug("Player has been destroyed");

        self.registry.remove(self.guild_id());

        disconnected.and(destroyed)
    }

    pub async fn stop(&mut self) -> PlayerResult<()> {
        self.state.position = 0;
        self.state.playing = false;

        self.send_update(UpdatePlayer::stop()).await
    }

    /// `playing` is always set to `!toggle`, even without a current track.
    pub async fn pause(&mut self, toggle: bool) -> PlayerResult<()> {
        self.state.playing = !toggle;
        self.state.paused = toggle;

        self.send_update(UpdatePlayer::pause(toggle)).await
    }

    /// Moves `offset` milliseconds forward, never past the end of the track.
    pub async fn seek_to(&mut self, offset: u64) -> PlayerResult<()> {
        let length = match &self.state.current {
            Some(track) => track.length(),
            None => return Err(PlayerError::NothingPlaying),
        };

        let target = self.state.position.saturating_add(offset).min(length);
        self.state.position = target;

        self.send_update(UpdatePlayer::seek(target)).await
    }

    pub async fn set_volume(&mut self, volume: u16) -> PlayerResult<()> {
        if volume > MAX_VOLUME {
            return Err(PlayerError::InvalidArgument(format!("volume must be between 0 and {}, got {}", MAX_VOLUME, volume)));
        }

        self.state.volume = volume;

        self.send_update(UpdatePlayer::volume(volume)).await
    }

    pub fn set_loop(&mut self, mode: LoopMode) {
        self.state.loop_mode = mode;
    }

    pub fn set_text_channel(&mut self, channel: Option<ChannelId>) {
        self.state.text_channel = channel;
    }

    pub fn set_voice_channel(&mut self, channel: Option<ChannelId>) {
        self.state.connection.channel_id = channel;
    }

    pub async fn resolve(&self, options: &ResolveOptions) -> PlayerResult<LoadResult> {
        resolve_query(&*self.node, options).await
    }

    pub async fn voice_server_update(&mut self, server: VoiceServer) -> PlayerResult<()> {
        let guild_id = self.guild_id();

        match self.state.connection.set_server_update(guild_id, server) {
            Some(session) => self.send_update(UpdatePlayer::voice(session)).await,
            None => Ok(()),
        }
    }

    pub async fn voice_state_update(&mut self, state: VoiceState) -> PlayerResult<()> {
        let guild_id = self.guild_id();

        match self.state.connection.set_state_update(guild_id, state) {
            Some(session) => self.send_update(UpdatePlayer::voice(session)).await,
            None => Ok(()),
        }
    }

    /// Applies a telemetry push.
    pub fn handle_update(&mut self, state: State) {
        if self.state.destroyed {
            return;
        }

        self.state.apply_telemetry(&state);
    }

    /// Reconciles a lifecycle push from the node.
    pub async fn handle_event(&mut self, event: LifecycleEvent) -> PlayerResult<()> {
        if self.state.destroyed {
            return Ok(());
        }

        match event {
            LifecycleEvent::TrackStart(_) => {
                self.state.playing = true;

                self.emit(PlayerEvent::TrackStarted {
                    guild_id: self.guild_id(),
                    track: self.state.current.clone(),
                });
                Ok(())
            },
            LifecycleEvent::TrackEnd(end) => self.track_end(end).await,
            LifecycleEvent::TrackStuck(stuck) => self.track_failed(TrackFailure::Stuck(stuck)).await,
            LifecycleEvent::TrackException(exception) => self.track_failed(TrackFailure::Exception(exception)).await,
            LifecycleEvent::WebSocketClosed(closed) => {
                self.socket_closed(closed);
                Ok(())
            },
            LifecycleEvent::Unknown { kind, .. } => Err(PlayerError::UnknownEvent(kind)),
        }
    }

    async fn track_end(&mut self, end: TrackEnd) -> PlayerResult<()> {
        self.state.previous = self.state.current.clone();

        match (self.state.loop_mode, self.state.previous.clone()) {
            (LoopMode::Track, Some(finished)) => self.queue.enqueue_front(finished),
            (LoopMode::Queue, Some(finished)) => self.queue.enqueue(finished),
            _ if self.queue.is_empty() => return self.queue_ended(),
            _ => (),
        }

        self.emit(PlayerEvent::TrackEnded {
            guild_id: self.guild_id(),
            track: self.state.current.clone(),
            event: end,
        });

        self.play().await
    }

    fn queue_ended(&mut self) -> PlayerResult<()> {
        self.state.playing = false;

        self.emit(PlayerEvent::PlayerDisconnected { guild_id: self.guild_id() });
        Ok(())
    }

    async fn track_failed(&mut self, failure: TrackFailure) -> PlayerResult<()> {
        warn!("guild {} track failed: {:?}", self.guild_id(), failure);

        self.emit(PlayerEvent::PlayerError {
            guild_id: self.guild_id(),
            track: self.state.current.clone(),
            failure,
        });

        self.stop().await
    }

    fn socket_closed(&mut self, closed: WebSocketClosed) {
        if closed.can_reconnect() {
            info!("guild {} voice socket closed with {}, joining again", self.guild_id(), closed.code);

            let update = self.state.connection.rejoin(self.guild_id());
            self.voice.send(update);
        }

        self.emit(PlayerEvent::PlayerClosed {
            guild_id: self.guild_id(),
            track: self.state.current.clone(),
            event: closed,
        });
    }
}

/// Looks a query up on the node and tags every result with the requester.
pub async fn resolve_query(node: &dyn NodeClient, options: &ResolveOptions) -> PlayerResult<LoadResult> {
    let result = node.load_tracks(&options.identifier()).await?;

    Ok(result.with_requester(options.requester.clone()))
}
