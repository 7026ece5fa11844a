use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info_span, warn};
use tracing_futures::Instrument;
use crate::{
    connection::{VoiceServer, VoiceState},
    error::{PlayerError, PlayerResult},
    model::{
        gateway::{LifecycleEvent, State},
        player::{ConnectOptions, LoopMode, PlayerState},
        track::{LoadResult, ResolveOptions, Track},
    },
    node::NodeClient,
    player::{resolve_query, Player},
    types::{ChannelId, GuildId},
};

type Reply<T> = oneshot::Sender<PlayerResult<T>>;

pub(crate) enum Command {
    Play(Reply<()>),
    Enqueue(Vec<Track>, Reply<()>),
    Connect(ConnectOptions, Reply<()>),
    Disconnect(Reply<()>),
    Destroy(Reply<()>),
    Stop(Reply<()>),
    Pause(bool, Reply<()>),
    Seek(u64, Reply<()>),
    Volume(u16, Reply<()>),
    Loop(LoopMode, Reply<()>),
    TextChannel(Option<ChannelId>, Reply<()>),
    VoiceChannel(Option<ChannelId>, Reply<()>),
    VoiceServer(VoiceServer, Reply<()>),
    VoiceState(VoiceState, Reply<()>),
    State(Reply<PlayerState>),
    Queue(Reply<Vec<Track>>),
}

/// Everything that may mutate a player goes through one inbox.
pub(crate) enum Message {
    Command(Command),
    Update(State),
    Event(LifecycleEvent),
}

/// Cloneable handle to a player running on its own task.
#[derive(Clone)]
pub struct PlayerHandle {
    guild_id: GuildId,
    sender: mpsc::UnboundedSender<Message>,
    node: Arc<dyn NodeClient>,
}

impl PlayerHandle {
    pub fn spawn(player: Player) -> Self {
        let (sender, inbox) = mpsc::unbounded_channel();
        let handle = Self::from_parts(player.guild_id(), sender, Arc::clone(player.node()));

        let span = info_span!("player", guild_id = player.guild_id());
        tokio::spawn(run(player, inbox).instrument(span));

        handle
    }

    pub(crate) fn from_parts(guild_id: GuildId, sender: mpsc::UnboundedSender<Message>, node: Arc<dyn NodeClient>) -> Self {
        Self {
            guild_id,
            sender,
            node,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// `false` once the player task is gone.
    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }

    async fn request<T, F>(&self, command: F) -> PlayerResult<T>
    where
        F: FnOnce(Reply<T>) -> Command
    {
        let (reply, response) = oneshot::channel();

        if self.sender.send(Message::Command(command(reply))).is_err() {
            return Err(PlayerError::PlayerDestroyed);
        }

        match response.await {
            Ok(result) => result,
            Err(_) => Err(PlayerError::PlayerDestroyed),
        }
    }

    pub(crate) fn push_update(&self, state: State) {
        let _ = self.sender.send(Message::Update(state));
    }

    pub(crate) fn push_event(&self, event: LifecycleEvent) {
        let _ = self.sender.send(Message::Event(event));
    }

    /// Plays the next track of the queue.
    pub async fn play(&self) -> PlayerResult<()> {
        self.request(Command::Play).await
    }

    pub async fn enqueue(&self, track: Track) -> PlayerResult<()> {
        self.request(|reply| Command::Enqueue(vec![track], reply)).await
    }

    pub async fn enqueue_all(&self, tracks: Vec<Track>) -> PlayerResult<()> {
        self.request(|reply| Command::Enqueue(tracks, reply)).await
    }

    pub async fn connect(&self, options: ConnectOptions) -> PlayerResult<()> {
        self.request(|reply| Command::Connect(options, reply)).await
    }

    pub async fn disconnect(&self) -> PlayerResult<()> {
        self.request(Command::Disconnect).await
    }

    /// Disconnects, destroys the remote player and drops out of the registry.
    /// Every later call returns [`PlayerError::PlayerDestroyed`].
    pub async fn destroy(&self) -> PlayerResult<()> {
        self.request(Command::Destroy).await
    }

    pub async fn stop(&self) -> PlayerResult<()> {
        self.request(Command::Stop).await
    }

    pub async fn pause(&self, toggle: bool) -> PlayerResult<()> {
        self.request(|reply| Command::Pause(toggle, reply)).await
    }

    pub async fn resume(&self) -> PlayerResult<()> {
        self.pause(false).await
    }

    pub async fn seek_to(&self, offset: u64) -> PlayerResult<()> {
        self.request(|reply| Command::Seek(offset, reply)).await
    }

    pub async fn set_volume(&self, volume: u16) -> PlayerResult<()> {
        self.request(|reply| Command::Volume(volume, reply)).await
    }

    pub async fn set_loop(&self, mode: LoopMode) -> PlayerResult<()> {
        self.request(|reply| Command::Loop(mode, reply)).await
    }

    pub async fn set_text_channel(&self, channel: Option<ChannelId>) -> PlayerResult<()> {
        self.request(|reply| Command::TextChannel(channel, reply)).await
    }

    pub async fn set_voice_channel(&self, channel: Option<ChannelId>) -> PlayerResult<()> {
        self.request(|reply| Command::VoiceChannel(channel, reply)).await
    }

    pub async fn voice_server_update(&self, server: VoiceServer) -> PlayerResult<()> {
        self.request(|reply| Command::VoiceServer(server, reply)).await
    }

    pub async fn voice_state_update(&self, state: VoiceState) -> PlayerResult<()> {
        self.request(|reply| Command::VoiceState(state, reply)).await
    }

    /// Snapshot of the player state.
    pub async fn state(&self) -> PlayerResult<PlayerState> {
        self.request(Command::State).await
    }

    /// Snapshot of the queued tracks.
    pub async fn queue(&self) -> PlayerResult<Vec<Track>> {
        self.request(Command::Queue).await
    }

    /// Searches the node. This does not touch the player state, so it skips the inbox.
    pub async fn resolve(&self, options: ResolveOptions) -> PlayerResult<LoadResult> {
        resolve_query(&*self.node, &options).await
    }
}

async fn run(mut player: Player, mut inbox: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = inbox.recv().await {
        match message {
            Message::Command(command) => apply(&mut player, command).await,
            Message::Update(state) => player.handle_update(state),
            Message::Event(event) => {
                if let Err(why) = player.handle_event(event).await {
                    warn!("guild {} failed to handle event: {}", player.guild_id(), why);
                    player.debug(why);
                }
            }
        }

        if player.is_destroyed() {
            break;
        }
    }
}

async fn apply(player: &mut Player, command: Command) {
    // A dropped receiver only means the caller stopped waiting
    match command {
        Command::Play(reply) => { let _ = reply.send(player.play().await); },
        Command::Enqueue(tracks, reply) => {
            player.queue_mut().extend(tracks);
            let _ = reply.send(Ok(()));
        },
        Command::Connect(options, reply) => { let _ = reply.send(player.connect(options)); },
        Command::Disconnect(reply) => { let _ = reply.send(player.disconnect().await); },
        Command::Destroy(reply) => { let _ = reply.send(player.destroy().await); },
        Command::Stop(reply) => { let _ = reply.send(player.stop().await); },
        Command::Pause(toggle, reply) => { let _ = reply.send(player.pause(toggle).await); },
        Command::Seek(offset, reply) => { let _ = reply.send(player.seek_to(offset).await); },
        Command::Volume(volume, reply) => { let _ = reply.send(player.set_volume(volume).await); },
        Command::Loop(mode, reply) => {
            player.set_loop(mode);
            let _ = reply.send(Ok(()));
        },
        Command::TextChannel(channel, reply) => {
            player.set_text_channel(channel);
            let _ = reply.send(Ok(()));
        },
        Command::VoiceChannel(channel, reply) => {
            player.set_voice_channel(channel);
            let _ = reply.send(Ok(()));
        },
        Command::VoiceServer(server, reply) => { let _ = reply.send(player.voice_server_update(server).await); },
        Command::VoiceState(state, reply) => { let _ = reply.send(player.voice_state_update(state).await); },
        Command::State(reply) => { let _ = reply.send(Ok(player.state().clone())); },
        Command::Queue(reply) => { let _ = reply.send(Ok(player.queue().iter().cloned().collect())); },
    }
}
