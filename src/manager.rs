use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use crate::{
    builder::NodeBuilder,
    connection::{VoiceSender, VoiceServer, VoiceState},
    error::{PlayerError, PlayerResult},
    events::{self, EventHandler, EventSender},
    handle::PlayerHandle,
    model::{
        player::PlayerOptions,
        track::{LoadResult, ResolveOptions},
    },
    node::{NodeClient, UniversalNode},
    player::{resolve_query, Player},
    registry::{InMemoryRegistry, PlayerRegistry},
    types::GuildId,
};

#[non_exhaustive]
pub struct PlayerManager {
    pub node: Arc<dyn NodeClient>,
    pub registry: Arc<dyn PlayerRegistry>,
    voice: Arc<dyn VoiceSender>,
    events: EventSender,
}

impl PlayerManager {
    pub fn builder<H: EventHandler + 'static, V: VoiceSender + 'static>(handler: H, voice: V) -> ManagerBuilder {
        ManagerBuilder::new(handler, voice)
    }

    /// Assembles a manager from its collaborators without starting any task.
    pub fn from_parts(
        node: Arc<dyn NodeClient>,
        registry: Arc<dyn PlayerRegistry>,
        voice: Arc<dyn VoiceSender>,
        events: EventSender,
    ) -> Self {
        Self {
            node,
            registry,
            voice,
            events,
        }
    }

    fn new(builder: ManagerBuilder) -> PlayerResult<Arc<Self>> {
        let node = builder.node.build()?;
        let registry: Arc<dyn PlayerRegistry> = Arc::new(InMemoryRegistry::new());
        let (events, events_rx) = mpsc::unbounded_channel();

        tokio::spawn(events::process(builder.event_handler, events_rx));
        UniversalNode::run(Arc::clone(&node), Arc::clone(&registry), events.clone(), builder.reconnect_attempts);

        Ok(Arc::new(Self::from_parts(node, registry, builder.voice, events)))
    }

    /// Returns the player of the guild, creating and connecting it when there is none.
    pub fn create_player(&self, options: PlayerOptions) -> PlayerResult<PlayerHandle> {
        if let Some(existing) = self.registry.lookup(options.guild_id) {
            if existing.is_alive() {
                return Ok(existing);
            }
        }

        let connect = options.connect_options();
        let mut player = Player::new(
            options,
            Arc::clone(&self.node),
            Arc::clone(&self.voice),
            Arc::clone(&self.registry),
            self.events.clone(),
        );

        if connect.voice_channel.is_some() {
            player.connect(connect)?;
        }

        let guild_id = player.guild_id();
        let handle = PlayerHandle::spawn(player);
        self.registry.register(guild_id, handle.clone());

        info!("Created player for guild {}", guild_id);

        Ok(handle)
    }

    pub fn get_player(&self, guild_id: impl Into<GuildId>) -> Option<PlayerHandle> {
        self.registry.lookup(guild_id.into())
    }

    pub async fn destroy_player(&self, guild_id: impl Into<GuildId>) -> PlayerResult<()> {
        match self.get_player(guild_id) {
            Some(player) => player.destroy().await,
            None => Err(PlayerError::PlayerNotFound),
        }
    }

    /// Feeds the `VOICE_SERVER_UPDATE` half of the handshake to the guild's player.
    pub async fn handle_voice_server_update(&self, guild_id: impl Into<GuildId>, server: VoiceServer) -> PlayerResult<()> {
        match self.get_player(guild_id) {
            Some(player) => player.voice_server_update(server).await,
            None => Err(PlayerError::PlayerNotFound),
        }
    }

    /// Feeds the bot's `VOICE_STATE_UPDATE` half of the handshake to the guild's player.
    pub async fn handle_voice_state_update(&self, guild_id: impl Into<GuildId>, state: VoiceState) -> PlayerResult<()> {
        match self.get_player(guild_id) {
            Some(player) => player.voice_state_update(state).await,
            None => Err(PlayerError::PlayerNotFound),
        }
    }

    pub async fn resolve(&self, options: ResolveOptions) -> PlayerResult<LoadResult> {
        resolve_query(&*self.node, &options).await
    }
}

impl typemap_rev::TypeMapKey for PlayerManager {
    type Value = Arc<PlayerManager>;
}

pub struct ManagerBuilder {
    pub event_handler: Arc<dyn EventHandler>,
    pub voice: Arc<dyn VoiceSender>,
    pub node: NodeBuilder,
    pub reconnect_attempts: u8
}

impl ManagerBuilder {
    pub fn new<H: EventHandler + 'static, V: VoiceSender + 'static>(handler: H, voice: V) -> Self {
        Self {
            event_handler: Arc::new(handler),
            voice: Arc::new(voice),
            node: NodeBuilder::default(),
            reconnect_attempts: 5
        }
    }

    pub fn node<F>(&mut self, func: F) -> &mut Self
    where
        F: FnOnce(&mut NodeBuilder) -> &mut NodeBuilder {
            func(&mut self.node);

            self
        }

    pub fn reconnect_attempts(&mut self, attempts: u8) -> &mut Self {
        self.reconnect_attempts = attempts;

        self
    }

    /// Spawns the event socket and the notification task, so it needs a tokio runtime.
    pub fn build(self) -> PlayerResult<Arc<PlayerManager>> {
        PlayerManager::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        connection::VoiceStateUpdate,
        events::PlayerEvent,
        model::update::UpdatePlayer,
        test_support::{FakeNode, FakeVoice, NodeCall},
    };
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Nothing;

    impl EventHandler for Nothing {}

    fn manager() -> (PlayerManager, Arc<FakeNode>, Arc<FakeVoice>, UnboundedReceiver<PlayerEvent>) {
        let node = Arc::new(FakeNode::new());
        let voice = Arc::new(FakeVoice::default());
        let (events, events_rx) = mpsc::unbounded_channel();

        let manager = PlayerManager::from_parts(node.clone(), Arc::new(InMemoryRegistry::new()), voice.clone(), events);
        (manager, node, voice, events_rx)
    }

    #[tokio::test]
    async fn create_player_connects_and_registers() {
        let (manager, _node, voice, _events) = manager();

        let handle = manager.create_player(PlayerOptions::new(1u64).voice_channel(2u64).mute(true)).unwrap();

        assert_eq!(manager.get_player(1u64).map(|p| p.guild_id()), Some(1));
        assert_eq!(voice.sent(), vec![VoiceStateUpdate { guild_id: 1, channel_id: Some(2), self_mute: true, self_deaf: true }]);
        assert!(handle.state().await.unwrap().connected());
    }

    #[tokio::test]
    async fn create_player_reuses_existing() {
        let (manager, _node, voice, _events) = manager();

        manager.create_player(PlayerOptions::new(1u64).voice_channel(2u64)).unwrap();
        manager.create_player(PlayerOptions::new(1u64).voice_channel(3u64)).unwrap();

        assert_eq!(voice.sent().len(), 1);
    }

    #[tokio::test]
    async fn destroy_removes_from_registry() {
        let (manager, node, _voice, _events) = manager();
        manager.create_player(PlayerOptions::new(1u64).voice_channel(2u64)).unwrap();

        manager.destroy_player(1u64).await.unwrap();

        assert!(manager.get_player(1u64).is_none());
        assert_eq!(node.calls(), vec![NodeCall::Update(1, UpdatePlayer::pause(true)), NodeCall::Destroy(1)]);
        assert!(matches!(manager.destroy_player(1u64).await, Err(PlayerError::PlayerNotFound)));
    }

    #[tokio::test]
    async fn voice_updates_need_a_player() {
        let (manager, _node, _voice, _events) = manager();
        let server = VoiceServer { token: "t".to_string(), endpoint: Some("e".to_string()) };

        assert!(matches!(manager.handle_voice_server_update(9u64, server).await, Err(PlayerError::PlayerNotFound)));
    }

    #[tokio::test]
    async fn builder_requires_user_id() {
        let builder = PlayerManager::builder(Nothing, |_update: VoiceStateUpdate| {});

        assert!(matches!(builder.build(), Err(PlayerError::InvalidArgument(_))));
    }
}
