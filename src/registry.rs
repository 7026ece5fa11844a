use dashmap::DashMap;
use crate::{handle::PlayerHandle, types::GuildId};

/// Owning collection of the live players, one per guild.
pub trait PlayerRegistry: Send + Sync + 'static {
    /// Returns the handle that was registered before, if any.
    fn register(&self, guild_id: GuildId, player: PlayerHandle) -> Option<PlayerHandle>;
    fn remove(&self, guild_id: GuildId) -> Option<PlayerHandle>;
    fn lookup(&self, guild_id: GuildId) -> Option<PlayerHandle>;
}

#[derive(Default)]
pub struct InMemoryRegistry {
    players: DashMap<GuildId, PlayerHandle>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn guilds(&self) -> Vec<GuildId> {
        self.players.iter().map(|item| *item.key()).collect()
    }
}

impl PlayerRegistry for InMemoryRegistry {
    fn register(&self, guild_id: GuildId, player: PlayerHandle) -> Option<PlayerHandle> {
        self.players.insert(guild_id, player)
    }

    fn remove(&self, guild_id: GuildId) -> Option<PlayerHandle> {
        self.players.remove(&guild_id).map(|(_, player)| player)
    }

    fn lookup(&self, guild_id: GuildId) -> Option<PlayerHandle> {
        self.players.get(&guild_id).map(|item| item.value().clone())
    }
}
