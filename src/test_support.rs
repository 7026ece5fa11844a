use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{atomic::{AtomicBool, Ordering}, Arc},
};
use tokio::sync::mpsc;
use crate::{
    connection::{VoiceSender, VoiceStateUpdate},
    error::{NodeError, NodeResult},
    handle::{Message, PlayerHandle},
    model::{
        track::{LoadResult, LoadType, PlaylistInfo, Track, TrackInfo},
        update::UpdatePlayer,
    },
    node::NodeClient,
    registry::PlayerRegistry,
    types::GuildId,
};

/// A resolved track whose encoded handle is its title.
pub(crate) fn playable(title: &str, length: u64) -> Track {
    Track {
        encoded: Some(title.to_string()),
        info: TrackInfo {
            title: title.to_string(),
            length,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NodeCall {
    Update(GuildId, UpdatePlayer),
    Destroy(GuildId),
    Load(String),
}

#[derive(Default)]
pub(crate) struct FakeNode {
    calls: Mutex<Vec<NodeCall>>,
    results: Mutex<HashMap<String, Vec<Track>>>,
    failing: AtomicBool,
}

impl FakeNode {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<NodeCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn add_result(&self, identifier: &str, tracks: Vec<Track>) {
        self.results.lock().insert(identifier.to_string(), tracks);
    }

    /// Makes player commands fail as if the node was unreachable.
    pub(crate) fn fail_updates(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn outcome(&self) -> NodeResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(NodeError::Status(503))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NodeClient for FakeNode {
    async fn update_player(&self, guild_id: GuildId, update: UpdatePlayer) -> NodeResult<()> {
        self.calls.lock().push(NodeCall::Update(guild_id, update));
        self.outcome()
    }

    async fn destroy_player(&self, guild_id: GuildId) -> NodeResult<()> {
        self.calls.lock().push(NodeCall::Destroy(guild_id));
        self.outcome()
    }

    async fn load_tracks(&self, identifier: &str) -> NodeResult<LoadResult> {
        self.calls.lock().push(NodeCall::Load(identifier.to_string()));

        let tracks = self.results.lock().get(identifier).cloned().unwrap_or_default();
        let load_type = if tracks.is_empty() { LoadType::NoMatches } else { LoadType::SearchResult };

        Ok(LoadResult {
            load_type,
            playlist_info: PlaylistInfo::default(),
            tracks,
            exception: None,
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeVoice {
    sent: Mutex<Vec<VoiceStateUpdate>>,
}

impl FakeVoice {
    pub(crate) fn sent(&self) -> Vec<VoiceStateUpdate> {
        self.sent.lock().clone()
    }
}

impl VoiceSender for FakeVoice {
    fn send(&self, update: VoiceStateUpdate) {
        self.sent.lock().push(update);
    }
}

/// A handle with no task behind it, the inbox is returned instead.
pub(crate) fn detached_handle(guild_id: GuildId) -> (PlayerHandle, mpsc::UnboundedReceiver<Message>) {
    let (sender, inbox) = mpsc::unbounded_channel();

    (PlayerHandle::from_parts(guild_id, sender, Arc::new(FakeNode::new())), inbox)
}

#[derive(Default)]
pub(crate) struct FakeRegistry {
    players: Mutex<HashMap<GuildId, PlayerHandle>>,
    removed: Mutex<Vec<GuildId>>,
}

impl FakeRegistry {
    pub(crate) fn removed(&self) -> Vec<GuildId> {
        self.removed.lock().clone()
    }

    pub(crate) fn register_inbox(&self, guild_id: GuildId) -> mpsc::UnboundedReceiver<Message> {
        let (handle, inbox) = detached_handle(guild_id);
        self.register(guild_id, handle);
        inbox
    }
}

impl PlayerRegistry for FakeRegistry {
    fn register(&self, guild_id: GuildId, player: PlayerHandle) -> Option<PlayerHandle> {
        self.players.lock().insert(guild_id, player)
    }

    fn remove(&self, guild_id: GuildId) -> Option<PlayerHandle> {
        self.removed.lock().push(guild_id);
        self.players.lock().remove(&guild_id)
    }

    fn lookup(&self, guild_id: GuildId) -> Option<PlayerHandle> {
        self.players.lock().get(&guild_id).cloned()
    }
}
