use async_trait::async_trait;
use futures::StreamExt;
use http::Request;
use parking_lot::RwLock;
use reqwest::{Client as HttpClient, header::HeaderMap, Response};
use std::{sync::Arc, time::Duration};
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;
use tracing::{debug, info, warn};
use crate::{
    builder::NodeBuilder,
    error::{NodeError, NodeResult},
    events::{EventSender, PlayerEvent},
    model::{
        gateway::{Incoming, Stats},
        track::LoadResult,
        update::UpdatePlayer,
    },
    registry::PlayerRegistry,
    types::{GuildId, UserId},
};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Commands a player needs from the remote node.
#[async_trait]
pub trait NodeClient: Send + Sync + 'static {
    async fn update_player(&self, guild_id: GuildId, update: UpdatePlayer) -> NodeResult<()>;
    async fn destroy_player(&self, guild_id: GuildId) -> NodeResult<()>;
    async fn load_tracks(&self, identifier: &str) -> NodeResult<LoadResult>;
}

pub struct UniversalNode {
    http: HttpClient,
    rest_url: String,
    socket_url: String,
    pass: String,
    user_id: UserId,
    client_name: String,
    session_id: RwLock<Option<String>>,
    stats: RwLock<Option<Stats>>,
}

impl UniversalNode {
    pub(crate) fn new(builder: NodeBuilder, user_id: UserId) -> NodeResult<Arc<Self>> {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", builder.pass.parse()?);
        headers.insert("User-Id", user_id.to_string().parse()?);
        headers.insert("Client-Name", builder.client_name.parse()?);

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Arc::new(Self {
            http,
            rest_url: builder.rest_url(),
            socket_url: builder.socket_url(),
            pass: builder.pass,
            user_id,
            client_name: builder.client_name,
            session_id: RwLock::new(None),
            stats: RwLock::new(None),
        }))
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    /// Last stats pushed by the node.
    pub fn stats(&self) -> Option<Stats> {
        self.stats.read().clone()
    }

    fn get_ws_request(&self) -> NodeResult<Request<()>> {
        Ok(Request::builder()
            .uri(&self.socket_url)
            .header("Authorization", &self.pass)
            .header("User-Id", &self.user_id.to_string())
            .header("Client-Name", &self.client_name)
            .body(())?)
    }

    fn player_url(&self, guild_id: GuildId) -> NodeResult<String> {
        match self.session_id.read().as_deref() {
            Some(session) => Ok(format!("{}/v3/sessions/{}/players/{}", self.rest_url, session, guild_id)),
            None => Err(NodeError::NoSession),
        }
    }

    fn check(response: Response) -> NodeResult<Response> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            Err(NodeError::Status(status.as_u16()))
        }
    }

    /// Keeps the event socket open, routing pushes to the registered players.
    pub fn run(node: Arc<Self>, registry: Arc<dyn PlayerRegistry>, events: EventSender, max_reconnect_attempts: u8) {
        tokio::spawn(async move {
            let mut actual_reconnection_attempt = 1u16;

            while within_attempts(actual_reconnection_attempt, max_reconnect_attempts) {
                info!("Node {} trying to connect to server, attempt {}", node.rest_url, actual_reconnection_attempt);

                let stream = match node.get_ws_request() {
                    Ok(request) => tokio_tungstenite::connect_async(request).await.map_err(NodeError::from),
                    Err(why) => Err(why),
                };

                let mut stream = match stream {
                    Ok((stream, _)) => stream,
                    Err(why) => {
                        actual_reconnection_attempt += 1;

                        warn!("Node {} failed to connect to server (attempt {}/{}): {}, waiting 5s before reconnecting", node.rest_url, actual_reconnection_attempt - 1, max_reconnect_attempts, why);
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                };

                info!("Node {} connected successfully to server", node.rest_url);

                actual_reconnection_attempt = 1;

                while let Some(Ok(msg)) = stream.next().await {
                    match msg {
                        TungsteniteMessage::Text(t) => node.handle_message(&t, &*registry, &events),
                        TungsteniteMessage::Close(_) => break,
                        _ => ()
                    }
                }

                // REST calls need a fresh session id once the socket is back
                *node.session_id.write() = None;

                warn!("Node {} disconnected from server", node.rest_url);
            }

            info!("Node {} reached max connection attempts, giving up", node.rest_url);
        });
    }

    fn handle_message(&self, text: &str, registry: &dyn PlayerRegistry, events: &EventSender) {
        let incoming = match Incoming::parse(text) {
            Ok(incoming) => incoming,
            Err(why) => {
                warn!("Node {} sent an unreadable payload: {}", self.rest_url, why);
                return;
            }
        };

        match incoming {
            Incoming::Ready(ready) => {
                info!("Node {} session {} ready (resumed: {})", self.rest_url, ready.session_id, ready.resumed);

                *self.session_id.write() = Some(ready.session_id);
            },
            Incoming::Stats(stats) => {
                // Set last stats
                *self.stats.write() = Some(stats.clone());

                let _ = events.send(PlayerEvent::Stats(stats));
            },
            Incoming::PlayerUpdate(update) => {
                if let Some(player) = registry.lookup(update.guild_id) {
                    player.push_update(update.state);
                }
            },
            Incoming::Event(event) => {
                let guild_id = event.guild_id();

                match registry.lookup(guild_id) {
                    Some(player) => player.push_event(event),
                    None => debug!("Dropping event for guild {} without a player", guild_id),
                }
            },
            Incoming::Other(op) => debug!("Node {} sent unhandled op {}", self.rest_url, op),
        }
    }
}

fn within_attempts(attempt: u16, max_attempts: u8) -> bool {
    attempt <= u16::from(max_attempts)
}

#[async_trait]
impl NodeClient for UniversalNode {
    async fn update_player(&self, guild_id: GuildId, update: UpdatePlayer) -> NodeResult<()> {
        let url = self.player_url(guild_id)?;

        let response = self.http.patch(&url)
            .query(&[("noReplace", "false")])
            .json(&update)
            .send()
            .await?;

        Self::check(response)?;

        Ok(())
    }

    async fn destroy_player(&self, guild_id: GuildId) -> NodeResult<()> {
        let url = self.player_url(guild_id)?;

        let response = self.http.delete(&url)
            .send()
            .await?;

        Self::check(response)?;

        Ok(())
    }

    async fn load_tracks(&self, identifier: &str) -> NodeResult<LoadResult> {
        let response = self.http.get(&format!("{}/v3/loadtracks", self.rest_url))
            .query(&[("identifier", identifier)])
            .send()
            .await?;

        let result = Self::check(response)?
            .json::<LoadResult>()
            .await?;

        Ok(result)
    }
}
