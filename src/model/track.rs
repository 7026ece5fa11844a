use lazy_static::lazy_static;
use regex::Regex;
use serde::{
    Serialize,
    Deserialize
};
use crate::{
    error::{PlayerError, PlayerResult},
    node::NodeClient,
    types::UserId,
};

pub const DEFAULT_SOURCE: &str = "ytsearch";

lazy_static!(
    static ref URL_REGEX: Regex = Regex::new(r"^https?://").unwrap();
);

pub fn is_url(query: &str) -> bool {
    URL_REGEX.is_match(query)
}

/// Builds the `loadtracks` identifier for a query.
///
/// Urls are looked up verbatim, anything else gets the `source:` search prefix.
pub fn load_identifier(query: &str, source: Option<&str>) -> String {
    if is_url(query) {
        query.to_string()
    } else {
        format!("{}:{}", source.unwrap_or(DEFAULT_SOURCE), query)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    TrackLoaded,
    PlaylistLoaded,
    SearchResult,
    NoMatches,
    LoadFailed,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadResult {
    pub load_type: LoadType,
    #[serde(default)]
    pub playlist_info: PlaylistInfo,
    #[serde(default)]
    pub tracks: Vec<Track>,
    pub exception: Option<Exception>
}

impl LoadResult {
    /// Attaches the requester to every loaded track.
    pub fn with_requester(mut self, requester: Option<TrackRequester>) -> Self {
        for track in self.tracks.iter_mut() {
            track.requester = requester.clone();
        }
        self
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Track {
    #[serde(default)]
    pub encoded: Option<String>,
    #[serde(default)]
    pub info: TrackInfo,
    /// Search prefix used when the track has to be resolved.
    #[serde(skip)]
    pub source: Option<String>,
    #[serde(skip)]
    pub requester: Option<TrackRequester>
}

impl Track {
    /// Creates a track that will be looked up on the node right before it plays.
    pub fn unresolved(query: impl ToString, source: impl ToString, requester: impl Into<TrackRequester>) -> Self {
        let query = query.to_string();
        let mut info = TrackInfo::default();

        if is_url(&query) {
            info.uri = Some(query);
        } else {
            info.title = query;
        }

        Self {
            encoded: None,
            info,
            source: Some(source.to_string()),
            requester: Some(requester.into())
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.encoded.is_some()
    }

    pub fn length(&self) -> u64 {
        self.info.length
    }

    fn search_identifier(&self) -> String {
        if let Some(uri) = self.info.uri.as_deref().filter(|uri| is_url(uri)) {
            return uri.to_string();
        }

        let query = if self.info.author.is_empty() {
            self.info.title.clone()
        } else {
            format!("{} - {}", self.info.author, self.info.title)
        };

        load_identifier(&query, self.source.as_deref())
    }

    /// Fetches the encoded handle from the node. A resolved track is left untouched.
    pub async fn resolve(&mut self, node: &dyn NodeClient) -> PlayerResult<()> {
        if self.is_resolved() {
            return Ok(());
        }

        let identifier = self.search_identifier();
        let result = node.load_tracks(&identifier).await?;

        match result.tracks.into_iter().find(Track::is_resolved) {
            Some(found) => {
                self.encoded = found.encoded;
                self.info = found.info;
                Ok(())
            },
            None => Err(PlayerError::Resolution(identifier))
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackInfo {
    pub identifier: String,
    pub is_seekable: bool,
    pub author: String,
    pub length: u64,
    pub is_stream: bool,
    pub position: u64,
    pub title: String,
    pub uri: Option<String>,
    pub source_name: Option<String>
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Exception {
    pub message: Option<String>,
    pub severity: String,
    #[serde(default)]
    pub cause: Option<String>
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PlaylistInfo {
    pub name: Option<String>,
    #[serde(rename = "selectedTrack")]
    pub selected_track: Option<i64>
}

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub query: String,
    pub source: Option<String>,
    pub requester: Option<TrackRequester>
}

impl ResolveOptions {
    pub fn new(query: impl ToString) -> Self {
        Self {
            query: query.to_string(),
            ..Default::default()
        }
    }

    pub fn source(mut self, source: impl ToString) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn requester(mut self, requester: impl Into<TrackRequester>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    pub fn identifier(&self) -> String {
        load_identifier(&self.query, self.source.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackRequester {
    pub id: Option<UserId>,
    pub name: Option<String>
}

impl From<UserId> for TrackRequester {
    fn from(id: UserId) -> TrackRequester {
        TrackRequester{id: Some(id), name: None}
    }
}

impl From<String> for TrackRequester {
    fn from(name: String) -> TrackRequester {
        TrackRequester{id: None, name: Some(name)}
    }
}

impl From<&str> for TrackRequester {
    fn from(name: &str) -> TrackRequester {
        TrackRequester{id: None, name: Some(name.to_string())}
    }
}

impl From<(UserId, String)> for TrackRequester {
    fn from(data: (UserId, String)) -> TrackRequester {
        TrackRequester {id: Some(data.0), name: Some(data.1)}
    }
}
