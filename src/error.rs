use std::{
    error::Error,
    fmt::{
        Display,
        Formatter,
        Result,
    },
};
use tokio_tungstenite::tungstenite::error::Error as TungsteniteError;
use reqwest::header::InvalidHeaderValue;

pub type PlayerResult<T> = ::std::result::Result<T, PlayerError>;

#[derive(Debug)]
pub enum PlayerError {
    InvalidArgument(String),
    Resolution(String),
    UnknownEvent(String),
    RemoteCommand(NodeError),
    NothingPlaying,
    PlayerDestroyed,
    PlayerNotFound,
}

impl Error for PlayerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PlayerError::RemoteCommand(e) => Some(e),
            _ => None
        }
    }
}

impl Display for PlayerError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            PlayerError::InvalidArgument(why) => write!(f, "Invalid argument: {}", why),
            PlayerError::Resolution(query) => write!(f, "No playable track was found for `{}`", query),
            PlayerError::UnknownEvent(kind) => write!(f, "An unknown event was received: {}", kind),
            PlayerError::RemoteCommand(e) => write!(f, "Remote command failed: {}", e),
            PlayerError::NothingPlaying => write!(f, "There is no current track."),
            PlayerError::PlayerDestroyed => write!(f, "The player has been destroyed."),
            PlayerError::PlayerNotFound => write!(f, "Player not found"),
        }
    }
}

impl From<NodeError> for PlayerError {
    fn from(e: NodeError) -> PlayerError {
        PlayerError::RemoteCommand(e)
    }
}

pub type NodeResult<T> = ::std::result::Result<T, NodeError>;

#[derive(Debug)]
pub enum NodeError {
    /// The node has not sent its `ready` op yet.
    NoSession,
    Status(u16),
    Http(reqwest::Error),
    InvalidHeader(InvalidHeaderValue),
    InvalidRequest(http::Error),
    Socket(TungsteniteError),
}

impl Error for NodeError {}

impl Display for NodeError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            NodeError::NoSession => write!(f, "The node has not provided a session id yet."),
            NodeError::Status(code) => write!(f, "The node answered with status {}", code),
            NodeError::Http(why) => write!(f, "Error while sending request => {:?}", why),
            NodeError::InvalidHeader(why) => write!(f, "Invalid header value => {}", why),
            NodeError::InvalidRequest(why) => write!(f, "Invalid socket request => {}", why),
            NodeError::Socket(why) => write!(f, "{:#?}", why),
        }
    }
}

impl From<reqwest::Error> for NodeError {
    fn from(e: reqwest::Error) -> NodeError {
        Self::Http(e)
    }
}

impl From<InvalidHeaderValue> for NodeError {
    fn from(e: InvalidHeaderValue) -> NodeError {
        Self::InvalidHeader(e)
    }
}

impl From<http::Error> for NodeError {
    fn from(e: http::Error) -> NodeError {
        Self::InvalidRequest(e)
    }
}

impl From<TungsteniteError> for NodeError {
    fn from(e: TungsteniteError) -> NodeError {
        Self::Socket(e)
    }
}
