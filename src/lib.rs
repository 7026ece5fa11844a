pub mod types;
pub mod error;
pub mod model;
pub mod connection;
pub mod node;
pub mod events;
pub mod registry;
pub mod player;
pub mod handle;
pub mod manager;
pub mod builder;

#[cfg(test)]
mod test_support;

pub use crate::{
    error::{NodeError, PlayerError, PlayerResult},
    events::{EventHandler, PlayerEvent},
    handle::PlayerHandle,
    manager::{ManagerBuilder, PlayerManager},
    model::{
        player::{ConnectOptions, LoopMode, PlaybackStatus, PlayerOptions, PlayerState},
        track::{LoadResult, ResolveOptions, Track, TrackRequester},
    },
};
