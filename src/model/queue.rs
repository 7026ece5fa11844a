use std::collections::VecDeque;
use super::track::Track;

/// Tracks waiting to be played, in playback order.
///
/// The current track is never stored here.
#[derive(Clone, Debug, Default)]
pub struct Queue {
    tracks: VecDeque<Track>
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, track: Track) {
        self.tracks.push_back(track);
    }

    pub fn enqueue_front(&mut self, track: Track) {
        self.tracks.push_front(track);
    }

    pub fn dequeue_front(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn first(&self) -> Option<&Track> {
        self.tracks.front()
    }

    pub fn remove(&mut self, index: usize) -> Option<Track> {
        self.tracks.remove(index)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }
}

impl Extend<Track> for Queue {
    fn extend<I: IntoIterator<Item = Track>>(&mut self, iter: I) {
        self.tracks.extend(iter);
    }
}
