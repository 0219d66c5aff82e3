//! Playback coordinator: which single station, if any, is "now playing".
//!
//! This only tracks the designation.  Decoding, volume and mute belong to the
//! per-station players in the UI, which stop themselves when their station
//! loses the designation.

use tracing::debug;

use crate::station::Station;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing(Station),
}

#[derive(Debug, Default)]
pub struct PlaybackCoordinator {
    state: PlaybackState,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current(&self) -> Option<&Station> {
        match &self.state {
            PlaybackState::Playing(s) => Some(s),
            PlaybackState::Idle => None,
        }
    }

    /// Per-station flag: is `id` the station currently playing?
    pub fn is_playing(&self, id: &str) -> bool {
        self.current().is_some_and(|s| s.id() == id)
    }

    /// Designate `station` as playing.  Returns the station it replaced, if a
    /// different one was playing.
    pub fn play(&mut self, station: Station) -> Option<Station> {
        debug!("[playback] play {}", station.id());
        let prev = std::mem::replace(&mut self.state, PlaybackState::Playing(station));
        match prev {
            PlaybackState::Playing(old) if !self.is_playing(old.id()) => Some(old),
            _ => None,
        }
    }

    /// Back to idle.  Returns the station that was playing.
    pub fn stop(&mut self) -> Option<Station> {
        match std::mem::take(&mut self.state) {
            PlaybackState::Playing(old) => {
                debug!("[playback] stop {}", old.id());
                Some(old)
            }
            PlaybackState::Idle => None,
        }
    }

    /// Stop only if `id` is the current station (used when its stream fails).
    pub fn stop_if(&mut self, id: &str) -> Option<Station> {
        if self.is_playing(id) {
            self.stop()
        } else {
            None
        }
    }
}
