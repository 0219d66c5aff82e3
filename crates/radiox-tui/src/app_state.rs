//! AppState: shared read-only data passed to all components during render/event.
//!
//! Components read this for station, favorite and playback state, but never
//! mutate it. The App event-loop is the only thing that writes to AppState.

use std::collections::HashMap;
use std::time::Instant;

use radiox_core::station::Station;

use crate::transport::Transport;
use crate::widgets::status_bar::InputMode;

/// Which list the body shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    All,
    Favorites,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::All => Self::Favorites,
            Self::Favorites => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all stations",
            Self::Favorites => "favorites",
        }
    }
}

/// Transient per-station playback status.  Absent means "nothing to report".
#[derive(Debug, Clone, PartialEq)]
pub enum StationStatus {
    Connecting,
    Failed { message: String, until: Instant },
}

pub struct AppState {
    // ── Browse ─────────────────────────────────────────────────────────────
    pub view: ViewMode,
    /// Stations the list renders, in order, for the current view.
    pub rows: Vec<Station>,
    /// More search results can be revealed (All view only).
    pub has_more: bool,
    pub total_stations: usize,
    pub matching_stations: usize,
    /// The query the list is currently filtered by.
    pub query: String,
    pub loading: bool,
    pub error: Option<String>,

    // ── Favorites ──────────────────────────────────────────────────────────
    /// Favorited station ids → when they were added (epoch millis).
    pub favorites_added: HashMap<String, i64>,
    pub favorites_count: usize,

    // ── Playback ───────────────────────────────────────────────────────────
    pub playing: Option<Station>,
    pub status: HashMap<String, StationStatus>,
    pub transports: HashMap<String, Transport>,
    pub default_volume: f32,

    // ── UI ─────────────────────────────────────────────────────────────────
    pub selected: Option<Station>,
    pub input_mode: InputMode,
    pub show_details: bool,
    pub show_help: bool,
    /// Advances every UI tick; drives the now-playing animation.
    pub frame: u64,
}

impl AppState {
    pub fn new(default_volume: f32) -> Self {
        Self {
            view: ViewMode::All,
            rows: Vec::new(),
            has_more: false,
            total_stations: 0,
            matching_stations: 0,
            query: String::new(),
            loading: false,
            error: None,
            favorites_added: HashMap::new(),
            favorites_count: 0,
            playing: None,
            status: HashMap::new(),
            transports: HashMap::new(),
            default_volume,
            selected: None,
            input_mode: InputMode::Normal,
            show_details: true,
            show_help: false,
            frame: 0,
        }
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites_added.contains_key(id)
    }

    pub fn favorite_added_at(&self, id: &str) -> Option<i64> {
        self.favorites_added.get(id).copied()
    }

    pub fn is_playing(&self, id: &str) -> bool {
        self.playing.as_ref().is_some_and(|s| s.id() == id)
    }

    pub fn is_connecting(&self, id: &str) -> bool {
        matches!(self.status.get(id), Some(StationStatus::Connecting))
    }

    pub fn error_for(&self, id: &str) -> Option<&str> {
        match self.status.get(id) {
            Some(StationStatus::Failed { message, .. }) => Some(message),
            _ => None,
        }
    }

    /// Volume/mute for `id`; stations never touched use the configured default.
    pub fn transport_for(&self, id: &str) -> Transport {
        self.transports
            .get(id)
            .copied()
            .unwrap_or_else(|| Transport::new(self.default_volume))
    }

    /// The station volume keys act on: the one playing, else the selection.
    pub fn transport_target(&self) -> Option<&Station> {
        self.playing.as_ref().or(self.selected.as_ref())
    }

    /// Drop failure messages whose display time has passed.
    pub fn expire_status(&mut self, now: Instant) -> bool {
        let before = self.status.len();
        self.status.retain(|_, s| match s {
            StationStatus::Failed { until, .. } => *until > now,
            StationStatus::Connecting => true,
        });
        self.status.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn station(id: &str) -> Station {
        Station {
            changeuuid: id.to_string(),
            ..Station::default()
        }
    }

    #[test]
    fn test_transport_defaults_to_configured_volume() {
        let state = AppState::new(0.4);
        assert!((state.transport_for("x").volume() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_transport_target_prefers_playing() {
        let mut state = AppState::new(1.0);
        state.selected = Some(station("sel"));
        assert_eq!(state.transport_target().map(|s| s.id()), Some("sel"));
        state.playing = Some(station("play"));
        assert_eq!(state.transport_target().map(|s| s.id()), Some("play"));
    }

    #[test]
    fn test_failed_status_expires() {
        let mut state = AppState::new(1.0);
        let now = Instant::now();
        state.status.insert(
            "a".into(),
            StationStatus::Failed {
                message: "Failed to play station".into(),
                until: now + Duration::from_secs(5),
            },
        );
        state.status.insert("b".into(), StationStatus::Connecting);

        assert!(!state.expire_status(now));
        assert_eq!(state.error_for("a"), Some("Failed to play station"));

        assert!(state.expire_status(now + Duration::from_secs(6)));
        assert!(state.error_for("a").is_none());
        assert!(state.is_connecting("b"));
    }
}
