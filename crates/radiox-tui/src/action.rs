//! Action enum: all user-initiated intents.

use radiox_core::station::Station;

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    /// Play the station, or stop it if it is the one playing.
    TogglePlay(Station),
    Stop,
    VolumeUp,
    VolumeDown,
    Mute, // toggle mute (save/restore volume)

    // ── Favorites ────────────────────────────────────────────────────────────
    ToggleFavorite(Station),
    ToggleView,

    // ── Browse ───────────────────────────────────────────────────────────────
    LoadMore,
    Reload,

    // ── Search ───────────────────────────────────────────────────────────────
    OpenSearch,
    /// Query text edited; applied after the debounce window.
    SearchEdited(String),
    /// Enter in the search box: apply now.
    SearchSubmitted(String),
    CloseSearch,

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleDetails,
    ToggleHelp,
    CopyToClipboard(String), // text to copy

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
