//! Error taxonomy shared by the directory client, the favorites store and the
//! stream players.  All of these are recovered locally by the UI; none of them
//! end the session.

use thiserror::Error;

/// Failure to load the station list from the directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The request was superseded or the caller went away.  Never shown.
    #[error("request cancelled")]
    Cancelled,

    #[error("Failed to fetch stations (HTTP {0})")]
    Status(reqwest::StatusCode),

    #[error("Failed to fetch stations: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Failed to read station list: {0}")]
    Decode(#[source] reqwest::Error),
}

impl DirectoryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DirectoryError::Cancelled)
    }
}

/// Failure to start (or keep) a station's stream playing.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("mpv binary not found")]
    PlayerNotFound,

    #[error("failed to start player: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("stream ended (exit code {0:?})")]
    Exited(Option<i32>),
}

impl PlaybackError {
    /// The message shown inline on the station row.
    pub fn user_message(&self) -> &'static str {
        "Failed to play station"
    }
}

/// Failure to write a slot of the local key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode slot: {0}")]
    Encode(#[from] serde_json::Error),
}
