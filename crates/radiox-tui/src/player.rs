//! mpv-backed stream player, one process per station.
//!
//! Architecture:
//!
//! ```text
//!   StreamPlayer::start()
//!         │
//!         └── watch task   ← owns the mpv Child
//!                ├── probe window passes, mpv still up → PlayerEvent::Started
//!                ├── mpv exits (any time)              → PlayerEvent::Failed
//!                └── stop signal / handle dropped      → kill, remove socket
//! ```
//!
//! Volume changes go over mpv's JSON IPC socket, one short-lived connection
//! per command.
//!
//! Platform notes:
//! - Unix:   Unix domain sockets
//! - Windows: Named pipes  \\.\pipe\<name>
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use radiox_core::error::PlaybackError;
use radiox_core::platform;
use radiox_core::station::Station;

const IPC_TIMEOUT: Duration = Duration::from_secs(2);

/// Reported back to the event loop.  `attempt` identifies the start request
/// so results from superseded players can be dropped.
#[derive(Debug)]
pub enum PlayerEvent {
    Started {
        id: String,
        attempt: u64,
    },
    Failed {
        id: String,
        attempt: u64,
        error: PlaybackError,
    },
}

impl PlayerEvent {
    pub fn id(&self) -> &str {
        match self {
            PlayerEvent::Started { id, .. } | PlayerEvent::Failed { id, .. } => id,
        }
    }

    pub fn attempt(&self) -> u64 {
        match self {
            PlayerEvent::Started { attempt, .. } | PlayerEvent::Failed { attempt, .. } => *attempt,
        }
    }
}

pub struct StreamPlayer {
    station: Station,
    attempt: u64,
    socket_path: PathBuf,
    started: bool,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl StreamPlayer {
    /// Spawn `binary` (mpv) for `station` and start watching it.  Errors here
    /// are immediate spawn failures; everything later arrives as a
    /// `PlayerEvent`.
    pub fn start(
        binary: &Path,
        station: Station,
        volume: f32,
        probe: Duration,
        attempt: u64,
        stderr_log: &Path,
        events: mpsc::Sender<PlayerEvent>,
    ) -> Result<Self, PlaybackError> {
        let socket_path = platform::mpv_socket_path(&socket_tag(station.id(), attempt));
        #[cfg(unix)]
        let _ = std::fs::remove_file(&socket_path);

        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(stderr_log)?;

        let child = tokio::process::Command::new(binary)
            .arg("--no-video")
            .arg("--idle=no")
            .arg("--no-input-terminal")
            .arg("--quiet")
            .arg(format!("--volume={}", volume_pct(volume)))
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg(station.stream_url())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!(
            "[player] {} spawned mpv pid {:?} for {}",
            station.id(),
            child.id(),
            station.stream_url()
        );

        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(watch(
            child,
            station.id().to_string(),
            attempt,
            probe,
            socket_path.clone(),
            stop_rx,
            events,
        ));

        Ok(Self {
            station,
            attempt,
            socket_path,
            started: false,
            stop_tx: Some(stop_tx),
        })
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn mark_started(&mut self) {
        self.started = true;
    }

    /// Push a new output volume to the running process.  Best effort: a
    /// player that is still starting picks the level up on its next start.
    pub fn set_volume(&self, volume: f32) {
        let socket = self.socket_path.clone();
        let id = self.station.id().to_string();
        let pct = volume_pct(volume);
        tokio::spawn(async move {
            match set_property(&socket, "volume", json!(pct)).await {
                Ok(()) => debug!("[player] {} volume → {}", id, pct),
                Err(e) => debug!("[player] {} volume not applied: {}", id, e),
            }
        });
    }

    pub fn stop(mut self) {
        debug!("[player] {} stop requested", self.station.id());
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn watch(
    mut child: Child,
    id: String,
    attempt: u64,
    probe: Duration,
    socket_path: PathBuf,
    mut stop_rx: oneshot::Receiver<()>,
    events: mpsc::Sender<PlayerEvent>,
) {
    let probe_timer = tokio::time::sleep(probe);
    tokio::pin!(probe_timer);
    let mut started = false;

    loop {
        tokio::select! {
            // Fires on an explicit stop and when the handle is dropped.
            _ = &mut stop_rx => {
                if let Err(e) = child.kill().await {
                    warn!("[player] {} kill failed: {}", id, e);
                }
                debug!("[player] {} stopped", id);
                break;
            }
            status = child.wait() => {
                let code = match status {
                    Ok(s) => s.code(),
                    Err(e) => {
                        warn!("[player] {} wait failed: {}", id, e);
                        None
                    }
                };
                warn!(
                    "[player] {} mpv exited with {:?} ({})",
                    id,
                    code,
                    if started { "while playing" } else { "during start" }
                );
                let _ = events
                    .send(PlayerEvent::Failed {
                        id: id.clone(),
                        attempt,
                        error: PlaybackError::Exited(code),
                    })
                    .await;
                break;
            }
            _ = &mut probe_timer, if !started => {
                started = true;
                info!("[player] {} playing", id);
                let _ = events
                    .send(PlayerEvent::Started { id: id.clone(), attempt })
                    .await;
            }
        }
    }

    #[cfg(unix)]
    let _ = tokio::fs::remove_file(&socket_path).await;
    #[cfg(not(unix))]
    let _ = socket_path;
}

fn volume_pct(volume: f32) -> i64 {
    (volume * 100.0).clamp(0.0, 100.0).round() as i64
}

/// Station ids are opaque; keep only what is safe in a socket file name.
/// The attempt keeps a replayed station off the socket an exiting watch
/// task is about to remove.
fn socket_tag(id: &str, attempt: u64) -> String {
    let tag: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(40)
        .collect();
    if tag.is_empty() {
        format!("station-{attempt}")
    } else {
        format!("{tag}-{attempt}")
    }
}

async fn set_property(socket: &Path, name: &str, value: Value) -> anyhow::Result<()> {
    let payload = json!({ "command": ["set_property", name, value] });
    let mut line = serde_json::to_string(&payload)?;
    line.push('\n');

    #[cfg(unix)]
    let stream = tokio::net::UnixStream::connect(socket).await?;
    #[cfg(windows)]
    let stream = tokio::net::windows::named_pipe::ClientOptions::new().open(socket)?;

    tokio::time::timeout(IPC_TIMEOUT, exchange(stream, &line))
        .await
        .map_err(|_| anyhow::anyhow!("mpv IPC timeout"))?
}

async fn exchange<S>(stream: S, line: &str) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    write_half.write_all(line.as_bytes()).await?;

    let mut reader = BufReader::new(read_half);
    let mut reply = String::new();
    loop {
        reply.clear();
        if reader.read_line(&mut reply).await? == 0 {
            anyhow::bail!("mpv IPC connection closed");
        }
        let val: Value = match serde_json::from_str(reply.trim()) {
            Ok(v) => v,
            Err(_) => continue,
        };
        // Skip unsolicited events; the first reply with an "error" key is ours.
        if let Some(err) = val.get("error").and_then(|e| e.as_str()) {
            if err == "success" {
                return Ok(());
            }
            anyhow::bail!("mpv error: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_tag_is_filesystem_safe() {
        assert_eq!(
            socket_tag("96062a7b-0601-11e8-ae97-52543be04c81", 1),
            "96062a7b-0601-11e8-ae97-52543be04c81-1"
        );
        assert_eq!(socket_tag("../etc/passwd", 3), "etcpasswd-3");
        assert_eq!(socket_tag("///", 4), "station-4");
    }

    #[test]
    fn test_replayed_station_gets_a_fresh_socket() {
        let first = platform::mpv_socket_path(&socket_tag("abc", 1));
        let second = platform::mpv_socket_path(&socket_tag("abc", 2));
        assert_ne!(first, second);
    }

    #[test]
    fn test_volume_pct() {
        assert_eq!(volume_pct(0.0), 0);
        assert_eq!(volume_pct(0.55), 55);
        assert_eq!(volume_pct(1.7), 100);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_set_property_round_trip() {
        use tokio::io::AsyncReadExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mpv.sock");
        let listener = tokio::net::UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let n = sock.read(&mut buf).await.unwrap();
            let req: Value =
                serde_json::from_str(String::from_utf8_lossy(&buf[..n]).trim()).unwrap();
            sock.write_all(b"{\"event\":\"idle\"}\n").await.unwrap();
            sock.write_all(b"{\"error\":\"success\"}\n").await.unwrap();
            req
        });

        set_property(&path, "volume", json!(40)).await.unwrap();
        let req = server.await.unwrap();
        assert_eq!(req["command"], json!(["set_property", "volume", 40]));
    }
}
