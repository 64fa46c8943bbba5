//! Frame Server
//!
//! Renders frames at a fixed rate and streams them to every connected
//! display client over a Unix socket:
//! - Polls the input state file once per tick
//! - Reloads a custom animation file when it changes on disk
//! - Renders, encodes and broadcasts one frame per tick
//! - Accepts any number of clients, each fed by its own writer task
//! - Supports graceful shutdown
//!
//! # Wire Format
//!
//! Each frame is one line of JSON followed by `\n`:
//!
//! ```text
//! {"rows":["  ..."],"cell_colors":[[0,8,...]],"theme_color":[0.4,0.7,1.0]}\n
//! ```
//!
//! # Client Fan-out
//!
//! ```text
//!            tick loop ── render ── encode ──► broadcast::Sender<Arc<str>>
//!                                                  │
//!                  ┌───────────────────────────────┼──────────────────┐
//!                  │                               │                  │
//!              client-1                        client-2           client-3
//!           (writer task)                   (writer task)      (writer task)
//! ```
//!
//! A client that falls behind skips frames rather than stalling the tick
//! loop; only the newest frames matter to a display.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use dashmap::DashMap;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn, Instrument};

use widget_core::{FrameRenderer, WireFrame};

use crate::animations::AnimationWatcher;
use crate::state::StateWatcher;

/// Identifies one connected display client
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Client state tracking
struct ClientState {
    /// When the client connected
    connected_at: Instant,
    /// Remote peer UID (from SO_PEERCRED)
    peer_uid: Option<u32>,
    /// Handle to abort the writer task
    abort_handle: tokio::task::AbortHandle,
}

/// Configuration for the frame server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Maximum number of concurrent clients
    pub max_clients: usize,
    /// Frames buffered per client before it starts skipping
    pub frame_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_clients: 16,
            frame_buffer: 8,
        }
    }
}

/// Streams rendered frames to clients on a Unix socket
pub struct FrameServer {
    /// Path to the Unix socket
    socket_path: PathBuf,
    /// Server configuration
    server_config: ServerConfig,
    /// Connected clients
    clients: Arc<DashMap<ClientId, ClientState>>,
    /// Next client id
    next_id: u64,
}

impl FrameServer {
    /// Create a server that will listen on `socket_path`
    #[must_use]
    pub fn new(socket_path: PathBuf, server_config: ServerConfig) -> Self {
        Self {
            socket_path,
            server_config,
            clients: Arc::new(DashMap::new()),
            next_id: 1,
        }
    }

    /// Number of connected clients
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Get peer credentials from Unix socket
    fn get_peer_uid(stream: &UnixStream) -> Option<u32> {
        use std::os::unix::io::AsRawFd;

        let fd = stream.as_raw_fd();
        // SAFETY: ucred is plain old data; all-zero is a valid value.
        let mut cred: libc::ucred = unsafe { std::mem::zeroed() };
        let mut len = libc::socklen_t::try_from(std::mem::size_of::<libc::ucred>()).ok()?;

        // SAFETY: fd is a live socket owned by `stream`; cred and len are
        // valid for writes of the sizes passed.
        let result = unsafe {
            libc::getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_PEERCRED,
                std::ptr::addr_of_mut!(cred).cast::<libc::c_void>(),
                &mut len,
            )
        };

        (result == 0).then_some(cred.uid)
    }

    /// Prepare the socket path (create directory, remove stale socket)
    fn prepare_socket(&self) -> Result<()> {
        if let Some(parent) = self.socket_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create socket directory: {parent:?}"))?;
                info!(path = ?parent, "Created socket directory");
            }
        }

        if self.socket_path.exists() {
            warn!(path = ?self.socket_path, "Removing stale socket file");
            fs::remove_file(&self.socket_path).with_context(|| {
                format!("Failed to remove stale socket: {:?}", self.socket_path)
            })?;
        }

        Ok(())
    }

    /// Run the tick loop and accept clients until `shutdown` is set
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be prepared, bound or cleaned
    /// up. Per-client failures only drop that client.
    pub async fn run(
        &mut self,
        mut renderer: FrameRenderer,
        mut watcher: StateWatcher,
        mut animations: Option<AnimationWatcher>,
        fps: u32,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        self.prepare_socket()?;

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind to {:?}", self.socket_path))?;

        info!(path = ?self.socket_path, fps, "Listening for display clients");

        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.socket_path, perms)?;
        }

        let (frames, _) = broadcast::channel::<Arc<str>>(self.server_config.frame_buffer.max(1));
        let mut latest: Option<Arc<str>> = None;

        let mut interval = tokio::time::interval(frame_interval(fps));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!(clients = self.client_count(), "Shutdown requested, stopping frame loop");
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    if let Some(line) = render_tick(&mut renderer, &mut watcher, animations.as_mut()) {
                        // No receivers is the normal idle case
                        let _ = frames.send(Arc::clone(&line));
                        latest = Some(line);
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => self.admit(stream, &frames, latest.clone()),
                    Err(e) => error!(error = %e, "Accept failed"),
                },
            }
        }

        self.shutdown()
    }

    /// Register a new client and spawn its writer task
    fn admit(
        &mut self,
        stream: UnixStream,
        frames: &broadcast::Sender<Arc<str>>,
        latest: Option<Arc<str>>,
    ) {
        if self.clients.len() >= self.server_config.max_clients {
            warn!("Client limit reached, rejecting new connection");
            return;
        }

        let peer_uid = Self::get_peer_uid(&stream);
        // SAFETY: getuid has no preconditions and cannot fail.
        let our_uid = unsafe { libc::getuid() };
        if let Some(uid) = peer_uid {
            if uid != our_uid && uid != 0 {
                warn!(peer_uid = uid, our_uid, "Rejecting connection from different user");
                return;
            }
        }

        let client_id = ClientId(self.next_id);
        self.next_id += 1;

        info!(
            %client_id,
            peer_uid = ?peer_uid,
            active_clients = self.clients.len() + 1,
            "Client connected"
        );

        // The writer waits until its entry is registered, so a client that
        // disconnects at once cannot be removed before it is inserted.
        let (ready_tx, ready_rx) = oneshot::channel::<()>();
        let receiver = frames.subscribe();
        let clients = Arc::clone(&self.clients);
        let task = tokio::spawn(
            async move {
                if ready_rx.await.is_ok() {
                    serve_client(client_id, stream, receiver, latest, clients).await;
                }
            }
            .instrument(tracing::info_span!("client", %client_id)),
        );

        self.clients.insert(
            client_id,
            ClientState {
                connected_at: Instant::now(),
                peer_uid,
                abort_handle: task.abort_handle(),
            },
        );
        let _ = ready_tx.send(());
    }

    /// Graceful shutdown
    fn shutdown(&mut self) -> Result<()> {
        info!("Initiating graceful shutdown");

        let ids: Vec<ClientId> = self.clients.iter().map(|r| *r.key()).collect();
        for client_id in ids {
            if let Some((_, state)) = self.clients.remove(&client_id) {
                debug!(
                    %client_id,
                    peer_uid = ?state.peer_uid,
                    uptime_secs = state.connected_at.elapsed().as_secs(),
                    "Disconnecting client"
                );
                state.abort_handle.abort();
            }
        }

        if self.socket_path.exists() {
            fs::remove_file(&self.socket_path)
                .with_context(|| format!("Failed to remove socket: {:?}", self.socket_path))?;
            info!(path = ?self.socket_path, "Socket file removed");
        }

        info!("Shutdown complete");
        Ok(())
    }
}

/// Time between frames at `fps`, treating 0 as 1
#[must_use]
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs(1) / fps.max(1)
}

/// One tick: pick up state and animation changes, render, advance
///
/// Returns the encoded frame line, or `None` if encoding failed.
pub fn render_tick(
    renderer: &mut FrameRenderer,
    watcher: &mut StateWatcher,
    animations: Option<&mut AnimationWatcher>,
) -> Option<Arc<str>> {
    if let Some(library) = animations.and_then(AnimationWatcher::poll) {
        renderer.set_library(library);
    }
    if let Some(state) = watcher.poll() {
        state.apply(renderer);
    }

    let frame = renderer.render();
    renderer.tick();

    match encode_line(&frame) {
        Ok(line) => Some(line),
        Err(e) => {
            error!(error = %e, "Failed to encode frame");
            None
        }
    }
}

/// Serialize a frame as one newline-terminated JSON line
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_line(frame: &WireFrame) -> Result<Arc<str>, serde_json::Error> {
    let mut line = serde_json::to_string(frame)?;
    line.push('\n');
    Ok(line.into())
}

/// Forward broadcast frames to one client until it disconnects
async fn serve_client(
    client_id: ClientId,
    mut stream: UnixStream,
    mut frames: broadcast::Receiver<Arc<str>>,
    latest: Option<Arc<str>>,
    clients: Arc<DashMap<ClientId, ClientState>>,
) {
    let mut pending = latest;

    loop {
        let line = match pending.take() {
            Some(line) => line,
            None => match frames.recv().await {
                Ok(line) => line,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Client is slow, skipping frames");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        if let Err(e) = stream.write_all(line.as_bytes()).await {
            debug!(error = %e, "Client write failed");
            break;
        }
    }

    clients.remove(&client_id);
    info!(active_clients = clients.len(), "Client disconnected");
}
