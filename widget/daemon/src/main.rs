//! Widget Daemon - Frame Server for the Companion Widget
//!
//! Reads the assistant's state from a JSON file, renders the widget at a
//! fixed frame rate and streams every frame to display clients connected on
//! a Unix socket.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults
//! widget-daemon
//!
//! # Custom socket and state file
//! widget-daemon --socket-path /tmp/widget.sock --state-file ~/.cache/widget/state.json
//!
//! # Preview a single frame in the terminal
//! widget-daemon --once --ansi
//!
//! # Verbose logging
//! RUST_LOG=debug widget-daemon
//! ```
//!
//! # Reloading
//!
//! A custom animation file named in the configuration is re-read whenever
//! its modification time changes. An invalid edit is logged and the
//! previous animations keep running.
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Graceful shutdown

mod animations;
mod server;
mod state;

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

use widget_core::{
    default_config_path, load_config_from_path, AnimationLibrary, ConfigOverrides, FrameRenderer,
    ThemeName, WidgetConfig,
};

use animations::AnimationWatcher;
use server::{FrameServer, ServerConfig};
use state::StateWatcher;

/// Widget Daemon - renders the companion widget and streams frames
#[derive(Parser, Debug)]
#[command(name = "widget-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Unix socket path for display clients
    #[arg(short = 's', long, env = "WIDGET_SOCKET", value_name = "PATH")]
    socket_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "WIDGET_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON file describing status, context usage, weather and verb
    #[arg(long, env = "WIDGET_STATE_FILE", value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// Frames per second (overrides config)
    #[arg(long)]
    fps: Option<u32>,

    /// Canvas width in cells (overrides config)
    #[arg(long)]
    width: Option<usize>,

    /// Canvas height in cells (overrides config)
    #[arg(long)]
    height: Option<usize>,

    /// Colour theme (overrides config)
    #[arg(long)]
    theme: Option<ThemeName>,

    /// Seed for weather particles, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Render a single frame to stdout and exit
    #[arg(long)]
    once: bool,

    /// With --once, print ANSI-coloured text instead of JSON
    #[arg(long, requires = "once")]
    ansi: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "WIDGET_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Directory for runtime files
///
/// Uses `XDG_RUNTIME_DIR` if available, otherwise `/tmp/companion-widget-$UID/`
fn runtime_dir() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir).join("companion-widget")
    } else {
        // SAFETY: getuid has no preconditions and cannot fail.
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/companion-widget-{uid}"))
    }
}

/// Get the default socket path
fn default_socket_path() -> PathBuf {
    runtime_dir().join("widget.sock")
}

/// Get the default state file path
fn default_state_path() -> PathBuf {
    runtime_dir().join("state.json")
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so `--once` output on stdout stays clean.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("widget_daemon={level},widget_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load config and fold the CLI overrides in
fn build_config(args: &Args) -> Result<WidgetConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(fps) = args.fps {
        overrides = overrides.with_fps(fps);
    }
    if let Some(width) = args.width {
        overrides = overrides.with_grid_width(width);
    }
    if let Some(height) = args.height {
        overrides = overrides.with_grid_height(height);
    }
    if let Some(theme) = args.theme {
        overrides = overrides.with_theme(theme);
    }
    overrides.apply(&mut config);
    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;

    Ok(config)
}

/// Load the animation library and expand every status up front
fn load_library(config: &WidgetConfig) -> Result<Arc<AnimationLibrary>> {
    let library = match &config.animations_path {
        Some(path) => AnimationLibrary::from_path(path)
            .with_context(|| format!("Failed to load animations from {path:?}"))?,
        None => AnimationLibrary::builtin().context("Built-in animations are invalid")?,
    };

    let frames = library.prewarm();
    let stats = library.cache_stats();
    info!(statuses = stats.states.len(), frames, "Animation cache warmed");

    Ok(Arc::new(library))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!("Widget Daemon starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = build_config(&args)?;
    info!(
        width = config.display.grid_width,
        height = config.display.grid_height,
        fps = config.display.fps,
        theme = %config.theme_name,
        source = ?config.source(),
        "Configuration loaded"
    );

    let library = load_library(&config)?;
    let mut renderer =
        FrameRenderer::new(&config, library).context("Failed to build frame renderer")?;
    if let Some(seed) = args.seed {
        renderer = renderer.with_seed(seed);
    }

    let state_path = args.state_file.clone().unwrap_or_else(default_state_path);
    let mut watcher = StateWatcher::new(state_path);
    info!(state_path = ?watcher.path(), "State file");

    if args.once {
        watcher.poll();
        watcher.current().apply(&mut renderer);
        let frame = renderer.render();
        if args.ansi {
            print!("{}", frame.to_ansi());
        } else {
            println!("{}", serde_json::to_string(&frame)?);
        }
        return Ok(());
    }

    let socket_path = args.socket_path.clone().unwrap_or_else(default_socket_path);
    info!(socket_path = ?socket_path, "Socket path");

    // Setup signal handlers
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    let shutdown_clone = Arc::clone(&shutdown);
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
        }
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    let animations = config.animations_path.as_ref().map(|path| {
        let animations = AnimationWatcher::new(path);
        info!(path = ?animations.path(), "Watching animation file for changes");
        animations
    });

    let mut server = FrameServer::new(socket_path.clone(), ServerConfig::default());
    let result = server
        .run(renderer, watcher, animations, config.display.fps, shutdown)
        .await;

    // Cleanup
    info!("Shutting down...");
    if socket_path.exists() {
        if let Err(e) = fs::remove_file(&socket_path) {
            warn!(error = %e, "Failed to remove socket file");
        }
    }

    match result {
        Ok(()) => {
            info!("Widget Daemon stopped cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Widget Daemon exited with error");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_defaults() {
        let args = Args::try_parse_from(["widget-daemon"]).unwrap();
        assert!(!args.once);
        assert!(!args.ansi);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_ansi_requires_once() {
        assert!(Args::try_parse_from(["widget-daemon", "--ansi"]).is_err());
        assert!(Args::try_parse_from(["widget-daemon", "--once", "--ansi"]).is_ok());
    }

    #[test]
    fn test_theme_flag_parses() {
        let args = Args::try_parse_from(["widget-daemon", "--theme", "crt-amber"]).unwrap();
        assert_eq!(args.theme, Some(ThemeName::CrtAmber));
        assert!(Args::try_parse_from(["widget-daemon", "--theme", "nope"]).is_err());
    }

    #[test]
    fn test_default_paths_share_runtime_dir() {
        assert_eq!(default_socket_path().parent(), default_state_path().parent());
        assert!(default_socket_path().ends_with("widget.sock"));
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("widget.toml");
        let args = Args::try_parse_from([
            "widget-daemon",
            "--config",
            config_path.to_str().unwrap(),
            "--fps",
            "12",
            "--width",
            "40",
        ])
        .unwrap();

        let config = build_config(&args).unwrap();
        assert_eq!(config.display.fps, 12);
        assert_eq!(config.display.grid_width, 40);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut args = Args::try_parse_from(["widget-daemon", "--fps", "0"]).unwrap();
        args.config = Some(PathBuf::from("/nonexistent/widget.toml"));
        assert!(build_config(&args).is_err());
    }
}
