//! # Trading-Signal Webhook Relay Server
//!
//! Receives asynchronous webhook notifications from an upstream alerting
//! source (e.g. TradingView), buffers them in a bounded in-memory queue, and
//! exposes a drain endpoint for a downstream trading bot.
//!
//! ## Endpoints:
//! - **`POST /webhook`**: Accepts an arbitrary JSON signal (or raw text),
//!   stamps it with ingest timestamps, and buffers it.
//! - **`GET /signals?limit=N`**: Drains up to N signals, most recent first.
//!   Destructive read: each signal is delivered to exactly one poll.
//! - **`GET /health`**: Liveness probe reporting the buffered signal count.
//!
//! ## Operational Behavior:
//! - **Bounded Memory**: The buffer retains at most 1000 signals (configurable);
//!   older signals are evicted oldest-first when the downstream bot is slow
//!   or absent.
//! - **Optional Persistence Mirror**: With `REDIS_URL` or `SIGNALS_FILE` set,
//!   every ingested signal is also mirrored to Redis or a JSON file,
//!   best-effort. A mirror failure never fails the sender's request.
//! - **Structured Logging**: `tracing` with an ANSI console layer and a
//!   JSON daily-rotating file layer.
//! - **Graceful Shutdown**: CTRL+C / SIGTERM drain in-flight requests before
//!   the process exits.
//! - **Dynamic Configuration**: Defaults, then an optional JSON config file,
//!   then environment variables / CLI flags, later layers winning.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use static_init::dynamic;
use tokio::signal;
use tracing::{info, warn};

use lib_common::SignalStore;
use lib_common::connections::store_file::JsonFileStore;
use lib_common::connections::store_redis::RedisSignalStore;

mod webhook_logic;

use webhook_logic::config::{Config, load_config};
use webhook_logic::handlers::build_router;
use webhook_logic::logger::setup_logging;
use webhook_logic::state::AppState;

// load .env files before anything else
/// Initializes environment variables by loading `.env` files.
///
/// It first attempts to load a generic `.env` file, and then
/// an OS-specific `.env.windows` or `.env.linux` file.
#[dynamic]
static DOTENV_INIT: () = {
    // Determine the operating system
    let dotenv_os: &str = if cfg!(target_os = "windows") {
        ".env.windows"
    } else {
        ".env.linux"
    };

    // Set up environment variables
    dotenvy::dotenv().ok();
    // Load the platform .env file
    dotenvy::from_filename(dotenv_os).ok();
};

/// # Main Entry Point
///
/// Initializes and runs the webhook relay.
///
/// ## Execution Flow:
/// 1.  **Load Configuration**: defaults, config file, env/CLI.
/// 2.  **Setup Logging**: console + daily-rotating JSON file.
/// 3.  **Construct State**: the bounded buffer plus the optional mirror,
///     owned by the application state and injected into handlers.
/// 4.  **Serve**: bind the axum router and run until a shutdown signal.
#[tokio::main]
async fn main() -> Result<()> {
    let config: Config = load_config();

    let log_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(|| std::path::PathBuf::from("./logs"));
    let log_level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    let _log_guard = setup_logging(&log_dir, &log_level)?;

    info!(
        "Webhook relay booting at {} (port {}, capacity {})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        config.port(),
        config.capacity()
    );

    let state = match build_mirror(&config) {
        Some(mirror) => AppState::new(config.capacity()).with_mirror(mirror),
        None => AppState::new(config.capacity()),
    };

    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Webhook relay listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received. Closing server gracefully...");
        })
        .await?;

    Ok(())
}

/// # Mirror Selection
///
/// Builds the optional persistence mirror from configuration. Redis takes
/// precedence over the JSON file; a Redis client that cannot even be
/// constructed downgrades the relay to memory-only with a warning, since
/// persistence is best-effort by design.
fn build_mirror(config: &Config) -> Option<Arc<dyn SignalStore>> {
    if let Some(url) = &config.redis_url {
        match RedisSignalStore::new(url, config.capacity()) {
            Ok(store) => {
                info!("Mirroring signals to Redis at {}", url);
                return Some(Arc::new(store));
            }
            Err(e) => {
                warn!("Redis mirror unavailable ({}); continuing memory-only", e);
                return None;
            }
        }
    }
    if let Some(path) = &config.signals_file {
        info!("Mirroring signals to {}", path.display());
        return Some(Arc::new(JsonFileStore::new(path, config.capacity())));
    }
    None
}

/// # Graceful Shutdown Signal Handler
///
/// Listens for `CTRL+C` (interrupt) and `SIGTERM` (terminate) signals to
/// initiate a graceful shutdown of the server.
///
/// On UNIX-like systems, it listens for both signals. On Windows, it only
/// listens for `CTRL+C`. The `tokio::select!` macro waits for the first
/// signal to be received.
async fn shutdown_signal() {
    // Handler for CTRL+C
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    // Handler for SIGTERM (on UNIX systems)
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    // On non-UNIX systems, `terminate` is a future that never completes.
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    // `tokio::select!` waits for the first of the futures to complete.
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
