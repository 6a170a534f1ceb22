//! WellWatch - Oil-Well Drilling Telemetry Service
//!
//! Serves the well records API, WITSML documents and the live-update relay.
//!
//! # Usage
//!
//! ```bash
//! # Persistent store in ./data/wellwatch
//! cargo run --release
//!
//! # Throwaway in-memory store with the three demo wells
//! cargo run -- --memory --seed
//! ```
//!
//! # Environment Variables
//!
//! - `WELLWATCH_CONFIG`: Path to a TOML config file (default: ./wellwatch.toml)
//! - `WELLWATCH_SERVER_ADDR`: Override the bind address
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use axum::Router;
use wellwatch::api::{create_app, AppState};
use wellwatch::config::{AppConfig, StorageBackend};
use wellwatch::storage::{seed, InMemoryStore, SledStore, WellStore};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "wellwatch")]
#[command(about = "WellWatch drilling telemetry service")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Use the in-memory store instead of sled
    #[arg(long)]
    memory: bool,

    /// Override the sled data directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<String>,

    /// Insert the demo wells when the store is empty
    #[arg(long)]
    seed: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "WELLWATCH_LOG_JSON")]
    log_json: bool,
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
        }
    }
}

// ============================================================================
// Startup
// ============================================================================

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Resolve config from file, env and CLI, in increasing precedence.
fn resolve_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load();
    config.apply_env_overrides();

    if let Some(addr) = &args.addr {
        config.server.addr = addr.clone();
    }
    if args.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    if let Some(dir) = &args.data_dir {
        config.storage.path = dir.clone();
    }
    if args.seed {
        config.storage.seed_demo_data = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Opened store plus the sled handle when one needs flushing at shutdown.
struct OpenedStore {
    store: Arc<dyn WellStore>,
    sled: Option<Arc<SledStore>>,
}

fn open_store(config: &AppConfig) -> Result<OpenedStore> {
    let opened = match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory store; data is lost on exit");
            OpenedStore {
                store: Arc::new(InMemoryStore::new()),
                sled: None,
            }
        }
        StorageBackend::Sled => {
            std::fs::create_dir_all(&config.storage.path).with_context(|| {
                format!("Failed to create data directory {}", config.storage.path)
            })?;
            let sled = Arc::new(
                SledStore::open(&config.storage.path)
                    .with_context(|| format!("Failed to open store at {}", config.storage.path))?,
            );
            info!(path = %config.storage.path, size_bytes = sled.size_bytes(), "Opened sled store");
            OpenedStore {
                store: sled.clone(),
                sled: Some(sled),
            }
        }
    };

    if config.storage.seed_demo_data {
        seed::seed_if_empty(opened.store.as_ref()).context("Failed to seed demo wells")?;
    }

    Ok(opened)
}

// ============================================================================
// Tasks
// ============================================================================

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!(error = %e, "[HttpServer] Server error");
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!(task = %task_name, "Supervisor: task completed normally");
                    }
                    Some(Ok(Err(e))) => {
                        error!(error = %e, "Supervisor: task failed");
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Supervisor: task panicked");
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let the server drain in-flight requests.
    while let Some(result) = task_set.join_next().await {
        if let Ok(Err(e)) = result {
            warn!(error = %e, "Task failed during shutdown");
        }
    }

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let config = resolve_config(&args)?;
    let opened = open_store(&config)?;

    info!(
        addr = %config.server.addr,
        backend = opened.store.backend_name(),
        simulation_interval_ms = config.relay.simulation_interval_ms,
        "WellWatch starting"
    );

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "Listening");

    let state = AppState::new(opened.store.clone(), config);
    let relay = state.relay.clone();
    let app = create_app(state);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());
    let outcome = run_supervisor(&mut task_set, cancel_token).await;

    relay.shutdown();
    if let Some(sled) = &opened.sled {
        if let Err(e) = sled.flush() {
            error!(error = %e, "Failed to flush store");
        }
    }

    outcome?;
    info!("WellWatch shutdown complete");
    Ok(())
}
