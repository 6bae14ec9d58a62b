//! Loyal Finder map service (loyal-map) - Main entry point
//!
//! Opens the people store, loads the people into the map session and serves
//! the map page with its JSON API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loyal_common::config::{ConfigResolver, StoreBackend, TomlConfig};
use loyal_common::{seed, store};
use loyal_map::{build_router, AppState};

/// Command-line arguments for loyal-map
#[derive(Parser, Debug)]
#[command(name = "loyal-map")]
#[command(about = "Map of loyal people with crowd votes")]
#[command(version)]
struct Args {
    /// Config file (overrides LOYAL_CONFIG and the default location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<String>,

    /// Store backend: rest, sqlite or memory
    #[arg(long)]
    backend: Option<StoreBackend>,

    /// Database file for the sqlite backend
    #[arg(long)]
    database: Option<PathBuf>,

    /// Insert this many generated people before serving
    #[arg(long, value_name = "COUNT")]
    seed: Option<usize>,
}

impl Args {
    /// Command-line flags take priority over file and environment
    fn apply(&self, config: &mut TomlConfig) -> Result<()> {
        if let Some(bind) = &self.bind {
            config.bind_addr = bind.clone();
        }
        if let Some(backend) = self.backend {
            config.store.backend = backend;
        }
        if let Some(database) = &self.database {
            config.store.database_path = database.clone();
        }
        config.validate().context("Invalid configuration")?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone());
    let mut config = resolver.resolve().context("Failed to load configuration")?;
    args.apply(&mut config)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Loyal Finder map (loyal-map) v{}", env!("CARGO_PKG_VERSION"));
    match resolver.config_path() {
        Some((path, _)) if path.exists() => info!("Config file: {}", path.display()),
        _ => info!("No config file; using defaults and environment"),
    }

    let store = store::open_store(&config.store)
        .await
        .context("Failed to open people store")?;

    if let Some(count) = args.seed {
        seed::seed_store(store.as_ref(), count, &config.region)
            .await
            .context("Failed to seed people")?;
    }

    let state = AppState::new(Arc::clone(&store), config.region.clone());

    // A failed first load is not fatal; the page can retry with refresh
    {
        let mut session = state.session.lock().await;
        match session.refresh(store.as_ref()).await {
            Ok(()) => info!(people = session.registry().all().len(), "Loaded people"),
            Err(e) => warn!(error = %e, "Initial load failed"),
        }
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("loyal-map listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
