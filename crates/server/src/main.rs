use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scadsrv_core::{
    load_config, load_config_from_env, validate_config, Config, LogFormat, OpenScadRenderer,
    Renderer,
};
use scadsrv_server::api::handlers::{COMMIT, TAG, VERSION};
use scadsrv_server::{create_router, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Configuration comes first since it picks the log format
    let config = match load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::default());
            return Err(e);
        }
    };
    init_tracing(config.logging.format);

    info!("Starting scadsrv {} (commit: {}, tag: {})", VERSION, COMMIT, TAG);
    validate_config(&config).context("Configuration validation failed")?;

    info!("OpenSCAD binary: {}", config.openscad.binary.display());
    info!(
        "Render timeout: {}s, temp dir: {}",
        config.openscad.timeout_secs,
        config.openscad.temp_dir.display()
    );

    // Refuse to start without a working openscad
    let renderer = OpenScadRenderer::new(config.openscad.clone());
    renderer
        .validate()
        .await
        .context("OpenSCAD is not available")?;

    let state = Arc::new(AppState::new(Arc::new(renderer)));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Loads the file named by `SCADSRV_CONFIG`, or defaults plus environment.
fn load() -> Result<Config> {
    match std::env::var("SCADSRV_CONFIG").map(PathBuf::from) {
        Ok(config_path) => load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path)),
        Err(_) => load_config_from_env().context("Failed to load config from environment"),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
