use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plexsubs_core::{
    load_config, validate_config, FsPlacer, OpenSubtitlesClient, Placer, PlayerClient, PlexClient,
    SubtitleProvider,
};

use plexsubs_server::api::create_router;
use plexsubs_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run() -> Result<()> {
    init_logging();

    // Determine config path
    let config_path = std::env::var("PLEXSUBS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        languages = %config.subtitles.languages,
        mappings = config.path_mappings.len(),
        "Configuration loaded successfully"
    );

    let player: Arc<dyn PlayerClient> =
        Arc::new(PlexClient::new(&config.plex).context("Failed to create Plex client")?);
    info!("Using player: {} at {}", player.name(), config.plex.url);

    let provider: Arc<dyn SubtitleProvider> = Arc::new(
        OpenSubtitlesClient::new(config.opensubtitles.clone())
            .context("Failed to create OpenSubtitles client")?,
    );
    info!("Using subtitle provider: {}", provider.name());

    let placer: Arc<dyn Placer> = Arc::new(FsPlacer::new());

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::new(
        config.clone(),
        player,
        provider,
        placer,
        shutdown.clone(),
    ));

    if config.discovery.enabled && config.discovery.validate_on_startup {
        validate_on_startup(&state).await;
    }

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!(
        "Starting server on {} (webhook at {})",
        addr, config.server.webhook_path
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown; in-flight runs see the cancellation.
    let token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            token.cancel();
        })
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Checks the path mappings once and logs the outcome. Never fatal.
async fn validate_on_startup(state: &AppState) {
    match state.discovery().validate(None).await {
        Ok(report) if report.valid => {
            info!(
                passed = report.summary.passed,
                total = report.summary.total,
                "Startup path validation passed"
            );
        }
        Ok(report) => {
            warn!(
                passed = report.summary.passed,
                failed = report.summary.failed,
                unmapped = report.summary.unmapped,
                "Startup path validation found problems"
            );
            for hint in &report.hints {
                warn!("{}", hint);
            }
        }
        Err(e) => warn!(error = %e, "Startup path validation could not run"),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
