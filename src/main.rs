//! Wagate Server — multi-tenant WhatsApp gateway
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use wagate_api::{AppState, build_app};
use wagate_core::config::AppConfig;
use wagate_core::error::AppError;
use wagate_realtime::PushHub;
use wagate_service::{GatewaySettings, LoopbackFactory, TenantRegistry};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/default.toml`, the environment file and
/// `WAGATE__*` variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("WAGATE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Wagate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Tenant repository ────────────────────────────────
    tracing::info!(
        "Opening tenant repository (provider: {})...",
        config.database.provider
    );
    let repository = wagate_database::open_repository(&config.database).await?;

    // ── Step 2: Realtime push hub ────────────────────────────────
    let push = Arc::new(PushHub::new(config.realtime.clone()));

    // ── Step 3: Tenant registry ──────────────────────────────────
    // The protocol client is an external collaborator; the loopback
    // factory stands in until one is linked.
    let factory = Arc::new(LoopbackFactory::new());
    let registry = Arc::new(TenantRegistry::new(
        repository,
        push,
        factory,
        GatewaySettings::from_config(&config),
    )?);

    let loaded = registry.initialize().await?;
    tracing::info!("{} tenant(s) loaded", loaded);

    // ── Step 4: HTTP server ──────────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_app(AppState::new(Arc::new(config), Arc::clone(&registry)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Wagate server listening on {}", addr);

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 6: Stop tenants ─────────────────────────────────────
    tracing::info!("Stopping tenant runtimes...");
    if tokio::time::timeout(grace, registry.shutdown()).await.is_err() {
        tracing::warn!("Tenant shutdown exceeded {}s grace period", grace.as_secs());
    }

    tracing::info!("Wagate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}
