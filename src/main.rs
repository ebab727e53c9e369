//! Authentication gateway binary.
//!
//! Run with: `catalog-auth-gateway --config config.yaml`

use anyhow::{Context, Result};
use catalog_auth_gateway::config::GatewayConfig;
use catalog_auth_gateway::credentials::CredentialStore;
use catalog_auth_gateway::rest::{router, GatewayState};
use catalog_auth_gateway::token::TokenService;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Dual-protocol authentication gateway.
///
/// Validates WS-Security UsernameToken headers on inbound SOAP messages
/// and signed bearer tokens on REST requests; issues tokens on login.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Listen address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!(
        "Starting authentication gateway v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Config file: {}", args.config.display());

    // Load configuration
    let config: GatewayConfig = if args.config.exists() {
        let content = tokio::fs::read_to_string(&args.config)
            .await
            .context("Failed to read config file")?;
        serde_yaml::from_str(&content).context("Failed to parse config file")?
    } else {
        info!("Config file not found, using defaults");
        GatewayConfig::default()
    };

    info!(
        users = config.users.len(),
        public_routes = config.rest.public_routes.len(),
        token_ttl_secs = config.token.ttl_secs,
        "Configuration loaded"
    );

    // Shared read-only state, built once. A missing signing secret is
    // fatal here, not a per-request condition.
    let credentials = CredentialStore::from_users(&config.users);
    let tokens = TokenService::new(&config.token)
        .context("Failed to initialize token service")?;
    let state = GatewayState::new(&config, credentials, tokens);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!("Listening on {}", args.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Authentication gateway stopped");
    Ok(())
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
