//! Task Tracker API
//!
//! REST backend for the personal task tracker.
//!
//! # Environment Variables
//!
//! - `API_PORT` (fallback `PORT`): Server port (default: `5000`)
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `STORAGE_MODE`: `postgres` (default) | `in_memory`
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`: store connection
//! - `DB_RETRY_DELAY_SECS`: delay between connection attempts (default: `5`)
//! - `SERVICE_NAME`, `SERVICE_BANNER`: shown by `GET /` and `GET /info`
//! - `RUST_LOG`: Logging level (e.g., `debug`, `task_tracker_api=debug`)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_tracker_api::api::{AppConfig, AppState, router};
use task_tracker_api::infrastructure::factory::parse_number;
use task_tracker_api::infrastructure::{
    ConfigurationError, StoreConfig, StoreLink, create_connector, spawn_connect_loop,
};

const DEFAULT_PORT: u16 = 5000;

/// Listener settings.
struct ServerConfig {
    host: String,
    port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigurationError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("API_PORT").or_else(|_| env::var("PORT")) {
            Ok(value) => parse_number::<u16>("API_PORT", &value)?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self { host, port })
    }
}

fn app_config_from_env() -> AppConfig {
    let defaults = AppConfig::default();
    AppConfig {
        service_name: env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
        banner: env::var("SERVICE_BANNER").unwrap_or(defaults.banner),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_tracker_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Task Tracker API");

    let store_config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };
    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage_mode = ?store_config.storage_mode,
        retry_delay_secs = store_config.retry_delay.as_secs(),
        "Store configuration loaded"
    );

    let connector = match create_connector(&store_config) {
        Ok(connector) => connector,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    // The listener comes up immediately; requests get 503 until this succeeds.
    let store = Arc::new(StoreLink::new());
    spawn_connect_loop(Arc::clone(&store), connector, store_config.retry_delay);

    let application = router(AppState::new(store, app_config_from_env()));

    let address: SocketAddr = match format!("{}:{}", server_config.host, server_config.port)
        .parse()
    {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(
                %error,
                "Invalid server address: {}:{}",
                server_config.host,
                server_config.port
            );
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Handles graceful shutdown signals (SIGINT, SIGTERM).
///
/// On Unix systems, it listens for both SIGINT (Ctrl+C) and SIGTERM. On
/// other systems, it only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
