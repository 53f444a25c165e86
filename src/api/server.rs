//! NAUTIL Admin HTTP server
//!
//! Thin Axum front for the pipeline, single steps, email and config updates.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::config::AdminConfig;
use crate::mail::Mailer;

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared application state
///
/// The mutex makes operations within this process run one at a time. Other
/// processes editing the same workbook are not guarded against.
pub struct AppState {
    pub version: String,
    pub config: Mutex<AdminConfig>,
    pub mailer: Arc<dyn Mailer>,
    /// Pinned date for deterministic runs; `None` uses the local clock
    pub fixed_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(config: AdminConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: Mutex::new(config),
            mailer,
            fixed_today: None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Lock the configuration, recovering it if a previous operation panicked.
    pub fn config(&self) -> MutexGuard<'_, AdminConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build the router with all routes and middleware
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/run-all", post(handlers::run_all))
        .route("/api/run-complete", post(handlers::run_complete))
        .route("/api/step/rename", post(handlers::step_rename))
        .route("/api/step/vue-globale", post(handlers::step_vue_globale))
        .route("/api/step/clear-tx", post(handlers::step_clear_tx))
        .route("/api/step/clear-after-tx3", post(handlers::step_clear_after_tx3))
        .route("/api/step/clear-template", post(handlers::step_clear_template))
        .route("/api/step/send-email", post(handlers::send_email))
        .route("/api/config/update", post(handlers::update_config))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("NAUTIL Admin starting on http://{}", addr);
    info!("   Pipeline: /api/run-all, /api/run-complete, /api/step/*");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("NAUTIL Admin shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
