//! Retrain Monitor
//!
//! Feedback loop for the deployed email classifier.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RETRAIN MONITOR                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────────┐  ┌───────────────────┐ │
//! │  │  API      │  │  Drift Loop     │  │  Model Selector   │ │
//! │  │  (Axum)   │  │  (interval)     │  │  (start-up + API) │ │
//! │  └─────┬─────┘  └───┬─────────┬───┘  └─────────┬─────────┘ │
//! │        │            │         ▼                │           │
//! │        │            │  ┌─────────────┐         │           │
//! │        │            │  │  Retrain    │──▶ CI pipeline      │
//! │        │            │  │  Trigger    │         │           │
//! │        │            │  └─────────────┘         │           │
//! │        └────────────┴───────────┬──────────────┘           │
//! │                                 ▼                          │
//! │                        ┌─────────────────┐                 │
//! │                        │  Elasticsearch  │                 │
//! │                        └─────────────────┘                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod drift;
mod error;
mod handlers;
mod handoff;
mod models;
mod selection;
mod store;
mod trigger;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use parking_lot::RwLock;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use drift::{CooldownGate, DetectionConfig, DriftDetector, DriftMonitor, MonitorStatus, SharedStatus};
use models::SelectionResult;
use selection::ModelSelector;
use store::{ElasticsearchConfig, ElasticsearchStore, MetricsStore};
use trigger::{PipelineTrigger, RetrainTrigger};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);

    tracing::info!("Retrain monitor v{} starting...", env!("CARGO_PKG_VERSION"));
    config.log_summary();
    if config.is_production() && config.trigger_token.is_none() {
        tracing::warn!("Running in production without TRIGGER_TOKEN; drift will never trigger retraining");
    }

    let store: Arc<dyn MetricsStore> = Arc::new(
        ElasticsearchStore::new(ElasticsearchConfig::from_config(&config))
            .context("Failed to create metrics store client")?,
    );
    let trigger: Arc<dyn RetrainTrigger> = Arc::new(
        PipelineTrigger::from_config(&config).context("Failed to create trigger client")?,
    );

    // Build application state
    let state = AppState {
        config: config.clone(),
        status: Arc::new(RwLock::new(MonitorStatus::default())),
        selector: Arc::new(ModelSelector::new(store.clone(), config.default_model_name.clone())),
        selection: Arc::new(RwLock::new(SelectionResult::fallback(&config.default_model_name))),
    };

    if let Some(path) = &config.selected_model_path {
        if let Ok(previous) = handoff::read_selection(Path::new(path)) {
            tracing::info!("Previous hand-off: {}", previous);
        }
    }

    // Start-up selection never blocks the service
    match handlers::models::reselect(&state, &config.candidate_model_names).await {
        Ok(result) => tracing::info!(
            "Start-up model: {}{}",
            result.chosen_model_name,
            if result.fallback_used { " (fallback)" } else { "" }
        ),
        Err(e) => tracing::error!("Model hand-off failed: {}", e),
    }

    // Start drift loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = Arc::new(DriftMonitor::new(
        store,
        trigger,
        DriftDetector::new(DetectionConfig::from_config(&config)),
    ));
    let drift_task = tokio::spawn(drift::scheduler::run(
        monitor,
        CooldownGate::new(config.cooldown()),
        config.check_interval(),
        state.status.clone(),
        shutdown_rx,
    ));

    // Start server
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Status API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("Server error")?;

    match drift_task.await {
        Ok(gate) => tracing::info!("Drift loop finished, last trigger: {:?}", gate.state().last_trigger_at),
        Err(e) => tracing::error!("Drift loop task failed: {}", e),
    }

    tracing::info!("Retrain monitor stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "retrain_monitor=info,tower_http=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl-C or SIGTERM and tells the drift loop to stop
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
    shutdown_tx.send(true).ok();
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub status: SharedStatus,
    pub selector: Arc<ModelSelector>,
    pub selection: Arc<RwLock<SelectionResult>>,
}

/// Create the main router with all routes
pub(crate) fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/drift/status", get(handlers::drift::status))
        .route("/api/v1/models/selected", get(handlers::models::selected))
        .route("/api/v1/models/select", post(handlers::models::select))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
