//! Chatbot skill webhook server: `POST /api/timeTable` and `GET /healthz`.

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use timebell_core::{Clock, SystemClock};
use timebell_source::{
    InitializerConfig, ReadinessGate, ScheduleSource, TableCache, spawn_initializer,
};
use tracing::info;

pub use handler::{healthz, timetable};

/// Shared per-request state. Everything here is read-mostly.
#[derive(Clone)]
pub struct AppState {
    pub gate: ReadinessGate,
    pub source: Arc<dyn ScheduleSource>,
    pub cache: Arc<TableCache>,
    pub clock: Arc<dyn Clock>,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub initializer: InitializerConfig,
    /// Zero disables the shared timetable memo.
    pub table_cache_ttl: Duration,
    pub fetch_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            initializer: InitializerConfig::default(),
            table_cache_ttl: Duration::from_secs(10 * 60),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/timeTable", post(timetable))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Start the initializer in the background and serve until the listener fails.
pub async fn run_server(source: Arc<dyn ScheduleSource>, config: ServerConfig) -> anyhow::Result<()> {
    let (gate, _initializer) = spawn_initializer(source.clone(), config.initializer.clone());

    let state = AppState {
        gate,
        source,
        cache: Arc::new(TableCache::new(config.table_cache_ttl)),
        clock: Arc::new(SystemClock),
        fetch_timeout: config.fetch_timeout,
    };

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .context("bind server listener failed")?;
    info!(addr = %config.listen, "skill server listening");
    axum::serve(listener, router(state))
        .await
        .context("server terminated with error")
}
