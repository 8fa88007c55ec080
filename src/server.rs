//! Daemon wiring: store, ledger, lane scheduler, tick loop, and the
//! health/stats HTTP surface

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::backfill::backfill_lanes;
use crate::cache::{MemoryCache, NullCache, RetentionCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::directory::StaticDirectory;
use crate::lanes::{LaneBoard, LaneStats};
use crate::ledger::RetentionLedger;
use crate::observability::{Metrics, MetricsSnapshot};
use crate::store::{RetentionStore, StoreStats};
use crate::worker::{MessageDeleter, MockDeleter, RestConfig, RestDeleter, TickRunner, spawn_tick_loop};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub lanes: Arc<Mutex<LaneBoard>>,
    pub store: RetentionStore,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(with = "chrono::serde::ts_seconds")]
    started_at: chrono::DateTime<chrono::Utc>,
    lanes: LaneStats,
    store: StoreStats,
    metrics: MetricsSnapshot,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let lanes = state.lanes.lock().await.stats();

    let store = match state.store.stats() {
        Ok(stats) => stats,
        Err(err) => {
            error!(error = %err, "Failed to read store stats");
            return (StatusCode::INTERNAL_SERVER_ERROR, "store unavailable").into_response();
        }
    };

    Json(StatsResponse {
        started_at: state.started_at,
        lanes,
        store,
        metrics: state.metrics.snapshot(),
    })
    .into_response()
}

/// Run the retention daemon until a shutdown signal arrives
pub async fn run(config: Config) -> Result<(), AnyError> {
    let metrics = Arc::new(Metrics::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store = RetentionStore::open(&config.store.path)?;

    let cache: Arc<dyn RetentionCache> = if config.cache.enabled {
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(NullCache::new())
    };

    let ledger = Arc::new(RetentionLedger::new(
        store.clone(),
        cache,
        config.cache.expiry_freshness.as_duration(),
        Arc::clone(&metrics),
    ));

    let lanes = Arc::new(Mutex::new(LaneBoard::new()));
    let directory = StaticDirectory::from_config(&config.directory);

    match backfill_lanes(
        &ledger,
        &lanes,
        &directory,
        clock.as_ref(),
        config.scheduler.backfill_window.as_secs(),
        &metrics,
    )
    .await
    {
        Ok(report) => info!(enqueued = report.enqueued, "Backfill complete"),
        // Non-fatal: those entries stay in the store until the next restart
        Err(err) => error!(error = %err, "Cannot backfill lanes"),
    }

    let deleter: Arc<dyn MessageDeleter> = match &config.platform.bot_token {
        Some(token) => Arc::new(RestDeleter::new(RestConfig {
            api_base: config.platform.api_base.clone(),
            bot_token: token.clone(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: config.platform.request_timeout.as_duration(),
            user_agent: config.platform.user_agent.clone(),
        })?),
        None => {
            warn!("No bot token configured, using mock deleter");
            Arc::new(MockDeleter::new())
        }
    };

    let runner = Arc::new(TickRunner::new(
        Arc::clone(&lanes),
        Arc::clone(&ledger),
        deleter,
        clock,
        Arc::clone(&metrics),
        config.scheduler.delete_concurrency,
    ));

    let (tick_task, tick_shutdown) =
        spawn_tick_loop(runner, config.scheduler.tick_interval.as_duration());

    let state = Arc::new(AppState {
        metrics,
        lanes,
        store: store.clone(),
        started_at: chrono::Utc::now(),
    });

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    info!(address = %config.server.bind_addr, "Lethe server listening");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the timer loop and wait for any in-flight tick: a delete that
    // already succeeded must get its ledger retire before the final persist,
    // or the next backfill would re-attempt an already-deleted message.
    let _ = tick_shutdown.send(true);
    if let Err(err) = tick_task.await {
        error!(error = %err, "Tick loop task failed");
    }
    store.persist()?;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install signal handler");
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
