//! Status page and metrics HTTP servers.
//!
//! Handlers only read: the status page takes `SnapshotStore::current()` and
//! renders it, so any number of requests run alongside the scheduler without
//! touching its write path.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use fleetsync_core::{SnapshotStore, SyncConfig};
use fleetsync_renderer::{StatusPage, StatusRenderer};

use crate::error::{io_err, DaemonError};
use crate::metrics::SyncMetrics;

/// Everything the status handler needs, injected at startup.
#[derive(Clone)]
pub struct StatusState {
    pub store: SnapshotStore,
    pub renderer: Arc<StatusRenderer>,
    pub config: Arc<SyncConfig>,
    pub metrics: Arc<SyncMetrics>,
}

/// `GET` on any path serves the status page.
pub fn status_router(state: StatusState) -> Router {
    Router::new()
        .route("/", get(status_page))
        .route("/{*path}", get(status_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /metrics` (or `/`) serves the Prometheus text format.
pub fn metrics_router(metrics: Arc<SyncMetrics>) -> Router {
    Router::new()
        .route("/", get(metrics_text))
        .route("/metrics", get(metrics_text))
        .layer(TraceLayer::new_for_http())
        .with_state(metrics)
}

async fn status_page(State(state): State<StatusState>) -> Response {
    state.metrics.status_requests.inc();
    let snapshot = state.store.current();
    let page = StatusPage::from_snapshot(&snapshot, state.config.namespace.as_str(), Utc::now());
    match state.renderer.render(&page) {
        Ok(body) => Html(body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "status page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "status page render failed").into_response()
        }
    }
}

async fn metrics_text(State(metrics): State<Arc<SyncMetrics>>) -> Response {
    match metrics.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "metrics encode failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve `router` on `listener` until a shutdown signal arrives.
pub async fn serve(
    name: &'static str,
    listener: TcpListener,
    router: Router,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(server = name, %addr, "listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| io_err(name, e))
}
