use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use fleetsync_core::{SnapshotStore, SyncConfig};
use fleetsync_datastore::RecordSource;
use fleetsync_renderer::StatusRenderer;
use fleetsync_sheets::SheetSink;

use crate::error::{io_err, DaemonError};
use crate::http::{metrics_router, serve, status_router, StatusState};
use crate::metrics::SyncMetrics;
use crate::scheduler::Scheduler;

/// The external store and sink the daemon talks to.
pub struct Collaborators {
    pub source: Arc<dyn RecordSource>,
    pub sink: Arc<dyn SheetSink>,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(
    config: SyncConfig,
    collaborators: Collaborators,
    log_json: bool,
) -> Result<(), DaemonError> {
    init_tracing(log_json);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, collaborators))
}

/// Run the scheduler and both HTTP servers until ctrl-c or a task failure.
pub async fn run(config: SyncConfig, collaborators: Collaborators) -> Result<(), DaemonError> {
    let config = Arc::new(config);
    let store = SnapshotStore::new();
    let metrics = Arc::new(SyncMetrics::new()?);
    let renderer = Arc::new(StatusRenderer::new()?);

    let status_listener = bind(config.status_port).await?;
    let metrics_listener = bind(config.metrics_port).await?;

    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let scheduler = Scheduler::new(
            store.clone(),
            collaborators.source,
            collaborators.sink,
            config.clone(),
            metrics.clone(),
        );
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let result = scheduler.run(shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let status_handle = {
        let shutdown = shutdown_tx.clone();
        let router = status_router(StatusState {
            store: store.clone(),
            renderer,
            config: config.clone(),
            metrics: metrics.clone(),
        });
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let result = serve("status", status_listener, router, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let metrics_handle = {
        let shutdown = shutdown_tx.clone();
        let router = metrics_router(metrics.clone());
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let result = serve("metrics", metrics_listener, router, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    let _ = shutdown.send(());
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down");
                            Ok(())
                        }
                        Err(err) => Err(io_err("ctrl-c handler", err)),
                    }
                }
            }
        })
    };

    let (scheduler_result, status_result, metrics_result, signal_result) =
        tokio::join!(scheduler_handle, status_handle, metrics_handle, signal_handle);

    handle_join("scheduler", scheduler_result)?;
    handle_join("status_server", status_result)?;
    handle_join("metrics_server", metrics_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

async fn bind(port: u16) -> Result<TcpListener, DaemonError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    TcpListener::bind(addr)
        .await
        .map_err(|source| DaemonError::Bind { addr, source })
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join(task, err.to_string())),
    }
}

/// Install the global `tracing` subscriber writing to stderr. `RUST_LOG`
/// overrides the default `info` filter. Safe to call more than once.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
