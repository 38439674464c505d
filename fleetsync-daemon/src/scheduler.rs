//! The sync loop: fetch → publish → upload → sleep, forever.
//!
//! The scheduler is the only writer of the [`SnapshotStore`]. A failed fetch
//! leaves the previous snapshot in place; a failed upload never rolls back the
//! snapshot that was just published. Either way the next cycle retries after
//! the usual jittered sleep.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::Instant;

use fleetsync_core::{Snapshot, SnapshotStore, SyncConfig};
use fleetsync_datastore::{fetch, RecordSource};
use fleetsync_sheets::{publish, SheetSink};

use crate::error::DaemonError;
use crate::jitter::Jitter;
use crate::metrics::SyncMetrics;

/// Where the scheduler is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Fetching,
    Publishing,
    Uploading,
    Sleeping,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CyclePhase::Fetching => write!(f, "fetching"),
            CyclePhase::Publishing => write!(f, "publishing"),
            CyclePhase::Uploading => write!(f, "uploading"),
            CyclePhase::Sleeping => write!(f, "sleeping"),
        }
    }
}

/// Result of one fetch/publish/upload pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The fetch failed; the current snapshot was left untouched.
    FetchFailed { error: String },
    /// A new snapshot was published. `upload` carries the sink error, if any.
    Published {
        version: u64,
        records: usize,
        upload: Result<(), String>,
    },
}

pub struct Scheduler {
    store: SnapshotStore,
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn SheetSink>,
    config: Arc<SyncConfig>,
    metrics: Arc<SyncMetrics>,
    jitter: Jitter,
    phase: CyclePhase,
}

impl Scheduler {
    pub fn new(
        store: SnapshotStore,
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn SheetSink>,
        config: Arc<SyncConfig>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        let jitter = Jitter::new(config.mean_interval());
        Self::with_jitter(store, source, sink, config, metrics, jitter)
    }

    /// Like [`Scheduler::new`] with an explicit delay source.
    pub fn with_jitter(
        store: SnapshotStore,
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn SheetSink>,
        config: Arc<SyncConfig>,
        metrics: Arc<SyncMetrics>,
        jitter: Jitter,
    ) -> Self {
        Self {
            store,
            source,
            sink,
            config,
            metrics,
            jitter,
            phase: CyclePhase::Sleeping,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    fn enter(&mut self, phase: CyclePhase) {
        tracing::debug!(%phase, "scheduler phase");
        self.phase = phase;
    }

    /// Run one fetch → publish → upload pass.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();
        self.metrics.cycles.inc();

        self.enter(CyclePhase::Fetching);
        let source = Arc::clone(&self.source);
        let namespace = self.config.namespace.clone();
        let fetched = tokio::task::spawn_blocking(move || fetch(source.as_ref(), &namespace))
            .await
            .map_err(|err| format!("fetch task join error: {err}"))
            .and_then(|result| result.map_err(|err| err.to_string()));

        let records = match fetched {
            Ok(records) => records,
            Err(error) => {
                self.metrics.fetch_failures.inc();
                tracing::error!(
                    namespace = %self.config.namespace,
                    error = %error,
                    "fetch failed; keeping previous snapshot",
                );
                self.metrics.run_time.observe(started.elapsed().as_secs_f64());
                return CycleOutcome::FetchFailed { error };
            }
        };

        self.enter(CyclePhase::Publishing);
        let snapshot = self.store.publish(Snapshot::new(records));
        self.metrics.snapshot_records.set(snapshot.len() as i64);
        self.metrics.snapshot_version.set(snapshot.version as i64);
        self.metrics.last_success_timestamp.set(Utc::now().timestamp());

        self.enter(CyclePhase::Uploading);
        let sink = Arc::clone(&self.sink);
        let spreadsheet_id = self.config.spreadsheet_id.clone();
        let to_upload = Arc::clone(&snapshot);
        let upload = tokio::task::spawn_blocking(move || {
            publish(sink.as_ref(), &spreadsheet_id, &to_upload)
        })
        .await
        .map_err(|err| format!("upload task join error: {err}"))
        .and_then(|result| result.map(|_| ()).map_err(|err| err.to_string()));

        match &upload {
            Ok(()) => tracing::info!(
                version = snapshot.version,
                records = snapshot.len(),
                spreadsheet = %self.config.spreadsheet_id,
                "snapshot published and uploaded",
            ),
            Err(error) => {
                self.metrics.upload_failures.inc();
                tracing::error!(
                    version = snapshot.version,
                    error = %error,
                    "upload failed; status page still serves the new snapshot",
                );
            }
        }

        self.metrics.run_time.observe(started.elapsed().as_secs_f64());
        CycleOutcome::Published {
            version: snapshot.version,
            records: snapshot.len(),
            upload,
        }
    }

    /// Pick the next sleep and record it.
    fn next_delay(&mut self) -> Duration {
        self.enter(CyclePhase::Sleeping);
        let delay = self.jitter.sample();
        self.metrics.sleep_time.observe(delay.as_secs_f64());
        tracing::info!(seconds = delay.as_secs_f64(), "sleeping until next cycle");
        delay
    }

    /// Cycle until a shutdown signal arrives. Only the sleep is interrupted;
    /// an in-flight fetch or upload runs to completion first.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<(), DaemonError> {
        tracing::info!(
            namespace = %self.config.namespace,
            mean_interval_secs = self.jitter.mean().as_secs_f64(),
            "sync scheduler started",
        );
        loop {
            self.run_cycle().await;
            let delay = self.next_delay();
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        tracing::info!("sync scheduler stopped");
        Ok(())
    }
}
