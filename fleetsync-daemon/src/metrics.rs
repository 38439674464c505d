//! Prometheus counters and gauges describing scheduler health.
//!
//! Owned by one [`SyncMetrics`] value built at startup and shared by `Arc`;
//! there is no global registry.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

use crate::error::DaemonError;

/// Bucket bounds sized for multi-second fetch/upload runs and multi-minute
/// sleeps rather than web-request latencies.
pub const TIME_BUCKETS: &[f64] = &[
    1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0,
];

pub struct SyncMetrics {
    registry: Registry,
    pub cycles: IntCounter,
    pub fetch_failures: IntCounter,
    pub upload_failures: IntCounter,
    pub snapshot_records: IntGauge,
    pub snapshot_version: IntGauge,
    pub last_success_timestamp: IntGauge,
    pub sleep_time: Histogram,
    pub run_time: Histogram,
    pub status_requests: IntCounter,
}

impl SyncMetrics {
    pub fn new() -> Result<Self, DaemonError> {
        let registry = Registry::new();

        let cycles = IntCounter::new("fleetsync_cycles_total", "Sync cycles started")?;
        let fetch_failures = IntCounter::new(
            "fleetsync_fetch_failures_total",
            "Cycles whose datastore fetch failed",
        )?;
        let upload_failures = IntCounter::new(
            "fleetsync_upload_failures_total",
            "Cycles whose spreadsheet upload failed",
        )?;
        let snapshot_records = IntGauge::new(
            "fleetsync_snapshot_records",
            "Records in the current snapshot",
        )?;
        let snapshot_version = IntGauge::new(
            "fleetsync_snapshot_version",
            "Version of the current snapshot",
        )?;
        let last_success_timestamp = IntGauge::new(
            "fleetsync_last_success_timestamp_seconds",
            "Unix time of the last successful fetch",
        )?;
        let sleep_time = Histogram::with_opts(
            HistogramOpts::new(
                "fleetsync_sleep_time_seconds",
                "Sleep between cycles (should be exponentially distributed)",
            )
            .buckets(TIME_BUCKETS.to_vec()),
        )?;
        let run_time = Histogram::with_opts(
            HistogramOpts::new(
                "fleetsync_run_time_seconds",
                "Wall time of one fetch/publish/upload cycle",
            )
            .buckets(TIME_BUCKETS.to_vec()),
        )?;
        let status_requests = IntCounter::new(
            "fleetsync_status_requests_total",
            "Status page requests served",
        )?;

        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(fetch_failures.clone()))?;
        registry.register(Box::new(upload_failures.clone()))?;
        registry.register(Box::new(snapshot_records.clone()))?;
        registry.register(Box::new(snapshot_version.clone()))?;
        registry.register(Box::new(last_success_timestamp.clone()))?;
        registry.register(Box::new(sleep_time.clone()))?;
        registry.register(Box::new(run_time.clone()))?;
        registry.register(Box::new(status_requests.clone()))?;

        Ok(Self {
            registry,
            cycles,
            fetch_failures,
            upload_failures,
            snapshot_records,
            snapshot_version,
            last_success_timestamp,
            sleep_time,
            run_time,
            status_requests,
        })
    }

    /// Text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, DaemonError> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
