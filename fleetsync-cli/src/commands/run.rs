//! `fleetsync run`: validate configuration and start the sync daemon.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use fleetsync_core::config::{
    DEFAULT_METRICS_PORT, DEFAULT_STATUS_PORT, DEFAULT_UPLOAD_INTERVAL_SECS,
};
use fleetsync_core::SyncConfig;
use fleetsync_daemon::{init_tracing, start_blocking, Collaborators};
use fleetsync_sheets::SheetsClient;

use super::StoreArgs;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Mean seconds between uploads; actual sleeps are exponentially distributed.
    #[arg(long, env = "FLEETSYNC_UPLOAD_INTERVAL", default_value_t = DEFAULT_UPLOAD_INTERVAL_SECS)]
    pub expected_upload_interval: f64,

    /// Id of the spreadsheet to upsert into.
    #[arg(long, env = "FLEETSYNC_SPREADSHEET")]
    pub spreadsheet: Option<String>,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "FLEETSYNC_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub prometheus_port: u16,

    /// Port for the HTML status page.
    #[arg(long, env = "FLEETSYNC_STATUS_PORT", default_value_t = DEFAULT_STATUS_PORT)]
    pub webserver_port: u16,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl RunArgs {
    pub fn config(&self) -> SyncConfig {
        SyncConfig {
            namespace: self.store.datastore_namespace.clone(),
            project_id: self.store.project.clone().unwrap_or_default(),
            spreadsheet_id: self.spreadsheet.clone().unwrap_or_default(),
            upload_interval_secs: self.expected_upload_interval,
            metrics_port: self.prometheus_port,
            status_port: self.webserver_port,
        }
    }

    pub fn run(self) -> Result<()> {
        init_tracing(self.log_json);

        let mut config = self.config();
        if config.project_id.trim().is_empty() {
            config.project_id = self.store.resolved_project().unwrap_or_default();
        }
        let config = config.validated().context("invalid configuration")?;

        let credentials = self.store.credentials();
        let source = self
            .store
            .datastore_client(&config.project_id, Arc::clone(&credentials));
        let sink = SheetsClient::new(credentials);

        start_blocking(
            config,
            Collaborators {
                source: Arc::new(source),
                sink: Arc::new(sink),
            },
            self.log_json,
        )
        .context("daemon exited with error")
    }
}
