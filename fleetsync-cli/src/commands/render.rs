//! `fleetsync render`: fetch once and print the status page.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use fleetsync_core::{ConfigError, Snapshot, SnapshotStore};
use fleetsync_daemon::init_tracing;
use fleetsync_datastore::fetch;
use fleetsync_renderer::{StatusPage, StatusRenderer};

use super::StoreArgs;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Write the page here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        init_tracing(false);

        let project_id = self
            .store
            .resolved_project()
            .ok_or(ConfigError::MissingProject)
            .context("invalid configuration")?;
        let namespace = self.store.datastore_namespace.as_str();
        if namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace).context("invalid configuration");
        }

        let client = self
            .store
            .datastore_client(&project_id, self.store.credentials());
        let records = fetch(&client, namespace)
            .with_context(|| format!("failed to fetch fleet records from namespace '{namespace}'"))?;

        let store = SnapshotStore::new();
        let snapshot = store.publish(Snapshot::new(records));
        let page = StatusPage::from_snapshot(&snapshot, namespace, Utc::now());
        let html = StatusRenderer::new()
            .and_then(|renderer| renderer.render(&page))
            .context("failed to render status page")?;

        match &self.output {
            Some(path) => {
                fs::write(path, &html)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), records = snapshot.len(), "status page written");
            }
            None => print!("{html}"),
        }
        Ok(())
    }
}
