pub mod render;
pub mod run;

use std::sync::Arc;

use clap::Args;

use fleetsync_core::config::DEFAULT_NAMESPACE;
use fleetsync_core::{Credentials, MetadataServer};
use fleetsync_datastore::DatastoreClient;

/// Set by the Datastore emulator tooling; points at a plain-http endpoint.
pub const EMULATOR_HOST_ENV: &str = "DATASTORE_EMULATOR_HOST";

/// Flags shared by every command that reads from Datastore.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Cloud project that owns the Datastore; asked of the GCE metadata server when absent.
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project: Option<String>,

    /// Datastore namespace holding the fleet entities.
    #[arg(long, env = "FLEETSYNC_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub datastore_namespace: String,

    /// OAuth access token; when absent one is fetched from the GCE metadata server.
    #[arg(long, env = "FLEETSYNC_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

impl StoreArgs {
    /// The project from the flag or environment, else the metadata server's.
    pub fn resolved_project(&self) -> Option<String> {
        let given = self
            .project
            .as_deref()
            .map(str::trim)
            .filter(|project| !project.is_empty());
        if let Some(project) = given {
            return Some(project.to_string());
        }
        match MetadataServer::from_env().project_id() {
            Ok(project) => {
                tracing::info!(%project, "project id taken from metadata server");
                Some(project)
            }
            Err(err) => {
                tracing::warn!(error = %err, "no project id given and metadata server lookup failed");
                None
            }
        }
    }

    /// Credentials for the Google REST APIs.
    pub fn credentials(&self) -> Arc<Credentials> {
        match &self.access_token {
            Some(token) if !token.trim().is_empty() => {
                Arc::new(Credentials::Static(token.trim().to_string()))
            }
            _ => Arc::new(Credentials::metadata()),
        }
    }

    /// Datastore client, pointed at the emulator when one is configured.
    pub fn datastore_client(&self, project_id: &str, credentials: Arc<Credentials>) -> DatastoreClient {
        match emulator_host() {
            Some(host) => {
                tracing::info!(%host, "using datastore emulator");
                DatastoreClient::with_endpoint(
                    format!("http://{host}"),
                    project_id,
                    Arc::new(Credentials::Anonymous),
                )
            }
            None => DatastoreClient::new(project_id, credentials),
        }
    }
}

fn emulator_host() -> Option<String> {
    std::env::var(EMULATOR_HOST_ENV)
        .ok()
        .map(|host| host.trim().to_string())
        .filter(|host| !host.is_empty())
}
