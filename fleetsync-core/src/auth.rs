//! OAuth bearer tokens for the Datastore and Sheets REST clients.
//!
//! On GCE the default service account's token is fetched from the metadata
//! server and cached until shortly before it expires. An explicit token can be
//! supplied instead, and emulator endpoints need no token at all. The same
//! server also reports the project the instance runs in.

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::AuthError;

/// Overrides the metadata server's `host[:port]`, as the Google client
/// libraries do.
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Bound on every metadata-server call.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
const PROJECT_ID_PATH: &str = "/computeMetadata/v1/project/project-id";

/// Tokens are refreshed once they have less than this long to live.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Where request credentials come from.
pub enum Credentials {
    /// Send no `Authorization` header (local emulators).
    Anonymous,
    /// A fixed token supplied at startup.
    Static(String),
    /// Default service account token from the GCE metadata server.
    Metadata(MetadataTokens),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Static(_) => f.write_str("Static(<redacted>)"),
            Credentials::Metadata(_) => f.write_str("Metadata"),
        }
    }
}

impl Credentials {
    /// Metadata-server credentials for the server named by the environment.
    pub fn metadata() -> Self {
        Credentials::Metadata(MetadataServer::from_env().tokens())
    }

    /// The value for an `Authorization` header, if any.
    pub fn authorization(&self) -> Result<Option<String>, AuthError> {
        match self {
            Credentials::Anonymous => Ok(None),
            Credentials::Static(token) => Ok(Some(format!("Bearer {token}"))),
            Credentials::Metadata(tokens) => tokens.token().map(|t| Some(format!("Bearer {t}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata server
// ---------------------------------------------------------------------------

/// The GCE metadata server, reached with a bounded agent.
#[derive(Clone)]
pub struct MetadataServer {
    agent: ureq::Agent,
    base: String,
}

impl MetadataServer {
    /// `$GCE_METADATA_HOST` when set, else the standard host.
    pub fn from_env() -> Self {
        let host = std::env::var(METADATA_HOST_ENV)
            .ok()
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
        Self::at(&host, METADATA_TIMEOUT)
    }

    /// Server at `host[:port]`; every call gives up after `timeout`.
    pub fn at(host: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base: format!("http://{}", host.trim_end_matches('/')),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Id of the project this instance belongs to.
    pub fn project_id(&self) -> Result<String, AuthError> {
        let url = self.url(PROJECT_ID_PATH);
        let body = self
            .agent
            .get(&url)
            .set("Metadata-Flavor", "Google")
            .call()
            .map_err(|e| AuthError::Request {
                url: url.clone(),
                source: Box::new(e),
            })?
            .into_string()?;
        let project_id = body.trim();
        if project_id.is_empty() {
            return Err(AuthError::EmptyAnswer { url });
        }
        Ok(project_id.to_string())
    }

    /// Caching token source for the default service account.
    pub fn tokens(&self) -> MetadataTokens {
        MetadataTokens::new(self.agent.clone(), self.url(TOKEN_PATH))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_after: Instant,
}

/// Caching fetcher for metadata-server access tokens.
pub struct MetadataTokens {
    agent: ureq::Agent,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokens {
    pub(crate) fn new(agent: ureq::Agent, url: impl Into<String>) -> Self {
        Self {
            agent,
            url: url.into(),
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, fetching a fresh one when the cache is stale.
    pub fn token(&self) -> Result<String, AuthError> {
        let mut cached = self
            .cached
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_after {
                return Ok(token.value.clone());
            }
        }

        let response: TokenResponse = self
            .agent
            .get(&self.url)
            .set("Metadata-Flavor", "Google")
            .call()
            .map_err(|e| AuthError::Request {
                url: self.url.clone(),
                source: Box::new(e),
            })?
            .into_json()?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(expires_in = response.expires_in, "fetched metadata access token");
        *cached = Some(CachedToken {
            value: response.access_token.clone(),
            refresh_after: Instant::now() + lifetime,
        });
        Ok(response.access_token)
    }
}
