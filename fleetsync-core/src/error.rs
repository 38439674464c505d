//! Error types for fleetsync-core.

use thiserror::Error;

/// Invalid startup configuration. Always fatal: the process must not start.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No spreadsheet id was supplied (or it was blank).
    #[error("missing required spreadsheet id; pass --spreadsheet or set FLEETSYNC_SPREADSHEET")]
    MissingSpreadsheet,

    /// No Cloud project id was supplied for the Datastore client.
    #[error("missing required project id; pass --project, set GOOGLE_CLOUD_PROJECT, or run on GCE")]
    MissingProject,

    /// The Datastore namespace was blank.
    #[error("datastore namespace must not be empty")]
    EmptyNamespace,

    /// The mean upload interval must be a finite, positive number of seconds.
    #[error("expected upload interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),

    /// Metrics and status page were configured to share one port.
    #[error("metrics port and status port must differ (both set to {0})")]
    PortConflict(u16),
}

/// Failure to obtain an OAuth access token or instance metadata.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport or HTTP-status failure talking to the token endpoint.
    #[error("token request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The metadata server answered 200 with an empty body.
    #[error("metadata server at {url} returned an empty answer")]
    EmptyAnswer { url: String },

    /// The token endpoint answered with a body we could not decode.
    #[error("could not decode token response: {0}")]
    Decode(#[from] std::io::Error),
}
