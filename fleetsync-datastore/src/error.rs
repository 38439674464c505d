//! Error types for fleetsync-datastore.

use thiserror::Error;

use fleetsync_core::AuthError;

/// The store was unreachable or rejected the query.
///
/// Never fatal: the scheduler logs it, keeps the previous snapshot, and tries
/// again next cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (DNS, connect, TLS, timeout).
    #[error("datastore request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The store answered with a non-success status.
    #[error("datastore rejected query ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The response body was not a valid query result.
    #[error("could not decode datastore response: {0}")]
    Decode(#[from] std::io::Error),

    /// No access token could be obtained.
    #[error("datastore credentials unavailable: {0}")]
    Auth(#[from] AuthError),
}

impl FetchError {
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => FetchError::Rejected {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            other => FetchError::Transport {
                url: url.to_string(),
                source: Box::new(other),
            },
        }
    }
}
