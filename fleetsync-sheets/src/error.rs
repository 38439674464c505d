//! Error types for fleetsync-sheets.

use thiserror::Error;

use fleetsync_core::AuthError;

/// The sheet was unreachable or refused the write.
///
/// Never fatal, and never rolls back the in-memory snapshot.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("sheets request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("sheets rejected write ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("sheets credentials unavailable: {0}")]
    Auth(#[from] AuthError),
}

impl UploadError {
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => UploadError::Rejected {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            other => UploadError::Transport {
                url: url.to_string(),
                source: Box::new(other),
            },
        }
    }
}
