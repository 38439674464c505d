use std::net::SocketAddr;

use thiserror::Error;

/// Error surface for the daemon runtime and its servers.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error in {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("render error: {0}")]
    Render(#[from] fleetsync_renderer::RenderError),

    #[error("{0} task join failure: {1}")]
    Join(&'static str, String),
}

pub(crate) fn io_err(context: &'static str, source: std::io::Error) -> DaemonError {
    DaemonError::Io { context, source }
}
