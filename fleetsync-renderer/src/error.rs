//! Error types for fleetsync-renderer.

use thiserror::Error;

/// Rendering failures. With the embedded template these indicate a defect,
/// not a runtime condition.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),
}
