//! CLI error types.

use thiserror::Error;

/// Errors that abort a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// The camera catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] fovtrack::camera::CatalogError),

    /// The GPX track file could not be loaded.
    #[error(transparent)]
    Track(#[from] fovtrack::track::TrackError),

    /// A report could not be rendered as JSON.
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    /// A command-line argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
