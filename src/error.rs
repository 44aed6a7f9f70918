use thiserror::Error;

/// Failures surfaced by [`crate::builder::PreviewBuilder`] implementations.
///
/// The resolution service never propagates these to batch callers; a failed
/// build degrades to a `None` entry in the result map.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to build preview image: {0}")]
    Build(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PreviewError>;
