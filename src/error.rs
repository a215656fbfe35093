//! Error types for the snapshot pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while snapshotting or rasterizing a node
#[derive(Error, Debug)]
pub enum Error {
    /// The root node was rejected by the filter or could not be cloned
    #[error("Nothing to snapshot: the root node was filtered out or could not be cloned")]
    EmptySnapshot,

    /// Target dimensions resolved to zero or could not be allocated
    #[error("Invalid target dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),

    /// An image reference could not be loaded and no placeholder was configured
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// The container URI (or an embedded image) could not be decoded
    #[error("Image decode failed: {0}")]
    Decode(String),

    /// The clone tree could not be serialized to markup
    #[error("Serialization failed: {0}")]
    Serialize(String),

    /// The drawn surface could not be encoded
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem error from a resource loader
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
