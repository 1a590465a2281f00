//! Unified error type for session operations.

use thiserror::Error;

/// Main error type for everything the session manager can fail at.
///
/// Nothing here is fatal: every variant leaves the session in a valid,
/// previously reachable state. Operations invoked with no mounted scene or
/// no active object are silent no-ops, not errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A document was created with an empty (after trimming) title.
    #[error("document title must not be empty")]
    EmptyTitle,

    /// Image bytes handed to the session could not be decoded. The scene is
    /// left unchanged.
    #[error("could not decode image data: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// An asynchronous image load completed after its originating scene was
    /// unmounted. Discarded by the session; callers must not surface it.
    #[error("stale completion: the originating scene is no longer mounted")]
    StaleOperation,

    /// The scene engine failed to restore serialized content. The mount
    /// proceeds with an empty scene.
    #[error("scene restore failed: {0}")]
    Restore(String),

    /// The scene engine failed to export a raster image.
    #[error("raster export failed: {0}")]
    Rasterize(String),
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
