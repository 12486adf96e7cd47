//! Error types for the eye overlay pipeline.
//!
//! Degenerate geometry never surfaces here: boxes and pairs that cannot be
//! measured are rejected where they are classified.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Color and grayscale buffers of a frame disagree on dimensions
    #[error("frame buffers differ in size: color {color:?}, gray {gray:?}")]
    FrameSizeMismatch { color: (u32, u32), gray: (u32, u32) },

    /// Frame with zero width or height
    #[error("frame has no pixels ({0}x{1})")]
    EmptyFrame(u32, u32),

    /// Overlay sprite violates the load-once precondition
    #[error("invalid overlay asset: {0}")]
    InvalidAsset(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration values out of range
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Debug dump directory unusable
    #[error("Debug output error: {0}")]
    DebugOutput(String),

    #[error("Font error: {0}")]
    Font(String),
}

pub type Result<T> = std::result::Result<T, Error>;
