//! Error types for mstrack.

use thiserror::Error;

/// Result alias for tracker operations.
pub type TrackResult<T> = std::result::Result<T, TrackError>;

/// Errors that can occur while building or running the tracker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    /// Image or tracker dimensions are invalid.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The row stride is smaller than the image width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// A pixel buffer is smaller than its declared geometry requires.
    #[error("buffer too small: needed {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The requested pyramid depth halves a level below one pixel.
    #[error("pyramid level {level} would be {width}x{height}")]
    LevelTooSmall {
        level: usize,
        width: usize,
        height: usize,
    },
    /// A per-frame operation was called before `initialize`.
    #[error("tracker is not initialized")]
    NotInitialized,
    /// The frame handed to the tracker does not match the initialized size.
    #[error("frame is {got_width}x{got_height}, tracker was initialized for {width}x{height}")]
    FrameSizeMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },
    /// A target index is outside the initialized target array.
    #[error("target index {index} out of range ({len} targets)")]
    TargetOutOfRange { index: usize, len: usize },
}
