//! Shared utility helpers.

pub mod error;
pub mod sqrt;

pub use error::{TrackError, TrackResult};
pub use sqrt::{sqrt_u32, sqrt_u64};
