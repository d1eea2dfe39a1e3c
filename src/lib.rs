//! mstrack is a real-time, multi-target, multiscale brute-force
//! block-matching tracker for video frames.
//!
//! Each target is re-localized every frame by scanning a bounded search
//! window for the best-matching image patch (SAD, SSD, or normalized
//! cross-correlation), with a coarse-to-fine image pyramid keeping the
//! window small at every level while still covering large inter-frame
//! motion. Optional parallelism over targets is available via the `rayon`
//! feature.

pub mod image;
pub mod kernel;
pub mod target;
mod template;
mod trace;
pub mod tracker;
pub mod util;

pub use image::{RgbImage, RgbView, Roi};
pub use kernel::Metric;
pub use target::{FeatureQuality, Point, Target};
pub use tracker::{Tracker, TrackerConfig};
pub use util::{sqrt_u32, sqrt_u64, TrackError, TrackResult};
