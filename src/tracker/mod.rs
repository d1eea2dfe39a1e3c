//! Multi-target, multiscale brute-force tracker.
//!
//! The pyramid is stored as an indexed array of [`Level`] structs, finest
//! level first, so child/parent navigation is plain slice indexing and the
//! depth is a checked invariant instead of a recursive ownership chain.
//!
//! Per frame, call [`Tracker::pre_process_image`] to refresh the downsampled
//! pyramid inputs, then [`Tracker::track`] to re-localize every target.

use crate::image::shrink::shrink_rgb;
use crate::image::{RgbView, Roi};
use crate::kernel::Metric;
use crate::target::{FeatureQuality, Point, Target};
use crate::trace::{trace_event, trace_span};
use crate::tracker::level::{derive_level_params, scale_up_pass, Level};
use crate::util::{TrackError, TrackResult};

pub(crate) mod level;

#[cfg(feature = "rayon")]
mod parallel;

/// Tracker configuration.
///
/// `scales`, `template_radius`, and `search_radius` size the pyramid buffers
/// and therefore take effect at the next [`Tracker::initialize`]; the other
/// fields apply to every level immediately.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Error metric for the matching kernels.
    pub metric: Metric,
    /// Pyramid depth; 1 disables coarse-to-fine search.
    pub scales: usize,
    /// Template half-size at the finest level.
    pub template_radius: usize,
    /// Search-window half-size at the coarsest level.
    pub search_radius: usize,
    /// Refresh the pristine template at the target position every frame.
    pub overwrite_templates: bool,
    /// Acquire templates automatically and blend them adaptively.
    pub template_update: bool,
    /// Adaptive blend weight: 0 keeps the pristine template, 255 always
    /// takes the fresh patch.
    pub template_update_weight: u8,
    /// Minimum confidence a target must hold to stay tracked.
    pub confidence_threshold: u8,
    /// Partition targets across rayon workers (needs the `rayon` feature).
    pub parallel: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Ncc,
            scales: 1,
            template_radius: 3,
            search_radius: 6,
            overwrite_templates: false,
            template_update: true,
            template_update_weight: 0,
            confidence_threshold: 0,
            parallel: false,
        }
    }
}

/// Multi-target multiscale brute-force block-matching tracker.
pub struct Tracker {
    config: TrackerConfig,
    levels: Vec<Level>,
}

impl Tracker {
    /// Creates an uninitialized tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            levels: Vec::new(),
        }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Sets the matching error metric; applies to every level immediately.
    pub fn set_error_metric(&mut self, metric: Metric) {
        self.config.metric = metric;
    }

    /// Sets the pyramid depth; takes effect at the next `initialize`.
    pub fn set_scales(&mut self, scales: usize) {
        self.config.scales = scales;
    }

    /// Sets the requested template radius; takes effect at the next `initialize`.
    pub fn set_template_radius(&mut self, radius: usize) {
        self.config.template_radius = radius;
    }

    /// Sets the requested search radius; takes effect at the next `initialize`.
    pub fn set_search_radius(&mut self, radius: usize) {
        self.config.search_radius = radius;
    }

    /// Enables drift-following template replacement.
    pub fn set_overwrite_templates(&mut self, enabled: bool) {
        self.config.overwrite_templates = enabled;
    }

    /// Enables automatic template acquisition and adaptive blending.
    pub fn set_template_update(&mut self, enabled: bool) {
        self.config.template_update = enabled;
    }

    /// Sets the adaptive blend weight.
    pub fn set_template_update_weight(&mut self, weight: u8) {
        self.config.template_update_weight = weight;
    }

    /// Sets the confidence gate for keeping targets tracked.
    pub fn set_confidence_threshold(&mut self, threshold: u8) {
        self.config.confidence_threshold = threshold;
    }

    /// (Re)builds the whole pyramid and allocates every buffer.
    pub fn initialize(
        &mut self,
        width: usize,
        height: usize,
        target_count: usize,
    ) -> TrackResult<()> {
        let _span = trace_span!(
            "initialize",
            width = width,
            height = height,
            targets = target_count,
            scales = self.config.scales
        )
        .entered();

        if width == 0 || height == 0 {
            return Err(TrackError::InvalidDimensions { width, height });
        }

        let depth = self.config.scales.max(1);
        let params = derive_level_params(
            self.config.template_radius,
            self.config.search_radius,
            depth,
        );

        // Validate every level's dimensions before allocating any of them.
        let mut dims = Vec::with_capacity(depth);
        let mut w = width;
        let mut h = height;
        for k in 0..depth {
            if w == 0 || h == 0 {
                return Err(TrackError::LevelTooSmall {
                    level: k,
                    width: w,
                    height: h,
                });
            }
            dims.push((w, h));
            w /= 2;
            h /= 2;
        }

        let mut levels = Vec::with_capacity(depth);
        for (k, (&p, &(w, h))) in params.iter().zip(&dims).enumerate() {
            levels.push(Level::new(w, h, depth - k, p, target_count)?);
        }

        self.levels = levels;
        Ok(())
    }

    /// Resets per-target quality and feature data without reallocating.
    pub fn reset_targets(&mut self) {
        for level in &mut self.levels {
            level.reset_targets();
        }
    }

    /// Tears down the pyramid and frees all owned buffers.
    ///
    /// Per-frame operations fail with [`TrackError::NotInitialized`] until
    /// the next [`Tracker::initialize`].
    pub fn release(&mut self) {
        self.levels = Vec::new();
    }

    /// Number of targets the pyramid was initialized for.
    pub fn target_count(&self) -> usize {
        self.levels.first().map_or(0, |level| level.targets.len())
    }

    /// Number of frames tracked since `initialize`/`reset_targets`.
    pub fn frame_count(&self) -> u64 {
        self.levels.first().map_or(0, |level| level.frame_counter)
    }

    /// Activates target `index` at `position` (finest-level coordinates).
    ///
    /// The position propagates down the pyramid halved per level, and the
    /// target's template state resets so it re-acquires on the next frame.
    pub fn set_target(&mut self, index: usize, position: Point) -> TrackResult<()> {
        self.check_target(index)?;
        let mut pos = position;
        for level in &mut self.levels {
            let target = &mut level.targets[index];
            target.used = true;
            target.visible = false;
            target.confidence = 0;
            target.quality = FeatureQuality::Uninitialized;
            target.position = pos;
            pos = pos.half();
        }
        Ok(())
    }

    /// Deactivates target `index` on every level.
    pub fn clear_target(&mut self, index: usize) -> TrackResult<()> {
        self.check_target(index)?;
        for level in &mut self.levels {
            let target = &mut level.targets[index];
            target.used = false;
            target.visible = false;
            target.confidence = 0;
            target.quality = FeatureQuality::Uninitialized;
        }
        Ok(())
    }

    /// Returns the finest-level record of target `index`.
    pub fn target(&self, index: usize) -> TrackResult<&Target> {
        self.check_target(index)?;
        Ok(&self.levels[0].targets[index])
    }

    /// Returns the current adaptive template of target `index`.
    pub fn feature(&self, index: usize) -> TrackResult<&[u8]> {
        self.target(index).map(Target::feature)
    }

    /// Recursively downsamples the frame into every child level's input.
    ///
    /// Must be called once per frame before [`Tracker::track`]. Only the ROI
    /// plus a search margin is recomputed at each level.
    pub fn pre_process_image(&mut self, frame: RgbView<'_>, roi: Roi) -> TrackResult<()> {
        self.check_frame(frame)?;
        let _span = trace_span!("pre_process_image", levels = self.levels.len()).entered();

        let depth = self.levels.len();
        let mut roi = roi.clamp(frame.width(), frame.height());
        for k in 0..depth - 1 {
            let child = &self.levels[k + 1];
            let margin = 2 * (child.search_radius + child.template_radius) as i32;

            let (head, tail) = self.levels.split_at_mut(k);
            let level = &mut tail[0];
            let input = if k == 0 {
                frame
            } else {
                head[k - 1]
                    .lower_scale
                    .as_ref()
                    .expect("non-coarsest level owns a lower-scale buffer")
                    .view()
            };
            let dst = level
                .lower_scale
                .as_mut()
                .expect("non-coarsest level owns a lower-scale buffer");
            shrink_rgb(input, roi, margin, dst);
            roi = roi.half();
        }
        Ok(())
    }

    /// Tracks every target through the current frame.
    ///
    /// Runs the visibility/acquisition pass on each level, then, coarsest
    /// first, pulls child results up and refines with the configured kernel,
    /// and finally snapshots the frame as each level's previous image.
    pub fn track(&mut self, frame: RgbView<'_>, roi: Roi) -> TrackResult<()> {
        self.check_frame(frame)?;
        let _span = trace_span!(
            "track",
            levels = self.levels.len(),
            targets = self.target_count()
        )
        .entered();

        let depth = self.levels.len();
        let rois = self.level_rois(frame, roi);

        // Pass 1: visibility and template acquisition, every level.
        for k in 0..depth {
            let (head, tail) = self.levels.split_at_mut(k);
            let level = &mut tail[0];
            let input = level_input(frame, head, k);
            #[cfg(feature = "rayon")]
            if self.config.parallel {
                level.visibility_pass_par(input, rois[k], &self.config);
            } else {
                level.visibility_pass(input, rois[k], &self.config);
            }
            #[cfg(not(feature = "rayon"))]
            level.visibility_pass(input, rois[k], &self.config);
        }

        // Passes 2 and 3, coarsest level first.
        for k in (0..depth).rev() {
            if k + 1 < depth {
                let (head, tail) = self.levels.split_at_mut(k + 1);
                scale_up_pass(&mut head[k].targets, &tail[0].targets);
            }

            let (head, tail) = self.levels.split_at_mut(k);
            let level = &mut tail[0];
            let input = level_input(frame, head, k);
            #[cfg(feature = "rayon")]
            if self.config.parallel {
                level.fine_pass_par(input, &self.config);
            } else {
                level.fine_pass(input, &self.config);
            }
            #[cfg(not(feature = "rayon"))]
            level.fine_pass(input, &self.config);
        }

        // Snapshot every level's frame for the next call.
        for k in 0..depth {
            let (head, tail) = self.levels.split_at_mut(k);
            let level = &mut tail[0];
            let input = level_input(frame, head, k);
            level.finish_frame(input, rois[k])?;
        }

        trace_event!("frame_tracked", frame = self.frame_count());
        Ok(())
    }

    fn level_rois(&self, frame: RgbView<'_>, roi: Roi) -> Vec<Roi> {
        let mut rois = Vec::with_capacity(self.levels.len());
        let mut roi = roi.clamp(frame.width(), frame.height());
        for level in &self.levels {
            rois.push(roi.clamp(level.width, level.height));
            roi = roi.half();
        }
        rois
    }

    fn check_frame(&self, frame: RgbView<'_>) -> TrackResult<()> {
        let level = self.levels.first().ok_or(TrackError::NotInitialized)?;
        if frame.width() != level.width || frame.height() != level.height {
            return Err(TrackError::FrameSizeMismatch {
                width: level.width,
                height: level.height,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }
        Ok(())
    }

    fn check_target(&self, index: usize) -> TrackResult<()> {
        let len = self.target_count();
        if self.levels.is_empty() {
            return Err(TrackError::NotInitialized);
        }
        if index >= len {
            return Err(TrackError::TargetOutOfRange { index, len });
        }
        Ok(())
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

/// Resolves level `k`'s input image: the caller frame at the root, the
/// parent's downsampled buffer below it.
fn level_input<'a>(frame: RgbView<'a>, head: &'a [Level], k: usize) -> RgbView<'a> {
    if k == 0 {
        frame
    } else {
        head[k - 1]
            .lower_scale
            .as_ref()
            .expect("non-coarsest level owns a lower-scale buffer")
            .view()
    }
}
