//! One pyramid level: per-target state, templates, and the tracking passes.

use crate::image::{RgbImage, RgbView, Roi};
use crate::kernel::best::select_best;
use crate::kernel::{match_template, MatchMap};
use crate::target::{FeatureQuality, Point, Target};
use crate::template::{copy_patch, template_bytes, update_template};
use crate::tracker::TrackerConfig;
use crate::util::TrackResult;

/// Effective radii for one pyramid level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct LevelParams {
    pub(crate) template_radius: usize,
    pub(crate) search_radius: usize,
}

/// Derives per-level working radii from the requested configuration.
///
/// Requested radii halve (rounding up) on the way down. Every level clamps
/// its template radius to at least 1. Non-coarsest levels refine with a
/// small fixed window of 2 because the child already resolved most of the
/// displacement; the coarsest level keeps its propagated radius, minimum 2.
pub(crate) fn derive_level_params(
    template_radius: usize,
    search_radius: usize,
    scales: usize,
) -> Vec<LevelParams> {
    let depth = scales.max(1);
    let mut params = Vec::with_capacity(depth);
    let mut tr = template_radius;
    let mut sr = search_radius;
    for level in 0..depth {
        let coarsest = level + 1 == depth;
        params.push(LevelParams {
            template_radius: tr.max(1),
            search_radius: if coarsest { sr.max(2) } else { 2 },
        });
        tr = tr.div_ceil(2);
        sr = sr.div_ceil(2);
    }
    params
}

/// State owned by one pyramid level (level 0 is the finest).
pub(crate) struct Level {
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// Number of levels from here down to and including the coarsest.
    pub(crate) scale: usize,
    pub(crate) template_radius: usize,
    pub(crate) search_radius: usize,
    pub(crate) targets: Vec<Target>,
    /// Pristine per-target template snapshots.
    pub(crate) orig_templates: Vec<Vec<u8>>,
    /// Transient score buffer shared by all targets of the sequential path.
    pub(crate) match_map: MatchMap,
    /// Full copy of the last frame seen at this resolution.
    pub(crate) previous: RgbImage,
    pub(crate) previous_roi: Roi,
    /// Downsampled current frame handed to the child level, if any.
    pub(crate) lower_scale: Option<RgbImage>,
    pub(crate) frame_counter: u64,
}

impl Level {
    pub(crate) fn new(
        width: usize,
        height: usize,
        scale: usize,
        params: LevelParams,
        target_count: usize,
    ) -> TrackResult<Self> {
        let bytes = template_bytes(params.template_radius);
        let targets = (0..target_count)
            .map(|_| Target {
                feature: vec![0u8; bytes],
                ..Target::default()
            })
            .collect();
        let lower_scale = if scale > 1 {
            Some(RgbImage::new(width / 2, height / 2)?)
        } else {
            None
        };
        Ok(Self {
            width,
            height,
            scale,
            template_radius: params.template_radius,
            search_radius: params.search_radius,
            targets,
            orig_templates: vec![vec![0u8; bytes]; target_count],
            match_map: MatchMap::new(params.search_radius),
            previous: RgbImage::new(width, height)?,
            previous_roi: Roi::full(width, height),
            lower_scale,
            frame_counter: 0,
        })
    }

    /// Visibility and template-acquisition pass.
    ///
    /// Visibility is judged against the previous frame's ROI shrunk by the
    /// template radius. Invisible targets drop to confidence 0. Targets whose
    /// template was never captured acquire one from the previous frame (the
    /// current frame on the very first call); in overwrite mode the templates
    /// are instead refreshed at the target's current position every frame.
    pub(crate) fn visibility_pass(&mut self, input: RgbView<'_>, roi: Roi, cfg: &TrackerConfig) {
        let r = self.template_radius as i32;
        let border = if self.frame_counter == 0 {
            roi
        } else {
            self.previous_roi
        }
        .shrink(r);
        let src = if self.frame_counter == 0 {
            input
        } else {
            self.previous.view()
        };
        let radius = self.template_radius;

        for (target, orig) in self.targets.iter_mut().zip(&mut self.orig_templates) {
            acquire_target(target, orig, src, border, radius, cfg);
        }
    }

    /// Brute-force refinement pass against the current frame.
    pub(crate) fn fine_pass(&mut self, input: RgbView<'_>, cfg: &TrackerConfig) {
        let radius = self.template_radius;
        let scale = self.scale;
        let match_map = &mut self.match_map;

        for (target, orig) in self.targets.iter_mut().zip(&self.orig_templates) {
            refine_target(target, orig, input, radius, scale, cfg, match_map);
        }
    }

    /// End-of-frame bookkeeping: snapshot the current frame.
    pub(crate) fn finish_frame(&mut self, input: RgbView<'_>, roi: Roi) -> TrackResult<()> {
        self.frame_counter += 1;
        self.previous.copy_from(input)?;
        self.previous_roi = roi;
        Ok(())
    }

    pub(crate) fn reset_targets(&mut self) {
        for (target, orig) in self.targets.iter_mut().zip(&mut self.orig_templates) {
            target.reset();
            orig.fill(0);
        }
        self.frame_counter = 0;
    }
}

/// Pass-1 body for a single target.
pub(crate) fn acquire_target(
    target: &mut Target,
    orig: &mut [u8],
    src: RgbView<'_>,
    border: Roi,
    radius: usize,
    cfg: &TrackerConfig,
) {
    if !target.used {
        target.visible = false;
        return;
    }
    target.visible = border.contains(target.position.x, target.position.y);
    if !target.visible {
        target.confidence = 0;
        return;
    }

    if cfg.template_update && target.quality == FeatureQuality::Uninitialized {
        copy_patch(src, target.position, radius, orig);
        target.feature.copy_from_slice(orig);
        target.confidence = 255;
        target.quality = FeatureQuality::JustAcquired;
    } else if cfg.overwrite_templates {
        // Drift-following replacement: both template copies track the
        // target's latest position.
        copy_patch(src, target.position, radius, orig);
        target.feature.copy_from_slice(orig);
    }
}

/// Pass-3 body for a single target.
pub(crate) fn refine_target(
    target: &mut Target,
    orig: &[u8],
    input: RgbView<'_>,
    radius: usize,
    scale: usize,
    cfg: &TrackerConfig,
    match_map: &mut MatchMap,
) {
    if !target.used || !target.visible {
        return;
    }
    if !target.quality.passes(cfg.confidence_threshold) {
        target.visible = false;
        target.confidence = 0;
        return;
    }

    match_template(
        cfg.metric,
        input,
        &target.feature,
        radius,
        target.position,
        match_map,
    );
    let best = select_best(match_map, cfg.metric);

    let mut confidence = i32::from(best.confidence);
    if scale > 1 {
        if confidence < i32::from(cfg.confidence_threshold) {
            confidence = 0;
        }
        confidence = (i32::from(target.confidence) * (scale as i32 - 1) + confidence)
            / scale as i32;
    }

    if target.quality == FeatureQuality::JustAcquired {
        target.quality = FeatureQuality::Scored(confidence as u8);
    }

    target.position.x += best.dx;
    target.position.y += best.dy;
    target.confidence = confidence as u8;

    if cfg.template_update && !cfg.overwrite_templates {
        update_template(
            orig,
            input,
            target.position,
            radius,
            cfg.template_update_weight,
            &mut target.feature,
        );
    }
}

/// Coarse pass: pulls the child level's results up into this level.
///
/// Applies to every target acquired at least once. When the child located
/// the target, the parent position is `child * 2 + 1` and the confidence is
/// carried over; otherwise the target goes invisible with confidence 0.
pub(crate) fn scale_up_pass(parent: &mut [Target], child: &[Target]) {
    for (target, lower) in parent.iter_mut().zip(child) {
        if !target.used || !target.quality.acquired() {
            continue;
        }
        if lower.quality.acquired() && lower.visible {
            target.position = Point::new(lower.position.x * 2 + 1, lower.position.y * 2 + 1);
            target.confidence = lower.confidence;
        } else {
            target.visible = false;
            target.confidence = 0;
        }
    }
}
