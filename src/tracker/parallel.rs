//! Data-parallel tracking passes (rayon).
//!
//! Targets are partitioned across rayon workers; each worker owns a disjoint
//! slice of the per-target arrays, so no per-target state is contended. The
//! refinement pass gives every worker its own scratch match map instead of
//! sharing the level's sequential buffer, and the end-of-frame previous-frame
//! snapshot runs once after the fork-join barrier in the calling thread.

use rayon::prelude::*;

use crate::image::{RgbView, Roi};
use crate::kernel::MatchMap;
use crate::tracker::level::{acquire_target, refine_target, Level};
use crate::tracker::TrackerConfig;

impl Level {
    /// Parallel counterpart of [`Level::visibility_pass`].
    pub(crate) fn visibility_pass_par(
        &mut self,
        input: RgbView<'_>,
        roi: Roi,
        cfg: &TrackerConfig,
    ) {
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

        self.targets
            .par_iter_mut()
            .zip(self.orig_templates.par_iter_mut())
            .for_each(|(target, orig)| {
                acquire_target(target, orig, src, border, radius, cfg);
            });
    }

    /// Parallel counterpart of [`Level::fine_pass`].
    pub(crate) fn fine_pass_par(&mut self, input: RgbView<'_>, cfg: &TrackerConfig) {
        let radius = self.template_radius;
        let scale = self.scale;
        let search_radius = self.search_radius;

        self.targets
            .par_iter_mut()
            .zip(self.orig_templates.par_iter())
            .for_each_init(
                || MatchMap::new(search_radius),
                |match_map, (target, orig)| {
                    refine_target(target, orig, input, radius, scale, cfg, match_map);
                },
            );
    }
}
