//! Matching kernels and match-score buffers.

use crate::image::RgbView;
use crate::target::Point;

pub(crate) mod best;
pub(crate) mod scalar;

/// Error metric used to score template placements.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Metric {
    /// Sum of absolute differences, lower is better.
    Sad,
    /// Sum of squared differences, lower is better.
    Ssd,
    /// Normalized cross-correlation, higher is better.
    #[default]
    Ncc,
}

/// Match-score map over a `(2 * search_radius + 1)^2` window.
///
/// Valid cells hold `raw_score + 1`; `0` is the sentinel for window
/// positions where the template patch would leave the image.
pub(crate) struct MatchMap {
    radius: usize,
    cells: Vec<i32>,
}

impl MatchMap {
    pub(crate) fn new(radius: usize) -> Self {
        let side = 2 * radius + 1;
        Self {
            radius,
            cells: vec![0; side * side],
        }
    }

    /// Search radius the map was sized for.
    pub(crate) fn radius(&self) -> usize {
        self.radius
    }

    /// Window side length, `2 * radius + 1`.
    pub(crate) fn side(&self) -> usize {
        2 * self.radius + 1
    }

    pub(crate) fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [i32] {
        &mut self.cells
    }
}

/// Runs the configured kernel over the search window centered at `center`.
pub(crate) fn match_template(
    metric: Metric,
    img: RgbView<'_>,
    tpl: &[u8],
    radius: usize,
    center: Point,
    map: &mut MatchMap,
) {
    match metric {
        Metric::Sad => scalar::match_sad(img, tpl, radius, center, map),
        Metric::Ssd => scalar::match_ssd(img, tpl, radius, center, map),
        Metric::Ncc => scalar::match_ncc(img, tpl, radius, center, map),
    }
}
