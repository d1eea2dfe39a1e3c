//! Best-match selection over a filled match map.

use crate::kernel::{MatchMap, Metric};

/// Winning displacement and the confidence derived from the score map.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct BestMatch {
    /// Horizontal displacement relative to the window center.
    pub(crate) dx: i32,
    /// Vertical displacement relative to the window center.
    pub(crate) dy: i32,
    /// Match confidence in `[0, 255]`.
    pub(crate) confidence: u8,
}

/// Reduces the match map to a displacement and a confidence byte.
///
/// The scan tracks the window average and the single best cell (max for NCC,
/// min for SAD/SSD). Sentinel `0` cells take part in the plain comparison, so
/// a sentinel can win when no valid cell beats it; `best == 0` then collapses
/// the confidence to zero. Confidence is a fixed-point best/average ratio:
///
/// - NCC: `avg > 0 ? (best << 6) / avg : 0`
/// - SAD: `best > 0 ? (avg << 6) / best : 0`
/// - SSD: `best > 0 ? (avg << 8) / (best << 3) : 0`
///
/// clamped to `[0, 255]`.
pub(crate) fn select_best(map: &MatchMap, metric: Metric) -> BestMatch {
    let cells = map.cells();
    let sr = map.radius() as i32;
    let side = map.side();

    let higher_better = metric == Metric::Ncc;
    let mut best = if higher_better { i32::MIN } else { i32::MAX };
    let mut best_idx = 0usize;
    let mut sum = 0i64;

    for (idx, &value) in cells.iter().enumerate() {
        sum += i64::from(value);
        let better = if higher_better {
            value > best
        } else {
            value < best
        };
        if better {
            best = value;
            best_idx = idx;
        }
    }

    let avg = sum / cells.len() as i64;
    let best = i64::from(best);
    let ratio = match metric {
        Metric::Ncc => {
            if avg > 0 {
                (best << 6) / avg
            } else {
                0
            }
        }
        Metric::Sad => {
            if best > 0 {
                (avg << 6) / best
            } else {
                0
            }
        }
        Metric::Ssd => {
            if best > 0 {
                (avg << 8) / (best << 3)
            } else {
                0
            }
        }
    };

    BestMatch {
        dx: (best_idx % side) as i32 - sr,
        dy: (best_idx / side) as i32 - sr,
        confidence: ratio.clamp(0, 255) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::{select_best, BestMatch};
    use crate::kernel::{MatchMap, Metric};

    fn map_from(radius: usize, values: &[i32]) -> MatchMap {
        let mut map = MatchMap::new(radius);
        map.cells_mut().copy_from_slice(values);
        map
    }

    #[test]
    fn sad_picks_minimum_and_reports_offset() {
        // 3x3 window, best cell at (dx, dy) = (1, -1).
        let map = map_from(1, &[90, 90, 5, 90, 90, 90, 90, 90, 90]);
        let best = select_best(&map, Metric::Sad);
        assert_eq!(best.dx, 1);
        assert_eq!(best.dy, -1);
        // avg = 725 / 9 = 80; (80 << 6) / 5 clamps to 255.
        assert_eq!(best.confidence, 255);
    }

    #[test]
    fn ncc_picks_maximum() {
        let map = map_from(1, &[1, 1, 1, 1, 769, 1, 1, 1, 1]);
        let best = select_best(&map, Metric::Ncc);
        assert_eq!((best.dx, best.dy), (0, 0));
        // avg = 777 / 9 = 86; (769 << 6) / 86 clamps to 255.
        assert_eq!(best.confidence, 255);
    }

    #[test]
    fn ncc_with_nonpositive_average_has_zero_confidence() {
        let map = map_from(1, &[-100, -100, -100, -100, 50, -100, -100, -100, -100]);
        let best = select_best(&map, Metric::Ncc);
        assert_eq!((best.dx, best.dy), (0, 0));
        assert_eq!(best.confidence, 0);
    }

    #[test]
    fn sentinel_can_win_a_minimum_search() {
        // One out-of-bounds sentinel beats every valid SAD score.
        let map = map_from(1, &[0, 40, 40, 40, 40, 40, 40, 40, 40]);
        let best = select_best(&map, Metric::Sad);
        assert_eq!(
            best,
            BestMatch {
                dx: -1,
                dy: -1,
                confidence: 0
            }
        );
    }

    #[test]
    fn ssd_confidence_uses_scaled_ratio() {
        let map = map_from(1, &[64, 64, 64, 64, 8, 64, 64, 64, 64]);
        let best = select_best(&map, Metric::Ssd);
        assert_eq!((best.dx, best.dy), (0, 0));
        // avg = 520 / 9 = 57; (57 << 8) / (8 << 3) = 228.
        assert_eq!(best.confidence, 228);
    }
}
