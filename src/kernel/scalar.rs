//! Scalar matching kernels.
//!
//! Each kernel scans the `(2 * search_radius + 1)^2` window centered on the
//! target position and writes one score per window cell into the match map.
//! Cells whose template placement would leave the image get the `0` sentinel;
//! valid cells store `raw_score + 1`. All arithmetic is integer-only so the
//! scores are bit-exact across platforms.

use crate::image::{RgbView, CHANNELS};
use crate::kernel::MatchMap;
use crate::target::Point;
use crate::util::sqrt_u64;

/// Whether a template of half-size `r` centered at `(px, py)` fits the image.
#[inline]
fn placement_fits(px: i32, py: i32, r: i32, width: i32, height: i32) -> bool {
    px >= r && px < width - r && py >= r && py < height - r
}

/// Sum of absolute differences, averaged per pixel. Lower is better.
pub(crate) fn match_sad(
    img: RgbView<'_>,
    tpl: &[u8],
    radius: usize,
    center: Point,
    map: &mut MatchMap,
) {
    let side = 2 * radius + 1;
    let row_bytes = side * CHANNELS;
    debug_assert_eq!(tpl.len(), side * row_bytes);

    let r = radius as i32;
    let sr = map.radius() as i32;
    let width = img.width() as i32;
    let height = img.height() as i32;
    let npix = (side * side) as i64;

    let cells = map.cells_mut();
    let mut idx = 0;
    for dy in -sr..=sr {
        let py = center.y + dy;
        for dx in -sr..=sr {
            let px = center.x + dx;
            if !placement_fits(px, py, r, width, height) {
                cells[idx] = 0;
                idx += 1;
                continue;
            }

            let mut sum = 0i64;
            let off = ((px - r) as usize) * CHANNELS;
            for ty in 0..side {
                let row = img
                    .row((py - r) as usize + ty)
                    .expect("row within bounds for scan");
                let trow = &tpl[ty * row_bytes..(ty + 1) * row_bytes];
                for (b, &t) in trow.iter().enumerate() {
                    sum += (i64::from(row[off + b]) - i64::from(t)).abs();
                }
            }

            cells[idx] = (sum / npix) as i32 + 1;
            idx += 1;
        }
    }
}

/// Sum of squared differences, averaged per pixel. Lower is better.
pub(crate) fn match_ssd(
    img: RgbView<'_>,
    tpl: &[u8],
    radius: usize,
    center: Point,
    map: &mut MatchMap,
) {
    let side = 2 * radius + 1;
    let row_bytes = side * CHANNELS;
    debug_assert_eq!(tpl.len(), side * row_bytes);

    let r = radius as i32;
    let sr = map.radius() as i32;
    let width = img.width() as i32;
    let height = img.height() as i32;
    let npix = (side * side) as i64;

    let cells = map.cells_mut();
    let mut idx = 0;
    for dy in -sr..=sr {
        let py = center.y + dy;
        for dx in -sr..=sr {
            let px = center.x + dx;
            if !placement_fits(px, py, r, width, height) {
                cells[idx] = 0;
                idx += 1;
                continue;
            }

            let mut sum = 0i64;
            let off = ((px - r) as usize) * CHANNELS;
            for ty in 0..side {
                let row = img
                    .row((py - r) as usize + ty)
                    .expect("row within bounds for scan");
                let trow = &tpl[ty * row_bytes..(ty + 1) * row_bytes];
                for (b, &t) in trow.iter().enumerate() {
                    let d = i64::from(row[off + b]) - i64::from(t);
                    sum += d * d;
                }
            }

            cells[idx] = (sum / npix) as i32 + 1;
            idx += 1;
        }
    }
}

/// Per-channel template mean and standard deviation for NCC.
struct TemplateStats {
    mean: [i64; CHANNELS],
    dev: [i64; CHANNELS],
}

fn template_stats(tpl: &[u8], npix: i64) -> TemplateStats {
    let mut sum = [0i64; CHANNELS];
    for px in tpl.chunks_exact(CHANNELS) {
        for c in 0..CHANNELS {
            sum[c] += i64::from(px[c]);
        }
    }
    let mean = [sum[0] / npix, sum[1] / npix, sum[2] / npix];

    let mut var = [0i64; CHANNELS];
    for px in tpl.chunks_exact(CHANNELS) {
        for c in 0..CHANNELS {
            let d = i64::from(px[c]) - mean[c];
            var[c] += d * d;
        }
    }
    TemplateStats {
        mean,
        dev: [
            sqrt_u64(var[0] as u64) as i64,
            sqrt_u64(var[1] as u64) as i64,
            sqrt_u64(var[2] as u64) as i64,
        ],
    }
}

/// Normalized cross-correlation. Higher is better.
///
/// Per channel the cell score is `(cross << 8) / (dev_img * dev_tpl)`, or
/// `cross << 8` when either deviation is zero; the three channel scores are
/// summed, so an exact match scores `3 * 256`.
pub(crate) fn match_ncc(
    img: RgbView<'_>,
    tpl: &[u8],
    radius: usize,
    center: Point,
    map: &mut MatchMap,
) {
    let side = 2 * radius + 1;
    let row_bytes = side * CHANNELS;
    debug_assert_eq!(tpl.len(), side * row_bytes);

    let r = radius as i32;
    let sr = map.radius() as i32;
    let width = img.width() as i32;
    let height = img.height() as i32;
    let npix = (side * side) as i64;

    let stats = template_stats(tpl, npix);

    let cells = map.cells_mut();
    let mut idx = 0;
    for dy in -sr..=sr {
        let py = center.y + dy;
        for dx in -sr..=sr {
            let px = center.x + dx;
            if !placement_fits(px, py, r, width, height) {
                cells[idx] = 0;
                idx += 1;
                continue;
            }

            let off = ((px - r) as usize) * CHANNELS;

            let mut sum = [0i64; CHANNELS];
            for ty in 0..side {
                let row = img
                    .row((py - r) as usize + ty)
                    .expect("row within bounds for scan");
                for tx in 0..side {
                    let o = off + tx * CHANNELS;
                    for c in 0..CHANNELS {
                        sum[c] += i64::from(row[o + c]);
                    }
                }
            }
            let mean = [sum[0] / npix, sum[1] / npix, sum[2] / npix];

            let mut var = [0i64; CHANNELS];
            let mut cross = [0i64; CHANNELS];
            for ty in 0..side {
                let row = img
                    .row((py - r) as usize + ty)
                    .expect("row within bounds for scan");
                let trow = &tpl[ty * row_bytes..(ty + 1) * row_bytes];
                for tx in 0..side {
                    let o = tx * CHANNELS;
                    for c in 0..CHANNELS {
                        let di = i64::from(row[off + o + c]) - mean[c];
                        let dt = i64::from(trow[o + c]) - stats.mean[c];
                        var[c] += di * di;
                        cross[c] += di * dt;
                    }
                }
            }

            let mut score = 0i64;
            for c in 0..CHANNELS {
                let dev = sqrt_u64(var[c] as u64) as i64;
                score += if dev == 0 || stats.dev[c] == 0 {
                    cross[c] << 8
                } else {
                    (cross[c] << 8) / (dev * stats.dev[c])
                };
            }

            cells[idx] = score as i32 + 1;
            idx += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{match_ncc, match_sad, match_ssd};
    use crate::image::{RgbView, CHANNELS};
    use crate::kernel::MatchMap;
    use crate::target::Point;

    fn make_frame(width: usize, height: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                for c in 0..CHANNELS {
                    data.push((((x * 17) ^ (y * 9) ^ (x * y) ^ (c * 77)) & 0xFF) as u8);
                }
            }
        }
        data
    }

    fn extract_patch(data: &[u8], width: usize, center: Point, radius: usize) -> Vec<u8> {
        let side = 2 * radius + 1;
        let mut out = Vec::with_capacity(side * side * CHANNELS);
        for ty in 0..side {
            let sy = (center.y - radius as i32) as usize + ty;
            for tx in 0..side {
                let sx = (center.x - radius as i32) as usize + tx;
                for c in 0..CHANNELS {
                    out.push(data[(sy * width + sx) * CHANNELS + c]);
                }
            }
        }
        out
    }

    #[test]
    fn sad_exact_match_scores_one_at_true_offset() {
        let width = 32;
        let height = 32;
        let data = make_frame(width, height);
        let img = RgbView::from_slice(&data, width, height).unwrap();

        let radius = 2;
        let truth = Point::new(17, 14);
        let tpl = extract_patch(&data, width, truth, radius);

        // Search from an offset center; the true position sits at (+2, -1).
        let mut map = MatchMap::new(3);
        match_sad(img, &tpl, radius, Point::new(15, 15), &mut map);

        let side = map.side();
        let cell = map.cells()[2 * side + 5];
        assert_eq!(cell, 1);
        for (i, &v) in map.cells().iter().enumerate() {
            if i != (2 * side + 5) {
                assert!(v > 1, "cell {i} should be a worse match, got {v}");
            }
        }
    }

    #[test]
    fn ssd_matches_bruteforce_reference() {
        let width = 24;
        let height = 20;
        let data = make_frame(width, height);
        let img = RgbView::from_slice(&data, width, height).unwrap();

        let radius = 1;
        let center = Point::new(10, 9);
        let tpl = extract_patch(&data, width, Point::new(11, 9), radius);

        let mut map = MatchMap::new(2);
        match_ssd(img, &tpl, radius, center, &mut map);

        let side = 2 * radius + 1;
        let npix = (side * side) as i64;
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let mut sum = 0i64;
                for ty in 0..side {
                    for tx in 0..side {
                        let sy = (center.y + dy - radius as i32) as usize + ty;
                        let sx = (center.x + dx - radius as i32) as usize + tx;
                        for c in 0..CHANNELS {
                            let a = i64::from(data[(sy * width + sx) * CHANNELS + c]);
                            let b = i64::from(tpl[(ty * side + tx) * CHANNELS + c]);
                            sum += (a - b) * (a - b);
                        }
                    }
                }
                let idx = ((dy + 2) * 5 + dx + 2) as usize;
                assert_eq!(map.cells()[idx], (sum / npix) as i32 + 1);
            }
        }
    }

    #[test]
    fn out_of_bounds_cells_hold_sentinel_zero() {
        let width = 16;
        let height = 16;
        let data = make_frame(width, height);
        let img = RgbView::from_slice(&data, width, height).unwrap();

        let radius = 2;
        let tpl = extract_patch(&data, width, Point::new(3, 3), radius);
        let mut map = MatchMap::new(3);
        match_sad(img, &tpl, radius, Point::new(3, 3), &mut map);

        let side = map.side();
        // Placements left of column 2 or above row 2 cannot fit the patch.
        assert_eq!(map.cells()[0], 0);
        assert_eq!(map.cells()[1], 0);
        assert_eq!(map.cells()[side], 0);
        // The window center itself is a valid exact match.
        assert_eq!(map.cells()[3 * side + 3], 1);
    }

    #[test]
    fn ncc_exact_match_scores_full_correlation() {
        let width = 32;
        let height = 32;
        let data = make_frame(width, height);
        let img = RgbView::from_slice(&data, width, height).unwrap();

        let radius = 3;
        let center = Point::new(16, 16);
        let tpl = extract_patch(&data, width, center, radius);

        let mut map = MatchMap::new(2);
        match_ncc(img, &tpl, radius, center, &mut map);

        let side = map.side();
        let center_cell = map.cells()[2 * side + 2];
        // The flooring integer sqrt can push each channel a hair past 256.
        assert!(
            (3 * 256 + 1..=3 * 258 + 1).contains(&center_cell),
            "expected full correlation, got {center_cell}"
        );
        for (i, &v) in map.cells().iter().enumerate() {
            if i != 2 * side + 2 {
                assert!(v < center_cell, "cell {i} beats the exact match");
            }
        }
    }

    #[test]
    fn ncc_is_invariant_to_brightness_offset() {
        let width = 32;
        let height = 32;
        let data = make_frame(width, height);

        let radius = 3;
        let center = Point::new(16, 16);
        let tpl = extract_patch(&data, width, center, radius);

        // Halving every channel is an affine intensity change.
        let dimmed: Vec<u8> = data.iter().map(|&v| v / 2).collect();
        let dimmed_img = RgbView::from_slice(&dimmed, width, height).unwrap();

        let mut map = MatchMap::new(2);
        match_ncc(dimmed_img, &tpl, radius, center, &mut map);
        let side = map.side();
        let center_cell = map.cells()[2 * side + 2];
        assert!(
            center_cell >= 3 * 250,
            "expected near-full correlation, got {center_cell}"
        );
    }
}
