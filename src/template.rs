//! Template store operations.
//!
//! A template is an interleaved RGB patch of `(2 * radius + 1)^2` pixels.
//! Targets keep two of them: the pristine snapshot captured at acquisition
//! and the adaptive working copy refreshed by fixed-point blending.

use crate::image::{RgbView, CHANNELS};
use crate::target::Point;

/// Patch side length for a template radius.
pub(crate) fn template_side(radius: usize) -> usize {
    2 * radius + 1
}

/// Byte length of a template buffer for a template radius.
pub(crate) fn template_bytes(radius: usize) -> usize {
    let side = template_side(radius);
    side * side * CHANNELS
}

/// Copies the patch centered at `center` into `out`.
///
/// Rows and columns falling outside the image are clipped; the corresponding
/// bytes of `out` keep their previous values.
pub(crate) fn copy_patch(img: RgbView<'_>, center: Point, radius: usize, out: &mut [u8]) {
    debug_assert_eq!(out.len(), template_bytes(radius));
    let side = template_side(radius) as i32;
    let r = radius as i32;
    let width = img.width() as i32;
    let height = img.height() as i32;

    for ty in 0..side {
        let sy = center.y - r + ty;
        if sy < 0 || sy >= height {
            continue;
        }
        let row = img.row(sy as usize).expect("row within bounds for copy");

        let tx0 = (r - center.x).max(0);
        let tx1 = (width - center.x + r).min(side);
        if tx0 >= tx1 {
            continue;
        }
        let len = ((tx1 - tx0) as usize) * CHANNELS;
        let src = ((center.x - r + tx0) as usize) * CHANNELS;
        let dst = ((ty * side + tx0) as usize) * CHANNELS;
        out[dst..dst + len].copy_from_slice(&row[src..src + len]);
    }
}

/// Refreshes the adaptive template from the pristine one and the frame patch
/// at `center`.
///
/// `weight == 0` restores the pristine template bit-exactly, `weight == 255`
/// copies the fresh patch, anything in between blends per byte with
/// `(orig * (256 - w) + new * w) >> 8`.
pub(crate) fn update_template(
    orig: &[u8],
    img: RgbView<'_>,
    center: Point,
    radius: usize,
    weight: u8,
    feature: &mut [u8],
) {
    debug_assert_eq!(orig.len(), feature.len());
    match weight {
        0 => feature.copy_from_slice(orig),
        255 => copy_patch(img, center, radius, feature),
        _ => {
            // Clipped-out patch bytes fall back to the pristine value.
            feature.copy_from_slice(orig);

            let side = template_side(radius) as i32;
            let r = radius as i32;
            let width = img.width() as i32;
            let height = img.height() as i32;
            let w = u32::from(weight);
            let inv = 256 - w;

            for ty in 0..side {
                let sy = center.y - r + ty;
                if sy < 0 || sy >= height {
                    continue;
                }
                let row = img.row(sy as usize).expect("row within bounds for blend");

                let tx0 = (r - center.x).max(0);
                let tx1 = (width - center.x + r).min(side);
                if tx0 >= tx1 {
                    continue;
                }
                let len = ((tx1 - tx0) as usize) * CHANNELS;
                let src = ((center.x - r + tx0) as usize) * CHANNELS;
                let dst = ((ty * side + tx0) as usize) * CHANNELS;
                for b in 0..len {
                    let fresh = u32::from(row[src + b]);
                    let old = u32::from(orig[dst + b]);
                    feature[dst + b] = ((old * inv + fresh * w) >> 8) as u8;
                }
            }
        }
    }
}
