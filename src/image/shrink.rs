//! ROI-aware 2x2 box-filter halving of interleaved RGB buffers.
//!
//! Each output channel is the plain average of the corresponding 2x2 input
//! block, `(a + b + c + d) >> 2`. Only the rectangle covering the ROI plus a
//! caller-supplied margin is recomputed; the rest of the destination buffer
//! keeps its previous contents.

use crate::image::{RgbImage, RgbView, Roi, CHANNELS};

/// Downsamples `src` into `dst`, which must be `src` halved (floor) per axis.
///
/// The processed rectangle is `roi` expanded by `margin`, clamped to the
/// source bounds, and forced to even coordinates so it maps cleanly onto
/// 2x2 blocks.
pub(crate) fn shrink_rgb(src: RgbView<'_>, roi: Roi, margin: i32, dst: &mut RgbImage) {
    debug_assert_eq!(dst.width(), src.width() / 2);
    debug_assert_eq!(dst.height(), src.height() / 2);

    let rect = roi.expand(margin).clamp(src.width(), src.height());
    let left = (rect.left & !1) as usize;
    let top = (rect.top & !1) as usize;
    let right = (rect.right & !1) as usize;
    let bottom = (rect.bottom & !1) as usize;
    if left >= right || top >= bottom {
        return;
    }

    let dst_width = dst.width();
    let out = dst.as_mut_slice();
    let mut y = top;
    while y < bottom {
        let row0 = src.row(y).expect("row within bounds for shrink");
        let row1 = src.row(y + 1).expect("row within bounds for shrink");
        let dst_row = (y / 2) * dst_width * CHANNELS;

        let mut x = left;
        while x < right {
            let i = x * CHANNELS;
            let o = dst_row + (x / 2) * CHANNELS;
            for c in 0..CHANNELS {
                let sum = u16::from(row0[i + c])
                    + u16::from(row0[i + CHANNELS + c])
                    + u16::from(row1[i + c])
                    + u16::from(row1[i + CHANNELS + c]);
                out[o + c] = (sum >> 2) as u8;
            }
            x += 2;
        }
        y += 2;
    }
}
