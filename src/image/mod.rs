//! Image views, owned RGB buffers, and region-of-interest rectangles.
//!
//! `RgbView` is a borrowed 2D view into an interleaved 8-bit RGB buffer with
//! an explicit stride. The stride counts pixels between the starts of
//! consecutive rows, so a stride larger than the width represents padded
//! rows. Tracking state snapshots use the owned `RgbImage`.

use crate::util::{TrackError, TrackResult};

pub mod shrink;

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 3;

/// Region of interest within a frame, `right`/`bottom` exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Roi {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Roi {
    /// Returns the ROI covering a whole `width` x `height` frame.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        }
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expand(self, margin: i32) -> Self {
        Self {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }

    /// Shrinks the rectangle by `margin` on every side.
    pub fn shrink(self, margin: i32) -> Self {
        self.expand(-margin)
    }

    /// Clamps the rectangle to a `width` x `height` frame.
    pub fn clamp(self, width: usize, height: usize) -> Self {
        Self {
            left: self.left.clamp(0, width as i32),
            top: self.top.clamp(0, height as i32),
            right: self.right.clamp(0, width as i32),
            bottom: self.bottom.clamp(0, height as i32),
        }
    }

    /// Maps the rectangle into the next coarser pyramid level.
    pub fn half(self) -> Self {
        Self {
            left: self.left / 2,
            top: self.top / 2,
            right: self.right / 2,
            bottom: self.bottom / 2,
        }
    }

    /// Whether `(x, y)` lies inside the rectangle.
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// Borrowed interleaved-RGB view with an explicit stride (in pixels).
#[derive(Copy, Clone, Debug)]
pub struct RgbView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> RgbView<'a> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [u8], width: usize, height: usize) -> TrackResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> TrackResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(TrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in pixels between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the interleaved bytes of row `y`, `width * 3` long.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?.checked_mul(CHANNELS)?;
        let end = start.checked_add(self.width.checked_mul(CHANNELS)?)?;
        self.data.get(start..end)
    }

    /// Returns the three channel bytes at `(x, y)` if within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; CHANNELS]> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let off = x * CHANNELS;
        Some([row[off], row[off + 1], row[off + 2]])
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> TrackResult<usize> {
    if width == 0 || height == 0 {
        return Err(TrackError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(TrackError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(TrackError::InvalidDimensions { width, height })?;
    Ok(needed)
}

/// Owned contiguous interleaved-RGB image buffer.
#[derive(Clone)]
pub struct RgbImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl RgbImage {
    /// Allocates a zero-filled image.
    pub fn new(width: usize, height: usize) -> TrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidDimensions { width, height });
        }
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(CHANNELS))
            .ok_or(TrackError::InvalidDimensions { width, height })?;
        Ok(Self {
            data: vec![0u8; len],
            width,
            height,
        })
    }

    /// Wraps an existing contiguous buffer of exactly `width * height * 3` bytes.
    pub fn from_vec(data: Vec<u8>, width: usize, height: usize) -> TrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(CHANNELS))
            .ok_or(TrackError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(TrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(TrackError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> RgbView<'_> {
        RgbView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the backing bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the backing bytes mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copies `src` into this buffer; dimensions must match.
    pub fn copy_from(&mut self, src: RgbView<'_>) -> TrackResult<()> {
        if src.width() != self.width || src.height() != self.height {
            return Err(TrackError::FrameSizeMismatch {
                width: self.width,
                height: self.height,
                got_width: src.width(),
                got_height: src.height(),
            });
        }
        let row_bytes = self.width * CHANNELS;
        for y in 0..self.height {
            let row = src.row(y).expect("row within bounds for copy");
            let start = y * row_bytes;
            self.data[start..start + row_bytes].copy_from_slice(row);
        }
        Ok(())
    }
}
