//! Binary digit-by-digit integer square root.
//!
//! The NCC kernel derives standard deviations from these routines, and match
//! confidences are thresholded downstream, so the results must be bit-exact
//! and identical across platforms. No floating point is involved.

/// Returns `floor(sqrt(value))` for a `u32`.
pub fn sqrt_u32(value: u32) -> u32 {
    let mut op = value;
    let mut res = 0u32;
    let mut one = 1u32 << 30;

    while one > op {
        one >>= 2;
    }
    while one != 0 {
        if op >= res + one {
            op -= res + one;
            res = (res >> 1) + one;
        } else {
            res >>= 1;
        }
        one >>= 2;
    }
    res
}

/// Returns `floor(sqrt(value))` for a `u64`.
pub fn sqrt_u64(value: u64) -> u64 {
    let mut op = value;
    let mut res = 0u64;
    let mut one = 1u64 << 62;

    while one > op {
        one >>= 2;
    }
    while one != 0 {
        if op >= res + one {
            op -= res + one;
            res = (res >> 1) + one;
        } else {
            res >>= 1;
        }
        one >>= 2;
    }
    res
}
