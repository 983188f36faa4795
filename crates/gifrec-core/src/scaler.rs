//! Nearest-neighbor downscaling.
//!
//! Recorded screens are mostly text and hard UI edges, so pixels are
//! sampled rather than filtered: every destination pixel copies all four
//! channels of exactly one source pixel.

use crate::frame::{CanonicalFrame, CHANNELS};

/// Whether a frame of `width` must be shrunk to honor `max_width`
pub fn needs_scaling(width: u32, max_width: u32) -> bool {
    max_width > 0 && width > max_width
}

/// Output size for a frame shrunk to `max_width`, aspect ratio preserved.
///
/// Equivalent to `floor(dim * max_width / width)` for both axes; integer
/// arithmetic keeps the width exactly at `max_width`.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if !needs_scaling(width, max_width) {
        return (width, height);
    }
    let new_height = (height as u64 * max_width as u64 / width as u64).max(1) as u32;
    (max_width, new_height)
}

/// Shrink `frame` so that its width does not exceed `max_width`.
///
/// Returns the input untouched when `max_width` is 0, the frame already
/// fits, or the frame has no rows.
pub fn scale(frame: CanonicalFrame, max_width: u32) -> CanonicalFrame {
    if !needs_scaling(frame.width, max_width) || frame.height == 0 {
        return frame;
    }

    let (src_w, src_h) = (frame.width as u64, frame.height as u64);
    let (dst_w, dst_h) = scaled_dimensions(frame.width, frame.height, max_width);
    let scale_num = max_width as u64;

    let mut pixels = Vec::with_capacity(CanonicalFrame::buffer_len(dst_w, dst_h));
    for y in 0..dst_h as u64 {
        // y / factor == y * src_w / max_width
        let src_y = (y * src_w / scale_num).min(src_h - 1);
        let row = src_y as usize * src_w as usize;
        for x in 0..dst_w as u64 {
            let src_x = (x * src_w / scale_num).min(src_w - 1);
            let offset = (row + src_x as usize) * CHANNELS;
            pixels.extend_from_slice(&frame.pixels[offset..offset + CHANNELS]);
        }
    }

    CanonicalFrame {
        pixels,
        width: dst_w,
        height: dst_h,
    }
}
