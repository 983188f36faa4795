//! Sampled frame similarity.
//!
//! Comparing every pixel of two full-HD frames is wasteful when the only
//! question is "did anything visible change". At most
//! [`MAX_SAMPLED_PIXELS`] evenly spaced pixels are compared on their color
//! channels; alpha is ignored.

use crate::frame::CHANNELS;

/// Upper bound on pixels compared per frame pair
pub const MAX_SAMPLED_PIXELS: usize = 10_000;

/// Distance between sampled pixel indices for a frame of `total_pixels`
pub fn sample_step(total_pixels: usize) -> usize {
    (total_pixels / MAX_SAMPLED_PIXELS).max(1)
}

/// Estimated percentage (0-100) of pixels whose RGB values are identical.
///
/// Buffers of different length are never similar and yield 0.
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let total_pixels = a.len() / CHANNELS;
    if total_pixels == 0 {
        return 0.0;
    }

    let step = sample_step(total_pixels);
    let mut sampled = 0usize;
    let mut matching = 0usize;

    for pixel in (0..total_pixels).step_by(step) {
        let offset = pixel * CHANNELS;
        if a[offset..offset + 3] == b[offset..offset + 3] {
            matching += 1;
        }
        sampled += 1;
    }

    matching as f64 / sampled as f64 * 100.0
}
