//! Frame model shared by every pipeline stage.

use bytes::Bytes;
use serde::Serialize;

/// Bytes per pixel in the canonical layout (R, G, B, A)
pub const CHANNELS: usize = 4;

/// A captured frame as handed over by the capture collaborator.
///
/// `width` and `height` stay 0 until the frame has been decoded; the
/// compressed bytes are the only thing the capturer knows about.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Compressed image data (PNG, JPEG, ...)
    pub bytes: Bytes,
    /// Capture time in milliseconds
    pub timestamp_ms: u64,
    /// Width in pixels, 0 when unknown
    pub width: u32,
    /// Height in pixels, 0 when unknown
    pub height: u32,
}

impl RawFrame {
    /// Create a frame with unknown geometry
    pub fn new(bytes: impl Into<Bytes>, timestamp_ms: u64) -> Self {
        Self {
            bytes: bytes.into(),
            timestamp_ms,
            width: 0,
            height: 0,
        }
    }
}

/// Decoded, uncompressed RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CanonicalFrame {
    /// Wrap an RGBA buffer. Returns `None` for an empty geometry or when the
    /// buffer length does not match it.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != Self::buffer_len(width, height) {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    /// Frame filled with one color
    #[cfg(test)]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(pixel_count * CHANNELS);
        for _ in 0..pixel_count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Expected buffer length for the given geometry
    pub fn buffer_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * CHANNELS
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[cfg(test)]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RGBA value at (x, y)
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let p = &self.pixels[offset..offset + CHANNELS];
        Some([p[0], p[1], p[2], p[3]])
    }
}

/// Counters for one conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Frames pushed into the encoder
    pub frames_added: u64,
    /// Frames dropped as near-duplicates of the last accepted frame
    pub frames_skipped_duplicate: u64,
    /// Frames dropped because their geometry differed from the first frame
    pub frames_skipped_dimension_mismatch: u64,
    /// Frames dropped because they could not be decoded
    pub frames_skipped_decode: u64,
    /// Frames encoded with the previous frame's palette
    pub palettes_reused: u64,
    /// Bytes written to the output file
    pub bytes_written: u64,
}

impl ConversionStats {
    /// Total frames that did not make it into the output
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped_duplicate
            + self.frames_skipped_dimension_mismatch
            + self.frames_skipped_decode
    }
}
