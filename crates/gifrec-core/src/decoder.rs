//! Compressed frame → canonical RGBA buffer.

use crate::errors::FrameError;
use crate::frame::{CanonicalFrame, RawFrame};

/// Decode compressed image bytes into a canonical RGBA frame.
///
/// The container format is sniffed from the data, so PNG screenshots and
/// JPEG captures are both accepted.
pub fn decode(bytes: &[u8]) -> Result<CanonicalFrame, FrameError> {
    if bytes.is_empty() {
        return Err(FrameError::Decode {
            reason: "empty frame buffer".to_string(),
        });
    }

    let image = image::load_from_memory(bytes).map_err(|e| FrameError::Decode {
        reason: e.to_string(),
    })?;

    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    CanonicalFrame::new(rgba.into_raw(), width, height).ok_or_else(|| FrameError::Decode {
        reason: format!("degenerate image size {width}x{height}"),
    })
}

/// Decode a captured frame
pub fn decode_raw_frame(frame: &RawFrame) -> Result<CanonicalFrame, FrameError> {
    decode(&frame.bytes).map_err(|e| match e {
        FrameError::Decode { reason } => FrameError::Decode {
            reason: format!("frame at {}ms: {reason}", frame.timestamp_ms),
        },
        other => other,
    })
}
