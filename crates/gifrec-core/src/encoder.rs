//! Animated GIF writer.
//!
//! Wraps [`gif::Encoder`] with the knobs a recorder needs: loop mode,
//! per-frame delay, quantizer choice and quality, and the palette reuse
//! optimizer. Every frame is written with its own local color table.

use std::borrow::Cow;
use std::io::Write;

use tracing::{debug, trace};

pub use gif::Repeat;

use crate::config::{QuantizerAlgorithm, MAX_QUALITY, MIN_QUALITY};
use crate::errors::ConvertError;
use crate::frame::CanonicalFrame;
use crate::quantize::{map_to_palette, palette_coverage, quantize, IndexedFrame};

/// Parameters fixed when the encoder is created
#[derive(Debug, Clone)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub algorithm: QuantizerAlgorithm,
    pub use_optimizer: bool,
    /// Expected number of frames; informational only
    pub frame_count_hint: usize,
}

/// How a frame's palette was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteSource {
    /// Quantized from this frame's pixels
    Fresh,
    /// Taken over from the previous frame
    Reused,
}

/// Streaming GIF encoder over any byte sink
pub struct GifEncoder<W: Write> {
    encoder: gif::Encoder<W>,
    width: u16,
    height: u16,
    algorithm: QuantizerAlgorithm,
    use_optimizer: bool,
    quality: u8,
    threshold: u8,
    delay_cs: u16,
    previous_palette: Option<Vec<u8>>,
    frames_written: u64,
    palettes_reused: u64,
}

impl<W: Write> GifEncoder<W> {
    /// Write the GIF header and logical screen descriptor.
    pub fn new(writer: W, settings: EncoderSettings) -> Result<Self, ConvertError> {
        let width = gif_dimension(settings.width, "width")?;
        let height = gif_dimension(settings.height, "height")?;

        let encoder = gif::Encoder::new(writer, width, height, &[])?;
        debug!(
            width,
            height,
            algorithm = %settings.algorithm,
            optimizer = settings.use_optimizer,
            frames = settings.frame_count_hint,
            "GIF encoder started"
        );

        Ok(Self {
            encoder,
            width,
            height,
            algorithm: settings.algorithm,
            use_optimizer: settings.use_optimizer,
            quality: 10,
            threshold: 90,
            delay_cs: 10,
            previous_palette: None,
            frames_written: 0,
            palettes_reused: 0,
        })
    }

    /// Set the loop mode (written as the NETSCAPE2.0 extension)
    pub fn set_repeat(&mut self, repeat: Repeat) -> Result<(), ConvertError> {
        self.encoder.set_repeat(repeat)?;
        Ok(())
    }

    /// Delay applied to subsequent frames, stored in centiseconds
    pub fn set_delay_ms(&mut self, delay_ms: u32) {
        self.delay_cs = ((delay_ms + 5) / 10).min(u16::MAX as u32) as u16;
    }

    /// Quantizer quality, clamped to 1..=20
    pub fn set_quality(&mut self, quality: u8) {
        self.quality = quality.clamp(MIN_QUALITY, MAX_QUALITY);
    }

    /// Palette reuse threshold in percent, clamped to 0..=100
    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold.min(100);
    }

    pub fn delay_cs(&self) -> u16 {
        self.delay_cs
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn palettes_reused(&self) -> u64 {
        self.palettes_reused
    }

    /// Quantize and write one RGBA frame of the encoder's size.
    pub fn add_frame(&mut self, rgba: &[u8]) -> Result<PaletteSource, ConvertError> {
        let expected = CanonicalFrame::buffer_len(self.width as u32, self.height as u32);
        if rgba.len() != expected {
            return Err(ConvertError::Encode(format!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                rgba.len(),
                expected,
                self.width,
                self.height
            )));
        }

        let (indexed, source) = self.index_frame(rgba);

        let frame = gif::Frame {
            width: self.width,
            height: self.height,
            delay: self.delay_cs,
            palette: Some(indexed.palette.clone()),
            buffer: Cow::Owned(indexed.indices),
            ..gif::Frame::default()
        };
        self.encoder.write_frame(&frame)?;

        self.previous_palette = Some(indexed.palette);
        self.frames_written += 1;
        if source == PaletteSource::Reused {
            self.palettes_reused += 1;
        }
        trace!(frame = self.frames_written, ?source, "GIF frame written");
        Ok(source)
    }

    fn index_frame(&self, rgba: &[u8]) -> (IndexedFrame, PaletteSource) {
        if self.use_optimizer {
            if let Some(previous) = &self.previous_palette {
                let coverage = palette_coverage(rgba, previous);
                if coverage >= self.threshold as f64 {
                    debug!(coverage, "reusing previous palette");
                    return (map_to_palette(rgba, previous), PaletteSource::Reused);
                }
            }
        }

        let indexed = quantize(rgba, self.width, self.height, self.algorithm, self.quality);
        (indexed, PaletteSource::Fresh)
    }

    /// Write the trailer and hand back the underlying writer, flushed.
    pub fn finish(self) -> Result<W, ConvertError> {
        let mut writer = self.encoder.into_inner()?;
        writer.flush()?;
        Ok(writer)
    }
}

fn gif_dimension(value: u32, axis: &str) -> Result<u16, ConvertError> {
    match u16::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConvertError::Encode(format!(
            "{axis} {value} is outside the GIF range 1..=65535"
        ))),
    }
}
