//! gifrec core - turns captured screen frames into an animated GIF.
//!
//! This crate implements:
//! - Frame decoding into a canonical RGBA layout
//! - Nearest-neighbor downscaling to a bounded width
//! - Sampled similarity analysis for duplicate frame dropping
//! - Palette quantization (octree, NeuQuant) with palette reuse
//! - GIF encoding streamed through a bounded sink to disk
//! - Recording session and review decision contexts for callers

#![forbid(unsafe_code)]

// Pipeline stages
pub mod decoder;
pub mod scaler;
pub mod similarity;
pub mod quantize;
pub mod encoder;
pub mod sink;
pub mod converter;

// Caller-owned contexts
pub mod session;
pub mod review;

// Supporting modules
pub mod config;
pub mod errors;
pub mod frame;

#[cfg(test)]
mod proptests;

pub use config::{ConversionConfig, QuantizerAlgorithm};
pub use converter::{convert_to_gif, Conversion, ConversionProgress, GifConverter};
pub use errors::{ConvertError, FrameError};
pub use frame::{CanonicalFrame, ConversionStats, RawFrame};
