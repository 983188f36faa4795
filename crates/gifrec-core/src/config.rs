//! Conversion tunables.
//!
//! A [`ConversionConfig`] is built once per conversion and never mutated
//! while a run is in progress. Every field has a default so partial TOML
//! tables deserialize cleanly.
//!
//! # Example TOML
//!
//! ```toml
//! fps = 10
//! quality = 10
//! algorithm = "octree"   # "octree" | "neuquant"
//! use_optimizer = true
//! threshold = 90
//! deduplicate_frames = true
//! deduplication_threshold = 99
//! max_width = 0          # 0 = keep captured width
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("{0}")]
    ValidationError(String),

    /// Unknown quantizer name
    #[error("unknown quantization algorithm '{0}', expected 'octree' or 'neuquant'")]
    UnknownAlgorithm(String),
}

/// Palette reduction method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantizerAlgorithm {
    #[default]
    Octree,
    #[serde(alias = "neu_quant")]
    NeuQuant,
}

impl FromStr for QuantizerAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "octree" => Ok(Self::Octree),
            "neuquant" | "neu_quant" => Ok(Self::NeuQuant),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for QuantizerAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Octree => write!(f, "octree"),
            Self::NeuQuant => write!(f, "neuquant"),
        }
    }
}

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 20;

/// Tunables for one conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Output frame rate; the inter-frame delay is `1000 / fps` ms
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Quantizer quality, 1 (best, slowest) to 20 (fastest)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Palette reduction method
    #[serde(default)]
    pub algorithm: QuantizerAlgorithm,

    /// Reuse the previous palette when it still fits the frame
    #[serde(default = "default_true")]
    pub use_optimizer: bool,

    /// Percentage of matching colors needed to reuse a palette (0-100)
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Drop frames that are near-identical to the last accepted frame
    #[serde(default = "default_true")]
    pub deduplicate_frames: bool,

    /// Similarity percentage at or above which a frame is dropped
    #[serde(default = "default_deduplication_threshold")]
    pub deduplication_threshold: f64,

    /// Upper bound on output width, 0 disables scaling
    #[serde(default)]
    pub max_width: u32,
}

fn default_fps() -> u32 {
    10
}

fn default_quality() -> u8 {
    10
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> u8 {
    90
}

fn default_deduplication_threshold() -> f64 {
    99.0
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            quality: default_quality(),
            algorithm: QuantizerAlgorithm::default(),
            use_optimizer: true,
            threshold: default_threshold(),
            deduplicate_frames: true,
            deduplication_threshold: default_deduplication_threshold(),
            max_width: 0,
        }
    }
}

impl ConversionConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::ValidationError(
                "fps must be at least 1, got 0".to_string(),
            ));
        }

        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(ConfigError::ValidationError(format!(
                "quality must be between {} and {}, got {}",
                MIN_QUALITY, MAX_QUALITY, self.quality
            )));
        }

        if self.threshold > 100 {
            return Err(ConfigError::ValidationError(format!(
                "threshold must be between 0 and 100, got {}",
                self.threshold
            )));
        }

        if !(0.0..=100.0).contains(&self.deduplication_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "deduplication_threshold must be between 0 and 100, got {}",
                self.deduplication_threshold
            )));
        }

        Ok(())
    }

    /// Delay between output frames in milliseconds
    pub fn frame_delay_ms(&self) -> u32 {
        1000 / self.fps.max(1)
    }

    /// Whether frames wider than `max_width` get downscaled
    pub fn scaling_enabled(&self) -> bool {
        self.max_width > 0
    }
}
