//! Configuration management for the gifrec CLI
//!
//! Configuration is stored in TOML format. Values are resolved in order of
//! increasing precedence: built-in defaults, config file, environment
//! (`GIFREC_*`), command-line flags.
//!
//! # Configuration File Locations
//!
//! - Linux: `~/.config/gifrec/config.toml`
//! - macOS: `~/Library/Application Support/io.gifrec.gifrec/config.toml`
//! - Windows: `%APPDATA%\gifrec\gifrec\config\config.toml`

use std::path::{Path, PathBuf};

use gifrec_core::{ConversionConfig, QuantizerAlgorithm};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding `conversion.fps`
pub const ENV_FPS: &str = "GIFREC_FPS";
/// Environment variable overriding `conversion.max_width`
pub const ENV_MAX_WIDTH: &str = "GIFREC_MAX_WIDTH";
/// Environment variable overriding `conversion.quality`
pub const ENV_QUALITY: &str = "GIFREC_QUALITY";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Conversion tunables out of range
    #[error("Invalid configuration: {0}")]
    Conversion(#[from] gifrec_core::config::ConfigError),
}

/// CLI configuration
///
/// # Example TOML
///
/// ```toml
/// [conversion]
/// fps = 10
/// quality = 10
/// algorithm = "octree"  # "octree" | "neuquant"
/// use_optimizer = true
/// threshold = 90
/// deduplicate_frames = true
/// deduplication_threshold = 99.0
/// max_width = 0  # 0 = keep source width
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Conversion tunables
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "gifrec", "gifrec")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write the commented sample config to `path`.
    ///
    /// Returns `false` without touching the file when it already exists and
    /// `force` is not set.
    pub fn write_sample(path: &Path, force: bool) -> Result<bool, ConfigError> {
        if path.exists() && !force {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::sample_toml())?;
        Ok(true)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        self.conversion.validate()?;
        Ok(())
    }

    /// Apply `GIFREC_*` overrides from the process environment
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `GIFREC_*` overrides read through `lookup`
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(fps) = parse_env(&lookup, ENV_FPS)? {
            self.conversion.fps = fps;
        }
        if let Some(max_width) = parse_env(&lookup, ENV_MAX_WIDTH)? {
            self.conversion.max_width = max_width;
        }
        if let Some(quality) = parse_env(&lookup, ENV_QUALITY)? {
            self.conversion.quality = quality;
        }
        Ok(self)
    }

    /// Generate a sample configuration file content
    pub fn sample_toml() -> &'static str {
        r#"# gifrec configuration

[conversion]
# Output frame rate; frames are shown for 1000 / fps milliseconds
fps = 10
# Quantizer quality: 1 (best, slowest) to 20 (fastest)
quality = 10
# Palette algorithm: "octree" or "neuquant"
algorithm = "octree"
# Reuse the previous frame's palette when it still covers the frame
use_optimizer = true
# Percentage of covered colors needed to reuse a palette (0-100)
threshold = 90
# Drop frames that barely differ from the last kept frame
deduplicate_frames = true
# Similarity percentage at or above which a frame is dropped
deduplication_threshold = 99.0
# Maximum output width in pixels (0 = keep source width)
max_width = 0

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ConfigError::ValidationError(format!("{key}='{raw}' is not a valid number"))
        }),
    }
}

/// CLI configuration overrides
///
/// Command-line arguments take precedence over environment and file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub fps: Option<u32>,
    pub quality: Option<u8>,
    pub algorithm: Option<QuantizerAlgorithm>,
    /// `Some(false)` from `--no-optimizer`
    pub use_optimizer: Option<bool>,
    pub threshold: Option<u8>,
    /// `Some(false)` from `--no-dedup`
    pub deduplicate_frames: Option<bool>,
    pub deduplication_threshold: Option<f64>,
    pub max_width: Option<u32>,
    /// Debug flag override
    pub debug: Option<bool>,
}

impl Config {
    /// Apply CLI overrides to configuration
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        let conversion = &mut self.conversion;
        if let Some(fps) = overrides.fps {
            conversion.fps = fps;
        }
        if let Some(quality) = overrides.quality {
            conversion.quality = quality;
        }
        if let Some(algorithm) = overrides.algorithm {
            conversion.algorithm = algorithm;
        }
        if let Some(use_optimizer) = overrides.use_optimizer {
            conversion.use_optimizer = use_optimizer;
        }
        if let Some(threshold) = overrides.threshold {
            conversion.threshold = threshold;
        }
        if let Some(dedup) = overrides.deduplicate_frames {
            conversion.deduplicate_frames = dedup;
        }
        if let Some(threshold) = overrides.deduplication_threshold {
            conversion.deduplication_threshold = threshold;
        }
        if let Some(max_width) = overrides.max_width {
            conversion.max_width = max_width;
        }
        if overrides.debug == Some(true) {
            self.logging.level = "debug".to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.conversion, ConversionConfig::default());
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_toml_matches_defaults() {
        let config: Config = toml::from_str(Config::sample_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[conversion]\nmax_width = 640\n").unwrap();
        assert_eq!(config.conversion.max_width, 640);
        assert_eq!(config.conversion.fps, 10);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.conversion.fps = 25;
        config.conversion.algorithm = QuantizerAlgorithm::NeuQuant;
        config.logging.level = "debug".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        std::fs::write(&path, "[conversion]\nquality = 50\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Conversion(_))));

        std::fs::write(&path, "[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::ValidationError(_))));

        std::fs::write(&path, "not toml [").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_from_missing_custom_path() {
        let result = Config::load_from(Some(Path::new("/nonexistent/gifrec.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_write_sample_respects_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        assert!(Config::write_sample(&path, false).unwrap());
        std::fs::write(&path, "# mine\n").unwrap();
        assert!(!Config::write_sample(&path, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        assert!(Config::write_sample(&path, true).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), Config::sample_toml());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_env_from(env(&[(ENV_FPS, "24"), (ENV_MAX_WIDTH, " 800 "), (ENV_QUALITY, "5")]))
            .unwrap();
        assert_eq!(config.conversion.fps, 24);
        assert_eq!(config.conversion.max_width, 800);
        assert_eq!(config.conversion.quality, 5);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let result = Config::default().with_env_from(env(&[(ENV_FPS, "fast")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let config = Config::default()
            .with_env_from(env(&[(ENV_FPS, "24")]))
            .unwrap()
            .with_overrides(&CliOverrides {
                fps: Some(5),
                use_optimizer: Some(false),
                deduplicate_frames: Some(false),
                debug: Some(true),
                ..CliOverrides::default()
            });

        assert_eq!(config.conversion.fps, 5);
        assert!(!config.conversion.use_optimizer);
        assert!(!config.conversion.deduplicate_frames);
        assert_eq!(config.logging.level, "debug");
        // untouched values survive
        assert_eq!(config.conversion.quality, 10);
    }
}
