//! CLI command definitions and argument parsing

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gifrec_core::{GifConverter, QuantizerAlgorithm};
use tracing::debug;

use crate::config::{CliOverrides, Config};
use crate::frames::{collect_inputs, load_frames};
use crate::output::{ConversionOutput, OutputFormat, Reporter};
use crate::ExitCode;

/// gifrec - turn captured screen frames into animated GIFs
#[derive(Parser, Debug)]
#[command(name = "gifrec")]
#[command(version, about = "Turn captured screen frames into animated GIFs")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, value_enum, ignore_case = true, default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Execute the CLI command with a pre-loaded configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let reporter = Reporter::new(self.output, self.verbose);
        match self.command {
            Commands::Convert(args) => args.execute(config, self.debug, reporter).await,
            Commands::Config(args) => args.execute(config, self.config.as_deref(), reporter),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert image files or frame directories into an animated GIF
    Convert(ConvertArgs),
    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the convert command
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Image files or directories of frames, in playback order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Destination GIF file
    #[arg(short = 'o', long = "out")]
    pub out: PathBuf,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Quantizer quality, 1 (best) to 20 (fastest)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Palette algorithm: octree or neuquant
    #[arg(long)]
    pub algorithm: Option<QuantizerAlgorithm>,

    /// Always build a fresh palette for every frame
    #[arg(long)]
    pub no_optimizer: bool,

    /// Color coverage (percent) needed to reuse the previous palette
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Keep near-identical consecutive frames
    #[arg(long)]
    pub no_dedup: bool,

    /// Similarity (percent) at which a frame counts as a duplicate
    #[arg(long)]
    pub dedup_threshold: Option<f64>,

    /// Downscale frames wider than this many pixels (0 = off)
    #[arg(long)]
    pub max_width: Option<u32>,
}

impl ConvertArgs {
    /// Flags that override config file and environment values
    pub fn overrides(&self, debug: bool) -> CliOverrides {
        CliOverrides {
            fps: self.fps,
            quality: self.quality,
            algorithm: self.algorithm,
            use_optimizer: self.no_optimizer.then_some(false),
            threshold: self.threshold,
            deduplicate_frames: self.no_dedup.then_some(false),
            deduplication_threshold: self.dedup_threshold,
            max_width: self.max_width,
            debug: debug.then_some(true),
        }
    }

    pub async fn execute(
        self,
        config: Config,
        debug: bool,
        reporter: Reporter,
    ) -> anyhow::Result<ExitCode> {
        const COMMAND: &str = "convert";

        let config = config.with_overrides(&self.overrides(debug));
        if let Err(e) = config.validate() {
            return Ok(reporter.fail(COMMAND, &e.to_string(), ExitCode::InvalidInput));
        }
        debug!(config = ?config.conversion, "Resolved conversion settings");

        let files = match collect_inputs(&self.inputs).await {
            Ok(files) => files,
            Err(e) => return Ok(reporter.fail(COMMAND, &e.to_string(), ExitCode::InvalidInput)),
        };

        reporter.note(&format!("Reading {} frames...", files.len()));
        let frames = match load_frames(&files, config.conversion.fps).await {
            Ok(frames) => frames,
            Err(e) => return Ok(reporter.fail(COMMAND, &e.to_string(), ExitCode::InvalidInput)),
        };
        let frames_in = frames.len();

        let mut converter = GifConverter::new(config.conversion);
        if reporter.is_verbose() {
            converter = converter.with_progress(move |p| {
                if p.processed == p.total || p.processed % 25 == 0 {
                    reporter.note(&format!(
                        "Encoded {}/{} frames ({:.0}%)",
                        p.processed,
                        p.total,
                        p.percent()
                    ));
                }
            });
        }

        reporter.note(&format!("Writing {}...", self.out.display()));
        match converter.convert(frames, &self.out).await {
            Ok(conversion) => {
                let summary = ConversionOutput::new(&conversion, frames_in);
                if let Some(text) = reporter.render_conversion(&summary) {
                    println!("{text}");
                }
                reporter.done(&format!("GIF written to {}", conversion.path.display()));
                Ok(ExitCode::Success)
            }
            Err(e) => Ok(reporter.fail(COMMAND, &e.to_string(), ExitCode::from(&e))),
        }
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the resolved configuration
    Show,
}

impl ConfigArgs {
    pub fn execute(
        self,
        config: Config,
        custom_path: Option<&Path>,
        reporter: Reporter,
    ) -> anyhow::Result<ExitCode> {
        match self.action {
            ConfigAction::Init { force } => {
                let path = match custom_path {
                    Some(path) => path.to_path_buf(),
                    None => Config::default_path()
                        .ok_or_else(|| anyhow::anyhow!("Could not determine the config directory"))?,
                };

                if !Config::write_sample(&path, force)? {
                    let message = format!(
                        "{} already exists. Use --force to overwrite it.",
                        path.display()
                    );
                    return Ok(reporter.fail("config init", &message, ExitCode::InvalidInput));
                }

                reporter.done(&format!("Config written to {}", path.display()));
                Ok(ExitCode::Success)
            }
            ConfigAction::Show => {
                if let Some(text) = reporter.render_config(&config) {
                    println!("{text}");
                }
                Ok(ExitCode::Success)
            }
        }
    }
}
