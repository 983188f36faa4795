//! Rendering of command results.
//!
//! `--output table` prints comfy-table summaries, `json` prints one
//! [`Report`] document per command on stdout, and `quiet` prints nothing so
//! the exit code carries the outcome. Progress notes always go to stderr,
//! which keeps stdout parseable in JSON mode.

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Table};
use gifrec_core::{Conversion, ConversionStats};
use serde::Serialize;

use crate::config::Config;
use crate::ExitCode;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// One JSON document on stdout
    Json,
    /// Exit code only
    Quiet,
}

/// JSON document emitted for every command in `--output json` mode
#[derive(Debug, Serialize)]
pub struct Report<T: Serialize> {
    pub success: bool,
    pub command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportError>,
    /// RFC 3339 time the report was produced
    pub timestamp: String,
}

/// Failure details inside a [`Report`]
#[derive(Debug, Serialize)]
pub struct ReportError {
    pub message: String,
    /// Symbolic exit code, e.g. `NO_FRAMES`
    pub code: &'static str,
    /// Numeric process exit status
    pub status: i32,
    /// What the exit code means
    pub meaning: &'static str,
}

impl<T: Serialize> Report<T> {
    pub fn ok(command: &'static str, data: T) -> Self {
        Self {
            success: true,
            command,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl Report<()> {
    pub fn failed(command: &'static str, message: &str, code: ExitCode) -> Self {
        Self {
            success: false,
            command,
            data: None,
            error: Some(ReportError {
                message: message.to_string(),
                code: code.name(),
                status: code.into(),
                meaning: code.description(),
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Conversion result as reported to the user
#[derive(Debug, Serialize)]
pub struct ConversionOutput {
    pub output: String,
    pub frames_in: usize,
    #[serde(flatten)]
    pub stats: ConversionStats,
}

impl ConversionOutput {
    pub fn new(conversion: &Conversion, frames_in: usize) -> Self {
        Self {
            output: conversion.path.display().to_string(),
            frames_in,
            stats: conversion.stats.clone(),
        }
    }
}

/// Prints command results in the selected [`OutputFormat`]
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Whether `--verbose` progress notes are shown
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn render_conversion(&self, result: &ConversionOutput) -> Option<String> {
        match self.format {
            OutputFormat::Table => Some(conversion_table(result)),
            OutputFormat::Json => Some(to_json(&Report::ok("convert", result))),
            OutputFormat::Quiet => None,
        }
    }

    /// Resolved configuration; tables mode prints it as TOML
    pub fn render_config(&self, config: &Config) -> Option<String> {
        match self.format {
            OutputFormat::Table => Some(
                toml::to_string_pretty(config)
                    .unwrap_or_else(|e| format!("# failed to render config: {e}")),
            ),
            OutputFormat::Json => Some(to_json(&Report::ok("config show", config))),
            OutputFormat::Quiet => None,
        }
    }

    pub fn render_failure(
        &self,
        command: &'static str,
        message: &str,
        code: ExitCode,
    ) -> Option<String> {
        match self.format {
            OutputFormat::Table => Some(format!("✗ {message}")),
            OutputFormat::Json => Some(to_json(&Report::failed(command, message, code))),
            OutputFormat::Quiet => None,
        }
    }

    /// Print a failure where the format expects it and return its exit code
    pub fn fail(&self, command: &'static str, message: &str, code: ExitCode) -> ExitCode {
        if let Some(text) = self.render_failure(command, message, code) {
            match self.format {
                OutputFormat::Json => println!("{text}"),
                _ => eprintln!("{text}"),
            }
        }
        code
    }

    /// Progress note, verbose table mode only
    pub fn note(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    /// Closing status line for table mode
    pub fn done(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("✓ {message}");
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"success\": false, \"error\": \"{e}\"}}"))
}

fn conversion_table(result: &ConversionOutput) -> String {
    let stats = &result.stats;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);

    let rows = [
        ("Output", result.output.clone()),
        ("Input Frames", result.frames_in.to_string()),
        ("Frames Written", stats.frames_added.to_string()),
        ("Duplicates Dropped", stats.frames_skipped_duplicate.to_string()),
        ("Size Mismatches", stats.frames_skipped_dimension_mismatch.to_string()),
        ("Undecodable", stats.frames_skipped_decode.to_string()),
        ("Palettes Reused", stats.palettes_reused.to_string()),
        ("File Size", format_bytes(stats.bytes_written)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }

    table.to_string()
}

/// Human-readable byte count using binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}
