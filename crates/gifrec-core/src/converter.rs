//! Conversion orchestration.
//!
//! Drives one run from raw captured frames to a finished GIF on disk:
//! decode, scale, geometry check, duplicate check, encode, stream out.
//! Frame processing is CPU bound and runs on a blocking worker; the file
//! is written by the [`StreamingSink`] task in parallel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ConversionConfig;
use crate::decoder::decode_raw_frame;
use crate::encoder::{EncoderSettings, GifEncoder, Repeat};
use crate::errors::{ConvertError, FrameError};
use crate::frame::{CanonicalFrame, ConversionStats, RawFrame};
use crate::scaler;
use crate::similarity::similarity;
use crate::sink::{SinkWriter, StreamingSink};

/// Snapshot handed to the progress observer after every input frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionProgress {
    /// Input frames looked at so far
    pub processed: usize,
    /// Input frames in this run
    pub total: usize,
    pub stats: ConversionStats,
}

impl ConversionProgress {
    /// Completion in percent
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total as f64 * 100.0
    }
}

/// Progress observer, called from the encoding worker thread
pub type ProgressCallback = Arc<dyn Fn(&ConversionProgress) + Send + Sync>;

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Conversion {
    pub path: PathBuf,
    pub stats: ConversionStats,
}

/// Frame sequence to GIF converter
#[derive(Clone)]
pub struct GifConverter {
    config: ConversionConfig,
    progress: Option<ProgressCallback>,
}

impl GifConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Attach a progress observer
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ConversionProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Convert `frames` into an animated GIF at `output`.
    ///
    /// Missing parent directories are created. On any failure after the
    /// output file was opened, the partial file is removed.
    pub async fn convert(
        &self,
        frames: Vec<RawFrame>,
        output: impl AsRef<Path>,
    ) -> Result<Conversion, ConvertError> {
        self.config.validate()?;
        if frames.is_empty() {
            return Err(ConvertError::EmptyInput);
        }

        let output = output.as_ref().to_path_buf();
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(
            frames = frames.len(),
            output = %output.display(),
            fps = self.config.fps,
            max_width = self.config.max_width,
            dedup = self.config.deduplicate_frames,
            "Starting GIF conversion"
        );

        let sink = StreamingSink::create(&output).await?;
        debug!(path = %sink.path().display(), "Output stream open");
        let writer = sink.writer();
        let config = self.config.clone();
        let progress = self.progress.clone();

        let encoded = tokio::task::spawn_blocking(move || {
            let mut run = EncodeRun::new(&config, frames.len(), writer, progress);
            for (index, frame) in frames.iter().enumerate() {
                run.push(index, frame)?;
            }
            run.finish()
        })
        .await;
        let drained = sink.finish().await;

        let result = match (encoded, drained) {
            // The sink failing is the root cause of any encoder-side broken pipe
            (_, Err(e)) => Err(ConvertError::Sink(e)),
            (Err(e), Ok(_)) => Err(ConvertError::Worker(e.to_string())),
            (Ok(Err(e)), Ok(_)) => Err(e),
            (Ok(Ok(mut stats)), Ok(bytes)) => {
                stats.bytes_written = bytes;
                Ok(stats)
            }
        };

        match result {
            Ok(stats) => {
                info!(
                    output = %output.display(),
                    added = stats.frames_added,
                    duplicates = stats.frames_skipped_duplicate,
                    mismatched = stats.frames_skipped_dimension_mismatch,
                    undecodable = stats.frames_skipped_decode,
                    palettes_reused = stats.palettes_reused,
                    bytes = stats.bytes_written,
                    "GIF conversion complete"
                );
                Ok(Conversion {
                    path: output,
                    stats,
                })
            }
            Err(e) => {
                warn!(output = %output.display(), error = %e, "GIF conversion failed");
                discard_partial_output(&output).await;
                Err(e)
            }
        }
    }
}

/// Convert `frames` with `config` and return the output path.
pub async fn convert_to_gif(
    frames: Vec<RawFrame>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, ConvertError> {
    let conversion = GifConverter::new(config.clone())
        .convert(frames, output)
        .await?;
    Ok(conversion.path)
}

async fn discard_partial_output(path: &Path) {
    // Only regular files are removed; device paths are left alone
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "partial output removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove partial output"),
        },
        _ => {}
    }
}

/// Per-run encoding state, owned by the blocking worker
struct EncodeRun<'a> {
    config: &'a ConversionConfig,
    total: usize,
    writer: Option<SinkWriter>,
    encoder: Option<GifEncoder<SinkWriter>>,
    canonical: Option<(u32, u32)>,
    last_accepted: Option<CanonicalFrame>,
    stats: ConversionStats,
    progress: Option<ProgressCallback>,
}

impl<'a> EncodeRun<'a> {
    fn new(
        config: &'a ConversionConfig,
        total: usize,
        writer: SinkWriter,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            config,
            total,
            writer: Some(writer),
            encoder: None,
            canonical: None,
            last_accepted: None,
            stats: ConversionStats::default(),
            progress,
        }
    }

    fn push(&mut self, index: usize, raw: &RawFrame) -> Result<(), ConvertError> {
        self.process(index, raw)?;
        self.report(index + 1);
        Ok(())
    }

    fn process(&mut self, index: usize, raw: &RawFrame) -> Result<(), ConvertError> {
        let frame = match decode_raw_frame(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable frame");
                self.stats.frames_skipped_decode += 1;
                return Ok(());
            }
        };
        let frame = if self.config.scaling_enabled() {
            scaler::scale(frame, self.config.max_width)
        } else {
            frame
        };

        let canonical = match self.canonical {
            Some(dims) => dims,
            None => {
                self.start_encoder(frame.width, frame.height)?;
                (frame.width, frame.height)
            }
        };

        if frame.dimensions() != canonical {
            let e = FrameError::DimensionMismatch {
                expected: canonical,
                actual: frame.dimensions(),
            };
            debug!(index, error = %e, "Skipping frame");
            self.stats.frames_skipped_dimension_mismatch += 1;
            return Ok(());
        }

        if self.config.deduplicate_frames {
            if let Some(last) = &self.last_accepted {
                let score = similarity(&last.pixels, &frame.pixels);
                if score >= self.config.deduplication_threshold {
                    debug!(index, similarity = score, "Skipping duplicate frame");
                    self.stats.frames_skipped_duplicate += 1;
                    return Ok(());
                }
            }
        }

        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| ConvertError::Worker("encoder not initialized".to_string()))?;
        encoder.add_frame(&frame.pixels)?;
        self.stats.frames_added = encoder.frames_written();
        self.stats.palettes_reused = encoder.palettes_reused();
        self.last_accepted = Some(frame);
        Ok(())
    }

    fn start_encoder(&mut self, width: u32, height: u32) -> Result<(), ConvertError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| ConvertError::Worker("output writer already in use".to_string()))?;

        let mut encoder = GifEncoder::new(
            writer,
            EncoderSettings {
                width,
                height,
                algorithm: self.config.algorithm,
                use_optimizer: self.config.use_optimizer,
                frame_count_hint: self.total,
            },
        )?;
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.set_delay_ms(self.config.frame_delay_ms());
        encoder.set_quality(self.config.quality);
        if self.config.use_optimizer {
            encoder.set_threshold(self.config.threshold);
        }

        debug!(width, height, delay_cs = encoder.delay_cs(), "Canonical frame size fixed");
        self.canonical = Some((width, height));
        self.encoder = Some(encoder);
        Ok(())
    }

    fn report(&self, processed: usize) {
        if let Some(callback) = &self.progress {
            callback(&ConversionProgress {
                processed,
                total: self.total,
                stats: self.stats.clone(),
            });
        }
    }

    fn finish(self) -> Result<ConversionStats, ConvertError> {
        let Some(encoder) = self.encoder.filter(|_| self.stats.frames_added > 0) else {
            return Err(ConvertError::NoFramesProcessable { total: self.total });
        };
        // Dropping the writer closes this producer's side of the stream
        drop(encoder.finish()?);
        Ok(self.stats)
    }
}
