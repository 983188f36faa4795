//! Streamed output file.
//!
//! The GIF encoder is synchronous and runs on a blocking worker; the file
//! is written by an async task. The two sides are joined by a bounded
//! channel of byte chunks:
//!
//! ```text
//! GifEncoder -> SinkWriter --(mpsc, SINK_CHANNEL_CAPACITY chunks)--> drain task -> File
//! ```
//!
//! When the channel is full the producer blocks, so memory use stays at
//! roughly `SINK_CHANNEL_CAPACITY * SINK_CHUNK_SIZE` regardless of the
//! output size. [`StreamingSink::finish`] resolves once, after every byte
//! is flushed and synced, or with the first I/O error.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Chunks in flight between encoder and file
pub const SINK_CHANNEL_CAPACITY: usize = 8;

/// Bytes batched by a [`SinkWriter`] before a chunk is handed off
pub const SINK_CHUNK_SIZE: usize = 64 * 1024;

/// Output stream errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("writer task aborted: {0}")]
    TaskFailed(String),
}

/// Owner of the output file for one conversion run
pub struct StreamingSink {
    path: PathBuf,
    tx: mpsc::Sender<Bytes>,
    task: JoinHandle<Result<u64, SinkError>>,
}

impl StreamingSink {
    /// Create (or truncate) the output file and start the drain task.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await.map_err(|source| SinkError::Open {
            path: path.clone(),
            source,
        })?;

        let (tx, rx) = mpsc::channel(SINK_CHANNEL_CAPACITY);
        let task = tokio::spawn(drain(file, rx, path.clone()));
        debug!(path = %path.display(), "output stream opened");

        Ok(Self { path, tx, task })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A blocking byte writer feeding this sink.
    ///
    /// Must be used off the async runtime (e.g. in `spawn_blocking`), and
    /// flushed before it is dropped; unflushed bytes are discarded.
    pub fn writer(&self) -> SinkWriter {
        SinkWriter {
            tx: self.tx.clone(),
            buf: Vec::with_capacity(SINK_CHUNK_SIZE),
        }
    }

    /// Close the stream and wait for the file to be flushed and closed.
    ///
    /// Waits until every [`SinkWriter`] has been dropped. Returns the
    /// number of bytes written.
    pub async fn finish(self) -> Result<u64, SinkError> {
        drop(self.tx);
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(SinkError::TaskFailed(e.to_string())),
        }
    }
}

async fn drain(
    file: File,
    mut rx: mpsc::Receiver<Bytes>,
    path: PathBuf,
) -> Result<u64, SinkError> {
    let write_err = |source: io::Error| SinkError::Write {
        path: path.clone(),
        source,
    };

    let mut out = BufWriter::new(file);
    let mut written = 0u64;

    while let Some(chunk) = rx.recv().await {
        if let Err(e) = out.write_all(&chunk).await {
            // Dropping the receiver turns further sends into BrokenPipe
            rx.close();
            return Err(write_err(e));
        }
        written += chunk.len() as u64;
        trace!(chunk = chunk.len(), total = written, "chunk written");
    }

    out.flush().await.map_err(write_err)?;
    out.get_ref().sync_all().await.map_err(write_err)?;
    debug!(path = %path.display(), bytes = written, "output stream closed");
    Ok(written)
}

/// Synchronous producer side of a [`StreamingSink`]
pub struct SinkWriter {
    tx: mpsc::Sender<Bytes>,
    buf: Vec<u8>,
}

impl SinkWriter {
    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(std::mem::replace(
            &mut self.buf,
            Vec::with_capacity(SINK_CHUNK_SIZE),
        ));
        self.tx
            .blocking_send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "output stream closed"))
    }
}

impl Write for SinkWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= SINK_CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}
