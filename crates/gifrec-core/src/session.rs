//! Recording session state machine.
//!
//! Holds the frames captured between `start` and `stop`. The capture
//! source and its timer live outside this crate; they call
//! [`RecordingSession::push_frame`] every [`capture_interval`].
//!
//! ```text
//!           start            pause
//!   Idle ----------> Recording -----> Paused
//!    ^                  |    <-----     |
//!    |       stop       |    resume     | stop
//!    +------------------+---------------+
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::frame::RawFrame;

/// Capture rate used when the caller does not pick one
pub const DEFAULT_CAPTURE_FPS: u32 = 10;

/// Time between two captures at `fps` (`floor(1000 / fps)` ms)
pub fn capture_interval(fps: u32) -> Duration {
    Duration::from_millis(1000 / fps.max(1) as u64)
}

/// Session errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },
}

/// State of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Paused,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Recording => write!(f, "recording"),
            SessionState::Paused => write!(f, "paused"),
        }
    }
}

/// Observer notified with the frame count after each accepted frame
pub type FrameObserver = Arc<dyn Fn(usize) + Send + Sync>;

/// Frames collected by one recording
#[derive(Default)]
pub struct RecordingSession {
    state: SessionState,
    frames: Vec<RawFrame>,
    observer: Option<FrameObserver>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while recording or paused
    pub fn is_recording(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Begin a new recording, discarding frames of any previous one.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.is_recording() {
            return Err(SessionError::AlreadyRecording);
        }
        self.frames.clear();
        self.state = SessionState::Recording;
        info!("Recording started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Recording, SessionState::Paused, "pause")
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Paused, SessionState::Recording, "resume")
    }

    fn transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if self.state != from {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action,
            });
        }
        self.state = to;
        debug!(%from, %to, "Recording state changed");
        Ok(())
    }

    /// Offer a captured frame.
    ///
    /// Accepted only while recording; returns whether the frame was kept.
    pub fn push_frame(&mut self, bytes: impl Into<Bytes>, timestamp_ms: u64) -> bool {
        if self.state != SessionState::Recording {
            trace!(state = %self.state, timestamp_ms, "Frame dropped");
            return false;
        }

        self.frames.push(RawFrame::new(bytes, timestamp_ms));
        if let Some(observer) = &self.observer {
            observer(self.frames.len());
        }
        true
    }

    /// End the recording and hand over its frames.
    ///
    /// Valid from any state; an idle session yields no frames.
    pub fn stop(&mut self) -> Vec<RawFrame> {
        let frames = std::mem::take(&mut self.frames);
        if self.is_recording() {
            info!(frames = frames.len(), "Recording stopped");
        }
        self.state = SessionState::Idle;
        frames
    }

    pub fn set_frame_observer<F>(&mut self, observer: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
    }

    pub fn clear_frame_observer(&mut self) {
        self.observer = None;
    }
}
