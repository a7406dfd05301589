//! Camera access check.
//!
//! A [`CaptureBackend`] turns [`CaptureConstraints`] into a live
//! [`MediaStream`]. The [`CameraProber`] wraps it in a [`CaptureSession`], the
//! only owner of the device handle, and binds it to a [`PreviewSink`].
//! Releasing the session stops every track; dropping it does the same.

pub mod preview;
pub mod prober;
pub mod session;
pub mod v4l2;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::CameraError;

pub use preview::{PreviewSink, TerminalPreview};
pub use prober::{CameraProber, CameraStatus};
pub use session::CaptureSession;
pub use v4l2::V4l2Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

/// Ideal capture parameters. Backends honour them where they can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            facing: FacingMode::User,
        }
    }
}

/// What a backend actually negotiated, which may differ from the
/// requested constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub source: Option<PathBuf>,
    /// FourCC of the frames, e.g. `MJPG` or `YUYV`.
    pub pixel_format: Option<String>,
}

pub trait MediaTrack: Send {
    fn label(&self) -> &str;
    fn is_live(&self) -> bool;
    /// Stops the track. Stopping an ended track does nothing.
    fn stop(&mut self);
    /// Frames delivered by the device since the track started.
    fn frames_captured(&self) -> u64 {
        0
    }
}

pub struct MediaStream {
    info: StreamInfo,
    tracks: Vec<Box<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(info: StreamInfo, tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self { info, tracks }
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn track_labels(&self) -> Vec<&str> {
        self.tracks.iter().map(|track| track.label()).collect()
    }

    pub fn live_tracks(&self) -> usize {
        self.tracks.iter().filter(|track| track.is_live()).count()
    }

    pub fn frames_captured(&self) -> u64 {
        self.tracks.iter().map(|track| track.frames_captured()).sum()
    }

    pub(crate) fn stop_all(&mut self) {
        for track in &mut self.tracks {
            track.stop();
        }
    }
}

#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Requests a video capture device matching `constraints`.
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<MediaStream, CameraError>;
}
