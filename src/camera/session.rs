use super::{MediaStream, StreamInfo};

/// Exclusive owner of an acquired stream.
///
/// Tracks are stopped exactly once: on the first [`release`](Self::release)
/// or, failing that, when the session is dropped.
pub struct CaptureSession {
    stream: Option<MediaStream>,
}

impl CaptureSession {
    pub fn new(stream: MediaStream) -> Self {
        tracing::info!(
            device = %stream.info().label,
            tracks = stream.live_tracks(),
            "capture session opened"
        );
        Self {
            stream: Some(stream),
        }
    }

    pub fn info(&self) -> Option<&StreamInfo> {
        self.stream.as_ref().map(MediaStream::info)
    }

    pub fn live_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, MediaStream::live_tracks)
    }

    pub fn frames_captured(&self) -> u64 {
        self.stream.as_ref().map_or(0, MediaStream::frames_captured)
    }

    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all();
            tracing::info!(device = %stream.info().label, "capture session released");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}
