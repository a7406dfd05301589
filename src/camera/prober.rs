use super::{CaptureBackend, CaptureConstraints, CaptureSession, PreviewSink, StreamInfo};
use crate::error::CameraError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraStatus {
    Inactive,
    Active,
    PermissionDenied,
    /// Human-readable description of the failure.
    Error(String),
}

impl CameraStatus {
    fn from_error(err: &CameraError) -> Self {
        match err {
            CameraError::PermissionDenied => CameraStatus::PermissionDenied,
            other => CameraStatus::Error(format!("Camera error: {}", other)),
        }
    }
}

/// Owns at most one capture session and the preview it feeds.
///
/// Dropping the prober releases an active session the same way
/// [`stop`](Self::stop) does.
pub struct CameraProber<B: CaptureBackend, P: PreviewSink> {
    backend: B,
    preview: P,
    constraints: CaptureConstraints,
    session: Option<CaptureSession>,
    status: CameraStatus,
}

impl<B: CaptureBackend, P: PreviewSink> CameraProber<B, P> {
    pub fn new(backend: B, preview: P, constraints: CaptureConstraints) -> Self {
        Self {
            backend,
            preview,
            constraints,
            session: None,
            status: CameraStatus::Inactive,
        }
    }

    pub fn status(&self) -> &CameraStatus {
        &self.status
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn preview(&self) -> &P {
        &self.preview
    }

    pub fn constraints(&self) -> &CaptureConstraints {
        &self.constraints
    }

    pub fn session_info(&self) -> Option<&StreamInfo> {
        self.session.as_ref().and_then(CaptureSession::info)
    }

    pub fn live_tracks(&self) -> usize {
        self.session.as_ref().map_or(0, CaptureSession::live_tracks)
    }

    pub fn frames_captured(&self) -> u64 {
        self.session.as_ref().map_or(0, CaptureSession::frames_captured)
    }

    /// Acquires a capture device and binds it to the preview.
    ///
    /// Acquisition failures are reflected in [`status`](Self::status) and
    /// also returned.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::AlreadyActive`] when a session is open, or the
    /// backend's error when the device cannot be acquired.
    pub async fn start(&mut self) -> Result<(), CameraError> {
        if self.session.is_some() {
            return Err(CameraError::AlreadyActive);
        }

        match self.backend.acquire(&self.constraints).await {
            Ok(stream) => {
                let session = CaptureSession::new(stream);
                if let Some(info) = session.info() {
                    self.preview.bind(info);
                }
                self.session = Some(session);
                self.status = CameraStatus::Active;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "camera acquisition failed");
                self.status = CameraStatus::from_error(&err);
                Err(err)
            }
        }
    }

    /// Releases the active session, if any. Calling it again does nothing.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.release();
        self.preview.clear();
        self.status = CameraStatus::Inactive;
    }
}

impl<B: CaptureBackend, P: PreviewSink> Drop for CameraProber<B, P> {
    fn drop(&mut self) {
        self.stop();
    }
}
