use async_trait::async_trait;
use speedcam::camera::{
    CameraProber, CameraStatus, CaptureBackend, CaptureConstraints, MediaStream, MediaTrack,
    StreamInfo, TerminalPreview, V4l2Backend,
};
use speedcam::error::CameraError;
use speedcam::headless::run_camera;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn report(out: Vec<u8>) -> Result<String, String> {
    String::from_utf8(out).map_err(|err| format!("output not utf8: {}", err))
}

fn prober<B: CaptureBackend>(backend: B) -> CameraProber<B, TerminalPreview> {
    CameraProber::new(backend, TerminalPreview::new(), CaptureConstraints::default())
}

/// Negotiates a smaller mode than requested, like a camera without 720p.
#[derive(Clone, Default)]
struct VgaBackend {
    live: Arc<AtomicUsize>,
}

struct VgaTrack {
    live: Arc<AtomicUsize>,
    running: bool,
}

impl MediaTrack for VgaTrack {
    fn label(&self) -> &str {
        "VGA Webcam"
    }

    fn is_live(&self) -> bool {
        self.running
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn frames_captured(&self) -> u64 {
        12
    }
}

#[async_trait]
impl CaptureBackend for VgaBackend {
    async fn acquire(&self, _constraints: &CaptureConstraints) -> Result<MediaStream, CameraError> {
        self.live.fetch_add(1, Ordering::SeqCst);
        let info = StreamInfo {
            label: "VGA Webcam".to_string(),
            width: 640,
            height: 480,
            source: Some(PathBuf::from("/dev/video0")),
            pixel_format: Some("YUYV".to_string()),
        };
        let track = VgaTrack {
            live: Arc::clone(&self.live),
            running: true,
        };
        Ok(MediaStream::new(info, vec![Box::new(track)]))
    }
}

struct FailingBackend(fn() -> CameraError);

#[async_trait]
impl CaptureBackend for FailingBackend {
    async fn acquire(&self, _constraints: &CaptureConstraints) -> Result<MediaStream, CameraError> {
        Err((self.0)())
    }
}

#[tokio::test]
async fn e2e_camera_reports_negotiated_format_and_releases() -> Result<(), String> {
    let backend = VgaBackend::default();
    let mut prober = prober(backend.clone());

    let mut out = Vec::new();
    let status = run_camera(&mut prober, &mut out)
        .await
        .map_err(|err| format!("run failed: {}", err))?;
    let text = report(out)?;

    if status != CameraStatus::Active {
        return Err(format!("expected Active, got {:?}:\n{}", status, text));
    }
    for expected in [
        "Camera:   VGA Webcam",
        "Request:  1280x720",
        "Format:   640x480 YUYV",
        "Tracks:   1 live",
        "Frames:   12",
        "Released: 0 live tracks remain",
    ] {
        if !text.contains(expected) {
            return Err(format!("output missing {:?}:\n{}", expected, text));
        }
    }
    if backend.live.load(Ordering::SeqCst) != 0 || prober.is_active() {
        return Err("session still open after the run".to_string());
    }
    Ok(())
}

#[tokio::test]
async fn e2e_camera_in_use_is_a_device_error() -> Result<(), String> {
    let mut prober = prober(FailingBackend(|| CameraError::Busy));

    let mut out = Vec::new();
    let status = run_camera(&mut prober, &mut out)
        .await
        .map_err(|err| format!("run failed: {}", err))?;
    let text = report(out)?;

    let expected = "Camera error: camera is in use by another application";
    if status != CameraStatus::Error(expected.to_string()) || !text.contains(expected) {
        return Err(format!("unexpected result {:?}:\n{}", status, text));
    }
    if text.contains("Released:") {
        return Err(format!("nothing should have been released:\n{}", text));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_camera_denied_keeps_denied_status() -> Result<(), String> {
    let mut prober = prober(FailingBackend(|| CameraError::PermissionDenied));

    let mut out = Vec::new();
    let status = run_camera(&mut prober, &mut out)
        .await
        .map_err(|err| format!("run failed: {}", err))?;
    let text = report(out)?;

    if status != CameraStatus::PermissionDenied {
        return Err(format!("expected PermissionDenied, got {:?}", status));
    }
    if prober.status() != &CameraStatus::PermissionDenied {
        return Err("stop after a denial should keep the denied status".to_string());
    }
    if !text.contains("access denied") {
        return Err(format!("unexpected output:\n{}", text));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_v4l2_missing_device_node() -> Result<(), String> {
    let backend = V4l2Backend::new(Some(PathBuf::from("/nonexistent/video9")));
    let result = backend.acquire(&CaptureConstraints::default()).await;
    if !matches!(result, Err(CameraError::NoDevice)) {
        return Err(format!("expected NoDevice, got {:?}", result.err()));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_v4l2_rejects_a_file_that_is_not_a_capture_device() -> Result<(), String> {
    let file = tempfile::NamedTempFile::new().map_err(|err| format!("tempfile failed: {}", err))?;
    let backend = V4l2Backend::new(Some(file.path().to_path_buf()));

    let result = backend.acquire(&CaptureConstraints::default()).await;
    match result {
        Err(CameraError::Device { .. }) => Ok(()),
        Err(other) => Err(format!("expected a device error, got {:?}", other)),
        Ok(_) => Err("a regular file must not be accepted as a camera".to_string()),
    }
}
