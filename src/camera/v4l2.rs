//! Linux capture devices driven through V4L2.
//!
//! Acquiring a device negotiates its format, maps a ring of buffers and
//! waits for the first frame. A device already streaming for another
//! process fails at that point with [`CameraError::Busy`]. Once acquired, a
//! worker thread keeps dequeuing frames until the track is stopped; stopping
//! drops the stream, which turns streaming off and closes the device.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use super::{CaptureBackend, CaptureConstraints, FacingMode, MediaStream, MediaTrack, StreamInfo};
use crate::error::CameraError;

/// Name fragments of cameras that usually face the user.
const USER_FACING_HINTS: [&str; 5] = ["integrated", "front", "facetime", "user", "webcam"];

const STREAM_BUFFERS: u32 = 4;
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(3);
/// How long the frame worker blocks before checking for a stop request.
const FRAME_POLL_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoNode {
    pub number: usize,
    pub name: String,
    pub path: PathBuf,
}

impl VideoNode {
    fn looks_user_facing(&self) -> bool {
        let name = self.name.to_lowercase();
        USER_FACING_HINTS.iter().any(|hint| name.contains(hint))
    }
}

#[derive(Debug, Clone, Default)]
pub struct V4l2Backend {
    /// Fixed device node. When unset the backend picks one by facing mode.
    device: Option<PathBuf>,
}

impl V4l2Backend {
    pub fn new(device: Option<PathBuf>) -> Self {
        Self { device }
    }

    /// Lists nodes that can capture video, lowest number first. Metadata and
    /// output nodes are skipped.
    ///
    /// # Errors
    ///
    /// When no node qualifies and at least one could not be opened, the open
    /// error is returned so a permission problem is not reported as a
    /// missing camera.
    pub fn enumerate() -> Result<Vec<VideoNode>, CameraError> {
        let mut nodes = Vec::new();
        let mut last_error = None;

        for node in v4l::context::enum_devices() {
            let path = node.path().to_path_buf();
            let caps = match Device::with_path(&path).and_then(|device| device.query_caps()) {
                Ok(caps) => caps,
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "skipping video node");
                    last_error = Some(err);
                    continue;
                }
            };
            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                continue;
            }
            nodes.push(VideoNode {
                number: node.index(),
                name: caps.card,
                path,
            });
        }

        nodes.sort_by_key(|node| node.number);
        match last_error {
            Some(err) if nodes.is_empty() => Err(CameraError::from_io(&err)),
            _ => Ok(nodes),
        }
    }

    fn acquire_blocking(&self, constraints: &CaptureConstraints) -> Result<MediaStream, CameraError> {
        let node = match &self.device {
            Some(path) => VideoNode {
                number: 0,
                name: path.display().to_string(),
                path: path.clone(),
            },
            None => {
                let nodes = Self::enumerate()?;
                pick_node(&nodes, constraints.facing)
                    .cloned()
                    .ok_or(CameraError::NoDevice)?
            }
        };

        tracing::debug!(device = %node.name, path = %node.path.display(), "opening capture device");
        let device = Device::with_path(&node.path).map_err(|err| CameraError::from_io(&err))?;
        let label = device.query_caps().map_or(node.name, |caps| caps.card);

        let mut format = device.format().map_err(|err| CameraError::from_io(&err))?;
        format.width = constraints.width;
        format.height = constraints.height;
        let format = device
            .set_format(&format)
            .map_err(|err| CameraError::from_io(&err))?;

        let mut stream = Stream::with_buffers(&device, Type::VideoCapture, STREAM_BUFFERS)
            .map_err(|err| CameraError::from_io(&err))?;
        stream.set_timeout(FIRST_FRAME_TIMEOUT);
        stream
            .next()
            .map_err(|err| first_frame_error(&err, &label))?;
        stream.set_timeout(FRAME_POLL_TIMEOUT);

        tracing::info!(
            device = %label,
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "capture format negotiated"
        );

        let info = StreamInfo {
            label: label.clone(),
            width: format.width,
            height: format.height,
            source: Some(node.path),
            pixel_format: Some(format.fourcc.to_string()),
        };
        let track = FrameTrack::spawn(label, 1, move || stream.next().map(|_| ()))
            .map_err(|err| CameraError::from_io(&err))?;
        Ok(MediaStream::new(info, vec![Box::new(track)]))
    }
}

#[async_trait]
impl CaptureBackend for V4l2Backend {
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<MediaStream, CameraError> {
        let backend = self.clone();
        let constraints = *constraints;
        tokio::task::spawn_blocking(move || backend.acquire_blocking(&constraints))
            .await
            .map_err(|err| CameraError::Device {
                message: err.to_string(),
            })?
    }
}

fn pick_node(nodes: &[VideoNode], facing: FacingMode) -> Option<&VideoNode> {
    let preferred = match facing {
        FacingMode::User => nodes.iter().find(|node| node.looks_user_facing()),
        FacingMode::Environment => nodes.iter().find(|node| !node.looks_user_facing()),
    };
    preferred.or_else(|| nodes.first())
}

fn first_frame_error(err: &io::Error, device: &str) -> CameraError {
    if err.kind() == io::ErrorKind::TimedOut {
        return CameraError::Device {
            message: format!(
                "{} delivered no frame within {}s",
                device,
                FIRST_FRAME_TIMEOUT.as_secs()
            ),
        };
    }
    CameraError::from_io(err)
}

/// A running capture stream. The worker owns the stream; dropping it when
/// the worker exits releases the device.
struct FrameTrack {
    label: String,
    frames: Arc<AtomicU64>,
    stop_requested: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FrameTrack {
    fn spawn<F>(label: String, frames_so_far: u64, mut next_frame: F) -> io::Result<Self>
    where
        F: FnMut() -> io::Result<()> + Send + 'static,
    {
        let frames = Arc::new(AtomicU64::new(frames_so_far));
        let stop_requested = Arc::new(AtomicBool::new(false));

        let worker = {
            let frames = Arc::clone(&frames);
            let stop_requested = Arc::clone(&stop_requested);
            let label = label.clone();
            thread::Builder::new()
                .name("v4l2-frames".to_string())
                .spawn(move || {
                    while !stop_requested.load(Ordering::Acquire) {
                        match next_frame() {
                            Ok(()) => {
                                frames.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(err) if err.kind() == io::ErrorKind::TimedOut => {}
                            Err(err) => {
                                tracing::warn!(device = %label, error = %err, "capture stream ended");
                                break;
                            }
                        }
                    }
                })?
        };

        Ok(Self {
            label,
            frames,
            stop_requested,
            worker: Some(worker),
        })
    }
}

impl MediaTrack for FrameTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_live(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.stop_requested.store(true, Ordering::Release);
        if worker.join().is_err() {
            tracing::error!(device = %self.label, "frame worker panicked");
        }
    }

    fn frames_captured(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl Drop for FrameTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
