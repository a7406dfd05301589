use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("a speed probe is already in flight")]
    AlreadyRunning,
    #[error("speed probe was cancelled")]
    Cancelled,
    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} failed: {source}")]
    Request {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server answered {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("reading response body failed: {source}")]
    Body {
        #[source]
        source: reqwest::Error,
    },
    #[error("no data from {url} for {idle_secs}s while {stage}")]
    Timeout {
        stage: &'static str,
        url: String,
        idle_secs: u64,
    },
    #[error("{0}")]
    Network(String),
}

impl ProbeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProbeError::Cancelled)
    }
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera access was denied")]
    PermissionDenied,
    #[error("no video capture device found")]
    NoDevice,
    #[error("camera is in use by another application")]
    Busy,
    #[error("{message}")]
    Device { message: String },
    #[error("a capture session is already active")]
    AlreadyActive,
}

impl CameraError {
    /// Classifies an OS error raised while opening a capture device.
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            std::io::ErrorKind::NotFound => CameraError::NoDevice,
            std::io::ErrorKind::ResourceBusy => CameraError::Busy,
            _ => CameraError::Device {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Unknown payload size '{value}' (expected 1mb, 10mb or 100mb)")]
    UnknownPayloadSize { value: String },
}
