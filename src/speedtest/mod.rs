pub mod download;
pub mod latency;
pub mod prober;
pub mod transport;
pub mod upload;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

pub use prober::{run_probe, SpeedProber};
pub use transport::{BodyStream, HttpTransport, ProbeTransport};

/// Nominal size of the file downloaded during a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PayloadSize {
    #[serde(rename = "1mb")]
    OneMb,
    #[default]
    #[serde(rename = "10mb")]
    TenMb,
    #[serde(rename = "100mb")]
    HundredMb,
}

impl PayloadSize {
    pub const ALL: [PayloadSize; 3] = [PayloadSize::OneMb, PayloadSize::TenMb, PayloadSize::HundredMb];

    pub fn label(self) -> &'static str {
        match self {
            PayloadSize::OneMb => "1MB",
            PayloadSize::TenMb => "10MB",
            PayloadSize::HundredMb => "100MB",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PayloadSize::OneMb => PayloadSize::TenMb,
            PayloadSize::TenMb => PayloadSize::HundredMb,
            PayloadSize::HundredMb => PayloadSize::OneMb,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            PayloadSize::OneMb => PayloadSize::HundredMb,
            PayloadSize::TenMb => PayloadSize::OneMb,
            PayloadSize::HundredMb => PayloadSize::TenMb,
        }
    }
}

impl fmt::Display for PayloadSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PayloadSize {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1mb" => Ok(PayloadSize::OneMb),
            "10mb" => Ok(PayloadSize::TenMb),
            "100mb" => Ok(PayloadSize::HundredMb),
            _ => Err(ConfigError::UnknownPayloadSize {
                value: value.to_string(),
            }),
        }
    }
}

/// Figures produced by one probe. Every field is `None` until measured.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeResult {
    pub download_mbps: Option<f64>,
    /// Simulated, see [`upload::simulated_upload_mbps`].
    pub upload_mbps: Option<f64>,
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Idle,
    Running,
    Cancelled,
    Completed,
    Failed,
}

impl ProbeStatus {
    pub fn is_running(self) -> bool {
        self == ProbeStatus::Running
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeUpdate {
    Latency(u64),
    Progress(u8),
    Download(f64),
    Upload(f64),
    Finished(RunOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(String),
}
