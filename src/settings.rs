use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::camera::{CaptureConstraints, FacingMode};
use crate::error::ConfigError;
use crate::speedtest::PayloadSize;

const DEFAULT_CONFIG_FILE: &str = "speedcam.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub default_payload: PayloadSize,
    /// Longest silence tolerated between two reads of a response.
    pub read_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub finalize_delay_ms: u64,
    pub camera: CameraSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            default_payload: PayloadSize::default(),
            read_timeout_secs: 30,
            connect_timeout_secs: 10,
            finalize_delay_ms: 500,
            camera: CameraSettings::default(),
        }
    }
}

/// Payload URLs, one per selectable size. Any static host serving files of
/// roughly the nominal size works.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    #[serde(rename = "1mb")]
    pub one_mb: String,
    #[serde(rename = "10mb")]
    pub ten_mb: String,
    #[serde(rename = "100mb")]
    pub hundred_mb: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            one_mb: "https://speed.cloudflare.com/1mb.bin".to_string(),
            ten_mb: "https://speed.cloudflare.com/10mb.bin".to_string(),
            hundred_mb: "https://speed.cloudflare.com/100mb.bin".to_string(),
        }
    }
}

impl Endpoints {
    pub fn url_for(&self, size: PayloadSize) -> &str {
        match size {
            PayloadSize::OneMb => &self.one_mb,
            PayloadSize::TenMb => &self.ten_mb,
            PayloadSize::HundredMb => &self.hundred_mb,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
    /// Capture from this node (e.g. `/dev/video2`) instead of picking one.
    pub device: Option<PathBuf>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let constraints = CaptureConstraints::default();
        Self {
            width: constraints.width,
            height: constraints.height,
            facing: constraints.facing,
            device: None,
        }
    }
}

impl CameraSettings {
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            width: self.width,
            height: self.height,
            facing: self.facing,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from `speedcam.toml` in the working
    /// directory when it exists, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_file(path);
        }

        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::load_file(&default_path);
        }

        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn finalize_delay(&self) -> Duration {
        Duration::from_millis(self.finalize_delay_ms)
    }
}
