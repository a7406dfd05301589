use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::app::PanelKind;
use crate::speedtest::PayloadSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PanelArg {
    Speed,
    Camera,
}

impl From<PanelArg> for PanelKind {
    fn from(value: PanelArg) -> Self {
        match value {
            PanelArg::Speed => PanelKind::Speed,
            PanelArg::Camera => PanelKind::Camera,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(version, about = "Terminal network speed and camera access tester")]
pub struct Args {
    /// Config file (TOML). Defaults to ./speedcam.toml when present
    #[arg(long = "config", short = 'c', env = "SPEEDCAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Payload size for the speed test (1mb, 10mb, 100mb)
    #[arg(long = "size", short = 's')]
    pub size: Option<PayloadSize>,

    /// Video device to capture from, e.g. /dev/video2
    #[arg(long = "device")]
    pub device: Option<PathBuf>,

    /// Panel to open first
    #[arg(long = "panel", value_enum, default_value_t = PanelArg::Speed)]
    pub panel: PanelArg,

    /// Run a single test and print the result instead of opening the UI
    #[arg(long = "no-ui")]
    pub no_ui: bool,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Write logs to this file while the UI is open
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}
