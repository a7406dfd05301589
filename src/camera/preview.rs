use std::time::{Duration, Instant};

use super::StreamInfo;

/// Where the live feed is shown.
pub trait PreviewSink: Send {
    fn bind(&mut self, info: &StreamInfo);
    fn clear(&mut self);
    fn bound(&self) -> Option<&StreamInfo>;
}

/// Preview for the terminal: shows what is bound and for how long.
#[derive(Debug, Default)]
pub struct TerminalPreview {
    bound: Option<(StreamInfo, Instant)>,
}

impl TerminalPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uptime(&self) -> Option<Duration> {
        self.bound.as_ref().map(|(_, since)| since.elapsed())
    }
}

impl PreviewSink for TerminalPreview {
    fn bind(&mut self, info: &StreamInfo) {
        self.bound = Some((info.clone(), Instant::now()));
    }

    fn clear(&mut self) {
        self.bound = None;
    }

    fn bound(&self) -> Option<&StreamInfo> {
        self.bound.as_ref().map(|(info, _)| info)
    }
}
