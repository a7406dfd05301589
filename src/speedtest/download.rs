use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{ProbeTransport, ProbeUpdate};
use crate::error::ProbeError;

/// Progress reported once latency is known and before any body arrives.
pub const LATENCY_DONE_PROGRESS: u8 = 10;
/// Upper bound while the body is still streaming. Stays below the finalizing
/// mark (95) so progress never moves backwards.
const DOWNLOAD_PROGRESS_CEILING: u8 = 94;

/// Maps bytes received to overall run progress: the body covers 10..95.
///
/// Without a declared total there is no honest fraction to report, so the
/// value stays at 10 until the run finishes.
pub fn download_progress(received: u64, declared: Option<u64>) -> u8 {
    match declared {
        Some(total) if total > 0 => {
            let fraction = received as f64 / total as f64;
            let progress = (fraction * 90.0).round() + f64::from(LATENCY_DONE_PROGRESS);
            progress.clamp(
                f64::from(LATENCY_DONE_PROGRESS),
                f64::from(DOWNLOAD_PROGRESS_CEILING),
            ) as u8
        }
        _ => LATENCY_DONE_PROGRESS,
    }
}

/// Decimal megabits per second. A zero interval reports 0 instead of infinity.
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0 / 1_000_000.0) / secs
}

pub struct DownloadTest {
    last_progress: u8,
}

impl DownloadTest {
    pub fn new() -> Self {
        Self {
            last_progress: LATENCY_DONE_PROGRESS,
        }
    }

    pub async fn run<T>(
        &mut self,
        transport: &T,
        url: &str,
        progress_tx: &mpsc::Sender<ProbeUpdate>,
    ) -> Result<DownloadResult, ProbeError>
    where
        T: ProbeTransport + ?Sized,
    {
        let body = transport.get(url).await?;
        let declared = body.content_length;
        let mut chunks = body.chunks;
        let mut received: u64 = 0;

        while let Some(chunk) = chunks.next().await {
            received += chunk? as u64;

            let progress = download_progress(received, declared);
            if progress > self.last_progress {
                self.last_progress = progress;
                let _ = progress_tx.send(ProbeUpdate::Progress(progress)).await;
            }
        }

        tracing::debug!(received, ?declared, "download body complete");

        Ok(DownloadResult {
            received_bytes: received,
            declared_bytes: declared,
        })
    }
}

impl Default for DownloadTest {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DownloadResult {
    pub received_bytes: u64,
    pub declared_bytes: Option<u64>,
}

impl DownloadResult {
    /// Bytes the rate is computed from: the declared size when the server
    /// announced one, otherwise what actually arrived.
    pub fn measured_bytes(&self) -> u64 {
        self.declared_bytes.unwrap_or(self.received_bytes)
    }
}
