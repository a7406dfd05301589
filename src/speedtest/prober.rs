use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::download::{throughput_mbps, DownloadTest, LATENCY_DONE_PROGRESS};
use super::latency::measure_latency;
use super::upload::simulated_upload_mbps;
use super::{PayloadSize, ProbeResult, ProbeStatus, ProbeTransport, ProbeUpdate, RunOutcome};
use crate::error::ProbeError;
use crate::settings::Endpoints;

const UPDATE_BUFFER: usize = 32;
const FINALIZING_PROGRESS: u8 = 95;
const COMPLETE_PROGRESS: u8 = 100;

/// Runs one probe against `url`, streaming updates to `updates`.
///
/// Latency and download race `cancel`; once the body is fully read the run
/// always finishes. The last update sent is always `Finished`.
pub async fn run_probe<T>(
    transport: &T,
    url: &str,
    finalize_delay: Duration,
    updates: mpsc::Sender<ProbeUpdate>,
    cancel: CancellationToken,
) -> RunOutcome
where
    T: ProbeTransport + ?Sized,
{
    let measured = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProbeError::Cancelled),
        result = measure_download(transport, url, &updates) => result,
    };

    let download_mbps = match measured {
        Ok(mbps) => mbps,
        Err(err) if err.is_cancelled() => {
            tracing::info!(url, "speed probe cancelled");
            let _ = updates.send(ProbeUpdate::Finished(RunOutcome::Cancelled)).await;
            return RunOutcome::Cancelled;
        }
        Err(err) => {
            tracing::warn!(url, error = %err, "speed probe failed");
            let outcome = RunOutcome::Failed(err.to_string());
            let _ = updates.send(ProbeUpdate::Finished(outcome.clone())).await;
            return outcome;
        }
    };

    let _ = updates.send(ProbeUpdate::Download(download_mbps)).await;
    let _ = updates.send(ProbeUpdate::Progress(FINALIZING_PROGRESS)).await;
    tokio::time::sleep(finalize_delay).await;

    let upload_mbps = simulated_upload_mbps(download_mbps);
    let _ = updates.send(ProbeUpdate::Upload(upload_mbps)).await;
    let _ = updates.send(ProbeUpdate::Finished(RunOutcome::Completed)).await;

    tracing::info!(url, download_mbps, upload_mbps, "speed probe completed");
    RunOutcome::Completed
}

async fn measure_download<T>(
    transport: &T,
    url: &str,
    updates: &mpsc::Sender<ProbeUpdate>,
) -> Result<f64, ProbeError>
where
    T: ProbeTransport + ?Sized,
{
    let start = Instant::now();

    let latency_ms = measure_latency(transport, url).await?;
    tracing::debug!(url, latency_ms, "latency measured");
    let _ = updates.send(ProbeUpdate::Latency(latency_ms)).await;
    let _ = updates.send(ProbeUpdate::Progress(LATENCY_DONE_PROGRESS)).await;

    let mut test = DownloadTest::new();
    let download = test.run(transport, url, updates).await?;

    Ok(throughput_mbps(download.measured_bytes(), start.elapsed()))
}

struct ActiveRun {
    cancel: CancellationToken,
    updates: mpsc::Receiver<ProbeUpdate>,
}

/// Owns the state of the speed panel and at most one in-flight probe.
pub struct SpeedProber<T: ProbeTransport> {
    transport: Arc<T>,
    endpoints: Endpoints,
    finalize_delay: Duration,
    payload_size: PayloadSize,
    status: ProbeStatus,
    progress: u8,
    result: ProbeResult,
    last_error: Option<String>,
    run: Option<ActiveRun>,
}

impl<T: ProbeTransport> SpeedProber<T> {
    pub fn new(transport: Arc<T>, endpoints: Endpoints, finalize_delay: Duration) -> Self {
        Self {
            transport,
            endpoints,
            finalize_delay,
            payload_size: PayloadSize::default(),
            status: ProbeStatus::Idle,
            progress: 0,
            result: ProbeResult::default(),
            last_error: None,
            run: None,
        }
    }

    pub fn with_payload_size(mut self, size: PayloadSize) -> Self {
        self.payload_size = size;
        self
    }

    pub fn status(&self) -> ProbeStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn result(&self) -> &ProbeResult {
        &self.result
    }

    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Changes the payload for the next run. Ignored while a run is in flight.
    pub fn select_payload_size(&mut self, size: PayloadSize) -> bool {
        if self.is_running() {
            return false;
        }
        self.payload_size = size;
        true
    }

    /// Starts a probe on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::AlreadyRunning`] while a previous run is in flight.
    pub fn start(&mut self, size: PayloadSize) -> Result<(), ProbeError> {
        if self.is_running() {
            return Err(ProbeError::AlreadyRunning);
        }

        self.payload_size = size;
        self.result = ProbeResult::default();
        self.progress = 0;
        self.last_error = None;
        self.status = ProbeStatus::Running;

        let url = self.endpoints.url_for(size).to_string();
        let (update_tx, update_rx) = mpsc::channel(UPDATE_BUFFER);
        let cancel = CancellationToken::new();

        tracing::info!(payload = %size, url = %url, "starting speed probe");

        let transport = Arc::clone(&self.transport);
        let token = cancel.clone();
        let finalize_delay = self.finalize_delay;
        tokio::spawn(async move {
            run_probe(transport.as_ref(), &url, finalize_delay, update_tx, token).await;
        });

        self.run = Some(ActiveRun {
            cancel,
            updates: update_rx,
        });
        Ok(())
    }

    /// Aborts the in-flight run. Returns `false` when there is nothing to
    /// cancel, or when the body has already been measured and the run is
    /// only finalizing.
    pub fn cancel(&mut self) -> bool {
        self.poll();

        let Some(run) = self.run.as_ref() else {
            return false;
        };
        if self.result.download_mbps.is_some() {
            return false;
        }

        run.cancel.cancel();
        self.run = None;
        self.status = ProbeStatus::Cancelled;
        self.result.download_mbps = None;
        self.result.upload_mbps = None;
        tracing::info!(progress = self.progress, "speed probe cancel requested");
        true
    }

    /// Applies every update that is ready without waiting.
    pub fn poll(&mut self) {
        while let Some(run) = self.run.as_mut() {
            match run.updates.try_recv() {
                Ok(update) => self.apply(update),
                Err(mpsc::error::TryRecvError::Empty) => return,
                Err(mpsc::error::TryRecvError::Disconnected) => self.abandon_run(),
            }
        }
    }

    /// Waits for the in-flight run, if any, to finish.
    pub async fn wait(&mut self) -> ProbeStatus {
        while let Some(run) = self.run.as_mut() {
            match run.updates.recv().await {
                Some(update) => self.apply(update),
                None => self.abandon_run(),
            }
        }
        self.status
    }

    /// Line shown under the progress bar. A cancelled run goes back to the
    /// idle view and shows nothing.
    pub fn status_message(&self) -> Option<&'static str> {
        match self.status {
            ProbeStatus::Idle | ProbeStatus::Cancelled => None,
            ProbeStatus::Running => Some(match self.progress {
                0..=9 => "Preparing test...",
                10..=89 => "Measuring download speed...",
                90..=99 => "Finalizing...",
                _ => "Complete!",
            }),
            ProbeStatus::Completed => Some("Complete!"),
            ProbeStatus::Failed => Some("Test failed"),
        }
    }

    fn apply(&mut self, update: ProbeUpdate) {
        match update {
            ProbeUpdate::Latency(ms) => self.result.latency_ms = Some(ms),
            ProbeUpdate::Progress(progress) => self.progress = self.progress.max(progress),
            ProbeUpdate::Download(mbps) => self.result.download_mbps = Some(mbps),
            ProbeUpdate::Upload(mbps) => self.result.upload_mbps = Some(mbps),
            ProbeUpdate::Finished(outcome) => self.finish(outcome),
        }
    }

    fn finish(&mut self, outcome: RunOutcome) {
        self.run = None;
        match outcome {
            RunOutcome::Completed => {
                self.progress = COMPLETE_PROGRESS;
                self.status = ProbeStatus::Completed;
            }
            RunOutcome::Cancelled => {
                self.result.download_mbps = None;
                self.result.upload_mbps = None;
                self.status = ProbeStatus::Cancelled;
            }
            RunOutcome::Failed(message) => {
                self.result.download_mbps = Some(0.0);
                self.result.upload_mbps = Some(0.0);
                self.last_error = Some(message);
                self.status = ProbeStatus::Failed;
            }
        }
    }

    fn abandon_run(&mut self) {
        tracing::error!("speed probe task ended without reporting an outcome");
        self.finish(RunOutcome::Failed("probe task ended unexpectedly".to_string()));
    }
}

impl<T: ProbeTransport> Drop for SpeedProber<T> {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancel.cancel();
        }
    }
}
