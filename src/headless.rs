//! One-shot runs for `--no-ui`.

use anyhow::Result;
use std::io::Write;

use crate::camera::{CameraProber, CameraStatus, CaptureBackend, PreviewSink, TerminalPreview};
use crate::speedtest::{PayloadSize, ProbeStatus, ProbeTransport, SpeedProber};
use crate::ui::{format_latency, format_rate};

/// Runs one probe, cancelling it on Ctrl-C, and prints the figures.
pub async fn run_speed<T, W>(prober: &mut SpeedProber<T>, size: PayloadSize, out: &mut W) -> Result<ProbeStatus>
where
    T: ProbeTransport,
    W: Write,
{
    prober.start(size)?;

    let status = tokio::select! {
        status = prober.wait() => status,
        _ = tokio::signal::ctrl_c() => {
            prober.cancel();
            prober.wait().await
        }
    };

    write_speed_report(prober, out)?;
    Ok(status)
}

pub fn write_speed_report<T: ProbeTransport, W: Write>(prober: &SpeedProber<T>, out: &mut W) -> Result<()> {
    let result = prober.result();
    writeln!(out, "Payload:  {}", prober.payload_size())?;
    writeln!(out, "Latency:  {}", format_latency(result.latency_ms))?;
    writeln!(out, "Download: {}", format_rate(result.download_mbps))?;
    writeln!(out, "Upload:   {} (simulated)", format_rate(result.upload_mbps))?;
    let status = match prober.status() {
        ProbeStatus::Cancelled => "Cancelled",
        _ => prober.status_message().unwrap_or("Ready"),
    };
    writeln!(out, "Status:   {}", status)?;
    if let Some(error) = prober.last_error() {
        writeln!(out, "Error:    {}", error)?;
    }
    Ok(())
}

/// Acquires the camera, reports what was bound, and releases it again.
pub async fn run_camera<B, W>(prober: &mut CameraProber<B, TerminalPreview>, out: &mut W) -> Result<CameraStatus>
where
    B: CaptureBackend,
    W: Write,
{
    let started = prober.start().await;
    let status = prober.status().clone();

    match (&started, prober.preview().bound()) {
        (Ok(()), Some(info)) => {
            let requested = prober.constraints();
            writeln!(out, "Camera:   {}", info.label)?;
            writeln!(out, "Request:  {}x{}", requested.width, requested.height)?;
            writeln!(
                out,
                "Format:   {}x{} {}",
                info.width,
                info.height,
                info.pixel_format.as_deref().unwrap_or("?")
            )?;
            if let Some(source) = &info.source {
                writeln!(out, "Source:   {}", source.display())?;
            }
            writeln!(out, "Tracks:   {} live", prober.live_tracks())?;
            writeln!(out, "Frames:   {}", prober.frames_captured())?;
        }
        _ => match &status {
            CameraStatus::PermissionDenied => {
                writeln!(out, "Camera:   access denied")?;
                writeln!(out, "Allow access to the video device and try again.")?;
            }
            CameraStatus::Error(message) => writeln!(out, "{}", message)?,
            CameraStatus::Inactive | CameraStatus::Active => {}
        },
    }

    prober.stop();
    if started.is_ok() {
        writeln!(out, "Released: {} live tracks remain", prober.live_tracks())?;
    }
    Ok(status)
}
