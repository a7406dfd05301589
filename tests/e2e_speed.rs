mod support;

use speedcam::headless::write_speed_report;
use speedcam::settings::Endpoints;
use speedcam::speedtest::{HttpTransport, PayloadSize, ProbeStatus, SpeedProber};
use std::sync::Arc;
use std::time::Duration;

fn endpoints(url: &str) -> Endpoints {
    Endpoints {
        one_mb: url.to_string(),
        ten_mb: url.to_string(),
        hundred_mb: url.to_string(),
    }
}

fn http_prober(url: &str) -> Result<SpeedProber<HttpTransport>, String> {
    http_prober_with_idle(url, Duration::from_secs(10))
}

fn http_prober_with_idle(url: &str, idle: Duration) -> Result<SpeedProber<HttpTransport>, String> {
    let transport = HttpTransport::new(idle, Duration::from_secs(5))
        .map_err(|err| format!("client build failed: {}", err))?;
    Ok(SpeedProber::new(
        Arc::new(transport),
        endpoints(url),
        Duration::ZERO,
    ))
}

#[tokio::test]
async fn e2e_download_against_local_server() -> Result<(), String> {
    let (base, _server) = support::spawn_payload_server()?;
    let mut prober = http_prober(&format!("{}/payload", base))?;

    prober
        .start(PayloadSize::OneMb)
        .map_err(|err| format!("start failed: {}", err))?;
    let status = prober.wait().await;
    if status != ProbeStatus::Completed {
        return Err(format!(
            "expected Completed, got {:?} ({:?})",
            status,
            prober.last_error()
        ));
    }

    let result = *prober.result();
    let download = result.download_mbps.ok_or("download missing")?;
    let upload = result.upload_mbps.ok_or("upload missing")?;
    if download <= 0.0 {
        return Err(format!("download should be positive, got {}", download));
    }
    if (upload - download * 0.7).abs() > 1e-9 {
        return Err(format!("upload {} is not 70% of {}", upload, download));
    }
    if result.latency_ms.is_none() {
        return Err("latency missing".to_string());
    }
    if prober.progress() != 100 {
        return Err(format!("progress ended at {}", prober.progress()));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_missing_payload_fails_with_zero_rates() -> Result<(), String> {
    let (base, _server) = support::spawn_payload_server()?;
    let mut prober = http_prober(&format!("{}/missing.bin", base))?;

    prober
        .start(PayloadSize::TenMb)
        .map_err(|err| format!("start failed: {}", err))?;
    let status = prober.wait().await;
    if status != ProbeStatus::Failed {
        return Err(format!("expected Failed, got {:?}", status));
    }

    let result = prober.result();
    if result.download_mbps != Some(0.0) || result.upload_mbps != Some(0.0) {
        return Err(format!("expected zero rates, got {:?}", result));
    }
    let error = prober.last_error().ok_or("error message missing")?;
    if !error.contains("404") {
        return Err(format!("error should mention the status: {}", error));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_undeclared_length_uses_received_bytes() -> Result<(), String> {
    let (base, _server) = support::spawn_payload_server()?;
    let mut prober = http_prober(&format!("{}/unsized", base))?;

    prober
        .start(PayloadSize::OneMb)
        .map_err(|err| format!("start failed: {}", err))?;
    let status = prober.wait().await;
    if status != ProbeStatus::Completed {
        return Err(format!(
            "expected Completed, got {:?} ({:?})",
            status,
            prober.last_error()
        ));
    }

    let download = prober.result().download_mbps.ok_or("download missing")?;
    if download <= 0.0 {
        return Err(format!("download should be positive, got {}", download));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_unreachable_host_fails() -> Result<(), String> {
    let url = support::closed_port_url()?;
    let mut prober = http_prober(&url)?;

    prober
        .start(PayloadSize::OneMb)
        .map_err(|err| format!("start failed: {}", err))?;
    if prober.wait().await != ProbeStatus::Failed {
        return Err("expected Failed".to_string());
    }
    if prober.result().latency_ms.is_some() {
        return Err("latency should be absent when HEAD fails".to_string());
    }
    Ok(())
}

#[tokio::test]
async fn e2e_report_marks_upload_as_simulated() -> Result<(), String> {
    let (base, _server) = support::spawn_payload_server()?;
    let mut prober = http_prober(&format!("{}/payload", base))?;

    prober
        .start(PayloadSize::OneMb)
        .map_err(|err| format!("start failed: {}", err))?;
    prober.wait().await;

    let mut out = Vec::new();
    write_speed_report(&prober, &mut out).map_err(|err| format!("report failed: {}", err))?;
    let report = String::from_utf8(out).map_err(|err| format!("report not utf8: {}", err))?;

    for expected in ["Payload:  1MB", "Upload:", "(simulated)", "Status:   Complete!"] {
        if !report.contains(expected) {
            return Err(format!("report missing {:?}:\n{}", expected, report));
        }
    }
    if report.contains("Error:") {
        return Err(format!("unexpected error line:\n{}", report));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_slow_but_steady_body_completes() -> Result<(), String> {
    let (base, _server) = support::spawn_payload_server()?;
    // The whole body takes about 3s, far longer than the idle limit.
    let mut prober = http_prober_with_idle(&format!("{}/trickle", base), Duration::from_secs(1))?;

    prober
        .start(PayloadSize::OneMb)
        .map_err(|err| format!("start failed: {}", err))?;
    let status = prober.wait().await;
    if status != ProbeStatus::Completed {
        return Err(format!(
            "expected Completed, got {:?} ({:?})",
            status,
            prober.last_error()
        ));
    }
    let download = prober.result().download_mbps.ok_or("download missing")?;
    if download <= 0.0 {
        return Err(format!("download should be positive, got {}", download));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_stalled_body_fails_with_timeout_message() -> Result<(), String> {
    let (base, _server) = support::spawn_payload_server()?;
    let mut prober = http_prober_with_idle(&format!("{}/stall", base), Duration::from_secs(1))?;

    prober
        .start(PayloadSize::OneMb)
        .map_err(|err| format!("start failed: {}", err))?;
    if prober.wait().await != ProbeStatus::Failed {
        return Err("expected Failed".to_string());
    }
    let error = prober.last_error().ok_or("error message missing")?;
    if !error.contains("no data from") || !error.contains("reading the response body") {
        return Err(format!("error should name the idle timeout: {}", error));
    }
    Ok(())
}
