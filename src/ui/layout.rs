use crate::app::{App, Panel, PanelKind};
use crate::camera::{CameraProber, CameraStatus, CaptureBackend, PreviewSink, TerminalPreview};
use crate::speedtest::{PayloadSize, ProbeStatus, ProbeTransport, SpeedProber};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::format::{format_latency, format_rate};

// Color Palette - Elegant & Minimal
const ACCENT: Color = Color::Rgb(100, 149, 237);      // Cornflower blue
const SUCCESS: Color = Color::Rgb(134, 194, 156);     // Soft green
const SUCCESS_DIM: Color = Color::Rgb(80, 120, 90);
const INFO: Color = Color::Rgb(147, 180, 220);        // Soft blue
const WARN: Color = Color::Rgb(220, 180, 130);        // Soft amber
const DANGER: Color = Color::Rgb(220, 120, 120);      // Soft red
const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
const TEXT_SECONDARY: Color = Color::Rgb(160, 160, 160);
const TEXT_MUTED: Color = Color::Rgb(100, 100, 100);
const BORDER: Color = Color::Rgb(60, 60, 65);
const BORDER_ACTIVE: Color = Color::Rgb(100, 100, 110);

pub fn draw_ui<T: ProbeTransport, B: CaptureBackend + Clone>(frame: &mut Frame, app: &App<T, B>) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(8),
        Constraint::Length(1),
    ])
    .split(area);

    draw_header(frame, chunks[0], app);
    draw_tabs(frame, chunks[1], app.panel_kind());

    match app.panel() {
        Panel::Speed(prober) => draw_speed_panel(frame, chunks[2], prober),
        Panel::Camera(prober) => draw_camera_panel(frame, chunks[2], prober),
    }

    draw_help(frame, chunks[3], app);
}

fn draw_header<T: ProbeTransport, B: CaptureBackend + Clone>(frame: &mut Frame, area: Rect, app: &App<T, B>) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::horizontal([
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Length(12),
    ])
    .split(inner);

    // Title
    let title = Paragraph::new("speedcam")
        .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD));
    frame.render_widget(title, chunks[0]);

    // Status
    let (status, color) = match app.panel() {
        Panel::Speed(prober) => speed_status(prober),
        Panel::Camera(prober) => camera_status(prober.status()),
    };

    let status_text = Paragraph::new(status)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center);
    frame.render_widget(status_text, chunks[1]);
}

fn speed_status<T: ProbeTransport>(prober: &SpeedProber<T>) -> (&'static str, Color) {
    let color = match prober.status() {
        ProbeStatus::Idle | ProbeStatus::Cancelled => TEXT_MUTED,
        ProbeStatus::Running => SUCCESS,
        ProbeStatus::Completed => ACCENT,
        ProbeStatus::Failed => DANGER,
    };
    (prober.status_message().unwrap_or("Ready"), color)
}

fn camera_status(status: &CameraStatus) -> (&'static str, Color) {
    match status {
        CameraStatus::Inactive => ("Camera inactive", TEXT_MUTED),
        CameraStatus::Active => ("Camera live", SUCCESS),
        CameraStatus::PermissionDenied => ("Camera access denied", DANGER),
        CameraStatus::Error(_) => ("Camera error", DANGER),
    }
}

fn draw_tabs(frame: &mut Frame, area: Rect, active: PanelKind) {
    let mut spans = Vec::new();
    for (i, kind) in [PanelKind::Speed, PanelKind::Camera].iter().enumerate() {
        let style = if *kind == active {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_MUTED)
        };
        if i > 0 {
            spans.push(Span::styled(" / ", Style::default().fg(TEXT_MUTED)));
        }
        spans.push(Span::styled(kind.label(), style));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

// Speed panel
fn draw_speed_panel<T: ProbeTransport>(frame: &mut Frame, area: Rect, prober: &SpeedProber<T>) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(2),
    ])
    .split(area);

    draw_payload_selector(frame, chunks[0], prober.payload_size(), prober.is_running());

    let ratio = f64::from(prober.progress()) / 100.0;
    draw_progress_bar(frame, chunks[2], ratio, SUCCESS, SUCCESS_DIM);

    if let Some(message) = prober.status_message() {
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(TEXT_SECONDARY))
                .alignment(Alignment::Center),
            chunks[3],
        );
    }

    let panels = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(chunks[4]);

    let result = prober.result();
    draw_metric_panel(frame, panels[0], "Download", SUCCESS, format_rate(result.download_mbps), None);
    draw_metric_panel(
        frame,
        panels[1],
        "Upload",
        INFO,
        format_rate(result.upload_mbps),
        Some("simulated: 70% of download"),
    );
    draw_metric_panel(frame, panels[2], "Latency", WARN, format_latency(result.latency_ms), None);

    if let Some(error) = prober.last_error() {
        frame.render_widget(
            Paragraph::new(error)
                .style(Style::default().fg(DANGER))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[5],
        );
    }
}

fn draw_payload_selector(frame: &mut Frame, area: Rect, selected: PayloadSize, locked: bool) {
    let mut spans = vec![Span::styled("Test size  ", Style::default().fg(TEXT_SECONDARY))];

    for size in PayloadSize::ALL {
        let style = if size == selected {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else if locked {
            Style::default().fg(BORDER)
        } else {
            Style::default().fg(TEXT_MUTED)
        };
        let label = if size == selected {
            format!("[{}]", size.label())
        } else {
            format!(" {} ", size.label())
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_metric_panel(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    color: Color,
    value: String,
    note: Option<&str>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(format!(" {} ", title), Style::default().fg(color)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(inner);

    frame.render_widget(
        Paragraph::new(value)
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        chunks[0],
    );

    if let Some(note) = note {
        frame.render_widget(
            Paragraph::new(note)
                .style(Style::default().fg(TEXT_MUTED))
                .alignment(Alignment::Center),
            chunks[1],
        );
    }
}

fn draw_progress_bar(frame: &mut Frame, area: Rect, ratio: f64, color: Color, dim_color: Color) {
    if area.width < 4 {
        return;
    }

    let width = (area.width - 2) as usize;
    let filled = ((ratio * width as f64) as usize).min(width);
    let empty = width.saturating_sub(filled);

    let bar = Line::from(vec![
        Span::raw(" "),
        Span::styled("━".repeat(filled), Style::default().fg(color)),
        Span::styled("━".repeat(empty), Style::default().fg(dim_color)),
        Span::raw(" "),
    ]);

    frame.render_widget(Paragraph::new(bar), area);
}

// Camera panel
fn draw_camera_panel<B: CaptureBackend>(
    frame: &mut Frame,
    area: Rect,
    prober: &CameraProber<B, TerminalPreview>,
) {
    let border_color = if prober.is_active() { BORDER_ACTIVE } else { BORDER };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(" Camera ", Style::default().fg(ACCENT)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = match (prober.preview().bound(), prober.status()) {
        (Some(info), _) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("● ", Style::default().fg(SUCCESS)),
                    Span::styled(
                        info.label.clone(),
                        Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(Span::styled(
                    match &info.pixel_format {
                        Some(fourcc) => format!("{}×{} {}", info.width, info.height, fourcc),
                        None => format!("{}×{}", info.width, info.height),
                    },
                    Style::default().fg(TEXT_SECONDARY),
                )),
            ];
            let requested = prober.constraints();
            if (requested.width, requested.height) != (info.width, info.height) {
                lines.push(Line::from(Span::styled(
                    format!("requested {}×{}", requested.width, requested.height),
                    Style::default().fg(WARN),
                )));
            }
            if let Some(source) = &info.source {
                lines.push(Line::from(Span::styled(
                    format!("source {}", source.display()),
                    Style::default().fg(TEXT_MUTED),
                )));
            }
            let frames = prober.frames_captured();
            let feed = match prober.preview().uptime() {
                Some(uptime) if uptime.as_secs_f64() >= 1.0 => format!(
                    "{} frames · {:.1} fps · live for {}s",
                    frames,
                    frames as f64 / uptime.as_secs_f64(),
                    uptime.as_secs()
                ),
                _ => format!("{} frames", frames),
            };
            lines.push(Line::from(Span::styled(feed, Style::default().fg(TEXT_MUTED))));
            lines
        }
        (None, CameraStatus::PermissionDenied) => notice(
            "Camera Access Denied",
            "Allow access to the video device (for example by joining the 'video' group) and try again.",
            DANGER,
        ),
        (None, CameraStatus::Error(message)) => notice("Camera Error", message, DANGER),
        (None, CameraStatus::Inactive | CameraStatus::Active) => notice(
            "Camera Inactive",
            "Press enter to start the camera test. The feed stays on this machine.",
            TEXT_SECONDARY,
        ),
    };

    let top = inner.height.saturating_sub(lines.len() as u16) / 2;
    let body = Rect {
        y: inner.y + top,
        height: inner.height.saturating_sub(top),
        ..inner
    };

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        body,
    );
}

fn notice<'a>(title: &'a str, detail: &'a str, color: Color) -> Vec<Line<'a>> {
    vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(detail, Style::default().fg(TEXT_SECONDARY))),
    ]
}

fn draw_help<T: ProbeTransport, B: CaptureBackend + Clone>(frame: &mut Frame, area: Rect, app: &App<T, B>) {
    let help = match app.panel() {
        Panel::Speed(prober) if prober.is_running() => "esc cancel · tab camera · q quit",
        Panel::Speed(_) => "enter start · ←→ size · tab camera · q quit",
        Panel::Camera(prober) if prober.is_active() => "esc stop · tab speed · q quit",
        Panel::Camera(_) => "enter start · tab speed · q quit",
    };

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        area,
    );
}
