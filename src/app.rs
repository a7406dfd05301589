use crate::camera::{CameraProber, CaptureBackend, TerminalPreview};
use crate::settings::Settings;
use crate::speedtest::{PayloadSize, ProbeTransport, SpeedProber};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Speed,
    Camera,
}

impl PanelKind {
    pub fn next(self) -> Self {
        match self {
            PanelKind::Speed => PanelKind::Camera,
            PanelKind::Camera => PanelKind::Speed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PanelKind::Speed => "Speed Test",
            PanelKind::Camera => "Camera Test",
        }
    }
}

/// The mounted panel. Only one prober exists at a time; replacing the panel
/// drops the other one, which aborts its probe or releases its camera.
pub enum Panel<T: ProbeTransport, B: CaptureBackend> {
    Speed(SpeedProber<T>),
    Camera(CameraProber<B, TerminalPreview>),
}

pub struct App<T: ProbeTransport, B: CaptureBackend + Clone> {
    pub settings: Settings,
    pub should_quit: bool,
    transport: Arc<T>,
    backend: B,
    panel: Panel<T, B>,
}

impl<T: ProbeTransport, B: CaptureBackend + Clone> App<T, B> {
    pub fn new(settings: Settings, transport: Arc<T>, backend: B, initial: PanelKind) -> Self {
        let panel = mount(&settings, &transport, &backend, initial);
        Self {
            settings,
            should_quit: false,
            transport,
            backend,
            panel,
        }
    }

    pub fn panel_kind(&self) -> PanelKind {
        match self.panel {
            Panel::Speed(_) => PanelKind::Speed,
            Panel::Camera(_) => PanelKind::Camera,
        }
    }

    pub fn panel(&self) -> &Panel<T, B> {
        &self.panel
    }

    pub fn speed(&self) -> Option<&SpeedProber<T>> {
        match &self.panel {
            Panel::Speed(prober) => Some(prober),
            Panel::Camera(_) => None,
        }
    }

    pub fn camera(&self) -> Option<&CameraProber<B, TerminalPreview>> {
        match &self.panel {
            Panel::Camera(prober) => Some(prober),
            Panel::Speed(_) => None,
        }
    }

    pub fn switch_panel(&mut self) {
        let next = self.panel_kind().next();
        tracing::debug!(panel = next.label(), "switching panel");
        // The previous prober is dropped here.
        self.panel = mount(&self.settings, &self.transport, &self.backend, next);
    }

    /// Applies finished work from the background probe.
    pub fn poll(&mut self) {
        if let Panel::Speed(prober) = &mut self.panel {
            prober.poll();
        }
    }

    pub fn handle_key_event(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Some(AppAction::Quit);
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Some(AppAction::Quit);
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.switch_panel();
                return None;
            }
            _ => {}
        }

        match &mut self.panel {
            Panel::Speed(prober) => handle_speed_key(prober, key.code),
            Panel::Camera(prober) => match key.code {
                KeyCode::Enter if !prober.is_active() => Some(AppAction::StartCamera),
                KeyCode::Esc | KeyCode::Char('s') if prober.is_active() => {
                    Some(AppAction::StopCamera)
                }
                _ => None,
            },
        }
    }

    pub async fn perform(&mut self, action: AppAction) {
        match (action, &mut self.panel) {
            (AppAction::Quit, _) => self.should_quit = true,
            (AppAction::StartProbe, Panel::Speed(prober)) => {
                let size = prober.payload_size();
                if let Err(err) = prober.start(size) {
                    tracing::warn!(error = %err, "speed probe not started");
                }
            }
            (AppAction::CancelProbe, Panel::Speed(prober)) => {
                prober.cancel();
            }
            (AppAction::StartCamera, Panel::Camera(prober)) => {
                if let Err(err) = prober.start().await {
                    tracing::debug!(error = %err, "camera start did not succeed");
                }
            }
            (AppAction::StopCamera, Panel::Camera(prober)) => prober.stop(),
            (action, _) => {
                tracing::debug!(?action, "action does not apply to the mounted panel");
            }
        }
    }
}

fn handle_speed_key<T: ProbeTransport>(prober: &mut SpeedProber<T>, code: KeyCode) -> Option<AppAction> {
    let running = prober.is_running();
    match code {
        KeyCode::Enter if !running => Some(AppAction::StartProbe),
        KeyCode::Esc if running => Some(AppAction::CancelProbe),
        KeyCode::Left | KeyCode::Char('h') => {
            prober.select_payload_size(prober.payload_size().prev());
            None
        }
        KeyCode::Right | KeyCode::Char('l') => {
            prober.select_payload_size(prober.payload_size().next());
            None
        }
        KeyCode::Char(digit @ '1'..='3') => {
            let index = usize::from(digit as u8 - b'1');
            if let Some(size) = PayloadSize::ALL.get(index) {
                prober.select_payload_size(*size);
            }
            None
        }
        _ => None,
    }
}

fn mount<T: ProbeTransport, B: CaptureBackend + Clone>(
    settings: &Settings,
    transport: &Arc<T>,
    backend: &B,
    kind: PanelKind,
) -> Panel<T, B> {
    match kind {
        PanelKind::Speed => Panel::Speed(
            SpeedProber::new(
                Arc::clone(transport),
                settings.endpoints.clone(),
                settings.finalize_delay(),
            )
            .with_payload_size(settings.default_payload),
        ),
        PanelKind::Camera => Panel::Camera(CameraProber::new(
            backend.clone(),
            TerminalPreview::new(),
            settings.camera.constraints(),
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    StartProbe,
    CancelProbe,
    StartCamera,
    StopCamera,
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
