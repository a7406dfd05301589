use anyhow::Result;
use clap::Parser;
use crossterm::event::Event;
use ratatui::DefaultTerminal;
use speedcam::app::{poll_event, App, AppAction, PanelKind};
use speedcam::camera::{CameraProber, CameraStatus, TerminalPreview, V4l2Backend};
use speedcam::cli::Args;
use speedcam::headless;
use speedcam::logger::{init_logging, LogTarget};
use speedcam::settings::Settings;
use speedcam::speedtest::{HttpTransport, ProbeStatus, SpeedProber};
use speedcam::ui::draw_ui;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let target = if args.no_ui {
        LogTarget::Stderr
    } else {
        args.log_file
            .as_deref()
            .map_or(LogTarget::Discard, LogTarget::File)
    };
    init_logging(args.verbose, target);

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(size) = args.size {
        settings.default_payload = size;
    }
    if let Some(device) = args.device.clone() {
        settings.camera.device = Some(device);
    }

    let transport = Arc::new(HttpTransport::new(
        settings.read_timeout(),
        settings.connect_timeout(),
    )?);
    let backend = V4l2Backend::new(settings.camera.device.clone());

    if args.no_ui {
        return run_headless(settings, transport, backend, args.panel.into()).await;
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let mut app = App::new(settings, transport, backend, args.panel.into());
    let result = run_app(&mut terminal, &mut app).await;

    // Release the camera and abort any probe before handing the terminal back.
    drop(app);
    ratatui::restore();
    result.map(|()| ExitCode::SUCCESS)
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    app: &mut App<HttpTransport, V4l2Backend>,
) -> Result<()> {
    loop {
        app.poll();
        terminal.draw(|frame| draw_ui(frame, app))?;

        // Handle input
        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(30))? {
            if let Some(action) = app.handle_key_event(key) {
                if action == AppAction::Quit {
                    break;
                }
                app.perform(action).await;
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn run_headless(
    settings: Settings,
    transport: Arc<HttpTransport>,
    backend: V4l2Backend,
    panel: PanelKind,
) -> Result<ExitCode> {
    let mut stdout = std::io::stdout();

    match panel {
        PanelKind::Speed => {
            let size = settings.default_payload;
            let mut prober =
                SpeedProber::new(transport, settings.endpoints.clone(), settings.finalize_delay())
                    .with_payload_size(size);
            let status = headless::run_speed(&mut prober, size, &mut stdout).await?;
            Ok(match status {
                ProbeStatus::Completed => ExitCode::SUCCESS,
                ProbeStatus::Cancelled => ExitCode::from(130),
                ProbeStatus::Idle | ProbeStatus::Running | ProbeStatus::Failed => ExitCode::FAILURE,
            })
        }
        PanelKind::Camera => {
            let mut prober =
                CameraProber::new(backend, TerminalPreview::new(), settings.camera.constraints());
            let status = headless::run_camera(&mut prober, &mut stdout).await?;
            Ok(match status {
                CameraStatus::Active | CameraStatus::Inactive => ExitCode::SUCCESS,
                CameraStatus::PermissionDenied | CameraStatus::Error(_) => ExitCode::FAILURE,
            })
        }
    }
}
