use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mentionwatch::actions::{Action, Dispatcher, Outcome};
use mentionwatch::api::AdminApi;
use mentionwatch::app::{App, Request};
use mentionwatch::data::duration::parse_duration;
use mentionwatch::prefs::Preferences;
use mentionwatch::ui::{self, Theme};
use mentionwatch::{
    events, RealtimeClient, RealtimeHandle, ReplayTransport, Settings, SseTransport, StaticToken,
    Transport, WebSocketTransport,
};

#[derive(Parser, Debug)]
#[command(name = "mentionwatch")]
#[command(about = "Realtime admin console for the mention-monitoring backend")]
struct Args {
    /// Settings file (TOML). Environment variables MENTIONWATCH_* override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (REST and SSE)
    #[arg(long)]
    api_url: Option<String>,

    /// WebSocket URL for the fallback transport (derived from --api-url by default)
    #[arg(long)]
    ws_url: Option<String>,

    /// Admin bearer token
    #[arg(short, long)]
    token: Option<String>,

    /// Replay a recorded session (newline-delimited envelopes) instead of connecting
    #[arg(short, long, conflicts_with_all = ["api_url", "ws_url"])]
    replay: Option<PathBuf>,

    /// Delay between replayed frames (e.g., "200ms")
    #[arg(long, requires = "replay")]
    pace: Option<String>,

    /// Do not fall back to WebSocket when SSE cannot connect
    #[arg(long)]
    no_websocket: bool,

    /// Delay between reconnect attempts (e.g., "5s")
    #[arg(long)]
    reconnect_interval: Option<String>,

    /// Consecutive failed attempts before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Log file (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded settings.
    fn apply(&self, settings: &mut Settings) -> Result<()> {
        if let Some(url) = &self.api_url {
            settings.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = &self.ws_url {
            settings.ws_url = Some(url.clone());
        }
        if let Some(token) = &self.token {
            settings.token = Some(token.clone()).filter(|t| !t.is_empty());
        }
        if let Some(interval) = &self.reconnect_interval {
            settings.reconnect_interval =
                parse_duration(interval).context("invalid --reconnect-interval")?;
        }
        if let Some(max) = self.max_attempts {
            anyhow::ensure!(max > 0, "--max-attempts must be at least 1");
            settings.max_reconnect_attempts = max;
        }
        if let Some(path) = &self.log_file {
            settings.log_file = path.clone();
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    args.apply(&mut settings)?;

    init_logging(&settings)?;

    let prefs = Preferences::load(&settings.prefs_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable preferences");
        Preferences::default()
    });

    let rt = tokio::runtime::Runtime::new()?;
    // Lets the UI thread spawn actions onto the runtime.
    let guard = rt.enter();

    let (handle, description) = if let Some(path) = &args.replay {
        let mut transport = ReplayTransport::new(path);
        if let Some(pace) = &args.pace {
            transport = transport.pace(parse_duration(pace).context("invalid --pace")?);
        }
        let description = transport.description().to_string();
        let handle = RealtimeClient::builder()
            .primary(transport)
            .tokens(StaticToken::new("replay"))
            .policy(settings.reconnect_policy())
            .spawn()?;
        (handle, description)
    } else {
        spawn_live_client(&settings, args.no_websocket)?
    };

    let api = AdminApi::builder()
        .endpoint(settings.api_url.clone())
        .token(settings.token.clone().unwrap_or_default())
        .timeout(settings.request_timeout)
        .build()?;
    let (dispatcher, outcomes) = Dispatcher::new(api);

    let mut app = App::new(description, settings.thresholds())
        .with_updates(handle.subscribe())
        .with_prefs(prefs, settings.prefs_path.clone());
    app.theme = Theme::auto_detect();

    info!(api_url = %settings.api_url, "console started");
    let result = run_tui(&mut app, &handle, &dispatcher, outcomes);

    handle.shutdown();
    drop(guard);
    rt.shutdown_timeout(Duration::from_secs(1));
    result
}

/// Start the sync client with SSE, falling back to WebSocket.
fn spawn_live_client(settings: &Settings, no_websocket: bool) -> Result<(RealtimeHandle, String)> {
    let sse = SseTransport::new(&settings.api_url)?;
    let description = sse.description().to_string();

    let mut builder = RealtimeClient::builder()
        .primary(sse)
        .tokens(StaticToken::from(settings.token.clone()))
        .policy(settings.reconnect_policy());

    if !no_websocket {
        let ws = match &settings.ws_url {
            Some(url) => WebSocketTransport::new(url)?,
            None => WebSocketTransport::from_api_url(&settings.api_url)?,
        };
        builder = builder.fallback(ws);
    }

    Ok((builder.spawn()?, description))
}

fn init_logging(settings: &Settings) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .with_context(|| format!("failed to open log file {}", settings.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mentionwatch=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Run the TUI until the user quits.
fn run_tui(
    app: &mut App,
    handle: &RealtimeHandle,
    dispatcher: &Dispatcher,
    outcomes: mpsc::UnboundedReceiver<Outcome>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Initial REST data
    app.request(Request::Api(Action::RefreshErrors));
    app.request(Request::Api(Action::RefreshUserStats));

    let result = run_app(&mut terminal, app, handle, dispatcher, outcomes);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    handle: &RealtimeHandle,
    dispatcher: &Dispatcher,
    mut outcomes: mpsc::UnboundedReceiver<Outcome>,
) -> Result<()> {
    while app.running {
        app.refresh();
        while let Ok(outcome) = outcomes.try_recv() {
            app.apply_outcome(outcome);
        }

        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    events::handle_mouse_event(app, mouse, ui::CONTENT_START_ROW);
                }
                // Redrawn on the next iteration
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        for request in app.take_requests() {
            match request {
                Request::Api(action) => dispatcher.dispatch(action),
                Request::Reconnect => handle.reconnect(),
            }
        }
    }

    Ok(())
}
