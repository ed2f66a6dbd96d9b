mod app;
mod components;
mod draw;
mod engine;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::engine::replay::ReplayModel;
use crate::state::app_settings::{AppSettings, CliAction, parse_cli_args};
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use anyhow::Context;
use courtside_api::client::SimApi;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(settings) = handle_cli_args() else {
        return Ok(());
    };
    let replay = load_replay(&settings)?;

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Error)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let tick = settings.tick;
    let client = SimApi::new(settings.api_url.clone());
    let mut app = App::new(settings);
    if let Some((title, replay)) = replay {
        app.open_replay(title, replay);
    }
    let app = Arc::new(Mutex::new(app));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(client, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Playback clock, one tick per frame
    let tick_tx = ui_event_tx.clone();
    let playback_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tick_tx.send(UiEvent::PlaybackTick(tick)).await.is_err() {
                break;
            }
        }
    });

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();
    playback_task.abort();

    Ok(())
}

/// `None` when the process should exit without starting the UI.
fn handle_cli_args() -> Option<AppSettings> {
    match parse_cli_args(std::env::args().skip(1)) {
        Ok(CliAction::Help) => {
            println!("{}", usage_text());
            None
        }
        Ok(CliAction::Version) => {
            println!("courtside {}", env!("CARGO_PKG_VERSION"));
            None
        }
        Ok(CliAction::Run(overrides)) => {
            let mut settings = AppSettings::load();
            settings.apply(overrides);
            Some(settings)
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "courtside - basketball game replays and live quarter-by-quarter games in your terminal

Usage:
  courtside --replay <file.json>
  courtside --game <id>
  courtside --game <id> --live
  courtside --help
  courtside --version

Environment:
  COURTSIDE_API_URL      Simulation backend (default http://127.0.0.1:8080)
  COURTSIDE_GAME_ID      Game to open when --game is not given
  COURTSIDE_REPLAY_JSON  Local animation payload when --replay is not given
  COURTSIDE_LIVE         1 to play the game live
  COURTSIDE_SIDE         home or away, the side you coach in a live game
  COURTSIDE_TICK_MS      Frame interval, 16-33 (default 33)
  COURTSIDE_SPEED        Starting playback speed (default 1)
  COURTSIDE_LOG_LEVEL    error, warn, info, debug or trace"
}

fn load_replay(settings: &AppSettings) -> anyhow::Result<Option<(String, ReplayModel)>> {
    let Some(path) = settings.replay_path.as_ref() else {
        return Ok(None);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading replay {}", path.display()))?;
    let replay = ReplayModel::from_json(&json)
        .with_context(|| format!("parsing replay {}", path.display()))?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "replay".to_string());
    Ok(Some((title, replay)))
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }
        }
    }
}

async fn send_all(network_requests: &mpsc::Sender<NetworkRequest>, requests: Vec<NetworkRequest>) {
    for request in requests {
        if let Err(e) = network_requests.send(request).await {
            error!("Failed to queue network request: {e}");
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let request = app.lock().await.startup_request();
            if let Some(request) = request {
                info!("starting with {:?}", request.kind());
                send_all(network_requests, vec![request]).await;
            }
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
        UiEvent::PlaybackTick(elapsed) => {
            let requests = app.lock().await.on_tick(elapsed);
            send_all(network_requests, requests).await;
            true
        }
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    let mut guard = app.lock().await;
    let requests = match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::QuarterLoaded { quarter } => guard.on_quarter_loaded(quarter),
        NetworkResponse::SimFinished { result } => guard.on_sim_finished(result),
        NetworkResponse::GameLoaded { game } => {
            guard.on_game_loaded(game);
            Vec::new()
        }
        NetworkResponse::BatchProgress {
            batch_id,
            completed,
            total,
        } => {
            guard.on_batch_progress(batch_id, completed, total);
            Vec::new()
        }
        NetworkResponse::BatchFinished { batch_id } => guard.on_batch_finished(batch_id),
        NetworkResponse::StandingsLoaded { standings } => {
            guard.on_standings_loaded(standings);
            Vec::new()
        }
        NetworkResponse::Error { kind, message } => {
            error!("Network error ({kind:?}): {message}");
            guard.on_error(kind, message);
            Vec::new()
        }
    };
    drop(guard);
    send_all(network_requests, requests).await;
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        cursor::Hide,
        terminal::EnterAlternateScreen,
        terminal::Clear(terminal::ClearType::All)
    );
    if let Err(e) = terminal::enable_raw_mode() {
        eprintln!("failed to enable raw mode: {e}");
    }
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        cursor::MoveTo(0, 0),
        terminal::Clear(terminal::ClearType::All),
        terminal::LeaveAlternateScreen,
        cursor::Show
    );
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
