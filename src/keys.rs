use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::error;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    let mut requests = Vec::new();

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            guard.shutdown();
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Court),
        (_, Char('2'), _) => guard.update_tab(MenuItem::BoxScore),
        (_, Char('3'), _) => guard.update_tab(MenuItem::Standings),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Box score
        (MenuItem::BoxScore, Char('c'), _) => guard.box_score_cycle_column(),
        (MenuItem::BoxScore, Char('d'), _) => guard.box_score_flip_direction(),
        (MenuItem::BoxScore, Char('t'), _) => guard.box_score_toggle_side(),
        (MenuItem::BoxScore, Char('j') | KeyCode::Down, _) => guard.box_score_scroll_down(),
        (MenuItem::BoxScore, Char('k') | KeyCode::Up, _) => guard.box_score_scroll_up(),

        // Quarter-break editing
        (MenuItem::Court, Char('j') | KeyCode::Down, _) => guard.lineup_next_slot(),
        (MenuItem::Court, Char('k') | KeyCode::Up, _) => guard.lineup_prev_slot(),
        (MenuItem::Court, Char('p'), _) => guard.lineup_cycle_player(),
        (MenuItem::Court, Char('x'), _) => guard.lineup_clear_slot(),
        (MenuItem::Court, Char('o'), _) => guard.cycle_offensive_style(),
        (MenuItem::Court, Char('d'), _) => guard.cycle_defensive_style(),
        (MenuItem::Court, Char('S'), _) => requests = guard.sim_to_end(),
        (_, KeyCode::Enter, _) => requests = guard.continue_play(),

        // Playback
        (_, Char(' '), _) => guard.toggle_play_pause(),
        (_, KeyCode::Right, _) => requests = guard.seek_forward(),
        (_, KeyCode::Left, _) => requests = guard.seek_back(),
        (_, Char('l'), _) => requests = guard.next_possession(),
        (_, Char('h'), _) => requests = guard.previous_possession(),
        (_, Char('s'), _) => guard.cycle_speed(),

        // Global
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }

    drop(guard);
    for request in requests {
        if let Err(e) = network_requests.send(request).await {
            error!("Failed to queue network request: {e}");
        }
    }
}
