use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::court::{AWAY_COLOR, CourtView, HOME_COLOR};
use crate::engine::box_score::{SortDirection, StatColumn};
use crate::engine::quarter_break::{CoordinatorState, PendingCall};
use crate::engine::snapshot::PlaybackSnapshot;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::session::GameSession;
use crate::ui::layout::{CourtAreas, LayoutAreas};
use courtside_api::{PlayerGameStat, Position, StatLine, TeamSide};

static TABS: &[&str; 3] = &["Court", "Box Score", "Standings"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Court => draw_court(f, layout.main, app),
            MenuItem::BoxScore => draw_box_score(f, layout.main, app),
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn side_color(side: TeamSide) -> Color {
    match side {
        TeamSide::Home => HOME_COLOR,
        TeamSide::Away => AWAY_COLOR,
    }
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Court => 0,
        MenuItem::BoxScore => 1,
        MenuItem::Standings => 2,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn waiting_message(app: &App) -> String {
    match app.state.last_error.as_deref() {
        Some(err) => format!("Could not load game:\n{err}"),
        None if app.settings.game_id.is_some() => "Loading game...".to_string(),
        None => "No game loaded. Start with --replay <file> or --game <id>.".to_string(),
    }
}

fn start_message(session: &GameSession) -> String {
    let coordinator = session.coordinator();
    match (coordinator.pending(), coordinator.last_error()) {
        (Some(_), _) => "Starting live game...".to_string(),
        (None, Some(err)) => format!("{err}\nPress Enter to try again."),
        (None, None) => "Press Enter to start the game.".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Court tab
// ---------------------------------------------------------------------------

fn draw_court(f: &mut Frame, area: Rect, app: &App) {
    let Some(session) = app.session.as_ref() else {
        draw_placeholder(f, area, &waiting_message(app));
        return;
    };
    let snapshot = session.snapshot();
    let areas = CourtAreas::new(area);

    draw_scoreboard(f, areas.scoreboard, session, &snapshot);

    if session.coordinator().awaiting_start() {
        draw_placeholder(f, areas.court, &start_message(session));
    } else if snapshot.no_data {
        draw_placeholder(f, areas.court, "No data, cannot play this replay.");
    } else {
        f.render_widget(
            CourtView {
                snapshot: &snapshot,
                roster: session.controller().box_score(),
                effects: &app.state.effects,
                block: Some(default_border(Color::DarkGray).title(format!(" {} ", session.title()))),
            },
            areas.court,
        );
    }

    draw_play_text(f, areas.play, &snapshot);
    draw_progress(f, areas.progress, &snapshot);
    if areas.sidebar.width > 0 {
        draw_sidebar(f, areas.sidebar, app, session);
    }

    match session.coordinator().state() {
        CoordinatorState::QuarterBreak { completed_quarter } => {
            draw_quarter_break(f, areas.court, app, session, completed_quarter)
        }
        CoordinatorState::GameComplete => draw_final(f, areas.court, session, &snapshot),
        CoordinatorState::Playing => {}
    }
}

fn draw_scoreboard(f: &mut Frame, area: Rect, session: &GameSession, snapshot: &PlaybackSnapshot) {
    let block = default_border(Color::White);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let ball = |side: TeamSide| {
        if snapshot.offense == Some(side) {
            " ●"
        } else {
            "  "
        }
    };
    let state = match session.coordinator().state() {
        CoordinatorState::Playing if snapshot.is_playing => "▶",
        CoordinatorState::Playing => "⏸",
        CoordinatorState::QuarterBreak { .. } => "BREAK",
        CoordinatorState::GameComplete => "FINAL",
    };
    let live = if snapshot.is_live { "  LIVE" } else { "" };
    let line = Line::from(vec![
        Span::styled(
            format!("AWAY {:>3}{}", snapshot.current_away_score, ball(TeamSide::Away)),
            Style::default()
                .fg(AWAY_COLOR)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("HOME {:>3}{}", snapshot.current_home_score, ball(TeamSide::Home)),
            Style::default()
                .fg(HOME_COLOR)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "   Q{}  {}  {:.2}x{}",
            snapshot.current_quarter, state, snapshot.speed_multiplier, live
        )),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), inner);
}

fn draw_play_text(f: &mut Frame, area: Rect, snapshot: &PlaybackSnapshot) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut spans = Vec::new();
    if let Some(name) = snapshot.current_play_name.as_deref() {
        spans.push(Span::styled(
            format!("{name}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::raw(
        snapshot.current_play_description.clone().unwrap_or_default(),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn draw_progress(f: &mut Frame, area: Rect, snapshot: &PlaybackSnapshot) {
    let label = format!(
        "possession {}/{}  {:.1}s/{:.1}s",
        (snapshot.possession_index + 1).min(snapshot.possession_count),
        snapshot.possession_count,
        snapshot.time_within_possession,
        snapshot.possession_duration
    );
    f.render_widget(
        Gauge::default()
            .ratio(snapshot.progress())
            .label(label)
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black)),
        area,
    );
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App, session: &GameSession) {
    let block = default_border(Color::DarkGray).title(" Game ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    for notice in session.notices() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", notice.at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(notice.text.clone(), Style::default().fg(Color::Yellow)),
        ]));
    }

    if !app.state.effects.stat_pops.is_empty() {
        lines.push(Line::from(""));
        for pop in &app.state.effects.stat_pops {
            let player = session.controller().box_score().player(&pop.player_id);
            let name = player.map_or(pop.player_id.as_str(), |p| p.name.as_str());
            let color = player.map_or(Color::Gray, |p| side_color(p.side));
            lines.push(Line::from(vec![
                Span::styled(format!("{name} "), Style::default().fg(color)),
                Span::styled(pop.text.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]));
        }
    }

    if let Some(batch) = session.batch() {
        lines.push(Line::from(""));
        let text = if batch.finished {
            "Around the league: all games final".to_string()
        } else if batch.total > 0 {
            format!("Around the league: {}/{} games", batch.completed, batch.total)
        } else {
            "Around the league: simulating...".to_string()
        };
        lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Gray))));
    }

    if let Some(err) = app.state.last_error.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn draw_quarter_break(
    f: &mut Frame,
    area: Rect,
    app: &App,
    session: &GameSession,
    completed_quarter: u8,
) {
    let coordinator = session.coordinator();
    let popup = centered(area, 56, if coordinator.is_live() { 14 } else { 5 });
    f.render_widget(Clear, popup);
    let block = default_border(Color::Yellow).title(format!(" End of Q{completed_quarter} "));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if !coordinator.is_live() {
        f.render_widget(
            Paragraph::new("Enter = continue to the next quarter").alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let roster = session.controller().box_score();
    let mut lines = Vec::new();
    for (i, slot) in Position::ALL.iter().enumerate() {
        let selected = i == app.state.lineup_editor.slot;
        let name = coordinator
            .lineup()
            .slot(*slot)
            .map(|id| roster.player(id).map_or(id, |p| p.name.as_str()))
            .unwrap_or("(empty)");
        let style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let marker = if selected { '>' } else { ' ' };
        lines.push(Line::from(Span::styled(
            format!("{marker} {:<3} {name}", slot.label()),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Offense: {}   Defense: {}",
        coordinator.offensive_style().label(),
        coordinator.defensive_style().label()
    )));

    let status = match coordinator.pending() {
        Some(PendingCall::Start | PendingCall::Continue) => Span::styled(
            "Simulating next quarter...",
            Style::default().fg(Color::Gray),
        ),
        Some(PendingCall::SimToEnd) => Span::styled(
            "Simulating to the final buzzer...",
            Style::default().fg(Color::Gray),
        ),
        None => match coordinator.last_error() {
            Some(err) => Span::styled(err.to_string(), Style::default().fg(Color::Red)),
            None => Span::raw(""),
        },
    };
    lines.push(Line::from(status));
    lines.push(Line::from(Span::styled(
        "j/k slot  p player  x clear  o/d styles  Enter continue  S sim to end",
        Style::default().fg(Color::DarkGray),
    )));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn draw_final(f: &mut Frame, area: Rect, session: &GameSession, snapshot: &PlaybackSnapshot) {
    let quarters = session.coordinator().quarter_scores();
    let popup = centered(area, 40, if quarters.is_empty() { 3 } else { 7 });
    f.render_widget(Clear, popup);
    let block = default_border(Color::Green).title(" Final ");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = vec![Line::from(Span::styled(
        format!(
            "AWAY {}  HOME {}",
            snapshot.current_away_score, snapshot.current_home_score
        ),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if !quarters.is_empty() {
        lines.push(Line::from(""));
        let header: String = quarters.iter().map(|q| format!("{:>5}", format!("Q{}", q.quarter))).collect();
        let away: String = quarters.iter().map(|q| format!("{:>5}", q.away)).collect();
        let home: String = quarters.iter().map(|q| format!("{:>5}", q.home)).collect();
        lines.push(Line::from(format!("     {header}")));
        lines.push(Line::from(Span::styled(format!("AWAY {away}"), Style::default().fg(AWAY_COLOR))));
        lines.push(Line::from(Span::styled(format!("HOME {home}"), Style::default().fg(HOME_COLOR))));
    }
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

// ---------------------------------------------------------------------------
// Box score tab
// ---------------------------------------------------------------------------

fn stat_cell(column: StatColumn, player: &PlayerGameStat) -> String {
    format_stat(column, &player.stats, &player.name)
}

fn format_stat(column: StatColumn, s: &StatLine, name: &str) -> String {
    match column {
        StatColumn::Name => name.to_string(),
        StatColumn::Minutes => format!("{:.0}", s.minutes),
        StatColumn::Points => s.points.to_string(),
        StatColumn::Rebounds => s.rebounds.to_string(),
        StatColumn::Assists => s.assists.to_string(),
        StatColumn::Steals => s.steals.to_string(),
        StatColumn::Blocks => s.blocks.to_string(),
        StatColumn::Turnovers => s.turnovers.to_string(),
        StatColumn::FieldGoals => format!("{}-{}", s.fg_made, s.fg_attempted),
        StatColumn::Threes => format!("{}-{}", s.three_made, s.three_attempted),
        StatColumn::FreeThrows => format!("{}-{}", s.ft_made, s.ft_attempted),
    }
}

fn draw_box_score(f: &mut Frame, area: Rect, app: &App) {
    let Some(session) = app.session.as_ref() else {
        draw_placeholder(f, area, &waiting_message(app));
        return;
    };
    let view = app.state.box_score;
    let coordinator = session.coordinator();
    let is_final = coordinator.state() == CoordinatorState::GameComplete;
    let title = format!(
        " {} Box Score{} ",
        view.side.label(),
        if is_final { " (Final)" } else { "" }
    );
    let block = default_border(side_color(view.side)).title(title);

    let aggregator = session.controller().box_score();
    let on_court = session.on_court_ids();
    let players = aggregator.sorted_players(
        view.side,
        view.column,
        view.direction,
        (!is_final).then_some(&on_court),
    );

    let arrow = match view.direction {
        SortDirection::Ascending => "▲",
        SortDirection::Descending => "▼",
    };
    let header = Row::new(StatColumn::ALL.iter().map(|c| {
        if *c == view.column {
            Cell::from(format!("{}{arrow}", c.label()))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else {
            Cell::from(c.label())
        }
    }))
    .style(Style::default().add_modifier(Modifier::UNDERLINED));

    let mut rows: Vec<Row> = players
        .iter()
        .skip(view.scroll_offset as usize)
        .map(|p| {
            let style = if !is_final && on_court.contains(&p.player_id) {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else if p.injured {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Gray)
            };
            Row::new(StatColumn::ALL.iter().map(|c| Cell::from(stat_cell(*c, p)))).style(style)
        })
        .collect();
    let totals = aggregator.totals(view.side);
    rows.push(
        Row::new(
            StatColumn::ALL
                .iter()
                .map(|c| Cell::from(format_stat(*c, &totals, "TOTAL"))),
        )
        .style(Style::default().add_modifier(Modifier::BOLD)),
    );

    let mut widths = vec![Constraint::Fill(1)];
    widths.extend(StatColumn::ALL.iter().skip(1).map(|c| match c {
        StatColumn::FieldGoals | StatColumn::Threes | StatColumn::FreeThrows => Constraint::Length(6),
        _ => Constraint::Length(4),
    }));

    f.render_widget(
        Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1),
        area,
    );
}

// ---------------------------------------------------------------------------
// Standings tab
// ---------------------------------------------------------------------------

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let Some(standings) = app.session.as_ref().and_then(|s| s.standings()) else {
        draw_placeholder(f, area, "Standings load when your game is final.");
        return;
    };
    let title = match standings.updated_at {
        Some(at) => format!(" Standings (updated {}) ", at.format("%H:%M")),
        None => " Standings ".to_string(),
    };

    let header = Row::new(["#", "Team", "W", "L", "PCT"])
        .style(Style::default().add_modifier(Modifier::UNDERLINED));
    let rows = standings.rows.iter().enumerate().map(|(i, row)| {
        let games = u32::from(row.wins) + u32::from(row.losses);
        let pct = if games == 0 {
            0.0
        } else {
            f64::from(row.wins) / f64::from(games)
        };
        Row::new([
            (i + 1).to_string(),
            row.name.clone(),
            row.wins.to_string(),
            row.losses.to_string(),
            format!("{pct:.3}"),
        ])
    });
    f.render_widget(
        Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Fill(1),
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Length(6),
            ],
        )
        .header(header)
        .block(default_border(Color::White).title(title)),
        area,
    );
}

// ---------------------------------------------------------------------------
// Help, logs, spinner
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let lines = [
        "space     play / pause",
        "←/→       seek 1s back / forward",
        "h/l       previous / next possession",
        "s         cycle playback speed",
        "Enter     continue after a quarter break",
        "S         simulate to the end (live)",
        "j/k p x   lineup slot / player / clear (live break)",
        "o/d       offensive / defensive style (live break)",
        "c d t     box score column / direction / team",
        "1 2 3     court / box score / standings",
        "f         full screen",
        "\"         toggle logs",
        "q         quit",
    ];
    let block = default_border(Color::White).title(" Help ");
    f.render_widget(
        Paragraph::new(lines.iter().map(|l| Line::from(*l)).collect::<Vec<_>>()).block(block),
        area,
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    f.render_widget(
        TuiLoggerWidget::default()
            .block(default_border(Color::DarkGray).title(" Logs "))
            .style_error(Style::default().fg(Color::Red))
            .style_warn(Style::default().fg(Color::Yellow))
            .style_info(Style::default().fg(Color::Gray)),
        area,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
