use crate::engine::box_score::BoxScoreAggregator;
use crate::engine::snapshot::PlaybackSnapshot;
use crate::state::app_state::CourtEffects;
use courtside_api::TeamSide;
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::symbols::Marker;
use tui::text::Span;
use tui::widgets::canvas::{Canvas, Circle, Context, Line, Rectangle};
use tui::widgets::{Block, Widget};

const COURT_COLOR: Color = Color::DarkGray;
pub const HOME_COLOR: Color = Color::Cyan;
pub const AWAY_COLOR: Color = Color::LightRed;
const BALL_COLOR: Color = Color::Rgb(255, 140, 0);

/// Top-down full court with the interpolated players and ball.
/// Positions are normalized to 0..1 on both axes, y growing downward.
pub struct CourtView<'a> {
    pub snapshot: &'a PlaybackSnapshot,
    pub roster: &'a BoxScoreAggregator,
    pub effects: &'a CourtEffects,
    pub block: Option<Block<'a>>,
}

impl Widget for CourtView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let CourtView {
            snapshot,
            roster,
            effects,
            block,
        } = self;

        let mut canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, 1.0])
            .y_bounds([0.0, 1.0])
            .paint(|ctx| {
                draw_lines(ctx);
                ctx.layer();
                draw_players(ctx, snapshot, roster);
                draw_effects(ctx, effects);
            });
        if let Some(block) = block {
            canvas = canvas.block(block);
        }
        canvas.render(area, buf);
    }
}

fn flip(y: f32) -> f64 {
    1.0 - f64::from(y.clamp(0.0, 1.0))
}

fn draw_lines(ctx: &mut Context) {
    ctx.draw(&Rectangle {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
        color: COURT_COLOR,
    });
    ctx.draw(&Line {
        x1: 0.5,
        y1: 0.0,
        x2: 0.5,
        y2: 1.0,
        color: COURT_COLOR,
    });
    ctx.draw(&Circle {
        x: 0.5,
        y: 0.5,
        radius: 0.08,
        color: COURT_COLOR,
    });
    for (hoop_x, key_x) in [(0.05, 0.0), (0.95, 0.81)] {
        ctx.draw(&Rectangle {
            x: key_x,
            y: 0.35,
            width: 0.19,
            height: 0.3,
            color: COURT_COLOR,
        });
        ctx.draw(&Circle {
            x: hoop_x,
            y: 0.5,
            radius: 0.015,
            color: BALL_COLOR,
        });
        ctx.draw(&Circle {
            x: hoop_x,
            y: 0.5,
            radius: 0.24,
            color: COURT_COLOR,
        });
    }
}

fn draw_players(ctx: &mut Context, snapshot: &PlaybackSnapshot, roster: &BoxScoreAggregator) {
    for (player_id, pose) in &snapshot.interpolated_positions {
        let player = roster.player(player_id);
        let color = match player.map(|p| p.side) {
            Some(TeamSide::Home) => HOME_COLOR,
            Some(TeamSide::Away) => AWAY_COLOR,
            None => Color::Gray,
        };
        let label = player
            .and_then(|p| p.position)
            .map(|pos| pos.label())
            .unwrap_or("•");
        let mut style = Style::default().fg(color);
        if pose.has_ball {
            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        ctx.print(f64::from(pose.x), flip(pose.y), Span::styled(label, style));
    }

    let ball = snapshot.interpolated_ball_position;
    ctx.draw(&Circle {
        x: f64::from(ball.x),
        y: flip(ball.y),
        radius: 0.01,
        color: BALL_COLOR,
    });
}

fn draw_effects(ctx: &mut Context, effects: &CourtEffects) {
    for mark in &effects.defense_marks {
        ctx.print(
            f64::from(mark.x),
            flip(mark.y),
            Span::styled(
                mark.kind.label(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        );
    }
    if let Some(flash) = effects.score_flash {
        let color = if flash.is_home { HOME_COLOR } else { AWAY_COLOR };
        ctx.print(
            0.46,
            0.9,
            Span::styled(
                format!("+{}", flash.points),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        );
    }
}
