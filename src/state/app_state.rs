use crate::app::MenuItem;
use crate::engine::box_score::{SortDirection, StatChange, StatColumn};
use crate::engine::snapshot::AnimationSink;
use courtside_api::{Outcome, PlayerGameStat, Position, TeamSide};
use std::time::Duration;

const SCORE_FLASH: Duration = Duration::from_millis(1200);
const DEFENSE_MARK: Duration = Duration::from_millis(900);
const STAT_POP: Duration = Duration::from_millis(1500);
const MAX_STAT_POPS: usize = 6;

// ---------------------------------------------------------------------------
// Court animations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFlash {
    pub points: u8,
    pub is_home: bool,
    pub remaining: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseMark {
    pub x: f32,
    pub y: f32,
    pub kind: Outcome,
    pub remaining: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatPop {
    pub player_id: String,
    pub text: String,
    pub remaining: Duration,
}

/// Short-lived overlays drawn on top of the court. Each trigger plays once
/// and fades out as ticks pass.
#[derive(Debug, Default)]
pub struct CourtEffects {
    pub score_flash: Option<ScoreFlash>,
    pub defense_marks: Vec<DefenseMark>,
    pub stat_pops: Vec<StatPop>,
}

impl CourtEffects {
    pub fn advance(&mut self, elapsed: Duration) {
        if let Some(flash) = &mut self.score_flash {
            flash.remaining = flash.remaining.saturating_sub(elapsed);
            if flash.remaining.is_zero() {
                self.score_flash = None;
            }
        }
        for mark in &mut self.defense_marks {
            mark.remaining = mark.remaining.saturating_sub(elapsed);
        }
        self.defense_marks.retain(|m| !m.remaining.is_zero());
        for pop in &mut self.stat_pops {
            pop.remaining = pop.remaining.saturating_sub(elapsed);
        }
        self.stat_pops.retain(|p| !p.remaining.is_zero());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        self.score_flash.is_none() && self.defense_marks.is_empty() && self.stat_pops.is_empty()
    }
}

impl AnimationSink for CourtEffects {
    fn trigger_score_animation(&mut self, points: u8, is_home: bool) {
        self.score_flash = Some(ScoreFlash {
            points,
            is_home,
            remaining: SCORE_FLASH,
        });
    }

    fn trigger_defensive_animation_at_position(&mut self, x: f32, y: f32, kind: Outcome) {
        self.defense_marks.push(DefenseMark {
            x,
            y,
            kind,
            remaining: DEFENSE_MARK,
        });
    }

    fn trigger_stat_pops(&mut self, changes: &[StatChange]) {
        for change in changes {
            self.stat_pops.push(StatPop {
                player_id: change.player_id.clone(),
                text: format!("{:+} {}", change.delta, change.stat.label()),
                remaining: STAT_POP,
            });
        }
        let overflow = self.stat_pops.len().saturating_sub(MAX_STAT_POPS);
        self.stat_pops.drain(..overflow);
    }
}

// ---------------------------------------------------------------------------
// Box score tab
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxScoreView {
    pub column: StatColumn,
    pub direction: SortDirection,
    pub side: TeamSide,
    pub scroll_offset: u16,
}

impl BoxScoreView {
    pub fn cycle_column(&mut self) {
        self.column = self.column.next();
    }

    pub fn flip_direction(&mut self) {
        self.direction = self.direction.flip();
    }

    pub fn toggle_side(&mut self) {
        self.side = self.side.opposite();
        self.scroll_offset = 0;
    }
}

// ---------------------------------------------------------------------------
// Quarter-break lineup editor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineupEditor {
    pub slot: usize,
    pub candidate: usize,
}

impl LineupEditor {
    pub fn selected_slot(&self) -> Position {
        Position::ALL[self.slot % Position::ALL.len()]
    }

    pub fn next_slot(&mut self) {
        self.slot = (self.slot + 1) % Position::ALL.len();
        self.candidate = 0;
    }

    pub fn prev_slot(&mut self) {
        self.slot = (self.slot + Position::ALL.len() - 1) % Position::ALL.len();
        self.candidate = 0;
    }

    /// Healthy players on `side` who can play the selected slot.
    pub fn candidates<'a>(
        &self,
        side: TeamSide,
        players: impl Iterator<Item = &'a PlayerGameStat>,
    ) -> Vec<&'a PlayerGameStat> {
        let slot = self.selected_slot();
        let mut out: Vec<_> = players
            .filter(|p| p.side == side && !p.injured && p.can_play(slot))
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Step to the next candidate and return its id.
    pub fn cycle_candidate<'a>(
        &mut self,
        side: TeamSide,
        players: impl Iterator<Item = &'a PlayerGameStat>,
    ) -> Option<String> {
        let candidates = self.candidates(side, players);
        if candidates.is_empty() {
            return None;
        }
        let pick = candidates[self.candidate % candidates.len()].player_id.clone();
        self.candidate = (self.candidate + 1) % candidates.len();
        Some(pick)
    }
}

// ---------------------------------------------------------------------------
// Top-level app state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub box_score: BoxScoreView,
    pub lineup_editor: LineupEditor,
    pub effects: CourtEffects,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lineup::tests::roster;

    #[test]
    fn effects_fade_out() {
        let mut effects = CourtEffects::default();
        effects.trigger_score_animation(3, false);
        effects.trigger_defensive_animation_at_position(0.4, 0.6, Outcome::Blocked);
        assert!(!effects.is_idle());

        effects.advance(Duration::from_millis(1000));
        assert!(effects.score_flash.is_some());
        assert!(effects.defense_marks.is_empty());

        effects.advance(Duration::from_millis(300));
        assert!(effects.is_idle());
    }

    #[test]
    fn stat_pops_are_capped_oldest_first() {
        let mut effects = CourtEffects::default();
        let changes: Vec<StatChange> = (0..8)
            .map(|i| StatChange {
                player_id: format!("h{i}"),
                stat: StatColumn::Points,
                delta: 2,
            })
            .collect();
        effects.trigger_stat_pops(&changes);
        assert_eq!(effects.stat_pops.len(), MAX_STAT_POPS);
        assert_eq!(effects.stat_pops[0].player_id, "h2");
        assert_eq!(effects.stat_pops[0].text, "+2 PTS");
    }

    #[test]
    fn box_score_view_toggles() {
        let mut view = BoxScoreView::default();
        view.scroll_offset = 4;
        view.toggle_side();
        assert_eq!(view.side, TeamSide::Away);
        assert_eq!(view.scroll_offset, 0);
        view.flip_direction();
        assert_eq!(view.direction, SortDirection::Ascending);
        view.cycle_column();
        assert_eq!(view.column, StatColumn::Points);
    }

    #[test]
    fn lineup_editor_cycles_eligible_players() {
        let roster = roster();
        let mut editor = LineupEditor::default();
        // PG: h0 and the bench guard h5.
        assert_eq!(
            editor.cycle_candidate(TeamSide::Home, roster.players()),
            Some("h0".into())
        );
        assert_eq!(
            editor.cycle_candidate(TeamSide::Home, roster.players()),
            Some("h5".into())
        );
        assert_eq!(
            editor.cycle_candidate(TeamSide::Home, roster.players()),
            Some("h0".into())
        );

        editor.prev_slot();
        assert_eq!(editor.selected_slot(), Position::C);
        // h6 is injured.
        let ids: Vec<_> = editor
            .candidates(TeamSide::Home, roster.players())
            .into_iter()
            .map(|p| p.player_id.as_str())
            .collect();
        assert_eq!(ids, ["h4"]);
    }
}
