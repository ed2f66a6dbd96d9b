use crate::engine::box_score::BoxScoreAggregator;
use crate::engine::error::LineupError;
use courtside_api::{BoxScore, PlayerGameStat, Position, TeamSide};
use std::collections::BTreeSet;

/// Read access to team rosters (identity, positions, injury flags).
pub trait TeamRosterProvider {
    fn players_on(&self, side: TeamSide) -> Vec<&PlayerGameStat>;

    fn find(&self, player_id: &str) -> Option<&PlayerGameStat> {
        [TeamSide::Home, TeamSide::Away]
            .into_iter()
            .flat_map(|side| self.players_on(side))
            .find(|p| p.player_id == player_id)
    }
}

impl TeamRosterProvider for BoxScore {
    fn players_on(&self, side: TeamSide) -> Vec<&PlayerGameStat> {
        self.side(side).iter().collect()
    }
}

impl TeamRosterProvider for BoxScoreAggregator {
    fn players_on(&self, side: TeamSide) -> Vec<&PlayerGameStat> {
        self.players().filter(|p| p.side == side).collect()
    }
}

/// Five position slots. A slot is empty only while the user edits it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineup {
    slots: [Option<String>; 5],
}

impl Lineup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unchecked construction; `validate` reports any problems.
    pub fn from_slots(slots: [Option<String>; 5]) -> Self {
        Self { slots }
    }

    pub fn slot(&self, slot: Position) -> Option<&str> {
        self.slots[slot.index()].as_deref()
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn ids(&self) -> BTreeSet<String> {
        self.slots.iter().flatten().cloned().collect()
    }

    pub fn slot_of(&self, player_id: &str) -> Option<Position> {
        Position::ALL
            .into_iter()
            .find(|pos| self.slot(*pos) == Some(player_id))
    }

    pub fn clear(&mut self, slot: Position) {
        self.slots[slot.index()] = None;
    }

    /// Put `player_id` in `slot`, replacing whoever was there. Rejected, never
    /// corrected, if the player is on another slot, cannot play the position,
    /// is injured, or is not on `side`'s roster.
    pub fn assign(
        &mut self,
        slot: Position,
        player_id: &str,
        side: TeamSide,
        roster: &dyn TeamRosterProvider,
    ) -> Result<(), LineupError> {
        if let Some(existing) = self.slot_of(player_id) {
            if existing == slot {
                return Ok(());
            }
            return Err(LineupError::DuplicatePlayer {
                player_id: player_id.to_owned(),
                slot: existing,
            });
        }
        check_candidate(slot, player_id, side, roster)?;
        self.slots[slot.index()] = Some(player_id.to_owned());
        Ok(())
    }

    /// Full check before submission. Returns ids in slot order.
    pub fn validate(
        &self,
        side: TeamSide,
        roster: &dyn TeamRosterProvider,
    ) -> Result<Vec<String>, LineupError> {
        let mut seen = BTreeSet::new();
        let mut ids = Vec::with_capacity(Position::ALL.len());
        for slot in Position::ALL {
            let id = self.slot(slot).ok_or(LineupError::EmptySlot(slot))?;
            if !seen.insert(id) {
                return Err(LineupError::DuplicatePlayer {
                    player_id: id.to_owned(),
                    slot,
                });
            }
            check_candidate(slot, id, side, roster)?;
            ids.push(id.to_owned());
        }
        Ok(ids)
    }

    /// Best-effort starting point for the editor: place `preferred` players
    /// (usually those on court) into slots they can legally fill, primary
    /// positions first. Slots that cannot be filled stay empty.
    pub fn suggest(
        side: TeamSide,
        roster: &dyn TeamRosterProvider,
        preferred: &BTreeSet<String>,
    ) -> Self {
        let mut lineup = Self::new();
        let mut candidates: Vec<&PlayerGameStat> = roster
            .players_on(side)
            .into_iter()
            .filter(|p| !p.injured)
            .collect();
        candidates.sort_by(|a, b| {
            preferred
                .contains(&b.player_id)
                .cmp(&preferred.contains(&a.player_id))
                .then_with(|| b.stats.minutes.total_cmp(&a.stats.minutes))
        });

        for primary_only in [true, false] {
            for slot in Position::ALL {
                if lineup.slot(slot).is_some() {
                    continue;
                }
                let pick = candidates.iter().find(|p| {
                    lineup.slot_of(&p.player_id).is_none()
                        && if primary_only {
                            p.position == Some(slot)
                        } else {
                            p.can_play(slot)
                        }
                });
                if let Some(p) = pick {
                    lineup.slots[slot.index()] = Some(p.player_id.clone());
                }
            }
        }
        lineup
    }
}

fn check_candidate(
    slot: Position,
    player_id: &str,
    side: TeamSide,
    roster: &dyn TeamRosterProvider,
) -> Result<(), LineupError> {
    let player = roster
        .find(player_id)
        .ok_or_else(|| LineupError::UnknownPlayer(player_id.to_owned()))?;
    if player.side != side {
        return Err(LineupError::WrongTeam(player_id.to_owned()));
    }
    if !player.can_play(slot) {
        return Err(LineupError::IneligiblePosition {
            player_id: player_id.to_owned(),
            slot,
        });
    }
    if player.injured {
        return Err(LineupError::Injured(player_id.to_owned()));
    }
    Ok(())
}
