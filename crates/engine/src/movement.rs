//! Turn-based movement budgets.
//!
//! A combatant starts each turn with its base speed unlocked. Moving past the
//! unlocked budget costs action points, one per whole-speed increment, and
//! needs the player's confirmation before it is committed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::{GridConfig, WorldPosition};
use crate::world::TokenId;

pub const DEFAULT_CREATURE_SPEED_FEET: f32 = 30.0;
const FEET_EPSILON: f32 = 1e-3;

/// Straight-line drag distance in feet. Non-finite input measures as zero.
pub fn movement_distance_feet(
    start: WorldPosition,
    current: WorldPosition,
    grid: &GridConfig,
) -> f32 {
    if !start.is_finite() || !current.is_finite() {
        return 0.0;
    }
    if !grid.cell_size.is_finite() || grid.cell_size <= 0.0 {
        return 0.0;
    }
    let feet_per_cell = if grid.feet_per_cell.is_finite() && grid.feet_per_cell > 0.0 {
        grid.feet_per_cell
    } else {
        crate::app::DEFAULT_FEET_PER_CELL
    };
    start.distance(current) / grid.cell_size * feet_per_cell
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatantTurn {
    pub speed_feet: f32,
    #[serde(default)]
    pub movement_used: f32,
    /// Budget already paid for this turn. Never below `speed_feet`.
    #[serde(default)]
    pub unlocked_movement: f32,
    pub action_points: u32,
}

impl CombatantTurn {
    pub fn new(speed_feet: f32, action_points: u32) -> Self {
        Self {
            speed_feet,
            movement_used: 0.0,
            unlocked_movement: speed_feet,
            action_points,
        }
    }

    pub fn speed(&self) -> f32 {
        if self.speed_feet.is_finite() && self.speed_feet > 0.0 {
            self.speed_feet
        } else {
            DEFAULT_CREATURE_SPEED_FEET
        }
    }

    pub fn unlocked(&self) -> f32 {
        let paid = if self.unlocked_movement.is_finite() {
            self.unlocked_movement
        } else {
            0.0
        };
        paid.max(self.speed())
    }

    fn used(&self) -> f32 {
        if self.movement_used.is_finite() {
            self.movement_used.max(0.0)
        } else {
            0.0
        }
    }

    /// Feet still reachable this turn, counting every AP left.
    pub fn remaining_movement(&self) -> f32 {
        (self.unlocked() - self.used()).max(0.0) + self.action_points as f32 * self.speed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementTier {
    Invalid,
    NeedsActionPoints,
    WithinBase,
    WithinPaid,
}

/// Structured verdict for one drag update. Presentation maps `tier()` to colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementVerdict {
    pub is_valid: bool,
    pub needs_confirmation: bool,
    pub total_movement_after_this: f32,
    pub movement_used_this_turn: f32,
    pub creature_speed: f32,
    pub additional_ap_needed: u32,
    pub feet_moved: f32,
    /// Budget the turn would hold once this move is committed.
    pub unlocked_after_this: f32,
    /// False outside combat; the drag is then unrestricted.
    pub enforced: bool,
}

impl MovementVerdict {
    pub fn unrestricted(feet_moved: f32) -> Self {
        Self {
            is_valid: true,
            needs_confirmation: false,
            total_movement_after_this: feet_moved,
            movement_used_this_turn: 0.0,
            creature_speed: 0.0,
            additional_ap_needed: 0,
            feet_moved,
            unlocked_after_this: 0.0,
            enforced: false,
        }
    }

    pub fn tier(&self) -> MovementTier {
        if !self.is_valid {
            MovementTier::Invalid
        } else if self.needs_confirmation {
            MovementTier::NeedsActionPoints
        } else if !self.enforced
            || self.total_movement_after_this <= self.creature_speed + FEET_EPSILON
        {
            MovementTier::WithinBase
        } else {
            MovementTier::WithinPaid
        }
    }
}

/// Judges a move of `feet_moved` against the combatant's turn, or returns an
/// unrestricted verdict when there is no turn data.
pub fn validate_movement(feet_moved: f32, turn: Option<&CombatantTurn>) -> MovementVerdict {
    let feet_moved = if feet_moved.is_finite() {
        feet_moved.max(0.0)
    } else {
        0.0
    };
    let Some(turn) = turn else {
        return MovementVerdict::unrestricted(feet_moved);
    };

    let speed = turn.speed();
    let unlocked = turn.unlocked();
    let used = turn.used();
    let total = used + feet_moved;

    let mut verdict = MovementVerdict {
        is_valid: true,
        needs_confirmation: false,
        total_movement_after_this: total,
        movement_used_this_turn: used,
        creature_speed: speed,
        additional_ap_needed: 0,
        feet_moved,
        unlocked_after_this: unlocked,
        enforced: true,
    };

    if total <= unlocked + FEET_EPSILON {
        return verdict;
    }

    let next_budget = ((total - FEET_EPSILON) / speed).ceil() * speed;
    let increments = ((next_budget - unlocked) / speed).round().max(1.0) as u32;
    verdict.needs_confirmation = true;
    verdict.additional_ap_needed = increments;
    verdict.unlocked_after_this = next_budget;
    verdict.is_valid = increments <= turn.action_points;
    verdict
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovementError {
    #[error("token {token:?} is not in the combat roster")]
    NotInCombat { token: TokenId },
    #[error("move needs {needed} action points, {available} available")]
    InsufficientActionPoints { needed: u32, available: u32 },
    #[error("verdict was not produced for a combat move")]
    NotEnforced,
}

/// Per-turn movement tracking for every combatant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatState {
    pub active: bool,
    turns: BTreeMap<TokenId, CombatantTurn>,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn end(&mut self) {
        self.active = false;
        self.turns.clear();
    }

    pub fn add_combatant(&mut self, token: TokenId, turn: CombatantTurn) {
        self.turns.insert(token, turn);
    }

    pub fn turn(&self, token: TokenId) -> Option<&CombatantTurn> {
        if !self.active {
            return None;
        }
        self.turns.get(&token)
    }

    pub fn validate(&self, token: TokenId, feet_moved: f32) -> MovementVerdict {
        validate_movement(feet_moved, self.turn(token))
    }

    /// Commits a validated move: spends its AP, raises the unlocked budget
    /// and records the new total as used.
    pub fn confirm_movement(
        &mut self,
        token: TokenId,
        verdict: &MovementVerdict,
    ) -> Result<(), MovementError> {
        if !verdict.enforced {
            return Err(MovementError::NotEnforced);
        }
        if !self.active {
            return Err(MovementError::NotInCombat { token });
        }
        let turn = self
            .turns
            .get_mut(&token)
            .ok_or(MovementError::NotInCombat { token })?;
        if verdict.additional_ap_needed > turn.action_points {
            return Err(MovementError::InsufficientActionPoints {
                needed: verdict.additional_ap_needed,
                available: turn.action_points,
            });
        }
        turn.action_points -= verdict.additional_ap_needed;
        turn.unlocked_movement = turn.unlocked().max(verdict.unlocked_after_this);
        turn.movement_used = verdict.total_movement_after_this;
        Ok(())
    }

    pub fn add_movement_used(&mut self, token: TokenId, feet: f32) -> Result<(), MovementError> {
        let turn = self
            .turns
            .get_mut(&token)
            .ok_or(MovementError::NotInCombat { token })?;
        if feet.is_finite() && feet > 0.0 {
            turn.movement_used = turn.used() + feet;
        }
        Ok(())
    }

    pub fn remaining_movement(&self, token: TokenId) -> Option<f32> {
        self.turn(token).map(CombatantTurn::remaining_movement)
    }

    /// Start-of-turn reset. Action points are refilled to `action_points`.
    pub fn reset_turn(&mut self, token: TokenId, action_points: u32) -> Result<(), MovementError> {
        let turn = self
            .turns
            .get_mut(&token)
            .ok_or(MovementError::NotInCombat { token })?;
        turn.movement_used = 0.0;
        turn.unlocked_movement = turn.speed();
        turn.action_points = action_points;
        Ok(())
    }
}

/// One drag, from pick-up to drop. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementSession {
    pub token: TokenId,
    pub start: WorldPosition,
    pub current: WorldPosition,
    pub feet_moved: f32,
    pub verdict: MovementVerdict,
}

impl MovementSession {
    pub fn begin(token: TokenId, start: WorldPosition) -> Self {
        Self {
            token,
            start,
            current: start,
            feet_moved: 0.0,
            verdict: MovementVerdict::unrestricted(0.0),
        }
    }

    pub fn update(
        &mut self,
        current: WorldPosition,
        grid: &GridConfig,
        combat: &CombatState,
    ) -> &MovementVerdict {
        self.current = current;
        self.feet_moved = movement_distance_feet(self.start, current, grid);
        self.verdict = combat.validate(self.token, self.feet_moved);
        &self.verdict
    }
}
