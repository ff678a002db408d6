use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::{world_to_grid, GridConfig, GridCoordinate, WorldPosition};

pub const DEFAULT_VISION_RANGE_CELLS: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionType {
    #[default]
    Normal,
    Darkvision,
    Blindsight,
}

/// Sense ranges in feet, as printed on a creature sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureSenses {
    pub sight_feet: Option<f32>,
    pub darkvision_feet: Option<f32>,
    pub blindsight_feet: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenEditError {
    #[error("token {id:?} has a non-finite position")]
    NonFinitePosition { id: TokenId },
    #[error("token {id:?} vision range must be finite and non-negative")]
    InvalidVisionRange { id: TokenId },
    #[error("no token {id:?}")]
    Missing { id: TokenId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub creature: String,
    pub position: WorldPosition,
    #[serde(default)]
    pub vision_type: VisionType,
    /// Manual range in cells; wins over anything derived from senses.
    #[serde(default)]
    pub vision_range_override: Option<f32>,
    #[serde(default)]
    pub senses: CreatureSenses,
    /// Facing in degrees, 0 = +x, growing clockwise on screen.
    #[serde(default)]
    pub facing_degrees: Option<f32>,
}

impl Token {
    pub fn new(id: TokenId, creature: impl Into<String>, position: WorldPosition) -> Self {
        Self {
            id,
            creature: creature.into(),
            position,
            vision_type: VisionType::Normal,
            vision_range_override: None,
            senses: CreatureSenses::default(),
            facing_degrees: None,
        }
    }

    pub fn validate(&self) -> Result<(), TokenEditError> {
        if !self.position.is_finite() {
            return Err(TokenEditError::NonFinitePosition { id: self.id });
        }
        if let Some(range) = self.vision_range_override {
            if !range.is_finite() || range < 0.0 {
                return Err(TokenEditError::InvalidVisionRange { id: self.id });
            }
        }
        Ok(())
    }

    pub fn cell(&self, grid: &GridConfig) -> GridCoordinate {
        world_to_grid(self.position, grid)
    }

    /// Vision range in cells. Non-finite or negative sense values are ignored.
    pub fn vision_range(&self, grid: &GridConfig) -> f32 {
        if let Some(range) = self.vision_range_override.filter(|r| r.is_finite() && *r >= 0.0) {
            return range;
        }
        let feet_per_cell = if grid.feet_per_cell.is_finite() && grid.feet_per_cell > 0.0 {
            grid.feet_per_cell
        } else {
            crate::app::DEFAULT_FEET_PER_CELL
        };
        let cells = |feet: Option<f32>| {
            feet.filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f / feet_per_cell)
        };
        let sight = cells(self.senses.sight_feet).unwrap_or(DEFAULT_VISION_RANGE_CELLS);
        match self.vision_type {
            VisionType::Normal => sight,
            VisionType::Darkvision => cells(self.senses.darkvision_feet).map_or(sight, |d| d.max(sight)),
            VisionType::Blindsight => cells(self.senses.blindsight_feet).unwrap_or(sight),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenMap {
    tokens: BTreeMap<TokenId, Token>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, token: Token) -> Result<(), TokenEditError> {
        token.validate()?;
        self.tokens.insert(token.id, token);
        Ok(())
    }

    /// Returns whether the position actually changed.
    pub fn move_token(&mut self, id: TokenId, position: WorldPosition) -> Result<bool, TokenEditError> {
        if !position.is_finite() {
            return Err(TokenEditError::NonFinitePosition { id });
        }
        let token = self
            .tokens
            .get_mut(&id)
            .ok_or(TokenEditError::Missing { id })?;
        if token.position == position {
            return Ok(false);
        }
        token.position = position;
        Ok(true)
    }

    pub fn set_facing(&mut self, id: TokenId, degrees: Option<f32>) -> Result<(), TokenEditError> {
        let token = self
            .tokens
            .get_mut(&id)
            .ok_or(TokenEditError::Missing { id })?;
        token.facing_degrees = degrees.filter(|d| d.is_finite());
        Ok(())
    }

    pub fn remove(&mut self, id: TokenId) -> Option<Token> {
        self.tokens.remove(&id)
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Vec2;

    fn token(vision_type: VisionType, senses: CreatureSenses) -> Token {
        Token {
            vision_type,
            senses,
            ..Token::new(TokenId(1), "goblin", Vec2::new(0.0, 0.0))
        }
    }

    #[test]
    fn default_range_is_six_cells() {
        let grid = GridConfig::default();
        let t = token(VisionType::Normal, CreatureSenses::default());
        assert_eq!(t.vision_range(&grid), DEFAULT_VISION_RANGE_CELLS);
    }

    #[test]
    fn darkvision_takes_the_longer_sense() {
        let grid = GridConfig::default();
        let t = token(
            VisionType::Darkvision,
            CreatureSenses {
                sight_feet: Some(30.0),
                darkvision_feet: Some(60.0),
                blindsight_feet: None,
            },
        );
        assert_eq!(t.vision_range(&grid), 12.0);
    }

    #[test]
    fn blindsight_uses_blindsight_range() {
        let grid = GridConfig::default();
        let t = token(
            VisionType::Blindsight,
            CreatureSenses {
                sight_feet: Some(60.0),
                darkvision_feet: None,
                blindsight_feet: Some(10.0),
            },
        );
        assert_eq!(t.vision_range(&grid), 2.0);
    }

    #[test]
    fn override_wins_over_senses() {
        let grid = GridConfig::default();
        let mut t = token(
            VisionType::Darkvision,
            CreatureSenses {
                darkvision_feet: Some(120.0),
                ..CreatureSenses::default()
            },
        );
        t.vision_range_override = Some(3.0);
        assert_eq!(t.vision_range(&grid), 3.0);
    }

    #[test]
    fn move_rejects_non_finite_and_reports_change() {
        let mut tokens = TokenMap::new();
        tokens
            .upsert(Token::new(TokenId(1), "elf", Vec2::new(10.0, 10.0)))
            .expect("upsert");
        assert!(matches!(
            tokens.move_token(TokenId(1), Vec2::new(f32::NAN, 0.0)),
            Err(TokenEditError::NonFinitePosition { .. })
        ));
        assert_eq!(tokens.move_token(TokenId(1), Vec2::new(10.0, 10.0)), Ok(false));
        assert_eq!(tokens.move_token(TokenId(1), Vec2::new(60.0, 10.0)), Ok(true));
        assert!(matches!(
            tokens.move_token(TokenId(9), Vec2::new(0.0, 0.0)),
            Err(TokenEditError::Missing { .. })
        ));
    }
}
