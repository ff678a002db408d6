use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::app::{GridConfig, GridCoordinate};
use crate::lighting::LightingSnapshot;
use crate::visibility::SightBlockers;
use crate::world::{FogDiff, FogRevealMode, FogState, Token, TokenMap, VisionType};

/// Upper bound on a single token's vision radius, in cells.
pub const MAX_VISION_RANGE_CELLS: f32 = 128.0;
pub const FULL_FOV_DEGREES: f32 = 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilitySettings {
    pub dynamic_fog_enabled: bool,
    pub respect_line_of_sight: bool,
    pub fog_reveal_mode: FogRevealMode,
    pub fov_angle_degrees: f32,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            dynamic_fog_enabled: true,
            respect_line_of_sight: true,
            fog_reveal_mode: FogRevealMode::Permanent,
            fov_angle_degrees: FULL_FOV_DEGREES,
        }
    }
}

fn within_fov(origin: GridCoordinate, cell: GridCoordinate, facing: f32, fov: f32) -> bool {
    let dx = (cell.x - origin.x) as f32;
    let dy = (cell.y - origin.y) as f32;
    let angle = dy.atan2(dx).to_degrees();
    let mut delta = (angle - facing).rem_euclid(360.0);
    if delta > 180.0 {
        delta = 360.0 - delta;
    }
    delta <= fov * 0.5
}

/// Cells one token can see: within its vision radius, inside its view cone,
/// and with a clear path from its cell centre. Its own cell is always visible.
pub fn visible_cells_for_token(
    token: &Token,
    grid: &GridConfig,
    blockers: &SightBlockers,
    settings: &VisibilitySettings,
) -> BTreeSet<GridCoordinate> {
    let mut visible = BTreeSet::new();
    if !token.position.is_finite() {
        return visible;
    }
    let origin = token.cell(grid);
    visible.insert(origin);

    let range = token.vision_range(grid).min(MAX_VISION_RANGE_CELLS);
    let reach = range.floor() as i32;
    let cone = match (token.vision_type, token.facing_degrees) {
        (VisionType::Blindsight, _) | (_, None) => None,
        (_, Some(facing))
            if settings.fov_angle_degrees.is_finite()
                && settings.fov_angle_degrees < FULL_FOV_DEGREES =>
        {
            Some((facing, settings.fov_angle_degrees.max(0.0)))
        }
        _ => None,
    };

    let eye = origin.center();
    for x in origin.x.saturating_sub(reach)..=origin.x.saturating_add(reach) {
        for y in origin.y.saturating_sub(reach)..=origin.y.saturating_add(reach) {
            let cell = GridCoordinate::new(x, y);
            if cell == origin || origin.distance(cell) > range {
                continue;
            }
            if let Some((facing, fov)) = cone {
                if !within_fov(origin, cell, facing, fov) {
                    continue;
                }
            }
            if blockers.has_line_of_sight(eye, cell.center()) {
                visible.insert(cell);
            }
        }
    }
    visible
}

/// Union of every token's view, plus cells lit above the illumination
/// threshold when a lighting snapshot is supplied.
pub fn compute_reveal_set(
    tokens: &TokenMap,
    grid: &GridConfig,
    blockers: &SightBlockers,
    settings: &VisibilitySettings,
    lighting: Option<&LightingSnapshot>,
) -> BTreeSet<GridCoordinate> {
    let mut reveal = BTreeSet::new();
    for token in tokens.iter() {
        reveal.extend(visible_cells_for_token(token, grid, blockers, settings));
    }
    if let Some(lighting) = lighting {
        reveal.extend(lighting.illuminated_cells());
    }
    reveal
}

/// Writes the reveal set into fog per the reveal mode. Dynamic fog off
/// leaves the fog untouched.
pub fn update_fog(
    fog: &mut FogState,
    reveal: &BTreeSet<GridCoordinate>,
    settings: &VisibilitySettings,
) -> FogDiff {
    if !settings.dynamic_fog_enabled {
        return FogDiff::default();
    }
    fog.apply(reveal, settings.fog_reveal_mode)
}
