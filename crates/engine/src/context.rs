//! Owning context for everything the engine reads and derives.
//!
//! Inputs change only through the methods here. Each one validates at the
//! editor boundary and marks the derived state it invalidates; `recompute`
//! then refreshes lighting and fog at most once per frame.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::{Camera, GridConfig, GridCoordinate, RecomputeScheduler, Viewport, WorldPosition};
use crate::lighting::{LightingSettings, LightingSnapshot, ShadowQuality};
use crate::movement::CombatState;
use crate::visibility::{compute_reveal_set, update_fog, SightBlockers, VisibilitySettings};
use crate::world::{
    FogDiff, FogRevealMode, FogState, LightEditError, LightId, LightMap, LightSource, Token,
    TokenEditError, TokenId, TokenMap, WallEditError, WallKey, WallMap, WallMaterial, WallState,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Sees through fog; fog is drawn translucent.
    GameMaster,
    #[default]
    Player,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::GameMaster => ViewMode::Player,
            ViewMode::Player => ViewMode::GameMaster,
        }
    }
}

/// Outcome of one `recompute` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeReport {
    pub lighting_recomputed: bool,
    pub visibility_recomputed: bool,
    pub fallback: bool,
    pub fog_diff: FogDiff,
    pub revealed_cells: usize,
    pub lit_cells: usize,
}

impl RecomputeReport {
    pub fn ran(&self) -> bool {
        self.lighting_recomputed || self.visibility_recomputed
    }
}

#[derive(Debug, Clone)]
pub struct TabletopContext {
    camera: Camera,
    grid: GridConfig,
    viewport: Viewport,
    walls: WallMap,
    lights: LightMap,
    tokens: TokenMap,
    fog: FogState,
    visibility_settings: VisibilitySettings,
    lighting_settings: LightingSettings,
    combat: CombatState,
    view_mode: ViewMode,
    lighting: LightingSnapshot,
    scheduler: RecomputeScheduler,
}

impl Default for TabletopContext {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl TabletopContext {
    pub fn new(grid: GridConfig) -> Self {
        Self {
            camera: Camera::default(),
            grid,
            viewport: Viewport::default(),
            walls: WallMap::new(),
            lights: LightMap::new(),
            tokens: TokenMap::new(),
            fog: FogState::new(),
            visibility_settings: VisibilitySettings::default(),
            lighting_settings: LightingSettings::default(),
            combat: CombatState::new(),
            view_mode: ViewMode::default(),
            lighting: LightingSnapshot::default(),
            scheduler: RecomputeScheduler::default(),
        }
    }

    pub fn with_fallback_interval(mut self, interval: Duration) -> Self {
        self.scheduler = RecomputeScheduler::new(interval);
        self
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Pan/zoom handlers own the camera. Camera moves only change rendering.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn set_grid(&mut self, grid: GridConfig) {
        if self.grid != grid {
            self.grid = grid;
            // Token cells depend on cell size and offset.
            self.scheduler.mark_visibility_dirty();
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn walls(&self) -> &WallMap {
        &self.walls
    }

    pub fn set_wall(&mut self, key: WallKey, material: WallMaterial) {
        self.walls.set_wall(key, material);
        self.scheduler.mark_all_dirty();
    }

    /// Editor entry point taking the map-file key form and a wall type id.
    pub fn set_wall_from_raw(
        &mut self,
        raw_key: &str,
        wall_type: &str,
    ) -> Result<WallKey, WallEditError> {
        let result = WallKey::parse(raw_key).and_then(|key| {
            let material = WallMaterial::from_id(wall_type).ok_or_else(|| {
                WallEditError::UnknownWallType {
                    wall_type: wall_type.to_string(),
                }
            })?;
            Ok((key, material))
        });
        match result {
            Ok((key, material)) => {
                self.set_wall(key, material);
                Ok(key)
            }
            Err(error) => {
                warn!(key = raw_key, wall_type, error = %error, "wall_rejected");
                Err(error)
            }
        }
    }

    pub fn set_wall_state(
        &mut self,
        key: &WallKey,
        state: WallState,
    ) -> Result<(), WallEditError> {
        if let Err(error) = self.walls.set_state(key, state) {
            warn!(key = %key, state = %state, error = %error, "wall_rejected");
            return Err(error);
        }
        self.scheduler.mark_all_dirty();
        Ok(())
    }

    pub fn remove_wall(&mut self, key: &WallKey) -> bool {
        let removed = self.walls.remove(key).is_some();
        if removed {
            self.scheduler.mark_all_dirty();
        }
        removed
    }

    pub fn lights(&self) -> &LightMap {
        &self.lights
    }

    pub fn upsert_light(&mut self, light: LightSource) -> Result<(), LightEditError> {
        let id = light.id;
        if let Err(error) = self.lights.upsert(light) {
            warn!(light = ?id, error = %error, "light_rejected");
            return Err(error);
        }
        self.scheduler.mark_all_dirty();
        Ok(())
    }

    pub fn remove_light(&mut self, id: LightId) -> bool {
        let removed = self.lights.remove(id).is_some();
        if removed {
            self.scheduler.mark_all_dirty();
        }
        removed
    }

    pub fn move_light(&mut self, id: LightId, cell: GridCoordinate) -> bool {
        let moved = self.lights.move_to(id, cell);
        if moved {
            self.scheduler.mark_all_dirty();
        }
        moved
    }

    pub fn set_light_enabled(&mut self, id: LightId, enabled: bool) -> bool {
        let changed = self.lights.set_enabled(id, enabled);
        if changed {
            self.scheduler.mark_all_dirty();
        }
        changed
    }

    pub fn tokens(&self) -> &TokenMap {
        &self.tokens
    }

    pub fn upsert_token(&mut self, token: Token) -> Result<(), TokenEditError> {
        let id = token.id;
        if let Err(error) = self.tokens.upsert(token) {
            warn!(token = ?id, error = %error, "token_rejected");
            return Err(error);
        }
        self.scheduler.mark_visibility_dirty();
        Ok(())
    }

    pub fn move_token(
        &mut self,
        id: TokenId,
        position: WorldPosition,
    ) -> Result<bool, TokenEditError> {
        let moved = match self.tokens.move_token(id, position) {
            Ok(moved) => moved,
            Err(error) => {
                warn!(token = ?id, error = %error, "token_rejected");
                return Err(error);
            }
        };
        if moved {
            self.scheduler.mark_visibility_dirty();
        }
        Ok(moved)
    }

    pub fn set_token_facing(
        &mut self,
        id: TokenId,
        degrees: Option<f32>,
    ) -> Result<(), TokenEditError> {
        if let Err(error) = self.tokens.set_facing(id, degrees) {
            warn!(token = ?id, error = %error, "token_rejected");
            return Err(error);
        }
        self.scheduler.mark_visibility_dirty();
        Ok(())
    }

    pub fn remove_token(&mut self, id: TokenId) -> bool {
        let removed = self.tokens.remove(id).is_some();
        if removed {
            self.scheduler.mark_visibility_dirty();
        }
        removed
    }

    pub fn fog(&self) -> &FogState {
        &self.fog
    }

    /// Fogs the whole map again.
    pub fn reset_fog(&mut self) -> FogDiff {
        self.scheduler.mark_visibility_dirty();
        self.fog.clear()
    }

    pub fn visibility_settings(&self) -> &VisibilitySettings {
        &self.visibility_settings
    }

    pub fn set_visibility_settings(&mut self, settings: VisibilitySettings) {
        if self.visibility_settings != settings {
            self.visibility_settings = settings;
            self.scheduler.mark_visibility_dirty();
        }
    }

    pub fn set_fog_reveal_mode(&mut self, mode: FogRevealMode) {
        self.set_visibility_settings(VisibilitySettings {
            fog_reveal_mode: mode,
            ..self.visibility_settings
        });
    }

    pub fn lighting_settings(&self) -> &LightingSettings {
        &self.lighting_settings
    }

    pub fn set_lighting_settings(&mut self, settings: LightingSettings) {
        if self.lighting_settings != settings {
            self.lighting_settings = settings;
            self.scheduler.mark_all_dirty();
        }
    }

    pub fn set_performance_mode(&mut self, enabled: bool) {
        self.set_lighting_settings(LightingSettings {
            performance_mode: enabled,
            ..self.lighting_settings
        });
    }

    pub fn set_shadow_quality(&mut self, quality: ShadowQuality) {
        let mut settings = self.lighting_settings;
        settings.set_shadow_quality(quality);
        self.set_lighting_settings(settings);
    }

    pub fn combat(&self) -> &CombatState {
        &self.combat
    }

    /// Turn tracking never feeds visibility or lighting.
    pub fn combat_mut(&mut self) -> &mut CombatState {
        &mut self.combat
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn lighting(&self) -> &LightingSnapshot {
        &self.lighting
    }

    pub fn needs_recompute(&self, now: Instant) -> bool {
        !self
            .scheduler
            .plan(now, self.animated_lighting())
            .is_idle()
    }

    fn animated_lighting(&self) -> bool {
        self.lighting_settings.light_animations && self.lights.has_animated_lights()
    }

    /// Refreshes whatever is dirty or due. `time_seconds` drives light flicker.
    pub fn recompute(&mut self, now: Instant, time_seconds: f64) -> RecomputeReport {
        let plan = self.scheduler.plan(now, self.animated_lighting());
        let mut report = RecomputeReport {
            fallback: plan.fallback,
            ..RecomputeReport::default()
        };
        if plan.is_idle() {
            return report;
        }

        let blockers = SightBlockers::from_walls(&self.walls);

        if plan.lighting {
            self.lighting = LightingSnapshot::compute(
                &self.lights,
                &blockers,
                &self.lighting_settings,
                time_seconds,
            );
            report.lighting_recomputed = true;
            report.lit_cells = self.lighting.lit_cell_count();
            debug!(
                lights = self.lights.len(),
                lit_cells = report.lit_cells,
                "lighting_recomputed"
            );
        }

        if plan.visibility {
            let vision_blockers = if self.visibility_settings.respect_line_of_sight {
                blockers
            } else {
                SightBlockers::none()
            };
            let lighting = self
                .lighting_settings
                .light_interacts_with_fog
                .then_some(&self.lighting);
            let reveal = compute_reveal_set(
                &self.tokens,
                &self.grid,
                &vision_blockers,
                &self.visibility_settings,
                lighting,
            );
            report.fog_diff = update_fog(&mut self.fog, &reveal, &self.visibility_settings);
            report.visibility_recomputed = true;
            report.revealed_cells = reveal.len();
            debug!(
                tokens = self.tokens.len(),
                visible = report.revealed_cells,
                revealed = report.fog_diff.revealed.len(),
                cleared = report.fog_diff.cleared.len(),
                fallback = plan.fallback,
                "fog_recomputed"
            );
        }

        self.scheduler.complete(now, plan);
        report
    }
}
