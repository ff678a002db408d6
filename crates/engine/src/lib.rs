//! Spatial core of a grid tabletop: coordinates, walls, lights, tokens, fog
//! of war, lighting, movement validation and a level-of-detail grid renderer.

pub mod app;
pub mod context;
pub mod lighting;
pub mod movement;
pub mod visibility;
pub mod world;

pub use app::{
    compose_frame, grid_coordinate_from_screen, grid_to_world_center, grid_to_world_corner,
    run_app, run_app_with_metrics, screen_to_world, snap_to_grid, visible_grid_bounds,
    world_to_grid, world_to_screen, AppError, Camera, DragLine, FrameOverlay, FrameStats,
    GridBounds, GridConfig, GridCoordinate, GridStyle, InputAction, InputSnapshot, LoopConfig,
    LoopMetricsSnapshot, MetricsHandle, Renderer, ScreenPosition, Session, SessionCommand, Vec2,
    Viewport, WorldPosition, ZoomLimits, SLOW_FRAME_ENV_VAR,
};
pub use context::{RecomputeReport, TabletopContext, ViewMode};
pub use lighting::{CellLighting, LightingSettings, LightingSnapshot, Rgb, ShadowQuality};
pub use movement::{
    movement_distance_feet, CombatState, CombatantTurn, MovementError, MovementSession,
    MovementTier, MovementVerdict, DEFAULT_CREATURE_SPEED_FEET,
};
pub use visibility::{SightBlockers, VisibilitySettings};
pub use world::{
    CreatureSenses, FogDiff, FogRevealMode, FogState, LightEditError, LightId, LightMap,
    LightSource, LightType, Token, TokenEditError, TokenId, TokenMap, VisionType, WallEditError,
    WallKey, WallMap, WallMaterial, WallState, MAX_LIGHT_RADIUS_CELLS,
};
