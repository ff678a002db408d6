mod camera;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scheduler;
mod session;

pub use camera::{
    Camera, GridConfig, GridCoordinate, ScreenPosition, Vec2, Viewport, WorldPosition, ZoomLimits,
    CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_STEP, DEFAULT_CELL_SIZE, DEFAULT_FEET_PER_CELL,
    MAX_EXACT_CELL_INDEX,
};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    compose_frame, grid_coordinate_from_screen, grid_lod_properties, grid_to_world_center,
    grid_to_world_corner, screen_to_world, snap_to_grid, viewport_dimensions, visible_grid_bounds,
    world_to_cell_space, world_to_grid, world_to_screen, world_to_screen_px, FrameStats,
    GridBounds, GridLodProperties, GridStyle, LodTier, Renderer, VISIBLE_GRID_PADDING_CELLS,
};
pub use scheduler::{RecomputePlan, RecomputeScheduler, DEFAULT_FALLBACK_INTERVAL};
pub use session::{DragLine, FrameOverlay, Session, SessionCommand};
