mod grid;
mod lod;
mod raster;
mod renderer;
mod transform;

pub use grid::GridStyle;
pub use lod::{grid_lod_properties, GridLodProperties, LodTier};
pub use renderer::{compose_frame, FrameStats, Renderer};
pub use transform::{
    grid_coordinate_from_screen, grid_to_world_center, grid_to_world_corner, screen_to_world,
    snap_to_grid, viewport_dimensions, visible_grid_bounds, world_to_cell_space, world_to_grid,
    world_to_screen, world_to_screen_px, GridBounds, VISIBLE_GRID_PADDING_CELLS,
};
