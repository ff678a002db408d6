use crate::app::{Camera, GridConfig, GridCoordinate, ScreenPosition, Vec2, Viewport, WorldPosition};

/// Cell padding added around the visible rectangle so lines at the edges are never dropped.
pub const VISIBLE_GRID_PADDING_CELLS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl GridBounds {
    pub fn contains(&self, cell: GridCoordinate) -> bool {
        cell.x >= self.min_x && cell.x <= self.max_x && cell.y >= self.min_y && cell.y <= self.max_y
    }

    pub fn cell_count(&self) -> usize {
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return 0;
        }
        let w = (i64::from(self.max_x) - i64::from(self.min_x)) as usize + 1;
        let h = (i64::from(self.max_y) - i64::from(self.min_y)) as usize + 1;
        w.saturating_mul(h)
    }
}

pub fn viewport_dimensions(viewport: Viewport) -> (u32, u32) {
    viewport.drawable_size()
}

pub fn world_to_screen(world: WorldPosition, camera: &Camera, viewport: Viewport) -> ScreenPosition {
    let zoom = camera.effective_zoom();
    let (width, height) = viewport.drawable_size();
    Vec2 {
        x: (world.x - camera.x) * zoom + width as f32 * 0.5,
        y: (world.y - camera.y) * zoom + height as f32 * 0.5,
    }
}

pub fn screen_to_world(screen: ScreenPosition, camera: &Camera, viewport: Viewport) -> WorldPosition {
    let zoom = camera.effective_zoom();
    let (width, height) = viewport.drawable_size();
    Vec2 {
        x: (screen.x - width as f32 * 0.5) / zoom + camera.x,
        y: (screen.y - height as f32 * 0.5) / zoom + camera.y,
    }
}

/// Pixel-rounded variant for raster passes.
pub fn world_to_screen_px(world: WorldPosition, camera: &Camera, viewport: Viewport) -> (i32, i32) {
    let screen = world_to_screen(world, camera, viewport);
    (screen.x.round() as i32, screen.y.round() as i32)
}

pub fn world_to_grid(world: WorldPosition, grid: &GridConfig) -> GridCoordinate {
    let cell_size = grid.safe_cell_size();
    GridCoordinate {
        x: ((world.x - grid.offset_x) / cell_size).floor() as i32,
        y: ((world.y - grid.offset_y) / cell_size).floor() as i32,
    }
}

/// Top-left corner of a cell.
pub fn grid_to_world_corner(cell: GridCoordinate, grid: &GridConfig) -> WorldPosition {
    let cell_size = grid.safe_cell_size();
    Vec2 {
        x: cell.x as f32 * cell_size + grid.offset_x,
        y: cell.y as f32 * cell_size + grid.offset_y,
    }
}

pub fn grid_to_world_center(cell: GridCoordinate, grid: &GridConfig) -> WorldPosition {
    let corner = grid_to_world_corner(cell, grid);
    let half = grid.safe_cell_size() * 0.5;
    Vec2 {
        x: corner.x + half,
        y: corner.y + half,
    }
}

/// Snaps a world position to the top-left corner of the cell containing it.
pub fn snap_to_grid(world: WorldPosition, grid: &GridConfig) -> WorldPosition {
    grid_to_world_corner(world_to_grid(world, grid), grid)
}

/// World position expressed in cell units, the space walls and lights live in.
pub fn world_to_cell_space(world: WorldPosition, grid: &GridConfig) -> Vec2 {
    let cell_size = grid.safe_cell_size();
    Vec2 {
        x: (world.x - grid.offset_x) / cell_size,
        y: (world.y - grid.offset_y) / cell_size,
    }
}

pub fn grid_coordinate_from_screen(
    screen: ScreenPosition,
    camera: &Camera,
    grid: &GridConfig,
    viewport: Viewport,
) -> GridCoordinate {
    world_to_grid(screen_to_world(screen, camera, viewport), grid)
}

pub fn visible_grid_bounds(camera: &Camera, grid: &GridConfig, viewport: Viewport) -> GridBounds {
    let (width, height) = viewport.drawable_size();
    let top_left = screen_to_world(Vec2::new(0.0, 0.0), camera, viewport);
    let bottom_right = screen_to_world(Vec2::new(width as f32, height as f32), camera, viewport);
    let min = world_to_grid(top_left, grid);
    let max = world_to_grid(bottom_right, grid);
    GridBounds {
        min_x: min.x.saturating_sub(VISIBLE_GRID_PADDING_CELLS),
        max_x: max.x.saturating_add(VISIBLE_GRID_PADDING_CELLS),
        min_y: min.y.saturating_sub(VISIBLE_GRID_PADDING_CELLS),
        max_y: max.y.saturating_add(VISIBLE_GRID_PADDING_CELLS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3 * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let camera = Camera {
            x: 120.0,
            y: -40.0,
            ..Camera::default()
        };
        let screen = world_to_screen(Vec2::new(120.0, -40.0), &camera, Viewport::new(800, 600));
        assert_eq!(screen, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn zoom_scales_distance_from_center() {
        let mut camera = Camera::default();
        camera.set_zoom_clamped(2.0);
        let screen = world_to_screen(Vec2::new(10.0, 5.0), &camera, Viewport::new(800, 600));
        assert_eq!(screen, Vec2::new(420.0, 310.0));
    }

    #[test]
    fn side_panel_shifts_viewport_center() {
        let camera = Camera::default();
        let viewport = Viewport {
            width: 1000,
            height: 600,
            side_panel_width: 200,
        };
        let screen = world_to_screen(Vec2::new(0.0, 0.0), &camera, viewport);
        assert_eq!(screen, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let viewports = [
            Viewport::new(800, 600),
            Viewport::new(1921, 1079),
            Viewport {
                width: 1280,
                height: 720,
                side_panel_width: 530,
            },
        ];
        let zooms = [0.05, 0.37, 1.0, 2.5];
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(-1234.5, 987.25),
            Vec2::new(50_000.0, -75_000.0),
            Vec2::new(3.3, -0.7),
        ];
        for viewport in viewports {
            for zoom in zooms {
                let mut camera = Camera {
                    x: 333.0,
                    y: -21.5,
                    ..Camera::default()
                };
                camera.set_zoom_clamped(zoom);
                for point in points {
                    let screen = world_to_screen(point, &camera, viewport);
                    let back = screen_to_world(screen, &camera, viewport);
                    assert!(approx(back.x, point.x), "{back:?} vs {point:?}");
                    assert!(approx(back.y, point.y), "{back:?} vs {point:?}");
                }
            }
        }
    }

    #[test]
    fn world_to_grid_floors_negative_positions() {
        let grid = GridConfig::default();
        assert_eq!(world_to_grid(Vec2::new(-1.0, -50.0), &grid), GridCoordinate::new(-1, -1));
        assert_eq!(world_to_grid(Vec2::new(49.9, 50.0), &grid), GridCoordinate::new(0, 1));
    }

    #[test]
    fn grid_offset_applies_to_both_directions() {
        let grid = GridConfig {
            offset_x: 10.0,
            offset_y: -20.0,
            ..GridConfig::default()
        };
        let cell = GridCoordinate::new(3, -2);
        let corner = grid_to_world_corner(cell, &grid);
        assert_eq!(corner, Vec2::new(160.0, -120.0));
        assert_eq!(world_to_grid(corner, &grid), cell);
        assert_eq!(grid_to_world_center(cell, &grid), Vec2::new(185.0, -95.0));
    }

    #[test]
    fn snap_to_grid_returns_cell_corner() {
        let grid = GridConfig::default();
        assert_eq!(snap_to_grid(Vec2::new(74.0, 101.0), &grid), Vec2::new(50.0, 100.0));
    }

    #[test]
    fn zero_cell_size_falls_back_instead_of_dividing_by_zero() {
        let grid = GridConfig {
            cell_size: 0.0,
            ..GridConfig::default()
        };
        assert_eq!(world_to_grid(Vec2::new(120.0, 0.0), &grid), GridCoordinate::new(2, 0));
    }

    #[test]
    fn visible_bounds_cover_viewport_corners() {
        let camera = Camera::default();
        let grid = GridConfig::default();
        let viewport = Viewport::new(800, 600);
        let bounds = visible_grid_bounds(&camera, &grid, viewport);
        let top_left = grid_coordinate_from_screen(Vec2::new(0.0, 0.0), &camera, &grid, viewport);
        let bottom_right =
            grid_coordinate_from_screen(Vec2::new(799.0, 599.0), &camera, &grid, viewport);
        assert!(bounds.contains(top_left));
        assert!(bounds.contains(bottom_right));
        assert_eq!(bounds.min_x, -9);
        assert_eq!(bounds.max_x, 9);
        assert_eq!(bounds.cell_count(), 19 * 15);
    }
}
