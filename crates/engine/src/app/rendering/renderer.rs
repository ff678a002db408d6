use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{
    grid_to_world_corner, visible_grid_bounds, world_to_screen, world_to_screen_px, Camera,
    FrameOverlay, GridBounds, GridConfig, GridCoordinate, Viewport,
};
use crate::context::{TabletopContext, ViewMode};
use crate::lighting::CellLighting;
use crate::world::{WallMaterial, WallSegment, WallState};

use super::grid::{draw_grid, GridStyle};
use super::raster::FrameBuffer;

const LIGHT_TINT_STRENGTH: f32 = 0.3;
const TOKEN_MIN_HALF_SIZE_PX: i32 = 3;
const TOKEN_HALF_SIZE_CELLS: f32 = 0.35;
const THICK_WALL_MIN_ZOOM: f32 = 0.5;
const HIGHLIGHT_COLOR: [u8; 4] = [255, 210, 70, 255];

/// Counts from one composed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub main_lines: u32,
    pub sub_lines: u32,
    pub fine_lines: u32,
    pub walls_drawn: u32,
    pub tokens_drawn: u32,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    size: (u32, u32),
    style: GridStyle,
}

impl Renderer {
    pub fn new(window: Arc<Window>, style: GridStyle) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            size: (size.width, size.height),
            style,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.size = (width, height);
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render(
        &mut self,
        context: &TabletopContext,
        overlay: &FrameOverlay,
    ) -> Result<FrameStats, Error> {
        let (width, height) = self.size;
        if width == 0 || height == 0 {
            return Ok(FrameStats::default());
        }
        let stats = compose_frame(
            self.pixels.frame_mut(),
            width,
            height,
            context,
            overlay,
            &self.style,
        );
        self.pixels.render()?;
        Ok(stats)
    }
}

/// Draws one frame into an RGBA8 buffer of `width * height` pixels.
///
/// Layers, bottom to top: lighting tint, grid, walls, tokens, fog, session
/// overlay, side panel. A buffer too small for the stated size is left
/// untouched.
pub fn compose_frame(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    context: &TabletopContext,
    overlay: &FrameOverlay,
    style: &GridStyle,
) -> FrameStats {
    let mut stats = FrameStats::default();
    let Some(mut frame) = FrameBuffer::new(pixels, width, height) else {
        return stats;
    };
    frame.clear(rgba(style.panel_color));

    let viewport = context.viewport();
    if viewport.is_empty() {
        return stats;
    }
    let (draw_width, draw_height) = viewport.drawable_size();
    let area = DrawArea {
        width: draw_width.min(width) as i32,
        height: draw_height.min(height) as i32,
    };
    let camera = context.camera();
    let grid = context.grid();
    let bounds = visible_grid_bounds(camera, grid, viewport);
    let edges = CellEdges {
        camera,
        grid,
        viewport,
    };

    frame.blend_rect((0, 0), (area.width, area.height), style.clear_color, 1.0);
    draw_lighting(&mut frame, context, &bounds, &edges, area, style);

    let grid_stats = draw_grid(&mut frame, camera, grid, viewport, style);
    stats.main_lines = grid_stats.main_lines;
    stats.sub_lines = grid_stats.sub_lines;
    stats.fine_lines = grid_stats.fine_lines;

    stats.walls_drawn = draw_walls(&mut frame, context, &edges);
    stats.tokens_drawn = draw_tokens(&mut frame, context, style);
    draw_fog(&mut frame, context, &bounds, &edges, area, style);
    draw_overlay(&mut frame, overlay, &edges);

    if area.width < frame.width() as i32 {
        frame.blend_rect(
            (area.width, 0),
            (frame.width() as i32, frame.height() as i32),
            style.panel_color,
            1.0,
        );
    }
    stats
}

#[derive(Debug, Clone, Copy)]
struct DrawArea {
    width: i32,
    height: i32,
}

/// Screen pixel positions of cell edges. Adjacent cells share an edge, so
/// spans built from it tile the screen without gaps or overlap.
struct CellEdges<'a> {
    camera: &'a Camera,
    grid: &'a GridConfig,
    viewport: Viewport,
}

impl CellEdges<'_> {
    fn corner_px(&self, cell: GridCoordinate) -> (i32, i32) {
        world_to_screen_px(
            grid_to_world_corner(cell, self.grid),
            self.camera,
            self.viewport,
        )
    }

    fn column_px(&self, x: i32) -> i32 {
        self.corner_px(GridCoordinate::new(x, 0)).0
    }

    fn row_px(&self, y: i32) -> i32 {
        self.corner_px(GridCoordinate::new(0, y)).1
    }
}

fn rgba(color: [u8; 3]) -> [u8; 4] {
    [color[0], color[1], color[2], 255]
}

/// Walks every visible cell column, splitting it into runs of rows. `runs`
/// yields `(first_row, end_row_exclusive, value)` covering `min_y..=max_y`.
fn fill_column_runs<T>(
    frame: &mut FrameBuffer<'_>,
    bounds: &GridBounds,
    edges: &CellEdges<'_>,
    area: DrawArea,
    mut runs: impl FnMut(i32) -> Vec<(i32, i32, T)>,
    mut paint: impl FnMut(&mut FrameBuffer<'_>, (i32, i32), (i32, i32), &T),
) {
    for x in bounds.min_x..=bounds.max_x {
        let x0 = edges.column_px(x).max(0);
        let x1 = edges.column_px(x.saturating_add(1)).min(area.width);
        if x1 <= x0 {
            continue;
        }
        for (first, end, value) in runs(x) {
            let y0 = edges.row_px(first).max(0);
            let y1 = edges.row_px(end).min(area.height);
            if y1 > y0 {
                paint(frame, (x0, y0), (x1, y1), &value);
            }
        }
    }
}

fn draw_lighting(
    frame: &mut FrameBuffer<'_>,
    context: &TabletopContext,
    bounds: &GridBounds,
    edges: &CellEdges<'_>,
    area: DrawArea,
    style: &GridStyle,
) {
    let snapshot = context.lighting();
    let ambient = snapshot.ambient();
    let runs = |x: i32| {
        let mut out = Vec::new();
        let mut next = bounds.min_y;
        for (row, lighting) in snapshot.lit_in_column(x, bounds.min_y, bounds.max_y) {
            if row > next {
                out.push((next, row, ambient));
            }
            out.push((row, row.saturating_add(1), *lighting));
            next = row.saturating_add(1);
        }
        if next <= bounds.max_y {
            out.push((next, bounds.max_y.saturating_add(1), ambient));
        }
        out
    };
    fill_column_runs(frame, bounds, edges, area, runs, |frame, from, to, lighting| {
        shade_cell(frame, from, to, lighting, style);
    });
}

fn shade_cell(
    frame: &mut FrameBuffer<'_>,
    from: (i32, i32),
    to: (i32, i32),
    lighting: &CellLighting,
    style: &GridStyle,
) {
    if lighting.light_count > 0 {
        let tint = [lighting.color.r, lighting.color.g, lighting.color.b];
        frame.blend_rect(from, to, tint, lighting.dynamic_intensity * LIGHT_TINT_STRENGTH);
    }
    let darkness = (1.0 - lighting.intensity).clamp(0.0, 1.0) * style.max_darkness;
    frame.blend_rect(from, to, [0, 0, 0], darkness);
}

fn draw_fog(
    frame: &mut FrameBuffer<'_>,
    context: &TabletopContext,
    bounds: &GridBounds,
    edges: &CellEdges<'_>,
    area: DrawArea,
    style: &GridStyle,
) {
    if !context.visibility_settings().dynamic_fog_enabled {
        return;
    }
    let alpha = match context.view_mode() {
        ViewMode::Player => 1.0,
        ViewMode::GameMaster => style.gm_fog_opacity,
    };
    let fog = context.fog();
    let runs = |x: i32| {
        let mut out = Vec::new();
        let mut next = bounds.min_y;
        for row in fog.revealed_in_column(x, bounds.min_y, bounds.max_y) {
            if row > next {
                out.push((next, row, ()));
            }
            next = row.saturating_add(1);
        }
        if next <= bounds.max_y {
            out.push((next, bounds.max_y.saturating_add(1), ()));
        }
        out
    };
    fill_column_runs(frame, bounds, edges, area, runs, |frame, from, to, _| {
        frame.blend_rect(from, to, style.fog_color, alpha);
    });
}

fn wall_color(wall: &WallSegment) -> [u8; 4] {
    match (wall.material, wall.state) {
        (_, WallState::Open) => [120, 200, 120, 255],
        (_, WallState::Locked) => [200, 60, 60, 255],
        (WallMaterial::WoodenDoor | WallMaterial::StoneDoor, _) => [139, 90, 43, 255],
        (WallMaterial::StoneWall, _) => [180, 180, 180, 255],
        (WallMaterial::WoodenWall, _) => [150, 110, 70, 255],
        (WallMaterial::BrickWall, _) => [170, 80, 60, 255],
        (WallMaterial::MetalWall, _) => [120, 130, 140, 255],
        (WallMaterial::MagicalBarrier, _) => [170, 90, 220, 255],
        (WallMaterial::ForceWall, _) => [90, 170, 255, 255],
        (WallMaterial::GlassWindow, _) => [170, 220, 255, 255],
        (WallMaterial::BarredWindow, _) => [110, 110, 110, 255],
    }
}

fn draw_walls(frame: &mut FrameBuffer<'_>, context: &TabletopContext, edges: &CellEdges<'_>) -> u32 {
    let thick = context.camera().effective_zoom() >= THICK_WALL_MIN_ZOOM;
    let mut drawn = 0;
    for (key, wall) in context.walls().iter() {
        let from = edges.corner_px(GridCoordinate::new(key.x1, key.y1));
        let to = edges.corner_px(GridCoordinate::new(key.x2, key.y2));
        let color = wall_color(wall);
        if !frame.line(from, to, color) {
            continue;
        }
        if thick {
            let (ox, oy) = if key.is_vertical() { (1, 0) } else { (0, 1) };
            frame.line((from.0 + ox, from.1 + oy), (to.0 + ox, to.1 + oy), color);
        }
        drawn += 1;
    }
    drawn
}

/// Players only see tokens standing in revealed cells.
fn draw_tokens(frame: &mut FrameBuffer<'_>, context: &TabletopContext, style: &GridStyle) -> u32 {
    let camera = context.camera();
    let grid = context.grid();
    let viewport = context.viewport();
    let fog_hides = context.view_mode() == ViewMode::Player
        && context.visibility_settings().dynamic_fog_enabled;
    let cell_px = grid.safe_cell_size() * camera.effective_zoom();
    let half = ((cell_px * TOKEN_HALF_SIZE_CELLS).round() as i32).max(TOKEN_MIN_HALF_SIZE_PX);
    let mut drawn = 0;
    for token in context.tokens().iter() {
        if !token.position.is_finite() {
            continue;
        }
        if fog_hides && !context.fog().is_revealed(token.cell(grid)) {
            continue;
        }
        let (cx, cy) = world_to_screen_px(token.position, camera, viewport);
        let (width, height) = (frame.width() as i32, frame.height() as i32);
        if cx + half < 0 || cy + half < 0 || cx - half >= width || cy - half >= height {
            continue;
        }
        frame.square(cx, cy, half, rgba(style.token_color));
        frame.square_outline(cx, cy, half, [0, 0, 0, 255]);
        drawn += 1;
    }
    drawn
}

fn draw_overlay(frame: &mut FrameBuffer<'_>, overlay: &FrameOverlay, edges: &CellEdges<'_>) {
    if let Some(cell) = overlay.highlighted_cell {
        let top_left = edges.corner_px(cell);
        let bottom_right = edges.corner_px(GridCoordinate::new(
            cell.x.saturating_add(1),
            cell.y.saturating_add(1),
        ));
        let top_right = (bottom_right.0, top_left.1);
        let bottom_left = (top_left.0, bottom_right.1);
        frame.line(top_left, top_right, HIGHLIGHT_COLOR);
        frame.line(top_right, bottom_right, HIGHLIGHT_COLOR);
        frame.line(bottom_right, bottom_left, HIGHLIGHT_COLOR);
        frame.line(bottom_left, top_left, HIGHLIGHT_COLOR);
    }
    if let Some(drag) = overlay.drag_line {
        let from = world_to_screen(drag.from, edges.camera, edges.viewport);
        let to = world_to_screen(drag.to, edges.camera, edges.viewport);
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let from = (from.x.round() as i32, from.y.round() as i32);
        let to = (to.x.round() as i32, to.y.round() as i32);
        let color = drag.color.to_rgba(255);
        frame.line(from, to, color);
        frame.line((from.0 + 1, from.1), (to.0 + 1, to.1), color);
        frame.line((from.0, from.1 + 1), (to.0, to.1 + 1), color);
        frame.square(to.0, to.1, 3, color);
    }
}
