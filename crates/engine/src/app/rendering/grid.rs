use serde::{Deserialize, Serialize};

use crate::app::{
    grid_lod_properties, visible_grid_bounds, world_to_screen, Camera, GridConfig, GridLodProperties,
    Vec2, Viewport,
};

use super::raster::FrameBuffer;

/// Passes whose lines would sit closer than this on screen are skipped.
const MIN_LINE_SPACING_PX: f32 = 2.0;

/// Colours for every layer the frame compositor draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridStyle {
    pub clear_color: [u8; 3],
    pub panel_color: [u8; 3],
    pub line_color: [u8; 3],
    pub sub_line_color: [u8; 3],
    pub fine_line_color: [u8; 3],
    pub token_color: [u8; 3],
    pub fog_color: [u8; 3],
    /// Darkness applied at zero intensity.
    pub max_darkness: f32,
    pub gm_fog_opacity: f32,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            clear_color: [46, 52, 44],
            panel_color: [24, 26, 33],
            line_color: [150, 150, 150],
            sub_line_color: [120, 120, 120],
            fine_line_color: [100, 100, 100],
            token_color: [80, 220, 255],
            fog_color: [12, 12, 16],
            max_darkness: 0.85,
            gm_fog_opacity: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GridPassStats {
    pub(crate) main_lines: u32,
    pub(crate) sub_lines: u32,
    pub(crate) fine_lines: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassKind {
    Fine,
    Sub,
    Main,
}

struct GridPass {
    kind: PassKind,
    /// Distance between lines, in cells.
    spacing_cells: f32,
    opacity: f32,
    thickness: u32,
    color: [u8; 3],
}

fn passes_for(lod: &GridLodProperties, style: &GridStyle) -> Vec<GridPass> {
    if !lod.draws_grid() {
        return Vec::new();
    }
    let mut passes = Vec::with_capacity(3);
    if let Some(opacity) = lod.fine_grid_opacity {
        passes.push(GridPass {
            kind: PassKind::Fine,
            spacing_cells: 0.25,
            opacity,
            thickness: 1,
            color: style.fine_line_color,
        });
    }
    if let Some(opacity) = lod.sub_grid_opacity {
        passes.push(GridPass {
            kind: PassKind::Sub,
            spacing_cells: 0.5,
            opacity,
            thickness: 1,
            color: style.sub_line_color,
        });
    }
    passes.push(GridPass {
        kind: PassKind::Main,
        spacing_cells: lod.skip_factor.max(1) as f32,
        opacity: lod.opacity,
        thickness: lod.line_width.round().max(1.0) as u32,
        color: style.line_color,
    });
    passes
}

/// Draws the fine, sub and main grid passes for the current zoom tier.
/// Only lines projecting inside the drawable area (plus one pixel) are drawn.
pub(crate) fn draw_grid(
    frame: &mut FrameBuffer<'_>,
    camera: &Camera,
    grid: &GridConfig,
    viewport: Viewport,
    style: &GridStyle,
) -> GridPassStats {
    let mut stats = GridPassStats::default();
    if viewport.is_empty() {
        return stats;
    }
    let (width, height) = viewport.drawable_size();
    let width = width.min(frame.width());
    let height = height.min(frame.height());
    let zoom = camera.effective_zoom();
    let lod = grid_lod_properties(zoom);
    let cell_size = grid.safe_cell_size();
    let bounds = visible_grid_bounds(camera, grid, viewport);

    for pass in passes_for(&lod, style) {
        if pass.spacing_cells * cell_size * zoom < MIN_LINE_SPACING_PX {
            continue;
        }
        let first_x = (bounds.min_x as f32 / pass.spacing_cells).floor() as i64;
        let last_x = ((i64::from(bounds.max_x) + 1) as f32 / pass.spacing_cells).ceil() as i64;
        let first_y = (bounds.min_y as f32 / pass.spacing_cells).floor() as i64;
        let last_y = ((i64::from(bounds.max_y) + 1) as f32 / pass.spacing_cells).ceil() as i64;
        let mut drawn = 0u32;

        for k in first_x..=last_x {
            let world_x = grid.offset_x + k as f32 * pass.spacing_cells * cell_size;
            let screen = world_to_screen(Vec2::new(world_x, camera.y), camera, viewport);
            if screen.x < -1.0 || screen.x > width as f32 + 1.0 {
                continue;
            }
            let x = screen.x.round() as i32;
            let half = pass.thickness as i32 / 2;
            frame.blend_rect(
                (x - half, 0),
                (x - half + pass.thickness as i32, height as i32),
                pass.color,
                pass.opacity,
            );
            drawn += 1;
        }
        for k in first_y..=last_y {
            let world_y = grid.offset_y + k as f32 * pass.spacing_cells * cell_size;
            let screen = world_to_screen(Vec2::new(camera.x, world_y), camera, viewport);
            if screen.y < -1.0 || screen.y > height as f32 + 1.0 {
                continue;
            }
            let y = screen.y.round() as i32;
            let half = pass.thickness as i32 / 2;
            frame.blend_rect(
                (0, y - half),
                (width as i32, y - half + pass.thickness as i32),
                pass.color,
                pass.opacity,
            );
            drawn += 1;
        }

        match pass.kind {
            PassKind::Fine => stats.fine_lines += drawn,
            PassKind::Sub => stats.sub_lines += drawn,
            PassKind::Main => stats.main_lines += drawn,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(zoom: f32) -> GridPassStats {
        let viewport = Viewport::new(200, 100);
        let mut bytes = vec![0u8; 200 * 100 * 4];
        let mut frame = FrameBuffer::new(&mut bytes, 200, 100).expect("frame");
        let mut camera = Camera::default();
        camera.set_zoom_clamped(zoom);
        draw_grid(
            &mut frame,
            &camera,
            &GridConfig::default(),
            viewport,
            &GridStyle::default(),
        )
    }

    #[test]
    fn no_lines_below_the_first_threshold() {
        assert_eq!(render(0.04), GridPassStats::default());
    }

    #[test]
    fn normal_zoom_draws_one_line_per_cell_edge() {
        // 50 px cells in a 200x100 area centred on the origin: x edges at
        // 0, 50, 100, 150, 200 and y edges at 0, 50, 100.
        let stats = render(1.0);
        assert_eq!(stats.main_lines, 8);
        assert_eq!(stats.sub_lines, 0);
        assert_eq!(stats.fine_lines, 0);
    }

    #[test]
    fn sub_grid_appears_from_1_2() {
        let stats = render(1.2);
        assert!(stats.sub_lines > 0);
        assert_eq!(stats.fine_lines, 0);
        let stats = render(2.5);
        assert!(stats.fine_lines > 0);
    }

    #[test]
    fn lines_are_blended_into_the_frame() {
        let viewport = Viewport::new(100, 100);
        let mut bytes = vec![0u8; 100 * 100 * 4];
        let mut frame = FrameBuffer::new(&mut bytes, 100, 100).expect("frame");
        draw_grid(
            &mut frame,
            &Camera::default(),
            &GridConfig::default(),
            viewport,
            &GridStyle::default(),
        );
        // Camera at the origin puts the x = 0 grid line on column 50.
        assert_ne!(frame.pixel(50, 10), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(30, 10), Some([0, 0, 0, 0]));
    }
}
