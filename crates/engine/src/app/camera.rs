use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Continuous pixel position on the unbounded world plane.
pub type WorldPosition = Vec2;
/// Pixel position inside the drawable viewport.
pub type ScreenPosition = Vec2;

/// Cell indices strictly inside `±MAX_EXACT_CELL_INDEX` (2^23) have centres
/// that `f32` holds exactly.
pub const MAX_EXACT_CELL_INDEX: i32 = 1 << 23;

/// Discrete cell index on the infinite grid.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoordinate {
    pub x: i32,
    pub y: i32,
}

impl GridCoordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between cell indices, in cells.
    pub fn distance(self, other: GridCoordinate) -> f32 {
        let dx = (i64::from(other.x) - i64::from(self.x)) as f64;
        let dy = (i64::from(other.y) - i64::from(self.y)) as f64;
        (dx * dx + dy * dy).sqrt() as f32
    }

    /// Cell centre in cell units (corner space). Past `MAX_EXACT_CELL_INDEX`
    /// the half cell rounds away and neighbouring centres merge, so sight and
    /// lighting geometry out there is approximate.
    pub fn center(self) -> Vec2 {
        Vec2 {
            x: self.x as f32 + 0.5,
            y: self.y as f32 + 0.5,
        }
    }
}

pub const DEFAULT_CELL_SIZE: f32 = 50.0;
pub const DEFAULT_FEET_PER_CELL: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cell_size: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub feet_per_cell: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            offset_x: 0.0,
            offset_y: 0.0,
            feet_per_cell: DEFAULT_FEET_PER_CELL,
        }
    }
}

impl GridConfig {
    /// Cell size guarded against zero, negative and non-finite values.
    pub fn safe_cell_size(&self) -> f32 {
        if self.cell_size.is_finite() && self.cell_size > f32::EPSILON {
            self.cell_size
        } else {
            DEFAULT_CELL_SIZE
        }
    }
}

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub min_player_zoom: f32,
    pub max_player_zoom: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min_zoom: 0.02,
            max_zoom: 5.0,
            min_player_zoom: 0.1,
            max_player_zoom: 2.0,
        }
    }
}

/// Camera state. `x`/`y` is the world position shown at the viewport centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub zoom_level: f32,
    pub player_zoom_multiplier: f32,
    pub limits: ZoomLimits,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom_level: CAMERA_ZOOM_DEFAULT,
            player_zoom_multiplier: 1.0,
            limits: ZoomLimits::default(),
        }
    }
}

impl Camera {
    pub fn position(&self) -> WorldPosition {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }

    pub fn effective_zoom(&self) -> f32 {
        let zoom = self.zoom_level * self.player_zoom_multiplier;
        if zoom.is_finite() && zoom > 0.0 {
            zoom
        } else {
            CAMERA_ZOOM_DEFAULT
        }
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.x += dx;
        self.y += dy;
    }

    pub fn center_on(&mut self, world: WorldPosition) {
        if world.is_finite() {
            self.x = world.x;
            self.y = world.y;
        }
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom_level = clamp_or_default(zoom, self.limits.min_zoom, self.limits.max_zoom);
    }

    pub fn set_player_zoom_clamped(&mut self, multiplier: f32) {
        self.player_zoom_multiplier = if multiplier.is_finite() {
            multiplier.clamp(self.limits.min_player_zoom, self.limits.max_player_zoom)
        } else {
            1.0
        };
    }

    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        // Multiplicative steps keep the low-zoom LOD tiers reachable.
        let factor = (1.0 + CAMERA_ZOOM_STEP).powi(steps);
        self.set_zoom_clamped(self.zoom_level * factor);
    }

    /// Zoom that fits a world-space rectangle into the viewport with a 10% margin.
    pub fn fit_zoom(&self, content_width: f32, content_height: f32, viewport: Viewport) -> f32 {
        let (width, height) = viewport.drawable_size();
        if content_width <= 0.0 || content_height <= 0.0 || width == 0 || height == 0 {
            return self.zoom_level;
        }
        let scale_x = width as f32 / content_width;
        let scale_y = height as f32 / content_height;
        clamp_or_default(
            scale_x.min(scale_y) * 0.9,
            self.limits.min_zoom,
            self.limits.max_zoom,
        )
    }
}

fn clamp_or_default(value: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        return CAMERA_ZOOM_DEFAULT.clamp(min, max);
    }
    value.clamp(min, max)
}

/// Window area and the fixed side panel carved out of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub side_panel_width: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            side_panel_width: 0,
        }
    }

    /// Drawable area shared by every overlay.
    pub fn drawable_size(&self) -> (u32, u32) {
        (self.width.saturating_sub(self.side_panel_width), self.height)
    }

    pub fn is_empty(&self) -> bool {
        let (width, height) = self.drawable_size();
        width == 0 || height == 0
    }
}
