//! Per-cell illumination from light sources, walls and an ambient floor.
//!
//! Geometry is in cell units with lights and targets at cell centres.

mod color;
mod composite;
mod intensity;
mod settings;

pub use color::Rgb;
pub use composite::{
    calculate_area_lighting, calculate_combined_lighting, calculate_shadows, is_cell_illuminated,
    CellLighting, LightingSnapshot,
};
pub use intensity::{
    atmospheric_factor, calculate_light_intensity, calculate_shadow_factor, falloff,
    flicker_factor, shadow_sample_count, LightContribution,
};
pub use settings::{
    LightingSettings, ShadowQuality, DEFAULT_AMBIENT_LIGHT, DEFAULT_ILLUMINATION_THRESHOLD,
    DEFAULT_SHADOW_DISTANCE_CELLS,
};
