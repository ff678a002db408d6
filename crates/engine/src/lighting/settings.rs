use serde::{Deserialize, Serialize};

pub const DEFAULT_AMBIENT_LIGHT: f32 = 0.2;
pub const DEFAULT_ILLUMINATION_THRESHOLD: f32 = 0.1;
pub const DEFAULT_SHADOW_DISTANCE_CELLS: f32 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl ShadowQuality {
    pub fn softness(self) -> f32 {
        match self {
            ShadowQuality::Low => 0.2,
            ShadowQuality::Medium => 0.5,
            ShadowQuality::High => 0.8,
        }
    }
}

/// Cost/quality knobs for the lighting pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub shadow_casting: bool,
    /// 0..=1; picks the soft-shadow sample tier and penumbra radius.
    pub shadow_softness: f32,
    /// Cells. Soft shadows inside, a single sight test beyond.
    pub shadow_distance: f32,
    pub atmospheric_effects: bool,
    /// One sight test per light instead of a sample ring.
    pub performance_mode: bool,
    pub light_animations: bool,
    pub ambient_light: f32,
    pub illumination_threshold: f32,
    pub light_interacts_with_fog: bool,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            shadow_casting: true,
            shadow_softness: ShadowQuality::default().softness(),
            shadow_distance: DEFAULT_SHADOW_DISTANCE_CELLS,
            atmospheric_effects: true,
            performance_mode: false,
            light_animations: true,
            ambient_light: DEFAULT_AMBIENT_LIGHT,
            illumination_threshold: DEFAULT_ILLUMINATION_THRESHOLD,
            light_interacts_with_fog: true,
        }
    }
}

impl LightingSettings {
    pub fn set_shadow_quality(&mut self, quality: ShadowQuality) {
        self.shadow_softness = quality.softness();
    }

    pub(crate) fn safe_ambient(&self) -> f32 {
        if self.ambient_light.is_finite() {
            self.ambient_light.clamp(0.0, 1.0)
        } else {
            DEFAULT_AMBIENT_LIGHT
        }
    }

    pub(crate) fn safe_softness(&self) -> f32 {
        if self.shadow_softness.is_finite() {
            self.shadow_softness.clamp(0.0, 1.0)
        } else {
            ShadowQuality::default().softness()
        }
    }

    pub(crate) fn safe_threshold(&self) -> f32 {
        if self.illumination_threshold.is_finite() {
            self.illumination_threshold
        } else {
            DEFAULT_ILLUMINATION_THRESHOLD
        }
    }
}
