use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::GridCoordinate;
use crate::lighting::Rgb;

/// Upper bound on a light's radius, in cells. Keeps one light's pass bounded.
pub const MAX_LIGHT_RADIUS_CELLS: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightType {
    Torch,
    Lantern,
    Candle,
    Magical,
    Campfire,
    Sunlight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPreset {
    pub radius: f32,
    pub color: &'static str,
    pub intensity: f32,
    pub flickering: bool,
}

impl LightType {
    pub fn preset(self) -> LightPreset {
        match self {
            LightType::Torch => LightPreset {
                radius: 4.0,
                color: "#ff6b35",
                intensity: 0.8,
                flickering: true,
            },
            LightType::Lantern => LightPreset {
                radius: 6.0,
                color: "#ffeb3b",
                intensity: 1.0,
                flickering: false,
            },
            LightType::Candle => LightPreset {
                radius: 1.0,
                color: "#fff3e0",
                intensity: 0.4,
                flickering: true,
            },
            LightType::Magical => LightPreset {
                radius: 8.0,
                color: "#9c27b0",
                intensity: 1.2,
                flickering: false,
            },
            LightType::Campfire => LightPreset {
                radius: 5.0,
                color: "#ff5722",
                intensity: 1.0,
                flickering: true,
            },
            LightType::Sunlight => LightPreset {
                radius: 12.0,
                color: "#fff59d",
                intensity: 1.5,
                flickering: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LightEditError {
    #[error("light {id:?} has a non-finite position")]
    NonFinitePosition { id: LightId },
    #[error("light {id:?} intensity must be finite and non-negative")]
    InvalidIntensity { id: LightId },
    #[error(
        "light {id:?} radius must be finite, positive and at most {max} cells",
        max = MAX_LIGHT_RADIUS_CELLS
    )]
    InvalidRadius { id: LightId },
    #[error("light {id:?} color {color:?} is not #rrggbb")]
    MalformedColor { id: LightId, color: String },
}

/// Light placed at a cell. `x`/`y` are cell indices; lighting is evaluated from the cell centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    pub id: LightId,
    pub x: f32,
    pub y: f32,
    pub light_type: LightType,
    pub radius: f32,
    pub color: String,
    pub intensity: f32,
    #[serde(default)]
    pub flickering: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl LightSource {
    pub fn from_preset(id: LightId, cell: GridCoordinate, light_type: LightType) -> Self {
        let preset = light_type.preset();
        Self {
            id,
            x: cell.x as f32,
            y: cell.y as f32,
            light_type,
            radius: preset.radius,
            color: preset.color.to_string(),
            intensity: preset.intensity,
            flickering: preset.flickering,
            enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), LightEditError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(LightEditError::NonFinitePosition { id: self.id });
        }
        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(LightEditError::InvalidIntensity { id: self.id });
        }
        if !self.radius.is_finite()
            || self.radius <= 0.0
            || self.radius > MAX_LIGHT_RADIUS_CELLS
        {
            return Err(LightEditError::InvalidRadius { id: self.id });
        }
        if Rgb::from_hex(&self.color).is_none() {
            return Err(LightEditError::MalformedColor {
                id: self.id,
                color: self.color.clone(),
            });
        }
        Ok(())
    }

    /// Light centre in cell units.
    pub fn center(&self) -> (f32, f32) {
        (self.x + 0.5, self.y + 0.5)
    }

    /// Enabled with finite geometry; anything else contributes nothing.
    pub fn is_active(&self) -> bool {
        self.enabled
            && self.x.is_finite()
            && self.y.is_finite()
            && self.radius.is_finite()
            && self.radius > 0.0
            && self.radius <= MAX_LIGHT_RADIUS_CELLS
            && self.intensity.is_finite()
            && self.intensity > 0.0
    }
}

/// Owned by the level editor; read-only to the lighting engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightMap {
    lights: BTreeMap<LightId, LightSource>,
}

impl LightMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, light: LightSource) -> Result<(), LightEditError> {
        light.validate()?;
        self.lights.insert(light.id, light);
        Ok(())
    }

    pub fn remove(&mut self, id: LightId) -> Option<LightSource> {
        self.lights.remove(&id)
    }

    pub fn get(&self, id: LightId) -> Option<&LightSource> {
        self.lights.get(&id)
    }

    pub fn set_enabled(&mut self, id: LightId, enabled: bool) -> bool {
        match self.lights.get_mut(&id) {
            Some(light) if light.enabled != enabled => {
                light.enabled = enabled;
                true
            }
            _ => false,
        }
    }

    pub fn move_to(&mut self, id: LightId, cell: GridCoordinate) -> bool {
        match self.lights.get_mut(&id) {
            Some(light) => {
                light.x = cell.x as f32;
                light.y = cell.y as f32;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LightSource> {
        self.lights.values()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn has_animated_lights(&self) -> bool {
        self.lights
            .values()
            .any(|light| light.flickering && light.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for light_type in [
            LightType::Torch,
            LightType::Lantern,
            LightType::Candle,
            LightType::Magical,
            LightType::Campfire,
            LightType::Sunlight,
        ] {
            let light = LightSource::from_preset(LightId(1), GridCoordinate::new(0, 0), light_type);
            assert_eq!(light.validate(), Ok(()), "{light_type:?}");
        }
    }

    #[test]
    fn upsert_rejects_bad_lights() {
        let mut lights = LightMap::new();
        let mut light =
            LightSource::from_preset(LightId(7), GridCoordinate::new(2, 2), LightType::Torch);
        light.intensity = -0.1;
        assert!(matches!(
            lights.upsert(light.clone()),
            Err(LightEditError::InvalidIntensity { .. })
        ));
        light.intensity = 0.5;
        light.color = "orange".to_string();
        assert!(matches!(
            lights.upsert(light.clone()),
            Err(LightEditError::MalformedColor { .. })
        ));
        light.color = "#ffaa00".to_string();
        light.x = f32::NAN;
        assert!(matches!(
            lights.upsert(light),
            Err(LightEditError::NonFinitePosition { .. })
        ));
        assert!(lights.is_empty());
    }

    #[test]
    fn set_enabled_reports_changes_only() {
        let mut lights = LightMap::new();
        lights
            .upsert(LightSource::from_preset(
                LightId(1),
                GridCoordinate::new(0, 0),
                LightType::Lantern,
            ))
            .expect("upsert");
        assert!(!lights.set_enabled(LightId(1), true));
        assert!(lights.set_enabled(LightId(1), false));
        assert!(!lights.set_enabled(LightId(2), false));
    }

    #[test]
    fn animated_lights_require_enabled_flicker() {
        let mut lights = LightMap::new();
        lights
            .upsert(LightSource::from_preset(
                LightId(1),
                GridCoordinate::new(0, 0),
                LightType::Torch,
            ))
            .expect("upsert");
        assert!(lights.has_animated_lights());
        lights.set_enabled(LightId(1), false);
        assert!(!lights.has_animated_lights());
    }

    #[test]
    fn radius_is_capped() {
        let mut light =
            LightSource::from_preset(LightId(3), GridCoordinate::new(5, 0), LightType::Lantern);
        light.radius = MAX_LIGHT_RADIUS_CELLS;
        assert_eq!(light.validate(), Ok(()));
        light.radius = 1.0e10;
        assert_eq!(light.validate(), Err(LightEditError::InvalidRadius { id: LightId(3) }));
        assert!(!light.is_active());
    }
}
