use std::f32::consts::TAU;

use crate::app::Vec2;
use crate::lighting::LightingSettings;
use crate::visibility::SightBlockers;
use crate::world::{LightSource, LightType};

/// One light's effect on one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightContribution {
    /// 0..=1 after every factor.
    pub intensity: f32,
    pub shadow_factor: f32,
    pub atmospheric_factor: f32,
}

impl LightContribution {
    pub const NONE: LightContribution = LightContribution {
        intensity: 0.0,
        shadow_factor: 1.0,
        atmospheric_factor: 1.0,
    };
}

/// Quadratic/linear blend; 1 at the light, 0 at the radius.
pub fn falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance > radius {
        return 0.0;
    }
    let f = 1.0 - distance / radius;
    0.7 * f * f + 0.3 * f
}

pub fn shadow_sample_count(softness: f32) -> usize {
    if softness > 0.7 {
        9
    } else if softness > 0.3 {
        5
    } else {
        3
    }
}

/// Fraction of sample points with clear sight to the light.
pub fn calculate_shadow_factor(
    light: Vec2,
    target: Vec2,
    blockers: &SightBlockers,
    softness: f32,
    performance_mode: bool,
) -> f32 {
    if performance_mode {
        return binary(blockers.has_line_of_sight(light, target));
    }

    let samples = shadow_sample_count(softness);
    let ring = softness * 0.5;
    let mut visible = 0usize;
    for i in 0..samples {
        let angle = i as f32 / samples as f32 * TAU;
        let sample = Vec2::new(target.x + angle.cos() * ring, target.y + angle.sin() * ring);
        if blockers.has_line_of_sight(light, sample) {
            visible += 1;
        }
    }
    if blockers.has_line_of_sight(light, target) {
        visible += 1;
    }
    visible as f32 / (samples + 1) as f32
}

/// Distance scattering, modulated per light type, kept in 0.7..=1.
pub fn atmospheric_factor(distance: f32, light_type: LightType) -> f32 {
    let mut factor = (1.0 - distance * 0.02).max(0.8);
    factor *= match light_type {
        LightType::Torch | LightType::Campfire => 0.95 - distance * 0.01,
        LightType::Magical => 0.98,
        LightType::Sunlight => 0.99,
        LightType::Lantern | LightType::Candle => 1.0,
    };
    factor.clamp(0.7, 1.0)
}

/// Deterministic for a given time; seeded by the light's cell so neighbours drift apart.
pub fn flicker_factor(time_seconds: f64, light_x: f32, light_y: f32) -> f32 {
    let t = time_seconds;
    let base = 0.9 + 0.1 * (t * 8.0 + light_x as f64 * 0.1 + light_y as f64 * 0.1).sin();
    let detail = 0.98 + 0.02 * (t * 15.0 + light_y as f64 * 0.2).sin();
    (base * detail) as f32
}

/// Light reaching `target` (cell units) from `light`.
pub fn calculate_light_intensity(
    light: &LightSource,
    target: Vec2,
    blockers: &SightBlockers,
    settings: &LightingSettings,
    time_seconds: f64,
) -> LightContribution {
    if !light.is_active() || !target.is_finite() {
        return LightContribution::NONE;
    }
    let (cx, cy) = light.center();
    let origin = Vec2::new(cx, cy);
    let distance = origin.distance(target);
    if distance > light.radius {
        return LightContribution::NONE;
    }

    let mut intensity = light.intensity * falloff(distance, light.radius);

    let shadow_factor = if settings.shadow_casting && distance <= settings.shadow_distance {
        calculate_shadow_factor(
            origin,
            target,
            blockers,
            settings.safe_softness(),
            settings.performance_mode,
        )
    } else {
        binary(blockers.has_line_of_sight(origin, target))
    };

    let atmospheric_factor = if settings.atmospheric_effects {
        atmospheric_factor(distance, light.light_type)
    } else {
        1.0
    };

    if light.flickering && settings.light_animations && time_seconds.is_finite() {
        intensity *= flicker_factor(time_seconds, light.x, light.y);
    }

    intensity *= shadow_factor * atmospheric_factor;

    LightContribution {
        intensity: intensity.clamp(0.0, 1.0),
        shadow_factor,
        atmospheric_factor,
    }
}

fn binary(clear: bool) -> f32 {
    if clear {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::GridCoordinate;
    use crate::world::{LightId, WallKey, WallMap, WallMaterial};

    fn lantern_at(x: i32, y: i32) -> LightSource {
        LightSource::from_preset(LightId(1), GridCoordinate::new(x, y), LightType::Lantern)
    }

    fn wall_blockers(keys: &[(i32, i32, i32, i32)]) -> SightBlockers {
        let mut walls = WallMap::new();
        for &(x1, y1, x2, y2) in keys {
            walls.set_wall(WallKey::new(x1, y1, x2, y2).expect("key"), WallMaterial::StoneWall);
        }
        SightBlockers::from_walls(&walls)
    }

    #[test]
    fn falloff_endpoints() {
        assert!((falloff(0.0, 6.0) - 1.0).abs() < 1e-6);
        assert_eq!(falloff(6.0, 6.0), 0.0);
        assert_eq!(falloff(6.01, 6.0), 0.0);
        let half = falloff(3.0, 6.0);
        assert!((half - (0.7 * 0.25 + 0.3 * 0.5)).abs() < 1e-6);
    }

    #[test]
    fn beyond_radius_is_exactly_zero() {
        let light = lantern_at(0, 0);
        let c = calculate_light_intensity(
            &light,
            GridCoordinate::new(7, 0).center(),
            &SightBlockers::none(),
            &LightingSettings::default(),
            0.0,
        );
        assert_eq!(c.intensity, 0.0);
    }

    #[test]
    fn intensity_stays_in_unit_range() {
        let mut light = LightSource::from_preset(
            LightId(2),
            GridCoordinate::new(0, 0),
            LightType::Sunlight,
        );
        light.intensity = 50.0;
        let settings = LightingSettings::default();
        for dx in -13..=13 {
            for dy in -13..=13 {
                let c = calculate_light_intensity(
                    &light,
                    GridCoordinate::new(dx, dy).center(),
                    &SightBlockers::none(),
                    &settings,
                    1.25,
                );
                assert!((0.0..=1.0).contains(&c.intensity), "{dx},{dy}: {c:?}");
            }
        }
    }

    #[test]
    fn disabled_light_contributes_nothing() {
        let mut light = lantern_at(0, 0);
        light.enabled = false;
        let c = calculate_light_intensity(
            &light,
            GridCoordinate::new(0, 0).center(),
            &SightBlockers::none(),
            &LightingSettings::default(),
            0.0,
        );
        assert_eq!(c, LightContribution::NONE);
    }

    #[test]
    fn closed_wall_fully_shadows_in_performance_mode() {
        let light = lantern_at(0, 0);
        let blockers = wall_blockers(&[(1, -1, 1, 0), (1, 0, 1, 1), (1, 1, 1, 2)]);
        let settings = LightingSettings {
            performance_mode: true,
            ..LightingSettings::default()
        };
        let c = calculate_light_intensity(
            &light,
            GridCoordinate::new(2, 0).center(),
            &blockers,
            &settings,
            0.0,
        );
        assert_eq!(c.shadow_factor, 0.0);
        assert_eq!(c.intensity, 0.0);
    }

    #[test]
    fn soft_shadow_is_partial_near_a_wall_edge() {
        let light = lantern_at(0, 0);
        // The centre ray grazes the wall's lower endpoint.
        let blockers = wall_blockers(&[(2, -1, 2, 0)]);
        let factor = calculate_shadow_factor(
            light_center(&light),
            Vec2::new(3.5, -0.5),
            &blockers,
            0.8,
            false,
        );
        assert!(factor > 0.0 && factor < 1.0, "{factor}");
    }

    fn light_center(light: &LightSource) -> Vec2 {
        let (x, y) = light.center();
        Vec2::new(x, y)
    }

    #[test]
    fn sample_tiers_follow_softness() {
        assert_eq!(shadow_sample_count(0.8), 9);
        assert_eq!(shadow_sample_count(0.5), 5);
        assert_eq!(shadow_sample_count(0.3), 3);
    }

    #[test]
    fn atmosphere_is_floored() {
        assert!((atmospheric_factor(0.0, LightType::Lantern) - 1.0).abs() < 1e-6);
        assert!((atmospheric_factor(30.0, LightType::Torch) - 0.7).abs() < 1e-6);
        assert!((atmospheric_factor(0.0, LightType::Magical) - 0.98).abs() < 1e-6);
    }

    #[test]
    fn flicker_is_reproducible_and_bounded() {
        let a = flicker_factor(12.5, 3.0, 4.0);
        let b = flicker_factor(12.5, 3.0, 4.0);
        assert_eq!(a, b);
        assert_ne!(a, flicker_factor(12.5, 30.0, 4.0));
        for step in 0..200 {
            let f = flicker_factor(step as f64 * 0.037, 1.0, 2.0);
            assert!((0.76..=1.0).contains(&f), "{f}");
        }
    }
}
