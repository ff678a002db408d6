use std::collections::{BTreeMap, BTreeSet};

use crate::app::{GridBounds, GridCoordinate};
use crate::lighting::{calculate_light_intensity, LightingSettings, Rgb};
use crate::visibility::SightBlockers;
use crate::world::{LightMap, LightSource, MAX_LIGHT_RADIUS_CELLS};

/// Composite illumination of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLighting {
    /// Ambient plus every light, capped at 1.
    pub intensity: f32,
    /// Light sources only, capped at 1. Ambient never counts here.
    pub dynamic_intensity: f32,
    pub color: Rgb,
    /// Averages over contributing lights; 1 when none contribute.
    pub average_shadow_factor: f32,
    pub average_atmospheric_factor: f32,
    pub light_count: usize,
}

impl CellLighting {
    pub fn ambient(ambient: f32) -> Self {
        let level = channel(ambient * 255.0);
        Self {
            intensity: ambient.min(1.0),
            dynamic_intensity: 0.0,
            color: Rgb::new(level, level, level),
            average_shadow_factor: 1.0,
            average_atmospheric_factor: 1.0,
            light_count: 0,
        }
    }

    /// `rgb(r, g, b)` form consumed by overlays.
    pub fn color_string(&self) -> String {
        self.color.to_string()
    }
}

fn channel(value: f32) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

/// Sums every light onto the ambient floor. Lights with an unparsable
/// colour are skipped.
pub fn calculate_combined_lighting<'a>(
    cell: GridCoordinate,
    lights: impl IntoIterator<Item = &'a LightSource>,
    blockers: &SightBlockers,
    settings: &LightingSettings,
    time_seconds: f64,
) -> CellLighting {
    let ambient = settings.safe_ambient();
    let target = cell.center();

    let mut dynamic = 0.0f32;
    let (mut r, mut g, mut b) = (ambient * 255.0, ambient * 255.0, ambient * 255.0);
    let mut shadow_sum = 0.0f32;
    let mut atmosphere_sum = 0.0f32;
    let mut count = 0usize;

    for light in lights {
        let contribution = calculate_light_intensity(light, target, blockers, settings, time_seconds);
        if contribution.intensity <= 0.0 {
            continue;
        }
        let Some(color) = Rgb::from_hex(&light.color) else {
            continue;
        };
        r += color.r as f32 * contribution.intensity;
        g += color.g as f32 * contribution.intensity;
        b += color.b as f32 * contribution.intensity;
        dynamic += contribution.intensity;
        shadow_sum += contribution.shadow_factor;
        atmosphere_sum += contribution.atmospheric_factor;
        count += 1;
    }

    let (average_shadow_factor, average_atmospheric_factor) = if count == 0 {
        (1.0, 1.0)
    } else {
        (shadow_sum / count as f32, atmosphere_sum / count as f32)
    };

    CellLighting {
        intensity: (ambient + dynamic).min(1.0),
        dynamic_intensity: dynamic.min(1.0),
        color: Rgb::new(channel(r), channel(g), channel(b)),
        average_shadow_factor,
        average_atmospheric_factor,
        light_count: count,
    }
}

/// Combined lighting for every cell of an inclusive rectangle.
pub fn calculate_area_lighting(
    area: GridBounds,
    lights: &LightMap,
    blockers: &SightBlockers,
    settings: &LightingSettings,
    time_seconds: f64,
) -> BTreeMap<GridCoordinate, CellLighting> {
    let mut out = BTreeMap::new();
    for x in area.min_x..=area.max_x {
        for y in area.min_y..=area.max_y {
            let cell = GridCoordinate::new(x, y);
            out.insert(
                cell,
                calculate_combined_lighting(cell, lights.iter(), blockers, settings, time_seconds),
            );
        }
    }
    out
}

pub fn is_cell_illuminated(
    cell: GridCoordinate,
    lights: &LightMap,
    blockers: &SightBlockers,
    settings: &LightingSettings,
    time_seconds: f64,
) -> bool {
    calculate_combined_lighting(cell, lights.iter(), blockers, settings, time_seconds).intensity
        >= settings.safe_threshold()
}

/// Cells inside the light's radius whose centre is hidden from the light by
/// a blocking wall.
pub fn calculate_shadows(light: &LightSource, blockers: &SightBlockers) -> BTreeSet<GridCoordinate> {
    let mut shadowed = BTreeSet::new();
    if !light.is_active() {
        return shadowed;
    }
    let (cx, cy) = light.center();
    let origin = crate::app::Vec2::new(cx, cy);
    for cell in cells_in_radius(light) {
        let target = cell.center();
        if origin.distance(target) <= light.radius && !blockers.has_line_of_sight(origin, target) {
            shadowed.insert(cell);
        }
    }
    shadowed
}

/// Cells whose bounding square can fall inside the light's radius.
pub(crate) fn cells_in_radius(light: &LightSource) -> impl Iterator<Item = GridCoordinate> {
    let reach = light.radius.min(MAX_LIGHT_RADIUS_CELLS).ceil() as i32;
    let cx = light.x.floor() as i32;
    let cy = light.y.floor() as i32;
    let rows = move || cy.saturating_sub(reach)..=cy.saturating_add(reach);
    (cx.saturating_sub(reach)..=cx.saturating_add(reach))
        .flat_map(move |x| rows().map(move |y| GridCoordinate::new(x, y)))
}

/// Lighting for every cell some active light can reach. Everything else sits
/// at the ambient floor. Handed to the visibility pass as its illumination input.
#[derive(Debug, Clone, PartialEq)]
pub struct LightingSnapshot {
    cells: BTreeMap<GridCoordinate, CellLighting>,
    ambient: CellLighting,
    threshold: f32,
}

impl Default for LightingSnapshot {
    fn default() -> Self {
        let settings = LightingSettings::default();
        Self {
            cells: BTreeMap::new(),
            ambient: CellLighting::ambient(settings.safe_ambient()),
            threshold: settings.safe_threshold(),
        }
    }
}

impl LightingSnapshot {
    pub fn compute(
        lights: &LightMap,
        blockers: &SightBlockers,
        settings: &LightingSettings,
        time_seconds: f64,
    ) -> Self {
        let active: Vec<&LightSource> = lights.iter().filter(|light| light.is_active()).collect();
        let candidates: BTreeSet<GridCoordinate> = active
            .iter()
            .flat_map(|light| cells_in_radius(light))
            .collect();

        let cells = candidates
            .into_iter()
            .map(|cell| {
                let lighting = calculate_combined_lighting(
                    cell,
                    active.iter().copied(),
                    blockers,
                    settings,
                    time_seconds,
                );
                (cell, lighting)
            })
            .filter(|(_, lighting)| lighting.light_count > 0)
            .collect();

        Self {
            cells,
            ambient: CellLighting::ambient(settings.safe_ambient()),
            threshold: settings.safe_threshold(),
        }
    }

    pub fn at(&self, cell: GridCoordinate) -> CellLighting {
        self.cells.get(&cell).copied().unwrap_or(self.ambient)
    }

    /// Level used for every cell no light reaches.
    pub fn ambient(&self) -> CellLighting {
        self.ambient
    }

    /// Lit cells of one column within `min_y..=max_y`, ascending by row.
    pub fn lit_in_column(
        &self,
        x: i32,
        min_y: i32,
        max_y: i32,
    ) -> impl Iterator<Item = (i32, &CellLighting)> + '_ {
        let range = (min_y <= max_y)
            .then(|| GridCoordinate::new(x, min_y)..=GridCoordinate::new(x, max_y));
        range
            .into_iter()
            .flat_map(move |range| self.cells.range(range))
            .map(|(cell, lighting)| (cell.y, lighting))
    }

    /// Cells lit by light sources at or above the illumination threshold.
    pub fn illuminated_cells(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.cells
            .iter()
            .filter(|(_, lighting)| lighting.dynamic_intensity >= self.threshold)
            .map(|(cell, _)| *cell)
    }

    pub fn lit_cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LightId, LightType, WallKey, WallMap, WallMaterial};

    fn lights(list: &[(u64, i32, i32, LightType)]) -> LightMap {
        let mut map = LightMap::new();
        for &(id, x, y, light_type) in list {
            map.upsert(LightSource::from_preset(
                LightId(id),
                GridCoordinate::new(x, y),
                light_type,
            ))
            .expect("upsert");
        }
        map
    }

    fn steady() -> LightingSettings {
        LightingSettings {
            light_animations: false,
            ..LightingSettings::default()
        }
    }

    #[test]
    fn unlit_cell_sits_at_ambient() {
        let map = LightMap::new();
        let lighting = calculate_combined_lighting(
            GridCoordinate::new(0, 0),
            map.iter(),
            &SightBlockers::none(),
            &steady(),
            0.0,
        );
        assert!((lighting.intensity - 0.2).abs() < 1e-6);
        assert_eq!(lighting.color_string(), "rgb(51, 51, 51)");
        assert_eq!(lighting.light_count, 0);
        assert_eq!(lighting.average_shadow_factor, 1.0);
    }

    #[test]
    fn light_at_cell_adds_its_color() {
        let map = lights(&[(1, 0, 0, LightType::Lantern)]);
        let lighting = calculate_combined_lighting(
            GridCoordinate::new(0, 0),
            map.iter(),
            &SightBlockers::none(),
            &steady(),
            0.0,
        );
        // Lantern at its own cell: falloff 1, atmosphere 1, intensity 1.
        assert_eq!(lighting.intensity, 1.0);
        assert_eq!(lighting.color, Rgb::new(255, 255, 110));
        assert_eq!(lighting.light_count, 1);
    }

    #[test]
    fn malformed_color_light_is_skipped() {
        let mut light =
            LightSource::from_preset(LightId(1), GridCoordinate::new(0, 0), LightType::Lantern);
        light.color = "not-a-color".to_string();
        let lighting = calculate_combined_lighting(
            GridCoordinate::new(0, 0),
            [&light],
            &SightBlockers::none(),
            &steady(),
            0.0,
        );
        assert_eq!(lighting.light_count, 0);
        assert!((lighting.intensity - 0.2).abs() < 1e-6);
    }

    #[test]
    fn area_lighting_covers_inclusive_rectangle() {
        let map = lights(&[(1, 0, 0, LightType::Candle)]);
        let area = GridBounds {
            min_x: -1,
            max_x: 1,
            min_y: 0,
            max_y: 1,
        };
        let out = calculate_area_lighting(area, &map, &SightBlockers::none(), &steady(), 0.0);
        assert_eq!(out.len(), 6);
        assert!(out[&GridCoordinate::new(0, 0)].intensity > out[&GridCoordinate::new(1, 1)].intensity);
    }

    #[test]
    fn illumination_threshold_applies() {
        let map = lights(&[(1, 0, 0, LightType::Torch)]);
        let settings = steady();
        assert!(is_cell_illuminated(
            GridCoordinate::new(1, 0),
            &map,
            &SightBlockers::none(),
            &settings,
            0.0
        ));
        let dark = LightingSettings {
            ambient_light: 0.0,
            ..settings
        };
        assert!(!is_cell_illuminated(
            GridCoordinate::new(20, 20),
            &map,
            &SightBlockers::none(),
            &dark,
            0.0
        ));
    }

    #[test]
    fn shadows_fall_behind_walls() {
        let light = LightSource::from_preset(LightId(1), GridCoordinate::new(0, 0), LightType::Lantern);
        let mut walls = WallMap::new();
        for y in -6..6 {
            walls.set_wall(WallKey::new(2, y, 2, y + 1).expect("key"), WallMaterial::StoneWall);
        }
        let shadowed = calculate_shadows(&light, &SightBlockers::from_walls(&walls));
        assert!(shadowed.contains(&GridCoordinate::new(3, 0)));
        assert!(shadowed.contains(&GridCoordinate::new(5, 1)));
        assert!(!shadowed.contains(&GridCoordinate::new(1, 0)));
        assert!(!shadowed.contains(&GridCoordinate::new(-3, 0)));
    }

    #[test]
    fn snapshot_reveals_only_light_source_cells() {
        let map = lights(&[(1, 10, 10, LightType::Lantern)]);
        let snapshot = LightingSnapshot::compute(&map, &SightBlockers::none(), &steady(), 0.0);
        let lit: BTreeSet<_> = snapshot.illuminated_cells().collect();
        assert!(lit.contains(&GridCoordinate::new(10, 10)));
        assert!(!lit.contains(&GridCoordinate::new(0, 0)));
        assert!((snapshot.at(GridCoordinate::new(0, 0)).intensity - 0.2).abs() < 1e-6);
        assert!(lit.iter().all(|cell| cell.distance(GridCoordinate::new(10, 10)) <= 6.0));
    }

    #[test]
    fn disabled_lights_leave_snapshot_empty() {
        let mut map = lights(&[(1, 0, 0, LightType::Magical)]);
        map.set_enabled(LightId(1), false);
        let snapshot = LightingSnapshot::compute(&map, &SightBlockers::none(), &steady(), 0.0);
        assert_eq!(snapshot.lit_cell_count(), 0);
        assert_eq!(snapshot.illuminated_cells().count(), 0);
    }

    #[test]
    fn oversized_radius_walks_a_capped_square() {
        let mut light =
            LightSource::from_preset(LightId(1), GridCoordinate::new(0, 0), LightType::Lantern);
        light.radius = 1.0e10;
        let side = 2 * MAX_LIGHT_RADIUS_CELLS as usize + 1;
        assert_eq!(cells_in_radius(&light).count(), side * side);
        assert!(calculate_shadows(&light, &SightBlockers::none()).is_empty());
    }

    #[test]
    fn light_at_the_index_limit_stays_bounded() {
        let mut map = lights(&[(1, i32::MAX, i32::MIN, LightType::Sunlight)]);
        let mut edge = LightSource::from_preset(
            LightId(2),
            GridCoordinate::new(i32::MIN, i32::MAX),
            LightType::Torch,
        );
        edge.radius = MAX_LIGHT_RADIUS_CELLS;
        map.upsert(edge).expect("upsert");
        let snapshot = LightingSnapshot::compute(&map, &SightBlockers::none(), &steady(), 0.0);
        let side = 2 * MAX_LIGHT_RADIUS_CELLS as usize + 1;
        assert!(snapshot.lit_cell_count() <= 2 * side * side);
        let intensity = snapshot.at(GridCoordinate::new(i32::MAX, i32::MIN)).intensity;
        assert!((0.0..=1.0).contains(&intensity));
    }
}
