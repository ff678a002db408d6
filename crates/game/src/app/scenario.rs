use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tabletop_engine::{
    Camera, CombatantTurn, GridConfig, GridCoordinate, LightEditError, LightId, LightSource,
    LightType, LightingSettings, LoopConfig, TabletopContext, Token, TokenEditError, TokenId,
    ViewMode, VisibilitySettings, WallEditError, WallKey, WallMaterial, WallState,
    DEFAULT_CREATURE_SPEED_FEET,
};
use thiserror::Error;
use tracing::info;

const SCENARIO_ENV_VAR: &str = "TABLETOP_SCENARIO";
const DEMO_SCENARIO: &str = include_str!("../../scenarios/demo.json");

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse scenario json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("wall run {index} from {from:?} to {to:?} is not axis aligned")]
    DiagonalWallRun {
        index: usize,
        from: [i32; 2],
        to: [i32; 2],
    },
    #[error("combatant {token:?} has no token on the map")]
    UnknownCombatant { token: TokenId },
    #[error(transparent)]
    Wall(#[from] WallEditError),
    #[error(transparent)]
    Light(#[from] LightEditError),
    #[error(transparent)]
    Token(#[from] TokenEditError),
}

/// Map file for the host: everything the tabletop starts with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Scenario {
    /// Window and loop tuning; omitted fields keep their defaults.
    #[serde(rename = "loop")]
    pub(crate) loop_config: LoopConfig,
    pub(crate) grid: GridConfig,
    pub(crate) camera: Option<Camera>,
    pub(crate) view_mode: ViewMode,
    pub(crate) visibility: VisibilitySettings,
    pub(crate) lighting: LightingSettings,
    pub(crate) wall_runs: Vec<WallRunEntry>,
    pub(crate) walls: Vec<WallEntry>,
    pub(crate) lights: Vec<LightEntry>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) combat: Option<CombatRoster>,
}

/// Single edge in the `"x1,y1,x2,y2"` key form.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WallEntry {
    pub(crate) key: String,
    pub(crate) wall_type: String,
    #[serde(default)]
    pub(crate) state: Option<WallState>,
}

/// Straight run of walls between two grid corners, split into unit edges.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WallRunEntry {
    pub(crate) from: [i32; 2],
    pub(crate) to: [i32; 2],
    pub(crate) wall_type: String,
}

/// Light built from its type's preset; any field given here overrides it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LightEntry {
    pub(crate) id: u64,
    pub(crate) cell: [i32; 2],
    pub(crate) light_type: LightType,
    #[serde(default)]
    pub(crate) radius: Option<f32>,
    #[serde(default)]
    pub(crate) color: Option<String>,
    #[serde(default)]
    pub(crate) intensity: Option<f32>,
    #[serde(default)]
    pub(crate) flickering: Option<bool>,
    #[serde(default = "enabled_by_default")]
    pub(crate) enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CombatRoster {
    #[serde(default = "enabled_by_default")]
    pub(crate) active: bool,
    #[serde(default)]
    pub(crate) combatants: Vec<CombatantEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CombatantEntry {
    pub(crate) token: TokenId,
    #[serde(default = "default_speed")]
    pub(crate) speed_feet: f32,
    #[serde(default)]
    pub(crate) action_points: u32,
}

fn default_speed() -> f32 {
    DEFAULT_CREATURE_SPEED_FEET
}

impl LightEntry {
    fn into_light(self) -> LightSource {
        let mut light = LightSource::from_preset(
            LightId(self.id),
            GridCoordinate::new(self.cell[0], self.cell[1]),
            self.light_type,
        );
        if let Some(radius) = self.radius {
            light.radius = radius;
        }
        if let Some(color) = self.color {
            light.color = color;
        }
        if let Some(intensity) = self.intensity {
            light.intensity = intensity;
        }
        if let Some(flickering) = self.flickering {
            light.flickering = flickering;
        }
        light.enabled = self.enabled;
        light
    }
}

impl WallRunEntry {
    fn unit_keys(&self, index: usize) -> Result<Vec<WallKey>, ScenarioError> {
        let [x1, y1] = self.from;
        let [x2, y2] = self.to;
        if x1 != x2 && y1 != y2 {
            return Err(ScenarioError::DiagonalWallRun {
                index,
                from: self.from,
                to: self.to,
            });
        }
        let (dx, dy) = ((x2 - x1).signum(), (y2 - y1).signum());
        let steps = (x2 - x1).abs().max((y2 - y1).abs());
        (0..steps)
            .map(|step| {
                let (ax, ay) = (x1 + dx * step, y1 + dy * step);
                WallKey::new(ax, ay, ax + dx, ay + dy).map_err(ScenarioError::from)
            })
            .collect()
    }
}

/// Scenario named by `TABLETOP_SCENARIO`, or the bundled demo map.
pub(crate) fn load_configured_scenario() -> Result<Scenario, ScenarioError> {
    match std::env::var_os(SCENARIO_ENV_VAR) {
        Some(path) if !path.is_empty() => load_scenario(Path::new(&path)),
        _ => {
            info!("scenario_default_demo");
            parse_scenario(DEMO_SCENARIO)
        }
    }
}

pub(crate) fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let scenario = parse_scenario(&raw)?;
    info!(path = %path.display(), "scenario_file_read");
    Ok(scenario)
}

pub(crate) fn parse_scenario(raw: &str) -> Result<Scenario, ScenarioError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, Scenario>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        ScenarioError::Parse {
            path,
            source: error.into_inner(),
        }
    })
}

/// Builds the owning context. Wall runs go in before single walls so a
/// single entry can replace one edge of a run (a door in a wall).
pub(crate) fn build_context(
    scenario: Scenario,
    fallback_interval: Duration,
) -> Result<TabletopContext, ScenarioError> {
    let mut context = TabletopContext::new(scenario.grid).with_fallback_interval(fallback_interval);
    if let Some(camera) = scenario.camera {
        *context.camera_mut() = camera;
    }
    context.set_view_mode(scenario.view_mode);
    context.set_visibility_settings(scenario.visibility);
    context.set_lighting_settings(scenario.lighting);

    for (index, run) in scenario.wall_runs.iter().enumerate() {
        let material = WallMaterial::from_id(&run.wall_type).ok_or_else(|| {
            WallEditError::UnknownWallType {
                wall_type: run.wall_type.clone(),
            }
        })?;
        for key in run.unit_keys(index)? {
            context.set_wall(key, material);
        }
    }
    for wall in &scenario.walls {
        let key = context.set_wall_from_raw(&wall.key, &wall.wall_type)?;
        if let Some(state) = wall.state {
            context.set_wall_state(&key, state)?;
        }
    }
    for light in scenario.lights {
        context.upsert_light(light.into_light())?;
    }
    for token in scenario.tokens {
        context.upsert_token(token)?;
    }
    if let Some(roster) = scenario.combat {
        for combatant in roster.combatants {
            if context.tokens().get(combatant.token).is_none() {
                return Err(ScenarioError::UnknownCombatant {
                    token: combatant.token,
                });
            }
            context.combat_mut().add_combatant(
                combatant.token,
                CombatantTurn::new(combatant.speed_feet, combatant.action_points),
            );
        }
        if roster.active {
            context.combat_mut().start();
        }
    }

    info!(
        walls = context.walls().len(),
        lights = context.lights().len(),
        tokens = context.tokens().len(),
        combat = context.combat().active,
        "scenario_loaded"
    );
    Ok(context)
}
