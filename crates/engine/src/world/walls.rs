use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wall edge between two adjacent grid corners, canonicalised so the smaller
/// endpoint comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallKey {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WallEditError {
    #[error("wall {key} is not axis aligned")]
    NotAxisAligned { key: String },
    #[error("wall {key} does not span exactly one cell edge")]
    NotUnitLength { key: String },
    #[error("malformed wall key {raw:?}")]
    MalformedKey { raw: String },
    #[error("unknown wall type {wall_type:?}")]
    UnknownWallType { wall_type: String },
    #[error("wall type {wall_type} does not allow state {state}")]
    StateNotAllowed { wall_type: String, state: WallState },
    #[error("no wall at {key}")]
    Missing { key: String },
}

impl WallKey {
    /// Validates and canonicalises an edge. Rejects anything that is not one
    /// axis-aligned cell edge.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, WallEditError> {
        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();
        let label = || format!("{x1},{y1},{x2},{y2}");
        if dx != 0 && dy != 0 {
            return Err(WallEditError::NotAxisAligned { key: label() });
        }
        if dx + dy != 1 {
            return Err(WallEditError::NotUnitLength { key: label() });
        }
        let key = if (x1, y1) <= (x2, y2) {
            Self { x1, y1, x2, y2 }
        } else {
            Self {
                x1: x2,
                y1: y2,
                x2: x1,
                y2: y1,
            }
        };
        Ok(key)
    }

    /// Parses the `"x1,y1,x2,y2"` form used by map files.
    pub fn parse(raw: &str) -> Result<Self, WallEditError> {
        let malformed = || WallEditError::MalformedKey {
            raw: raw.to_string(),
        };
        let parts = raw
            .split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;
        let [x1, y1, x2, y2] = parts.as_slice() else {
            return Err(malformed());
        };
        Self::new(*x1, *y1, *x2, *y2)
    }

    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }

    pub fn is_horizontal(&self) -> bool {
        self.y1 == self.y2
    }
}

impl fmt::Display for WallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x1, self.y1, self.x2, self.y2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallState {
    Default,
    Closed,
    Open,
    Locked,
}

impl fmt::Display for WallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WallState::Default => "default",
            WallState::Closed => "closed",
            WallState::Open => "open",
            WallState::Locked => "locked",
        };
        f.write_str(label)
    }
}

impl WallState {
    pub fn permits_sight(self) -> bool {
        self == WallState::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallMaterial {
    StoneWall,
    WoodenWall,
    BrickWall,
    MetalWall,
    MagicalBarrier,
    ForceWall,
    WoodenDoor,
    StoneDoor,
    GlassWindow,
    BarredWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTypeDef {
    pub material: WallMaterial,
    pub id: &'static str,
    pub blocks_movement: bool,
    pub blocks_vision: bool,
    pub interactive: bool,
    /// Allowed states; the first is the default.
    pub states: &'static [WallState],
}

const NO_STATES: &[WallState] = &[WallState::Default];
const DOOR_STATES: &[WallState] = &[WallState::Closed, WallState::Open, WallState::Locked];

const fn solid(material: WallMaterial, id: &'static str, blocks_vision: bool) -> WallTypeDef {
    WallTypeDef {
        material,
        id,
        blocks_movement: true,
        blocks_vision,
        interactive: false,
        states: NO_STATES,
    }
}

const fn door(material: WallMaterial, id: &'static str) -> WallTypeDef {
    WallTypeDef {
        material,
        id,
        blocks_movement: true,
        blocks_vision: true,
        interactive: true,
        states: DOOR_STATES,
    }
}

pub const WALL_TYPES: &[WallTypeDef] = &[
    solid(WallMaterial::StoneWall, "stone_wall", true),
    solid(WallMaterial::WoodenWall, "wooden_wall", true),
    solid(WallMaterial::BrickWall, "brick_wall", true),
    solid(WallMaterial::MetalWall, "metal_wall", true),
    solid(WallMaterial::MagicalBarrier, "magical_barrier", false),
    solid(WallMaterial::ForceWall, "force_wall", false),
    door(WallMaterial::WoodenDoor, "wooden_door"),
    door(WallMaterial::StoneDoor, "stone_door"),
    solid(WallMaterial::GlassWindow, "glass_window", false),
    solid(WallMaterial::BarredWindow, "barred_window", false),
];

impl WallMaterial {
    pub fn def(self) -> &'static WallTypeDef {
        // Every variant has exactly one entry in WALL_TYPES.
        WALL_TYPES
            .iter()
            .find(|def| def.material == self)
            .unwrap_or(&WALL_TYPES[0])
    }

    pub fn from_id(id: &str) -> Option<Self> {
        WALL_TYPES
            .iter()
            .find(|def| def.id == id)
            .map(|def| def.material)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallSegment {
    pub material: WallMaterial,
    pub state: WallState,
}

impl WallSegment {
    pub fn new(material: WallMaterial) -> Self {
        Self {
            material,
            state: material.def().states[0],
        }
    }

    pub fn blocks_vision(&self) -> bool {
        self.material.def().blocks_vision
    }

    pub fn interactive(&self) -> bool {
        self.material.def().interactive
    }

    /// True when the segment currently stops sight.
    pub fn obstructs_sight(&self) -> bool {
        self.blocks_vision() && !self.state.permits_sight()
    }
}

/// Owned by the level editor; read by visibility and lighting every recompute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallMap {
    walls: BTreeMap<WallKey, WallSegment>,
}

impl WallMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_wall(&mut self, key: WallKey, material: WallMaterial) {
        self.walls.insert(key, WallSegment::new(material));
    }

    pub fn get(&self, key: &WallKey) -> Option<&WallSegment> {
        self.walls.get(key)
    }

    pub fn set_state(&mut self, key: &WallKey, state: WallState) -> Result<(), WallEditError> {
        let Some(segment) = self.walls.get_mut(key) else {
            return Err(WallEditError::Missing {
                key: key.to_string(),
            });
        };
        let def = segment.material.def();
        if !def.states.contains(&state) {
            return Err(WallEditError::StateNotAllowed {
                wall_type: def.id.to_string(),
                state,
            });
        }
        segment.state = state;
        Ok(())
    }

    pub fn remove(&mut self, key: &WallKey) -> Option<WallSegment> {
        self.walls.remove(key)
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WallKey, &WallSegment)> {
        self.walls.iter()
    }

    /// Segments that currently stop sight.
    pub fn sight_blockers(&self) -> impl Iterator<Item = &WallKey> {
        self.walls
            .iter()
            .filter(|(_, segment)| segment.obstructs_sight())
            .map(|(key, _)| key)
    }
}
