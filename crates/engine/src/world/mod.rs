mod fog;
mod lights;
mod tokens;
mod walls;

pub use fog::{FogDiff, FogRevealMode, FogState};
pub use lights::{
    LightEditError, LightId, LightMap, LightPreset, LightSource, LightType, MAX_LIGHT_RADIUS_CELLS,
};
pub use tokens::{
    CreatureSenses, Token, TokenEditError, TokenId, TokenMap, VisionType,
    DEFAULT_VISION_RANGE_CELLS,
};
pub use walls::{
    WallEditError, WallKey, WallMap, WallMaterial, WallSegment, WallState, WallTypeDef, WALL_TYPES,
};
