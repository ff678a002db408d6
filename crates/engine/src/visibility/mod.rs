mod line_of_sight;
mod reveal;

pub use line_of_sight::SightBlockers;
pub use reveal::{
    compute_reveal_set, update_fog, visible_cells_for_token, VisibilitySettings,
    FULL_FOV_DEGREES, MAX_VISION_RANGE_CELLS,
};
