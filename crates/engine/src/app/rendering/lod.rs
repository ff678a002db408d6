//! Grid level-of-detail selection.
//!
//! Tiers are chosen from the effective zoom only. Each tier fixes how many
//! cells separate drawn main lines, their opacity and stroke width, and
//! whether the half-cell sub-grid and quarter-cell fine grid are drawn.

use serde::{Deserialize, Serialize};

const LOD_NO_GRID_BELOW: f32 = 0.05;
const LOD_MAJOR_ONLY_BELOW: f32 = 0.15;
const LOD_SPARSE_BELOW: f32 = 0.3;
const LOD_MEDIUM_BELOW: f32 = 0.6;
const LOD_NORMAL_BELOW: f32 = 1.2;
const LOD_DETAILED_BELOW: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LodTier {
    Hidden,
    MajorOnly,
    Sparse,
    Medium,
    Normal,
    Detailed,
    UltraDetailed,
}

impl LodTier {
    pub fn for_zoom(effective_zoom: f32) -> Self {
        if !effective_zoom.is_finite() || effective_zoom < LOD_NO_GRID_BELOW {
            Self::Hidden
        } else if effective_zoom < LOD_MAJOR_ONLY_BELOW {
            Self::MajorOnly
        } else if effective_zoom < LOD_SPARSE_BELOW {
            Self::Sparse
        } else if effective_zoom < LOD_MEDIUM_BELOW {
            Self::Medium
        } else if effective_zoom < LOD_NORMAL_BELOW {
            Self::Normal
        } else if effective_zoom < LOD_DETAILED_BELOW {
            Self::Detailed
        } else {
            Self::UltraDetailed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLodProperties {
    pub tier: LodTier,
    /// Main lines are drawn every `skip_factor` cells.
    pub skip_factor: u32,
    pub opacity: f32,
    pub line_width: f32,
    pub sub_grid_opacity: Option<f32>,
    pub fine_grid_opacity: Option<f32>,
}

impl GridLodProperties {
    pub fn draws_grid(&self) -> bool {
        self.tier != LodTier::Hidden
    }
}

pub fn grid_lod_properties(effective_zoom: f32) -> GridLodProperties {
    let tier = LodTier::for_zoom(effective_zoom);
    let zoom = effective_zoom;
    let base = GridLodProperties {
        tier,
        skip_factor: 1,
        opacity: 0.0,
        line_width: 0.0,
        sub_grid_opacity: None,
        fine_grid_opacity: None,
    };
    match tier {
        LodTier::Hidden => base,
        LodTier::MajorOnly => GridLodProperties {
            skip_factor: 10,
            opacity: (zoom * 8.0).min(0.8),
            line_width: (zoom * 2.0).max(1.0),
            ..base
        },
        LodTier::Sparse => GridLodProperties {
            skip_factor: 5,
            opacity: (zoom * 4.0).min(0.7),
            line_width: (zoom * 1.5).max(0.8),
            ..base
        },
        LodTier::Medium => GridLodProperties {
            skip_factor: 2,
            opacity: (zoom * 2.0).min(0.6),
            line_width: zoom.max(0.6),
            ..base
        },
        LodTier::Normal => GridLodProperties {
            opacity: (zoom * 1.2).min(0.7),
            line_width: zoom.max(0.8),
            ..base
        },
        LodTier::Detailed => GridLodProperties {
            opacity: 0.4,
            line_width: 0.5,
            sub_grid_opacity: Some(0.2),
            ..base
        },
        LodTier::UltraDetailed => GridLodProperties {
            opacity: 0.3,
            line_width: 0.4,
            sub_grid_opacity: Some(0.15),
            fine_grid_opacity: Some(0.1),
            ..base
        },
    }
}
