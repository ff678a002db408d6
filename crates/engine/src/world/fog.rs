use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::app::GridCoordinate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FogRevealMode {
    /// Revealed cells stay revealed.
    #[default]
    Permanent,
    /// Fog tracks current visibility exactly.
    Temporary,
}

/// Cells written by one fog update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FogDiff {
    pub revealed: Vec<GridCoordinate>,
    pub cleared: Vec<GridCoordinate>,
}

impl FogDiff {
    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty() && self.cleared.is_empty()
    }

    pub fn len(&self) -> usize {
        self.revealed.len() + self.cleared.len()
    }
}

/// Revealed cells. Absent cells are fogged. Written only by the visibility pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FogState {
    revealed: BTreeSet<GridCoordinate>,
}

impl FogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_revealed(&self, cell: GridCoordinate) -> bool {
        self.revealed.contains(&cell)
    }

    pub fn revealed_cells(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.revealed.iter().copied()
    }

    /// Revealed rows of one cell column within `min_y..=max_y`, ascending.
    pub fn revealed_in_column(
        &self,
        x: i32,
        min_y: i32,
        max_y: i32,
    ) -> impl Iterator<Item = i32> + '_ {
        let range = (min_y <= max_y)
            .then(|| GridCoordinate::new(x, min_y)..=GridCoordinate::new(x, max_y));
        range
            .into_iter()
            .flat_map(move |range| self.revealed.range(range))
            .map(|cell| cell.y)
    }

    pub fn len(&self) -> usize {
        self.revealed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }

    /// Merges the current reveal set. Only cells whose state flips are written
    /// and reported.
    pub fn apply(&mut self, visible: &BTreeSet<GridCoordinate>, mode: FogRevealMode) -> FogDiff {
        let revealed: Vec<GridCoordinate> = visible.difference(&self.revealed).copied().collect();
        let cleared: Vec<GridCoordinate> = match mode {
            FogRevealMode::Permanent => Vec::new(),
            FogRevealMode::Temporary => self.revealed.difference(visible).copied().collect(),
        };
        for cell in &cleared {
            self.revealed.remove(cell);
        }
        self.revealed.extend(revealed.iter().copied());
        FogDiff { revealed, cleared }
    }

    /// Editor reset: fogs everything.
    pub fn clear(&mut self) -> FogDiff {
        let cleared = std::mem::take(&mut self.revealed).into_iter().collect();
        FogDiff {
            revealed: Vec::new(),
            cleared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(list: &[(i32, i32)]) -> BTreeSet<GridCoordinate> {
        list.iter().map(|&(x, y)| GridCoordinate::new(x, y)).collect()
    }

    #[test]
    fn column_query_stays_inside_its_column() {
        let mut fog = FogState::new();
        fog.apply(
            &cells(&[(2, -1), (2, 3), (2, 9), (3, 0), (1, 0)]),
            FogRevealMode::Permanent,
        );
        let rows: Vec<i32> = fog.revealed_in_column(2, -1, 5).collect();
        assert_eq!(rows, vec![-1, 3]);
        assert_eq!(fog.revealed_in_column(2, 5, -1).count(), 0);
    }

    #[test]
    fn permanent_mode_never_clears() {
        let mut fog = FogState::new();
        fog.apply(&cells(&[(0, 0), (1, 0)]), FogRevealMode::Permanent);
        let diff = fog.apply(&cells(&[(5, 5)]), FogRevealMode::Permanent);
        assert_eq!(diff.revealed, vec![GridCoordinate::new(5, 5)]);
        assert!(diff.cleared.is_empty());
        assert!(fog.is_revealed(GridCoordinate::new(0, 0)));
        assert_eq!(fog.len(), 3);
    }

    #[test]
    fn temporary_mode_clears_cells_no_longer_visible() {
        let mut fog = FogState::new();
        fog.apply(&cells(&[(0, 0), (1, 0)]), FogRevealMode::Temporary);
        let diff = fog.apply(&cells(&[(1, 0), (2, 0)]), FogRevealMode::Temporary);
        assert_eq!(diff.revealed, vec![GridCoordinate::new(2, 0)]);
        assert_eq!(diff.cleared, vec![GridCoordinate::new(0, 0)]);
        assert!(!fog.is_revealed(GridCoordinate::new(0, 0)));
    }

    #[test]
    fn unchanged_input_writes_nothing() {
        let mut fog = FogState::new();
        let visible = cells(&[(3, 4), (4, 4)]);
        fog.apply(&visible, FogRevealMode::Temporary);
        assert!(fog.apply(&visible, FogRevealMode::Temporary).is_empty());
        assert!(fog.apply(&visible, FogRevealMode::Permanent).is_empty());
    }

    #[test]
    fn clear_reports_every_revealed_cell() {
        let mut fog = FogState::new();
        fog.apply(&cells(&[(0, 0), (0, 1)]), FogRevealMode::Permanent);
        let diff = fog.clear();
        assert_eq!(diff.cleared.len(), 2);
        assert!(fog.is_empty());
    }
}
