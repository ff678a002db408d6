//! Segment casting against vision-blocking walls.
//!
//! Everything here works in cell units: grid corners sit on integer
//! coordinates and cell centres on `n + 0.5`. A ray that touches a blocking
//! wall, endpoints included, is blocked.

use crate::app::Vec2;
use crate::world::{WallKey, WallMap};

const ORIENTATION_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
}

impl Segment {
    fn from_points(a: Vec2, b: Vec2) -> Self {
        Self {
            ax: a.x as f64,
            ay: a.y as f64,
            bx: b.x as f64,
            by: b.y as f64,
        }
    }

    fn from_wall(key: &WallKey) -> Self {
        Self {
            ax: key.x1 as f64,
            ay: key.y1 as f64,
            bx: key.x2 as f64,
            by: key.y2 as f64,
        }
    }

    fn bounds_overlap(&self, other: &Segment) -> bool {
        self.ax.min(self.bx) <= other.ax.max(other.bx) + ORIENTATION_EPSILON
            && other.ax.min(other.bx) <= self.ax.max(self.bx) + ORIENTATION_EPSILON
            && self.ay.min(self.by) <= other.ay.max(other.by) + ORIENTATION_EPSILON
            && other.ay.min(other.by) <= self.ay.max(self.by) + ORIENTATION_EPSILON
    }
}

/// Sign of the turn a -> b -> c: 1 left, -1 right, 0 collinear.
fn orientation(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> i8 {
    let cross = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax);
    if cross > ORIENTATION_EPSILON {
        1
    } else if cross < -ORIENTATION_EPSILON {
        -1
    } else {
        0
    }
}

fn within_box(s: &Segment, px: f64, py: f64) -> bool {
    px >= s.ax.min(s.bx) - ORIENTATION_EPSILON
        && px <= s.ax.max(s.bx) + ORIENTATION_EPSILON
        && py >= s.ay.min(s.by) - ORIENTATION_EPSILON
        && py <= s.ay.max(s.by) + ORIENTATION_EPSILON
}

fn segments_intersect(p: &Segment, q: &Segment) -> bool {
    if !p.bounds_overlap(q) {
        return false;
    }
    let d1 = orientation(q.ax, q.ay, q.bx, q.by, p.ax, p.ay);
    let d2 = orientation(q.ax, q.ay, q.bx, q.by, p.bx, p.by);
    let d3 = orientation(p.ax, p.ay, p.bx, p.by, q.ax, q.ay);
    let d4 = orientation(p.ax, p.ay, p.bx, p.by, q.bx, q.by);

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }
    (d1 == 0 && within_box(q, p.ax, p.ay))
        || (d2 == 0 && within_box(q, p.bx, p.by))
        || (d3 == 0 && within_box(p, q.ax, q.ay))
        || (d4 == 0 && within_box(p, q.bx, q.by))
}

/// Walls that currently stop sight, flattened once per recompute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SightBlockers {
    segments: Vec<Segment>,
}

impl SightBlockers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_walls(walls: &WallMap) -> Self {
        Self {
            segments: walls.sight_blockers().map(Segment::from_wall).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when the straight path between two cell-space points crosses no
    /// blocking wall. Non-finite points never have sight.
    pub fn has_line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        if !from.is_finite() || !to.is_finite() {
            return false;
        }
        let ray = Segment::from_points(from, to);
        !self
            .segments
            .iter()
            .any(|wall| segments_intersect(&ray, wall))
    }
}
