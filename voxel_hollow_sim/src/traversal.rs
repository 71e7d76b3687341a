// 3D grid-DDA ray traversal (Amanatides & Woo).
//
// `VoxelTraversal` walks the unit-cell lattice from a real-valued origin
// along a direction, yielding each cell together with the ray parameter `t`
// at which the ray enters it. Cells come out in non-decreasing `t`, and each
// cell differs from the previous one by exactly one step on one axis.
//
// Per axis, the walk keeps `t_max` (ray parameter of the next boundary
// crossing on that axis) and `t_delta` (parameter length of one full cell).
// Each advance picks the axis with the smallest `t_max`; ties go to X, then
// Y, then Z. A direction component of exactly zero (either sign) leaves that
// axis at `t_max = t_delta = +inf`, so it never becomes the minimum.
//
// `trace()` is the query used by edits: it returns the first occupied cell
// within a step budget, or `TraceResult::Miss`. A miss is its own variant
// and never doubles as a coordinate. The walk also stops early once the ray
// is outside the grid and moving away from it, since no later cell can hit.
//
// Everything here is read-only over `VoxelGrid` and holds no state between
// calls.
//
// See also: `grid.rs` for the occupancy being tested, `field.rs` which uses
// `trace()` to pick edit targets.

use crate::grid::VoxelGrid;
use crate::types::VoxelCoord;

/// First occupied cell found by [`trace`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceHit {
    /// The occupied cell.
    pub coord: VoxelCoord,
    /// Ray parameter at which the ray enters `coord` (0 for the origin cell).
    /// In units of `|direction|`, so world distance is `t * |direction|`.
    pub t: f32,
    /// Cells examined before the hit (0 when the origin cell is occupied).
    pub steps: u32,
}

/// Outcome of a bounded ray walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceResult {
    Hit(TraceHit),
    /// No occupied cell within the budget. `steps` is the number of cells
    /// examined, at most the budget.
    Miss { steps: u32 },
}

impl TraceResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, TraceResult::Hit(_))
    }

    pub fn hit(&self) -> Option<TraceHit> {
        match self {
            TraceResult::Hit(h) => Some(*h),
            TraceResult::Miss { .. } => None,
        }
    }

    /// Hit cell, if any.
    pub fn coord(&self) -> Option<VoxelCoord> {
        self.hit().map(|h| h.coord)
    }
}

/// `i32::MIN` and `i32::MAX + 1`, both exact in `f32`.
const I32_MIN_F: f32 = -2_147_483_648.0;
const I32_END_F: f32 = 2_147_483_648.0;

/// Iterator over the cells pierced by a ray, nearest first.
#[derive(Clone, Debug)]
pub struct VoxelTraversal {
    cell: [i32; 3],
    step: [i32; 3],
    t_max: [f32; 3],
    t_delta: [f32; 3],
    /// Ray parameter at which the ray entered `cell`.
    t_entry: f32,
    /// Whether any axis can advance (false for a zero direction).
    moving: bool,
    done: bool,
}

impl VoxelTraversal {
    /// Start a walk at the cell containing `origin`.
    ///
    /// A non-finite origin or direction yields no cells, as does an origin
    /// whose cell is not representable as `i32`. A zero direction yields only
    /// the origin cell.
    pub fn new(origin: [f32; 3], direction: [f32; 3]) -> Self {
        let finite = origin.iter().chain(direction.iter()).all(|v| v.is_finite())
            && origin
                .iter()
                .all(|o| (I32_MIN_F..I32_END_F).contains(&o.floor()));

        let mut cell = [0i32; 3];
        let mut step = [0i32; 3];
        let mut t_max = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];

        if finite {
            for axis in 0..3 {
                let o = origin[axis];
                let d = direction[axis];
                let floor = o.floor();
                cell[axis] = floor as i32;
                if d > 0.0 {
                    step[axis] = 1;
                    t_delta[axis] = 1.0 / d;
                    t_max[axis] = (floor + 1.0 - o) / d;
                } else if d < 0.0 {
                    step[axis] = -1;
                    t_delta[axis] = -1.0 / d;
                    t_max[axis] = (floor - o) / d;
                }
                // d == 0.0 (or -0.0): step/t_max/t_delta stay 0/INF/INF.
            }
        }

        Self {
            cell,
            step,
            t_max,
            t_delta,
            t_entry: 0.0,
            moving: step != [0; 3],
            done: !finite,
        }
    }

    /// Axis with the smallest `t_max`; ties prefer X, then Y, then Z.
    fn next_axis(&self) -> usize {
        let t = &self.t_max;
        if t[0] <= t[1] && t[0] <= t[2] {
            0
        } else if t[1] <= t[2] {
            1
        } else {
            2
        }
    }

    /// True when `cell` lies outside `[0, size)^3` on some axis and the walk
    /// is not moving back toward the grid on that axis.
    pub fn is_receding(&self, cell: VoxelCoord, size: u32) -> bool {
        let n = size as i32;
        let c = [cell.x, cell.y, cell.z];
        (0..3).any(|a| (c[a] < 0 && self.step[a] <= 0) || (c[a] >= n && self.step[a] >= 0))
    }
}

impl Iterator for VoxelTraversal {
    /// A cell and the ray parameter at which the ray enters it.
    type Item = (VoxelCoord, f32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let out = (
            VoxelCoord::new(self.cell[0], self.cell[1], self.cell[2]),
            self.t_entry,
        );
        if self.moving {
            let axis = self.next_axis();
            self.t_entry = self.t_max[axis];
            match self.cell[axis].checked_add(self.step[axis]) {
                Some(c) => self.cell[axis] = c,
                None => self.done = true,
            }
            self.t_max[axis] += self.t_delta[axis];
        } else {
            self.done = true;
        }
        Some(out)
    }
}

/// Walk from `origin` along `direction` and return the first occupied cell.
///
/// Examines at most `max_steps` cells, the origin cell included. Out-of-bounds
/// cells count as empty.
pub fn trace(
    grid: &VoxelGrid,
    origin: [f32; 3],
    direction: [f32; 3],
    max_steps: u32,
) -> TraceResult {
    let mut walk = VoxelTraversal::new(origin, direction);
    let mut steps = 0;
    while steps < max_steps {
        let Some((cell, t)) = walk.next() else {
            break;
        };
        if grid.is_occupied(cell) {
            return TraceResult::Hit(TraceHit {
                coord: cell,
                t,
                steps,
            });
        }
        steps += 1;
        if walk.is_receding(cell, grid.size()) {
            break;
        }
    }
    log::trace!("trace from {origin:?} dir {direction:?}: miss after {steps} cells");
    TraceResult::Miss { steps }
}
