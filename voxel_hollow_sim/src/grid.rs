// Dense 3D voxel grid.
//
// The grid is a cube of `size^3` scalar cells stored as a flat `Vec<f32>`
// indexed by `x + y * size + z * size * size` (x fastest, z slowest). That
// same order is used for every flattened snapshot handed to a presentation
// layer, and by `occlusion.rs` for the coarse density field. A value of
// `0.0` is empty; any other value is occupied and doubles as a material tag.
// Out-of-bounds reads return `0.0`; out-of-bounds writes are no-ops.
//
// The only mutation after construction is the sphere brush
// (`place_sphere()` / `apply_brush()`). It works on a cube of edge `radius`
// whose corner is `center - radius / 2` (integer truncation) and touches only
// the cells inside the inscribed sphere: local offset `l` qualifies when
// `|l - radius/2.0| < radius / 2` (real-valued cube centre, truncated
// radius). Even and odd radii therefore fill slightly different, asymmetric
// patterns; that is the intended shape, not an off-by-one. A fill never
// overwrites an occupied cell and an erase never touches an empty one.
//
// Every brush application returns a `SphereEdit` describing the clipped edit
// cube and the exact cells it changed, which `occlusion.rs` consumes to
// recompute only the affected coarse boxes.
//
// See also: `traversal.rs` for the DDA walk that reads this grid,
// `occlusion.rs` for the coarse density field derived from it, `field.rs`
// which owns a `VoxelGrid` and sequences edits with occlusion updates.

use crate::types::{EditBounds, VoxelCoord};
use serde::{Deserialize, Serialize};

/// Whether a brush adds or removes occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    /// Write the brush value into empty cells.
    #[default]
    Fill,
    /// Clear occupied cells back to empty.
    Erase,
}

/// A sphere-shaped edit: the cube edge, the value written, and the mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereBrush {
    /// Edge length of the edit cube, in voxels. The inscribed sphere has
    /// radius `radius / 2`.
    pub radius: u32,
    /// Value written by `Fill`. Ignored by `Erase`.
    pub value: f32,
    pub mode: EditMode,
}

impl SphereBrush {
    pub const fn fill(radius: u32, value: f32) -> Self {
        Self {
            radius,
            value,
            mode: EditMode::Fill,
        }
    }

    pub const fn erase(radius: u32) -> Self {
        Self {
            radius,
            value: 0.0,
            mode: EditMode::Erase,
        }
    }

    /// Cube edge actually used; radii past `i32::MAX` are clamped so every
    /// local offset fits in a `VoxelCoord`.
    pub fn edge(&self) -> u32 {
        self.radius.min(i32::MAX as u32)
    }

    /// The edit cube's minimum corner for a brush centred at `center`.
    ///
    /// Saturates at `i32::MIN`; a cube whose true corner lies below that is
    /// entirely outside the grid anyway.
    pub fn corner(&self, center: VoxelCoord) -> VoxelCoord {
        let half = (self.edge() / 2) as i32;
        VoxelCoord::new(
            center.x.saturating_sub(half),
            center.y.saturating_sub(half),
            center.z.saturating_sub(half),
        )
    }

    /// Whether the local cube offset lies inside the inscribed sphere.
    pub fn covers(&self, local: VoxelCoord) -> bool {
        let mid = self.edge() as f32 / 2.0;
        let limit = (self.edge() / 2) as f32;
        let dx = local.x as f32 - mid;
        let dy = local.y as f32 - mid;
        let dz = local.z as f32 - mid;
        dx * dx + dy * dy + dz * dz < limit * limit
    }

    /// The value this brush leaves in a cell currently holding `current`, or
    /// `None` if the cell is left alone.
    fn next_value(&self, current: f32) -> Option<f32> {
        match self.mode {
            EditMode::Fill if current == 0.0 && self.value != 0.0 => Some(self.value),
            EditMode::Erase if current != 0.0 => Some(0.0),
            _ => None,
        }
    }
}

/// What a brush application did to the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SphereEdit {
    /// World coordinate of local offset `(0, 0, 0)` of the edit cube. May lie
    /// outside the grid.
    pub corner: VoxelCoord,
    /// The edit cube clipped to the grid.
    pub bounds: EditBounds,
    /// Local offsets (relative to `corner`) of every cell whose value changed.
    pub changed: Vec<VoxelCoord>,
}

impl SphereEdit {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }

    /// World coordinates of the changed cells.
    pub fn changed_world(&self) -> impl Iterator<Item = VoxelCoord> + '_ {
        self.changed.iter().map(move |&l| self.corner + l)
    }
}

/// Dense cubic voxel grid.
#[derive(Clone, Debug, Default)]
pub struct VoxelGrid {
    /// Flat storage: index = x + y * size + z * size * size.
    cells: Vec<f32>,
    size: u32,
}

impl VoxelGrid {
    /// Create a grid of `size^3` empty cells.
    pub fn new(size: u32) -> Self {
        let n = size as usize;
        Self {
            cells: vec![0.0; n * n * n],
            size,
        }
    }

    /// Create a grid holding a solid sphere of `1.0` centred in the cube.
    ///
    /// A cell is filled when its integer coordinate lies strictly closer than
    /// `size / 4` to the point `(size/2, size/2, size/2)`.
    pub fn with_centered_sphere(size: u32) -> Self {
        let mut grid = Self::new(size);
        let mid = size as f32 / 2.0;
        let r = (size / 4) as f32;
        let r_sq = r * r;
        let n = size as i32;
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let dx = x as f32 - mid;
                    let dy = y as f32 - mid;
                    let dz = z as f32 - mid;
                    if dx * dx + dy * dy + dz * dz < r_sq {
                        grid.set(VoxelCoord::new(x, y, z), 1.0);
                    }
                }
            }
        }
        grid
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Check whether a coordinate is within bounds.
    pub fn in_bounds(&self, coord: VoxelCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.z >= 0
            && (coord.x as u32) < self.size
            && (coord.y as u32) < self.size
            && (coord.z as u32) < self.size
    }

    /// Convert a coordinate to a flat index. Returns `None` if out of bounds.
    fn index(&self, coord: VoxelCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            let n = self.size as usize;
            Some(coord.x as usize + coord.y as usize * n + coord.z as usize * n * n)
        } else {
            None
        }
    }

    /// Read a cell. Returns `0.0` for out-of-bounds coordinates.
    pub fn get(&self, coord: VoxelCoord) -> f32 {
        self.index(coord).map(|i| self.cells[i]).unwrap_or(0.0)
    }

    pub fn is_occupied(&self, coord: VoxelCoord) -> bool {
        self.get(coord) != 0.0
    }

    /// Write a cell. No-op for out-of-bounds coordinates.
    ///
    /// This bypasses the brush rules; it is meant for procedural fills before
    /// a field is built on top of the grid.
    pub fn set(&mut self, coord: VoxelCoord, value: f32) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = value;
        }
    }

    /// Fill the inscribed sphere of the cube around `center` with `value`,
    /// leaving occupied cells untouched.
    pub fn place_sphere(&mut self, center: VoxelCoord, radius: u32, value: f32) -> SphereEdit {
        self.apply_brush(center, &SphereBrush::fill(radius, value))
    }

    /// Apply a sphere brush centred at `center`.
    pub fn apply_brush(&mut self, center: VoxelCoord, brush: &SphereBrush) -> SphereEdit {
        let corner = brush.corner(center);
        let bounds = EditBounds::clipped_cube(corner, brush.edge(), self.size);
        let mut changed = Vec::new();

        // Only the clipped cube is walked; `bounds` is empty when the corner
        // saturated, so `world - corner` cannot overflow.
        for z in bounds.min.z..bounds.max.z {
            for y in bounds.min.y..bounds.max.y {
                for x in bounds.min.x..bounds.max.x {
                    let world = VoxelCoord::new(x, y, z);
                    let local = world - corner;
                    let Some(i) = self.index(world) else {
                        continue;
                    };
                    if !brush.covers(local) {
                        continue;
                    }
                    if let Some(next) = brush.next_value(self.cells[i]) {
                        self.cells[i] = next;
                        changed.push(local);
                    }
                }
            }
        }

        log::debug!(
            "{:?} brush r={} at {center}: {} cells changed in {bounds}",
            brush.mode,
            brush.radius,
            changed.len()
        );

        SphereEdit {
            corner,
            bounds,
            changed,
        }
    }

    /// Number of occupied cells in the whole grid.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0.0).count()
    }

    /// Number of occupied cells inside `bounds` (clipped to the grid).
    pub fn occupied_in(&self, bounds: &EditBounds) -> usize {
        let b = bounds.clip_to(self.size);
        if b.is_empty() {
            return 0;
        }
        let mut count = 0;
        for z in b.min.z..b.max.z {
            for y in b.min.y..b.max.y {
                count += self
                    .row(b.min.x, b.max.x, y, z)
                    .iter()
                    .filter(|&&v| v != 0.0)
                    .count();
            }
        }
        count
    }

    /// The flat cell array, x fastest then y then z.
    pub fn as_slice(&self) -> &[f32] {
        &self.cells
    }

    /// Copy of the region `bounds` (clipped to the grid) flattened in the
    /// same axis order as `as_slice()`. Suitable for a partial texture update
    /// at offset `bounds.min` with extent `bounds.extent()`.
    pub fn extract_region(&self, bounds: &EditBounds) -> Vec<f32> {
        let b = bounds.clip_to(self.size);
        let mut out = Vec::with_capacity(b.volume());
        if b.is_empty() {
            return out;
        }
        for z in b.min.z..b.max.z {
            for y in b.min.y..b.max.y {
                out.extend_from_slice(self.row(b.min.x, b.max.x, y, z));
            }
        }
        out
    }

    /// Cells `[x0, x1)` of row `(y, z)`. Caller guarantees in-bounds.
    fn row(&self, x0: i32, x1: i32, y: i32, z: i32) -> &[f32] {
        let n = self.size as usize;
        let base = y as usize * n + z as usize * n * n;
        &self.cells[base + x0 as usize..base + x1 as usize]
    }
}
