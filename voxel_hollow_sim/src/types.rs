// Core types shared across the voxel field.
//
// Defines fine-grid coordinates (`VoxelCoord`), coarse occlusion-box
// coordinates (`BoxCoord`), and the clipped axis-aligned bounds an edit
// reports (`EditBounds`). All types derive `Serialize`/`Deserialize` so a
// presentation layer can ship them across whatever boundary it owns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position in the fine voxel grid. Each component is in voxel units.
///
/// Components are signed so that edit corners and ray cells may sit outside
/// the grid; every grid access bounds-checks before touching storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The same value on all three axes.
    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Floor a real-valued point to the cell containing it.
    pub fn from_point(p: [f32; 3]) -> Self {
        Self::new(p[0].floor() as i32, p[1].floor() as i32, p[2].floor() as i32)
    }

    /// The coarse box this voxel falls in, for boxes `box_size` voxels wide.
    ///
    /// Uses Euclidean division so negative coordinates map to negative boxes
    /// instead of collapsing onto box 0.
    pub fn to_box(self, box_size: u32) -> BoxCoord {
        let b = box_size as i32;
        BoxCoord::new(
            self.x.div_euclid(b),
            self.y.div_euclid(b),
            self.z.div_euclid(b),
        )
    }
}

impl Add for VoxelCoord {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for VoxelCoord {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A position in the coarse occlusion grid (one unit = one box of
/// `box_size^3` fine voxels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BoxCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The fine voxel at this box's minimum corner.
    pub fn min_voxel(self, box_size: u32) -> VoxelCoord {
        let b = box_size as i32;
        VoxelCoord::new(self.x * b, self.y * b, self.z * b)
    }
}

impl fmt::Display for BoxCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Edit bounds
// ---------------------------------------------------------------------------

/// Half-open axis-aligned region `[min, max)` of fine voxels.
///
/// An empty region has `max <= min` on at least one axis. Edits report their
/// cube clipped to the grid, so a fully out-of-bounds edit yields an empty
/// region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBounds {
    pub min: VoxelCoord,
    pub max: VoxelCoord,
}

impl EditBounds {
    pub const fn new(min: VoxelCoord, max: VoxelCoord) -> Self {
        Self { min, max }
    }

    /// The cube `[corner, corner + edge)` intersected with `[0, grid_size)^3`.
    ///
    /// Computed in `i64` so a corner near the `i32` limits clips to an empty
    /// region instead of overflowing.
    pub fn clipped_cube(corner: VoxelCoord, edge: u32, grid_size: u32) -> Self {
        let n = i64::from(grid_size);
        let lo = |c: i32| i64::from(c).clamp(0, n) as i32;
        let hi = |c: i32| (i64::from(c) + i64::from(edge)).clamp(0, n) as i32;
        Self::new(
            VoxelCoord::new(lo(corner.x), lo(corner.y), lo(corner.z)),
            VoxelCoord::new(hi(corner.x), hi(corner.y), hi(corner.z)),
        )
    }

    /// Intersect with `[0, size)^3`.
    pub fn clip_to(&self, size: u32) -> Self {
        let n = size as i32;
        let lo = |v: i32| v.clamp(0, n);
        Self::new(
            VoxelCoord::new(lo(self.min.x), lo(self.min.y), lo(self.min.z)),
            VoxelCoord::new(lo(self.max.x), lo(self.max.y), lo(self.max.z)),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y || self.max.z <= self.min.z
    }

    /// Edge lengths per axis (0 for an empty axis).
    pub fn extent(&self) -> [u32; 3] {
        [
            (self.max.x - self.min.x).max(0) as u32,
            (self.max.y - self.min.y).max(0) as u32,
            (self.max.z - self.min.z).max(0) as u32,
        ]
    }

    /// Number of voxels in the region.
    pub fn volume(&self) -> usize {
        let [x, y, z] = self.extent();
        x as usize * y as usize * z as usize
    }

    pub fn contains(&self, coord: VoxelCoord) -> bool {
        coord.x >= self.min.x
            && coord.y >= self.min.y
            && coord.z >= self.min.z
            && coord.x < self.max.x
            && coord.y < self.max.y
            && coord.z < self.max.z
    }
}

impl fmt::Display for EditBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {})", self.min, self.max)
    }
}
