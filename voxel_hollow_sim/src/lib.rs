// voxel_hollow_sim — dense voxel field core.
//
// This crate holds the computational core of a sculptable voxel volume: the
// dense occupancy grid and its sphere brush, a coarse ambient-occlusion
// density field kept in sync with it, and a grid-DDA ray walk used to pick
// edit targets. It has no graphics, windowing or file-format dependencies;
// everything it exposes is plain numbers and flat `f32` arrays that a
// presentation layer uploads however it likes.
//
// Module overview:
// - `field.rs`:      SculptField — owns grid + occlusion + config, sequences edits.
// - `grid.rs`:       Dense N^3 voxel grid, sphere brush (fill / erase), snapshots.
// - `occlusion.rs`:  Coarse occupied-fraction field, full and incremental recompute.
// - `traversal.rs`:  Amanatides & Woo voxel traversal and bounded `trace()`.
// - `config.rs`:     FieldConfig — construction-time parameters, JSON via serde.
// - `error.rs`:      FieldError — configuration failures.
// - `types.rs`:      VoxelCoord, BoxCoord, EditBounds.
//
// Coordinate convention: every flat array (grid cells, densities, extracted
// regions) is indexed x fastest, then y, then z. Any axis swizzling a
// renderer needs happens on its side.

pub mod config;
pub mod error;
pub mod field;
pub mod grid;
pub mod occlusion;
pub mod traversal;
pub mod types;

pub use config::{FieldConfig, InitialFill};
pub use error::FieldError;
pub use field::{EditReport, SculptField};
pub use grid::{EditMode, SphereBrush, SphereEdit, VoxelGrid};
pub use occlusion::{AmbientOcclusionField, ChangedBoxes};
pub use traversal::{TraceHit, TraceResult, VoxelTraversal, trace};
pub use types::{BoxCoord, EditBounds, VoxelCoord};
