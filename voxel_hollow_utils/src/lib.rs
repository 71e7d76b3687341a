// voxel_hollow_utils — small reusable helpers shared by the voxel_hollow crates.
//
// Module overview:
// - `dedup.rs`: Order-preserving deduplication for small `Copy` keys (used
//   to collapse per-voxel edit lists into per-box work lists).
//
// Nothing in here knows about voxels or occlusion; the helpers are generic
// over their element type so the sim crate can feed them box coordinates.

pub mod dedup;

pub use dedup::{dedup_in_order, dedup_in_order_iter};
