// Coarse ambient-occlusion density field.
//
// The fine grid is partitioned into cubic boxes of `box_size^3` voxels. Each
// coarse cell stores the fraction of occupied voxels in its box, in `[0, 1]`,
// which a renderer samples as a cheap approximation of local occlusion. The
// coarse grid is `coarse_size = grid_size / box_size` cells per edge and uses
// the same flat layout as `VoxelGrid` (x fastest, z slowest).
//
// `box_size` must divide the grid size exactly; `new()` refuses anything else
// rather than silently dropping a partial box at the far edge.
//
// ## Recomputation
//
// - `compute_all()` recomputes every box. The density buffer is split into
//   one slab per outer (z) box coordinate with `par_chunks_mut`, so each
//   rayon task writes a disjoint slab and reads a disjoint part of the grid.
// - `compute_changed()` maps a list of edited voxels (plus a caller-supplied
//   offset, typically an edit's corner) to boxes, deduplicates them, and
//   recomputes each box once. The densities are computed in parallel and
//   written back after the join. The returned box list doubles as the
//   change notification for partial uploads.
//
// Boxes not named by an edit are left untouched. The field is therefore only
// as fresh as the edit reports fed into it; `field.rs` makes sure every edit
// is reported.
//
// See also: `grid.rs` for the source voxels, `field.rs` which owns both and
// sequences edits with recomputation.

use crate::config::check_box_size;
use crate::error::FieldError;
use crate::grid::VoxelGrid;
use crate::types::{BoxCoord, EditBounds, VoxelCoord};
use rayon::prelude::*;
use smallvec::SmallVec;
use voxel_hollow_utils::dedup_in_order;

/// Boxes recomputed by one `compute_changed()` call. An edit whose cube is
/// smaller than a box touches at most 8 boxes.
pub type ChangedBoxes = SmallVec<[BoxCoord; 8]>;

/// Fraction of occupied voxels in box `b`.
fn box_density(grid: &VoxelGrid, box_size: u32, b: BoxCoord) -> f32 {
    let min = b.min_voxel(box_size);
    let bounds = EditBounds::new(min, min + VoxelCoord::splat(box_size as i32));
    let total = (box_size as usize).pow(3);
    grid.occupied_in(&bounds) as f32 / total as f32
}

/// Coarse occupied-fraction field derived from a `VoxelGrid`.
#[derive(Clone, Debug)]
pub struct AmbientOcclusionField {
    /// Flat storage: index = x + y * coarse_size + z * coarse_size^2.
    density: Vec<f32>,
    box_size: u32,
    coarse_size: u32,
    parallel: bool,
}

impl AmbientOcclusionField {
    /// Build the field for `grid` and compute every box on the rayon pool.
    pub fn new(grid: &VoxelGrid, box_size: u32) -> Result<Self, FieldError> {
        Self::with_parallelism(grid, box_size, true)
    }

    /// Like `new()`, choosing whether recomputation runs on the rayon pool.
    /// Both paths produce identical densities.
    pub fn with_parallelism(
        grid: &VoxelGrid,
        box_size: u32,
        parallel: bool,
    ) -> Result<Self, FieldError> {
        check_box_size(grid.size(), box_size)?;
        let coarse_size = grid.size() / box_size;
        let m = coarse_size as usize;
        let mut field = Self {
            density: vec![0.0; m * m * m],
            box_size,
            coarse_size,
            parallel,
        };
        field.compute_all(grid);
        log::debug!(
            "occlusion field: {m}^3 boxes of {box_size}^3 voxels (parallel: {parallel})"
        );
        Ok(field)
    }

    pub fn box_size(&self) -> u32 {
        self.box_size
    }

    pub fn coarse_size(&self) -> u32 {
        self.coarse_size
    }

    /// Whether `b` names a box of this field.
    pub fn in_range(&self, b: BoxCoord) -> bool {
        let m = self.coarse_size as i32;
        (0..m).contains(&b.x) && (0..m).contains(&b.y) && (0..m).contains(&b.z)
    }

    fn index(&self, b: BoxCoord) -> Option<usize> {
        if self.in_range(b) {
            let m = self.coarse_size as usize;
            Some(b.x as usize + b.y as usize * m + b.z as usize * m * m)
        } else {
            None
        }
    }

    /// Stored density of box `b`, or `0.0` outside the field.
    pub fn density(&self, b: BoxCoord) -> f32 {
        self.index(b).map(|i| self.density[i]).unwrap_or(0.0)
    }

    /// Density of the box containing fine voxel `coord`.
    pub fn density_at_voxel(&self, coord: VoxelCoord) -> f32 {
        self.density(coord.to_box(self.box_size))
    }

    /// The flat density array, x fastest then y then z.
    pub fn as_slice(&self) -> &[f32] {
        &self.density
    }

    /// Recompute one box. Returns `false` (and leaves the field alone) if `b`
    /// is outside the field.
    pub fn compute_box(&mut self, grid: &VoxelGrid, b: BoxCoord) -> bool {
        let Some(i) = self.index(b) else {
            log::warn!("compute_box: {b} outside {}^3 occlusion field", self.coarse_size);
            return false;
        };
        self.density[i] = box_density(grid, self.box_size, b);
        log::trace!("recomputed {b}: {}", self.density[i]);
        true
    }

    /// Recompute every box.
    pub fn compute_all(&mut self, grid: &VoxelGrid) {
        debug_assert_eq!(grid.size(), self.coarse_size * self.box_size);
        let m = self.coarse_size as usize;
        let box_size = self.box_size;

        // One slab per bz; slabs are disjoint so no synchronization is needed.
        let fill_slab = |(bz, slab): (usize, &mut [f32])| {
            for by in 0..m {
                for bx in 0..m {
                    let b = BoxCoord::new(bx as i32, by as i32, bz as i32);
                    slab[bx + by * m] = box_density(grid, box_size, b);
                }
            }
        };

        if self.parallel {
            self.density
                .par_chunks_mut(m * m)
                .enumerate()
                .for_each(fill_slab);
        } else {
            self.density.chunks_mut(m * m).enumerate().for_each(fill_slab);
        }
    }

    /// Recompute the boxes containing `edited[i] + origin_offset`, each once.
    ///
    /// Returns the boxes that were recomputed, in first-seen order. Box
    /// coordinates outside the field are skipped with a warning; they can
    /// only come from voxels outside the grid.
    pub fn compute_changed(
        &mut self,
        grid: &VoxelGrid,
        edited: &[VoxelCoord],
        origin_offset: VoxelCoord,
    ) -> ChangedBoxes {
        let box_size = self.box_size;
        let touched: Vec<BoxCoord> = edited
            .iter()
            .map(|&c| (c + origin_offset).to_box(box_size))
            .collect();

        let mut boxes = ChangedBoxes::new();
        let mut targets = Vec::new();
        for b in dedup_in_order(&touched) {
            match self.index(b) {
                Some(i) => {
                    boxes.push(b);
                    targets.push((i, b));
                }
                None => log::warn!(
                    "compute_changed: {b} outside {}^3 occlusion field, skipped",
                    self.coarse_size
                ),
            }
        }

        let densities: Vec<(usize, f32)> = if self.parallel {
            targets
                .par_iter()
                .map(|&(i, b)| (i, box_density(grid, box_size, b)))
                .collect()
        } else {
            targets
                .iter()
                .map(|&(i, b)| (i, box_density(grid, box_size, b)))
                .collect()
        };
        for (i, d) in densities {
            self.density[i] = d;
        }

        log::debug!(
            "recomputed {} occlusion boxes for {} edited voxels",
            boxes.len(),
            edited.len()
        );
        boxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SphereBrush;

    #[test]
    fn rejects_box_size_not_dividing_grid() {
        let grid = VoxelGrid::new(64);
        for bad in [0, 24, 128] {
            let err = AmbientOcclusionField::new(&grid, bad).unwrap_err();
            assert!(matches!(
                err,
                FieldError::BoxSizeMismatch { size: 64, box_size } if box_size == bad
            ));
        }
    }

    #[test]
    fn coarse_size_is_grid_over_box() {
        let grid = VoxelGrid::new(64);
        let field = AmbientOcclusionField::new(&grid, 16).unwrap();
        assert_eq!(field.coarse_size(), 4);
        assert_eq!(field.as_slice().len(), 64);
        assert!(field.as_slice().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn full_box_has_density_one() {
        let mut grid = VoxelGrid::new(8);
        for z in 0..4 {
            for y in 0..4 {
                for x in 4..8 {
                    grid.set(VoxelCoord::new(x, y, z), 3.0);
                }
            }
        }
        grid.set(VoxelCoord::new(0, 0, 4), 1.0);
        let field = AmbientOcclusionField::new(&grid, 4).unwrap();
        assert_eq!(field.density(BoxCoord::new(1, 0, 0)), 1.0);
        assert_eq!(field.density(BoxCoord::new(0, 0, 1)), 1.0 / 64.0);
        assert_eq!(field.density(BoxCoord::new(0, 0, 0)), 0.0);
        // Flat layout: box (0,0,1) lives at index 0 + 0 * 2 + 1 * 4.
        assert_eq!(field.as_slice()[4], 1.0 / 64.0);
    }

    #[test]
    fn compute_all_matches_per_box() {
        let grid = VoxelGrid::with_centered_sphere(64);
        let field = AmbientOcclusionField::new(&grid, 16).unwrap();
        let mut per_box = field.clone();
        let m = per_box.coarse_size() as i32;
        for z in 0..m {
            for y in 0..m {
                for x in 0..m {
                    assert!(per_box.compute_box(&grid, BoxCoord::new(x, y, z)));
                }
            }
        }
        assert_eq!(field.as_slice(), per_box.as_slice());

        // Running it again changes nothing.
        let mut again = field.clone();
        again.compute_all(&grid);
        assert_eq!(field.as_slice(), again.as_slice());
    }

    #[test]
    fn serial_and_parallel_agree() {
        let grid = VoxelGrid::with_centered_sphere(64);
        let par = AmbientOcclusionField::with_parallelism(&grid, 8, true).unwrap();
        let ser = AmbientOcclusionField::with_parallelism(&grid, 8, false).unwrap();
        assert_eq!(par.as_slice(), ser.as_slice());
    }

    #[test]
    fn centre_box_denser_than_outside_box() {
        let grid = VoxelGrid::with_centered_sphere(64);
        let field = AmbientOcclusionField::new(&grid, 16).unwrap();
        let centre = field.density_at_voxel(VoxelCoord::new(32, 32, 32));
        let corner = field.density(BoxCoord::new(0, 0, 0));
        assert_eq!(corner, 0.0);
        assert!(centre > corner);
        assert!(centre > 0.5 && centre < 0.7, "centre = {centre}");
    }

    #[test]
    fn default_box_size_centre_box_denser_than_corner() {
        let grid = VoxelGrid::with_centered_sphere(128);
        let field = AmbientOcclusionField::new(&grid, 32).unwrap();
        let centre = field.density(BoxCoord::new(1, 1, 1));
        let corner = field.density(BoxCoord::new(0, 0, 0));
        assert_eq!(corner, 0.0);
        assert!(centre > corner, "centre = {centre}");
    }

    #[test]
    fn small_edit_only_touches_its_box() {
        let mut grid = VoxelGrid::new(64);
        let mut field = AmbientOcclusionField::new(&grid, 32).unwrap();
        let edit = grid.place_sphere(VoxelCoord::new(10, 10, 10), 8, 1.0);
        let changed = field.compute_changed(&grid, &edit.changed, edit.corner);

        assert_eq!(changed.as_slice(), &[BoxCoord::new(0, 0, 0)]);
        assert!(field.density(BoxCoord::new(0, 0, 0)) > 0.0);
        for b in [
            BoxCoord::new(1, 1, 1),
            BoxCoord::new(1, 0, 0),
            BoxCoord::new(0, 1, 0),
            BoxCoord::new(0, 0, 1),
            BoxCoord::new(1, 1, 0),
        ] {
            assert_eq!(field.density(b), 0.0, "{b}");
        }
    }

    #[test]
    fn edit_across_box_corner_reports_each_box_once() {
        let mut grid = VoxelGrid::new(64);
        let mut field = AmbientOcclusionField::new(&grid, 32).unwrap();
        let edit = grid.place_sphere(VoxelCoord::new(32, 32, 32), 8, 1.0);
        let changed = field.compute_changed(&grid, &edit.changed, edit.corner);
        assert_eq!(changed.len(), 8);
        let mut sorted = changed.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 8);
        assert!(changed.iter().all(|&b| field.density(b) > 0.0));
    }

    #[test]
    fn incremental_matches_full_recompute() {
        let mut grid = VoxelGrid::with_centered_sphere(64);
        let mut field = AmbientOcclusionField::new(&grid, 16).unwrap();

        let edits = [
            (VoxelCoord::new(16, 16, 16), SphereBrush::fill(10, 2.0)),
            (VoxelCoord::new(32, 32, 32), SphereBrush::erase(12)),
            (VoxelCoord::new(63, 0, 40), SphereBrush::fill(9, 1.0)),
            (VoxelCoord::new(47, 48, 20), SphereBrush::fill(20, 4.0)),
        ];
        for (center, brush) in edits {
            let edit = grid.apply_brush(center, &brush);
            field.compute_changed(&grid, &edit.changed, edit.corner);
            let full = AmbientOcclusionField::new(&grid, 16).unwrap();
            assert_eq!(field.as_slice(), full.as_slice(), "after edit at {center}");
        }
    }

    #[test]
    fn untouched_boxes_are_not_recomputed() {
        let mut grid = VoxelGrid::new(64);
        let mut field = AmbientOcclusionField::new(&grid, 32).unwrap();
        // Change box (1,1,1) behind the field's back.
        grid.set(VoxelCoord::new(40, 40, 40), 1.0);
        let edit = grid.place_sphere(VoxelCoord::new(10, 10, 10), 4, 1.0);
        field.compute_changed(&grid, &edit.changed, edit.corner);
        assert_eq!(field.density(BoxCoord::new(1, 1, 1)), 0.0);
        assert!(field.density(BoxCoord::new(0, 0, 0)) > 0.0);
    }

    #[test]
    fn out_of_range_boxes_are_skipped() {
        let grid = VoxelGrid::new(64);
        let mut field = AmbientOcclusionField::new(&grid, 32).unwrap();
        let changed = field.compute_changed(
            &grid,
            &[VoxelCoord::new(-1, 0, 0), VoxelCoord::new(200, 0, 0)],
            VoxelCoord::default(),
        );
        assert!(changed.is_empty());
        assert!(!field.compute_box(&grid, BoxCoord::new(2, 0, 0)));
    }

    #[test]
    fn offset_translates_local_coordinates() {
        let mut grid = VoxelGrid::new(64);
        let mut field = AmbientOcclusionField::with_parallelism(&grid, 32, false).unwrap();
        grid.set(VoxelCoord::new(40, 2, 2), 1.0);
        let changed = field.compute_changed(
            &grid,
            &[VoxelCoord::new(0, 2, 2)],
            VoxelCoord::new(40, 0, 0),
        );
        assert_eq!(changed.as_slice(), &[BoxCoord::new(1, 0, 0)]);
        assert_eq!(field.density(BoxCoord::new(1, 0, 0)), 1.0 / 32768.0);
    }
}
