// Owning context for a sculptable voxel field.
//
// `SculptField` is the single source of truth for one volume: it owns the
// `VoxelGrid`, the `AmbientOcclusionField` derived from it, and the
// `FieldConfig` both were built from. Every mutation goes through
// `place_sphere()` / `apply_brush()`, which run the edit and then recompute
// exactly the occlusion boxes the edit reported, so the two grids never
// drift apart.
//
// Typical interactive use is `place_at_ray()`: trace from the eye along the
// view direction, and if something is hit, apply the brush there.
//
// Each edit returns an `EditReport` carrying what a presentation layer needs
// for a partial upload: the clipped edit bounds with the flattened voxel
// sub-block for that region, and the list of changed occlusion boxes.
//
// Concurrency: edits take `&mut self`, queries take `&self`, so the borrow
// checker enforces the single-writer rule between edits and occlusion
// recomputation or ray walks. Parallelism lives inside
// `AmbientOcclusionField`.
//
// See also: `grid.rs`, `occlusion.rs`, `traversal.rs` for the pieces being
// sequenced, `config.rs` for `FieldConfig`.

use crate::config::{FieldConfig, InitialFill};
use crate::error::FieldError;
use crate::grid::{SphereBrush, VoxelGrid};
use crate::occlusion::{AmbientOcclusionField, ChangedBoxes};
use crate::traversal::{self, TraceResult};
use crate::types::{EditBounds, VoxelCoord};

/// Everything a presentation layer needs after one edit.
#[derive(Clone, Debug, PartialEq)]
pub struct EditReport {
    /// Brush centre the edit was applied at.
    pub center: VoxelCoord,
    /// The edit cube clipped to the grid; the region `voxels` covers.
    pub bounds: EditBounds,
    /// Number of voxels whose value changed.
    pub changed_voxels: usize,
    /// Occlusion boxes recomputed because of this edit.
    pub changed_boxes: ChangedBoxes,
    /// Grid values inside `bounds` after the edit, flattened x fastest.
    pub voxels: Vec<f32>,
}

impl EditReport {
    pub fn is_noop(&self) -> bool {
        self.changed_voxels == 0
    }
}

/// A voxel grid with its occlusion field kept in sync.
#[derive(Clone, Debug)]
pub struct SculptField {
    config: FieldConfig,
    grid: VoxelGrid,
    occlusion: AmbientOcclusionField,
}

impl SculptField {
    /// Build the grid from `config.initial_fill` and compute the full
    /// occlusion field. Fails before allocating if the config is invalid.
    pub fn new(config: FieldConfig) -> Result<Self, FieldError> {
        config.validate()?;
        let grid = match config.initial_fill {
            InitialFill::Empty => VoxelGrid::new(config.grid_size),
            InitialFill::CenteredSphere => VoxelGrid::with_centered_sphere(config.grid_size),
        };
        Self::from_grid(config, grid)
    }

    /// Wrap an existing grid. `config.grid_size` is overridden by the grid's
    /// own size; `config.initial_fill` is ignored.
    pub fn from_grid(mut config: FieldConfig, grid: VoxelGrid) -> Result<Self, FieldError> {
        config.grid_size = grid.size();
        config.validate()?;
        let occlusion = AmbientOcclusionField::with_parallelism(
            &grid,
            config.occlusion_box_size,
            config.parallel_occlusion,
        )?;
        log::debug!(
            "sculpt field ready: {}^3 voxels, {} occupied",
            grid.size(),
            grid.occupied_count()
        );
        Ok(Self {
            config,
            grid,
            occlusion,
        })
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn occlusion(&self) -> &AmbientOcclusionField {
        &self.occlusion
    }

    /// Flattened voxel snapshot (see `VoxelGrid::as_slice`).
    pub fn voxel_snapshot(&self) -> &[f32] {
        self.grid.as_slice()
    }

    /// Flattened density snapshot (see `AmbientOcclusionField::as_slice`).
    pub fn occlusion_snapshot(&self) -> &[f32] {
        self.occlusion.as_slice()
    }

    /// Walk a ray with the configured step budget.
    pub fn trace(&self, origin: [f32; 3], direction: [f32; 3]) -> TraceResult {
        traversal::trace(&self.grid, origin, direction, self.config.trace_max_steps)
    }

    /// Fill a sphere at `center` (see `VoxelGrid::place_sphere`).
    pub fn place_sphere(&mut self, center: VoxelCoord, radius: u32, value: f32) -> EditReport {
        self.apply_brush(center, &SphereBrush::fill(radius, value))
    }

    /// Apply `brush` at `center` and refresh the occlusion boxes it touched.
    pub fn apply_brush(&mut self, center: VoxelCoord, brush: &SphereBrush) -> EditReport {
        let edit = self.grid.apply_brush(center, brush);
        let changed_boxes = self
            .occlusion
            .compute_changed(&self.grid, &edit.changed, edit.corner);
        EditReport {
            center,
            bounds: edit.bounds,
            changed_voxels: edit.changed.len(),
            changed_boxes,
            voxels: self.grid.extract_region(&edit.bounds),
        }
    }

    /// Trace from `origin` along `direction` and apply `brush` at the first
    /// occupied cell. Returns `None` if the ray misses.
    pub fn place_at_ray(
        &mut self,
        origin: [f32; 3],
        direction: [f32; 3],
        brush: &SphereBrush,
    ) -> Option<EditReport> {
        match self.trace(origin, direction) {
            TraceResult::Hit(hit) => Some(self.apply_brush(hit.coord, brush)),
            TraceResult::Miss { steps } => {
                log::debug!("place_at_ray: no target after {steps} cells");
                None
            }
        }
    }

    /// Recompute the whole occlusion field from scratch.
    pub fn recompute_occlusion(&mut self) {
        self.occlusion.compute_all(&self.grid);
    }
}
