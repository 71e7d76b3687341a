// Construction-time configuration for a voxel field.
//
// All tunable parameters live in `FieldConfig`. The caller builds one (in
// code, or by parsing a JSON string it obtained however it likes) and hands
// it to `SculptField::new()`. Nothing here reads files; the grid size is
// fixed for the lifetime of the field it configures.
//
// `validate()` checks the occlusion divisibility precondition before any
// allocation happens, so a bad config fails fast instead of producing a
// truncated coarse grid.
//
// See also: `field.rs` which consumes the config, `occlusion.rs` which
// re-checks the box size on its own constructor.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};

/// Default fine grid edge length.
pub const DEFAULT_GRID_SIZE: u32 = 128;

/// Default occlusion box edge length (fine voxels per coarse cell, per axis).
pub const DEFAULT_OCCLUSION_BOX_SIZE: u32 = 32;

/// Default DDA step budget for `SculptField::trace()`.
pub const DEFAULT_TRACE_MAX_STEPS: u32 = 512;

/// Procedural content the grid starts with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialFill {
    /// All cells empty.
    Empty,
    /// A solid sphere of value `1.0` centred in the cube, radius `size / 4`.
    #[default]
    CenteredSphere,
}

/// Complete configuration for one `SculptField`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Edge length N of the dense N×N×N grid.
    pub grid_size: u32,

    /// Edge length of one coarse occlusion box. Must evenly divide
    /// `grid_size`.
    pub occlusion_box_size: u32,

    /// Maximum number of cells a ray walk examines before reporting a miss.
    pub trace_max_steps: u32,

    /// What the grid contains right after construction.
    pub initial_fill: InitialFill,

    /// Recompute occlusion boxes on the rayon pool. The serial path produces
    /// identical values; it exists for tiny grids and for debugging.
    pub parallel_occlusion: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            occlusion_box_size: DEFAULT_OCCLUSION_BOX_SIZE,
            trace_max_steps: DEFAULT_TRACE_MAX_STEPS,
            initial_fill: InitialFill::CenteredSphere,
            parallel_occlusion: true,
        }
    }
}

impl FieldConfig {
    /// Parse a config from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, FieldError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, FieldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the construction preconditions.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.grid_size == 0 {
            return Err(FieldError::InvalidGridSize(self.grid_size));
        }
        check_box_size(self.grid_size, self.occlusion_box_size)
    }

    /// Edge length of the coarse occlusion grid.
    pub fn coarse_size(&self) -> u32 {
        self.grid_size / self.occlusion_box_size.max(1)
    }
}

/// `box_size` must be positive and divide `size` exactly.
pub(crate) fn check_box_size(size: u32, box_size: u32) -> Result<(), FieldError> {
    if box_size == 0 || box_size > size || size % box_size != 0 {
        return Err(FieldError::BoxSizeMismatch { size, box_size });
    }
    Ok(())
}
