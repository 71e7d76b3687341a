// Error types for field construction.
//
// Only configuration problems are errors. Out-of-bounds coordinates are
// absorbed where they occur (reads return empty, writes are skipped) and an
// exhausted ray walk is an ordinary `TraceResult::Miss`, so neither shows up
// here.

/// Errors that can occur while building a voxel field.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FieldError {
    /// The grid edge length must be positive.
    #[error("grid size must be positive, got {0}")]
    InvalidGridSize(u32),

    /// The occlusion box size must be positive and evenly divide the grid size.
    #[error("occlusion box size {box_size} does not evenly divide grid size {size}")]
    BoxSizeMismatch {
        /// Fine grid edge length.
        size: u32,
        /// Requested box edge length.
        box_size: u32,
    },

    /// A JSON config could not be parsed.
    #[error("invalid field config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
