// End-to-end tests for the edit pipeline: trace → brush → occlusion refresh.
//
// These drive the public API only, the way a presentation layer would, and
// check that the incrementally maintained occlusion field always matches a
// field computed from scratch over the same grid.

use voxel_hollow_sim::{
    AmbientOcclusionField, BoxCoord, FieldConfig, InitialFill, SculptField, SphereBrush,
    TraceResult, VoxelCoord, VoxelGrid,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn field(grid_size: u32, box_size: u32, initial_fill: InitialFill) -> SculptField {
    SculptField::new(FieldConfig {
        grid_size,
        occlusion_box_size: box_size,
        initial_fill,
        ..FieldConfig::default()
    })
    .unwrap()
}

fn assert_occlusion_fresh(field: &SculptField) {
    let full =
        AmbientOcclusionField::new(field.grid(), field.config().occlusion_box_size).unwrap();
    assert_eq!(field.occlusion_snapshot(), full.as_slice());
}

#[test]
fn sculpting_session_keeps_occlusion_consistent() {
    init_logging();
    let mut field = field(64, 16, InitialFill::CenteredSphere);

    // Shoot rays at the sphere from several sides and alternate fill/erase.
    let shots: [([f32; 3], [f32; 3], SphereBrush); 5] = [
        ([0.5, 32.5, 32.5], [1.0, 0.0, 0.0], SphereBrush::erase(10)),
        ([63.5, 40.2, 30.7], [-1.0, -0.1, 0.05], SphereBrush::fill(12, 2.0)),
        ([32.5, 63.5, 32.5], [0.0, -1.0, 0.0], SphereBrush::fill(7, 3.0)),
        ([5.5, 5.5, 5.5], [1.0, 1.0, 1.0], SphereBrush::erase(16)),
        ([32.5, 32.5, 0.5], [0.02, -0.03, 1.0], SphereBrush::fill(20, 1.0)),
    ];

    for (origin, direction, brush) in shots {
        let report = field
            .place_at_ray(origin, direction, &brush)
            .unwrap_or_else(|| panic!("ray from {origin:?} missed the sphere"));
        assert_eq!(report.voxels.len(), report.bounds.volume());
        for b in &report.changed_boxes {
            assert!(field.occlusion().in_range(*b));
        }
        assert_occlusion_fresh(&field);
    }
}

#[test]
fn trace_then_edit_reports_only_touched_boxes() {
    init_logging();
    let mut field = field(64, 32, InitialFill::Empty);
    field.place_sphere(VoxelCoord::new(10, 10, 10), 8, 1.0);

    // Hit the blob from +x and grow it.
    let hit = match field.trace([60.5, 10.5, 10.5], [-1.0, 0.0, 0.0]) {
        TraceResult::Hit(hit) => hit,
        miss => panic!("expected hit, got {miss:?}"),
    };
    assert_eq!(hit.coord.y, 10);
    assert_eq!(hit.coord.z, 10);

    let report = field.place_sphere(hit.coord, 6, 2.0);
    assert_eq!(report.changed_boxes.as_slice(), &[BoxCoord::new(0, 0, 0)]);
    for b in [
        BoxCoord::new(1, 0, 0),
        BoxCoord::new(0, 1, 0),
        BoxCoord::new(0, 0, 1),
        BoxCoord::new(1, 1, 1),
    ] {
        assert_eq!(field.occlusion().density(b), 0.0);
    }
    assert_occlusion_fresh(&field);
}

#[test]
fn refilling_is_idempotent() {
    init_logging();
    let mut field = field(32, 16, InitialFill::Empty);
    let first = field.place_sphere(VoxelCoord::new(16, 16, 16), 9, 1.0);
    let snapshot = field.voxel_snapshot().to_vec();
    let second = field.place_sphere(VoxelCoord::new(16, 16, 16), 9, 5.0);

    assert!(!first.is_noop());
    assert!(second.is_noop());
    assert!(second.changed_boxes.is_empty());
    assert_eq!(snapshot, field.voxel_snapshot());
}

#[test]
fn ray_misses_after_erasing_everything() {
    init_logging();
    let mut field = field(32, 16, InitialFill::CenteredSphere);
    // The initial sphere has radius 8; one erase of edge 24 clears it.
    field.apply_brush(VoxelCoord::new(16, 16, 16), &SphereBrush::erase(24));
    assert_eq!(field.grid().occupied_count(), 0);
    assert!(field.occlusion_snapshot().iter().all(|&d| d == 0.0));
    assert!(matches!(
        field.trace([0.5, 16.5, 16.5], [1.0, 0.0, 0.0]),
        TraceResult::Miss { .. }
    ));
}

#[test]
fn wrapped_grid_snapshot_order() {
    init_logging();
    let mut grid = VoxelGrid::new(32);
    grid.set(VoxelCoord::new(1, 2, 3), 4.0);
    let field = SculptField::from_grid(FieldConfig::default(), grid).unwrap();
    assert_eq!(field.voxel_snapshot()[1 + 2 * 32 + 3 * 32 * 32], 4.0);
    // Default box size 32 on a 32 grid: a single box.
    assert_eq!(field.occlusion_snapshot(), &[1.0 / 32768.0]);
}
