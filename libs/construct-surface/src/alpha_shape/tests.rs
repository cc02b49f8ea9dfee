//! Tests for alpha-shape surface construction.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use delaunay::DelaunayError;
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use surface_mesh::ops::SmoothingParams;
use surface_mesh::{PropertyArray, PropertyData, RegionId, SimulationCell, TaskToken};

use super::*;

// =============================================================================
// HELPERS
// =============================================================================

/// Simple cubic lattice of `n.x * n.y * n.z` points with unit spacing.
fn lattice(n: [usize; 3], origin: DVec3) -> Vec<DVec3> {
    let mut points = Vec::with_capacity(n[0] * n[1] * n[2]);
    for k in 0..n[2] {
        for j in 0..n[1] {
            for i in 0..n[0] {
                points.push(origin + DVec3::new(i as f64, j as f64, k as f64));
            }
        }
    }
    points
}

fn is_interior(p: DVec3, origin: DVec3, n: usize) -> bool {
    let r = p - origin;
    (0..3).all(|d| r[d] > 0.5 && r[d] < n as f64 - 1.5)
}

/// Unsmoothed parameters, so vertices stay on the particles.
fn params(probe_radius: f64) -> AlphaShapeParams {
    AlphaShapeParams {
        probe_radius,
        smoothing: SmoothingParams::with_iterations(0),
        ..Default::default()
    }
}

fn run(cell: &SimulationCell, particles: &Particles<'_>, params: &AlphaShapeParams) -> SurfaceReconstruction {
    construct_alpha_shape(cell, particles, params, &TaskToken::new())
        .unwrap()
        .unwrap()
}

/// Two 4x4x4 lattice blocks four units apart.
fn two_blocks() -> (SimulationCell, Vec<DVec3>) {
    let mut positions = lattice([4; 3], DVec3::splat(2.0));
    positions.extend(lattice([4; 3], DVec3::new(9.0, 2.0, 2.0)));
    let cell = SimulationCell::orthorhombic(DVec3::new(14.0, 7.0, 7.0), [false; 3]);
    (cell, positions)
}

// =============================================================================
// ONE-SIDED SURFACES
// =============================================================================

#[test]
fn test_lattice_block() {
    let origin = DVec3::splat(2.0);
    let positions = lattice([5; 3], origin);
    let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [false; 3]);
    let result = run(&cell, &Particles::new(&positions), &params(1.5));

    let mesh = &result.mesh;
    assert!(mesh.is_closed());
    assert_eq!(mesh.region_count(), 1);
    // Every particle on the block faces is a vertex, the 27 inner ones are not.
    assert_eq!(mesh.vertex_count(), 98);
    assert_eq!(mesh.vertex_count() + mesh.face_count(), mesh.edge_count() / 2 + 2);

    let summary = result.summary;
    assert_relative_eq!(summary.filled_volume, 64.0, max_relative = 1e-6);
    assert_relative_eq!(summary.surface_area, 96.0, max_relative = 1e-6);
    assert_relative_eq!(summary.empty_volume, 1000.0 - 64.0, max_relative = 1e-6);
    assert_relative_eq!(summary.filled_fraction, 0.064, max_relative = 1e-6);
    assert_eq!(summary.filled_region_count, 1);
    assert_eq!(summary.empty_region_count, 0);
    assert_relative_eq!(mesh.region(RegionId(0)).volume, 64.0, max_relative = 1e-6);
    assert_eq!(mesh.space_filling_region(), None);
}

#[test]
fn test_vertices_map_to_particles() {
    let origin = DVec3::splat(2.0);
    let positions = lattice([5; 3], origin);
    let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [false; 3]);
    let params = AlphaShapeParams {
        select_surface_particles: true,
        ..params(1.5)
    };
    let result = run(&cell, &Particles::new(&positions), &params);

    let map = result.vertex_particles.as_ref().unwrap();
    assert_eq!(map.len(), result.mesh.vertex_count());
    for v in result.mesh.vertices() {
        let p = positions[map[v.index()]];
        assert!(result.mesh.vertex_position(v).abs_diff_eq(p, 1e-12));
    }

    let surface = result.surface_particles.unwrap();
    for (i, &p) in positions.iter().enumerate() {
        assert_eq!(surface[i], !is_interior(p, origin, 5), "particle {i}");
    }
}

#[test]
fn test_filled_volume_grows_with_probe_radius() {
    let mut rng = StdRng::seed_from_u64(7);
    let center = DVec3::splat(6.0);
    let positions: Vec<DVec3> = (0..600)
        .map(|_| loop {
            let p = DVec3::new(rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0));
            if p.length() < 4.0 {
                break center + p;
            }
        })
        .collect();
    let cell = SimulationCell::orthorhombic(DVec3::splat(12.0), [false; 3]);

    let mut previous = 0.0;
    for radius in [0.6, 0.9, 1.5, 3.0, 10.0] {
        let result = run(&cell, &Particles::new(&positions), &params(radius));
        assert!(result.mesh.is_closed(), "probe radius {radius}");
        let volume = result.summary.filled_volume;
        assert!(volume >= previous - 1e-9, "probe radius {radius}: {volume} < {previous}");
        previous = volume;
    }
    // A large probe fills the convex hull, which lies inside the ball.
    let ball = 4.0 / 3.0 * std::f64::consts::PI * 64.0;
    assert!(previous < ball && previous > 0.7 * ball, "hull volume {previous}");
}

#[test]
fn test_surface_distance_one_sided() {
    let origin = DVec3::splat(2.0);
    let positions = lattice([5; 3], origin);
    let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [false; 3]);
    let params = AlphaShapeParams {
        compute_surface_distance: true,
        ..params(1.5)
    };
    let result = run(&cell, &Particles::new(&positions), &params);
    let distances = result.surface_distances.unwrap();
    let center = positions.iter().position(|&p| p == origin + DVec3::splat(2.0)).unwrap();
    assert_abs_diff_eq!(distances[center], -2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(distances[0], 0.0, epsilon = 1e-6);
}

#[test]
fn test_transfer_properties() {
    let positions = lattice([4; 3], DVec3::splat(2.0));
    let ids: Vec<i64> = (0..positions.len() as i64).collect();
    let properties = [PropertyArray::from_data("id", 1, PropertyData::Int(ids)).unwrap()];
    let cell = SimulationCell::orthorhombic(DVec3::splat(8.0), [false; 3]);
    let params = AlphaShapeParams {
        transfer_properties: true,
        ..params(1.5)
    };
    let result = run(&cell, &Particles::new(&positions).with_properties(&properties), &params);
    let id = result.mesh.vertex_property("id").unwrap();
    let map = result.vertex_particles.unwrap();
    for (v, &particle) in map.iter().enumerate() {
        assert_eq!(id.get_f64(v, 0), particle as f64);
    }
}

// =============================================================================
// PERIODIC CELLS
// =============================================================================

#[test]
fn test_periodic_slab() {
    let positions = lattice([6, 6, 4], DVec3::new(0.25, 0.25, 3.0));
    let cell = SimulationCell::orthorhombic(DVec3::new(6.0, 6.0, 10.0), [true, true, false]);
    let result = run(&cell, &Particles::new(&positions), &params(1.5));

    assert!(result.mesh.is_closed());
    assert_eq!(result.mesh.vertex_count(), 72);
    assert_relative_eq!(result.summary.surface_area, 72.0, max_relative = 1e-6);
    assert_relative_eq!(result.summary.filled_volume, 108.0, max_relative = 1e-6);
}

#[test]
fn test_periodic_slab_regions() {
    let positions = lattice([6, 6, 4], DVec3::new(0.25, 0.25, 3.0));
    let cell = SimulationCell::orthorhombic(DVec3::new(6.0, 6.0, 10.0), [true, true, false]);
    let params = AlphaShapeParams {
        identify_regions: true,
        ..params(1.5)
    };
    let result = run(&cell, &Particles::new(&positions), &params);

    assert!(result.mesh.is_closed());
    assert_eq!(result.summary.filled_region_count, 1);
    // Open space above and below the slab.
    assert_eq!(result.summary.empty_region_count, 2);
    assert_relative_eq!(result.summary.surface_area, 72.0, max_relative = 1e-6);
    // Open space fills the cell below (z < 3) and above (z > 6) the slab.
    assert_relative_eq!(result.summary.empty_volume, 36.0 * (3.0 + 4.0), max_relative = 1e-6);
    assert_relative_eq!(
        result.summary.filled_volume + result.summary.empty_volume,
        cell.volume(),
        max_relative = 1e-6
    );
}

#[test]
fn test_periodic_space_filling() {
    let positions = lattice([6; 3], DVec3::splat(0.5));
    let cell = SimulationCell::cubic(6.0);
    let result = run(&cell, &Particles::new(&positions), &params(1.5));

    assert_eq!(result.mesh.face_count(), 0);
    assert_eq!(result.mesh.space_filling_region(), Some(RegionId(0)));
    assert_relative_eq!(result.summary.filled_volume, 216.0, max_relative = 1e-6);
    assert_relative_eq!(result.summary.filled_fraction, 1.0, max_relative = 1e-6);
}

// =============================================================================
// REGIONS
// =============================================================================

#[test]
fn test_two_blocks_identify_regions() {
    let (cell, positions) = two_blocks();
    let params = AlphaShapeParams {
        identify_regions: true,
        ..params(1.5)
    };
    let result = run(&cell, &Particles::new(&positions), &params);
    let mesh = &result.mesh;

    assert!(mesh.is_closed());
    assert_eq!(result.summary.filled_region_count, 2);
    assert_eq!(result.summary.empty_region_count, 1);
    assert_eq!(mesh.region_count(), 3);
    for r in 0..2 {
        let region = mesh.region(RegionId(r));
        assert!(region.is_filled);
        assert_relative_eq!(region.volume, 27.0, max_relative = 1e-6);
    }
    assert!(!mesh.region(RegionId(2)).is_filled);

    // Two-sided: every face has a partner with the reverse orientation.
    for f in mesh.faces() {
        let back = mesh.opposite_face(f).unwrap();
        assert_eq!(mesh.opposite_face(back), Some(f));
        assert_ne!(mesh.face_region(f), mesh.face_region(back));
    }
    assert_relative_eq!(result.summary.surface_area, 2.0 * 54.0, max_relative = 1e-6);
    assert_relative_eq!(result.summary.filled_volume, 54.0, max_relative = 1e-6);
    assert_relative_eq!(result.summary.empty_volume, 14.0 * 49.0 - 54.0, max_relative = 1e-6);
    assert_relative_eq!(mesh.region(RegionId(2)).volume, 14.0 * 49.0 - 54.0, max_relative = 1e-6);
}

#[test]
fn test_open_cell_volumes_do_not_depend_on_ghost_layer() {
    let positions = lattice([4; 3], DVec3::splat(3.0));
    let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [false; 3]);
    for ghost_layer_factor in [2.0, 3.5, 6.0] {
        let params = AlphaShapeParams {
            identify_regions: true,
            ghost_layer_factor,
            ..params(1.5)
        };
        let summary = run(&cell, &Particles::new(&positions), &params).summary;
        assert_relative_eq!(summary.filled_volume, 27.0, max_relative = 1e-6);
        assert_relative_eq!(summary.empty_volume, 1000.0 - 27.0, max_relative = 1e-6);
        assert_relative_eq!(summary.filled_fraction, 0.027, max_relative = 1e-6);
    }
}

#[test]
fn test_outer_surface_rule() {
    assert!(!is_outer_face(Some(RegionId(0)), 2));
    assert!(!is_outer_face(Some(RegionId(1)), 2));
    assert!(is_outer_face(Some(RegionId(2)), 2));
    assert!(is_outer_face(None, 2));
    assert!(is_outer_face(Some(RegionId(0)), 0));
}

#[test]
fn test_identify_mode_area_matches_one_sided() {
    let (cell, positions) = two_blocks();
    let one_sided = run(&cell, &Particles::new(&positions), &params(1.5));
    let params = AlphaShapeParams {
        identify_regions: true,
        ..params(1.5)
    };
    let two_sided = run(&cell, &Particles::new(&positions), &params);
    assert_eq!(two_sided.mesh.face_count(), 2 * one_sided.mesh.face_count());
    assert_relative_eq!(two_sided.summary.surface_area, one_sided.summary.surface_area, max_relative = 1e-9);
}

#[test]
fn test_cluster_ids_define_regions() {
    let (cell, positions) = two_blocks();
    let cluster_ids: Vec<i64> = (0..positions.len()).map(|i| if i < 64 { 0 } else { 1 }).collect();
    let params = AlphaShapeParams {
        identify_regions: true,
        map_particles_to_regions: true,
        ..params(1.5)
    };
    let particles = Particles::new(&positions).with_cluster_ids(&cluster_ids);
    let result = run(&cell, &particles, &params);

    assert_eq!(result.summary.filled_region_count, 2);
    let regions = result.particle_regions.unwrap();
    assert!(regions[..64].iter().all(|&r| r == Some(RegionId(0))));
    assert!(regions[64..].iter().all(|&r| r == Some(RegionId(1))));
}

#[test]
fn test_particle_regions_and_distances() {
    let (cell, mut positions) = two_blocks();
    positions.push(DVec3::new(7.0, 3.5, 3.5));
    let mut selection = vec![true; positions.len()];
    selection[128] = false;
    let params = AlphaShapeParams {
        identify_regions: true,
        map_particles_to_regions: true,
        compute_surface_distance: true,
        ..params(1.5)
    };
    let result = run(&cell, &Particles::new(&positions).with_selection(&selection), &params);

    let regions = result.particle_regions.unwrap();
    let first = regions[0].unwrap();
    let second = regions[64].unwrap();
    assert_ne!(first, second);
    assert!(first.index() < 2 && second.index() < 2);
    assert!(regions[..64].iter().all(|&r| r == Some(first)));
    assert!(regions[64..128].iter().all(|&r| r == Some(second)));
    assert_eq!(regions[128], Some(RegionId(2)));

    let distances = result.surface_distances.unwrap();
    // Innermost particles of the first block are one unit deep.
    let inner = positions
        .iter()
        .position(|&p| p == DVec3::new(3.0, 3.0, 3.0))
        .unwrap();
    assert_abs_diff_eq!(distances[inner], -1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(distances[128], 2.0, epsilon = 1e-6);
}

// =============================================================================
// EDGE CASES
// =============================================================================

#[test]
fn test_empty_selection() {
    let positions = lattice([3; 3], DVec3::ONE);
    let selection = vec![false; positions.len()];
    let cell = SimulationCell::orthorhombic(DVec3::splat(5.0), [false; 3]);
    let params = AlphaShapeParams {
        identify_regions: true,
        map_particles_to_regions: true,
        ..params(1.5)
    };
    let result = run(&cell, &Particles::new(&positions).with_selection(&selection), &params);
    assert_eq!(result.mesh.face_count(), 0);
    assert_eq!(result.mesh.space_filling_region(), Some(RegionId(0)));
    assert_eq!(result.summary.filled_volume, 0.0);
    assert_relative_eq!(result.summary.empty_volume, 125.0);
    assert!(result.particle_regions.unwrap().iter().all(|&r| r == Some(RegionId(0))));
}

#[test]
fn test_invalid_probe_radius() {
    let positions = lattice([3; 3], DVec3::ONE);
    let cell = SimulationCell::orthorhombic(DVec3::splat(5.0), [false; 3]);
    for radius in [0.0, -2.0] {
        let result = construct_alpha_shape(&cell, &Particles::new(&positions), &params(radius), &TaskToken::new());
        assert!(matches!(result, Err(ConstructError::InvalidParameter { .. })));
    }
}

#[test]
fn test_ghost_layer_too_large() {
    let positions = lattice([4; 3], DVec3::splat(0.5));
    let cell = SimulationCell::cubic(4.0);
    let result = construct_alpha_shape(&cell, &Particles::new(&positions), &params(1.5), &TaskToken::new());
    assert!(matches!(
        result,
        Err(ConstructError::Delaunay(DelaunayError::GhostLayerTooLarge { .. }))
    ));
}

#[test]
fn test_degenerate_cell() {
    let positions = lattice([3; 3], DVec3::ONE);
    let cell = SimulationCell::orthorhombic(DVec3::new(5.0, 5.0, 0.0), [false; 3]);
    let result = construct_alpha_shape(&cell, &Particles::new(&positions), &params(1.5), &TaskToken::new());
    assert!(matches!(result, Err(ConstructError::DegenerateCell { .. })));
}

#[test]
fn test_canceled() {
    let positions = lattice([4; 3], DVec3::ONE);
    let cell = SimulationCell::orthorhombic(DVec3::splat(6.0), [false; 3]);
    let task = TaskToken::new();
    task.cancel();
    let result = construct_alpha_shape(&cell, &Particles::new(&positions), &params(1.5), &task).unwrap();
    assert!(result.is_none());
}
