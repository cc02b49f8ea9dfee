//! Tests for the Delaunay tessellation.

use std::collections::HashSet;

use approx::assert_relative_eq;
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use surface_mesh::{SimulationCell, TaskToken};

use super::*;

// =============================================================================
// HELPERS
// =============================================================================

fn random_points(count: usize, size: f64, seed: u64) -> Vec<DVec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| DVec3::new(rng.gen_range(0.0..size), rng.gen_range(0.0..size), rng.gen_range(0.0..size)))
        .collect()
}

fn tessellate(cell: &SimulationCell, points: &[DVec3], ghost: f64, cover: bool) -> DelaunayTessellation {
    DelaunayTessellation::generate(cell, points, ghost, cover, None, &TaskToken::new())
        .unwrap()
        .unwrap()
}

fn finite_volume(tess: &DelaunayTessellation) -> f64 {
    tess.cells().filter(|&c| tess.is_finite_cell(c)).map(|c| tess.cell_volume(c)).sum()
}

// =============================================================================
// DELAUNAY PROPERTY
// =============================================================================

#[test]
fn test_cells_are_positively_oriented() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [false; 3]);
    let tess = tessellate(&cell, &random_points(100, 10.0, 1), 1.0, false);
    for c in tess.cells() {
        let [a, b, cc, d] = tess.cell_vertex_positions(c);
        assert!(orient(a, b, cc, d) > 0.0, "cell {c}");
    }
}

#[test]
fn test_circumspheres_are_empty() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [false; 3]);
    let tess = tessellate(&cell, &random_points(150, 10.0, 2), 1.0, false);
    let finite_vertices: Vec<usize> = (0..tess.vertex_count()).filter(|&v| !tess.is_infinite_vertex(v)).collect();
    for c in tess.cells().filter(|&c| tess.is_finite_cell(c)) {
        let corners = tess.cell_vertices(c);
        let [a, b, cc, d] = tess.cell_vertex_positions(c);
        for &v in &finite_vertices {
            if corners.contains(&v) {
                continue;
            }
            assert!(in_sphere(a, b, cc, d, tess.vertex_position(v)) <= 0.0, "vertex {v} inside cell {c}");
        }
    }
}

#[test]
fn test_neighbors_are_symmetric() {
    let cell = SimulationCell::cubic(5.0);
    let tess = tessellate(&cell, &random_points(60, 5.0, 3), 1.5, false);
    for c in tess.cells() {
        for f in 0..4 {
            let Some((n, g)) = tess.mirror_facet(c, f) else {
                continue;
            };
            assert_eq!(tess.mirror_facet(n, g), Some((c, f)));
            let mut mine: Vec<usize> = FACET_VERTICES[f].iter().map(|&k| tess.cell_vertex(c, k)).collect();
            let mut theirs: Vec<usize> = FACET_VERTICES[g].iter().map(|&k| tess.cell_vertex(n, k)).collect();
            mine.sort_unstable();
            theirs.sort_unstable();
            assert_eq!(mine, theirs);
        }
    }
}

// =============================================================================
// VOLUME COVERAGE
// =============================================================================

#[test]
fn test_lattice_fills_its_convex_hull() {
    let mut points = Vec::new();
    for k in 0..4 {
        for j in 0..4 {
            for i in 0..4 {
                points.push(DVec3::new(i as f64, j as f64, k as f64));
            }
        }
    }
    let cell = SimulationCell::orthorhombic(DVec3::splat(3.0), [false; 3]);
    let tess = tessellate(&cell, &points, 1.0, false);
    assert_relative_eq!(finite_volume(&tess), 27.0, max_relative = 1e-6);
}

#[test]
fn test_owned_cells_tile_the_periodic_cell() {
    let cell = SimulationCell::cubic(1.0);
    let tess = tessellate(&cell, &random_points(300, 1.0, 4), 0.45, false);
    let owned: Vec<usize> = tess
        .cells()
        .filter(|&c| tess.is_valid_cell(c) && !tess.is_ghost_cell(c))
        .collect();
    let volume: f64 = owned.iter().map(|&c| tess.cell_volume(c)).sum();
    assert_relative_eq!(volume, 1.0, max_relative = 1e-6);

    // No cell is owned twice.
    let keys: HashSet<[usize; 4]> = owned.iter().map(|&c| tess.cell_point_key(c)).collect();
    assert_eq!(keys.len(), owned.len());
    for &c in &owned {
        assert!(!tess.is_ghost_vertex(tess.head_vertex(c)));
    }
}

#[test]
fn test_sheared_periodic_cell() {
    let matrix = glam::DMat3::from_cols(DVec3::new(2.0, 0.0, 0.0), DVec3::new(0.6, 2.0, 0.0), DVec3::new(0.3, 0.4, 2.0));
    let cell = SimulationCell::new(matrix, DVec3::new(-1.0, 0.5, 0.0), [true; 3]);
    let mut rng = StdRng::seed_from_u64(5);
    let points: Vec<DVec3> = (0..300)
        .map(|_| cell.to_absolute(DVec3::new(rng.gen(), rng.gen(), rng.gen())))
        .collect();
    let tess = tessellate(&cell, &points, 0.8, false);
    let volume: f64 = tess
        .cells()
        .filter(|&c| tess.is_valid_cell(c) && !tess.is_ghost_cell(c))
        .map(|c| tess.cell_volume(c))
        .sum();
    assert_relative_eq!(volume, cell.volume(), max_relative = 1e-6);
}

#[test]
fn test_cover_domain_adds_helper_cells() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(6.0), [true, true, false]);
    let points = random_points(80, 6.0, 6);
    let plain = tessellate(&cell, &points, 1.5, false);
    assert_eq!(plain.helper_vertex_count(), 0);

    let covered = tessellate(&cell, &points, 1.5, true);
    assert!(covered.helper_vertex_count() > 0);
    let helper_cells = covered
        .cells()
        .filter(|&c| covered.is_finite_cell(c) && !covered.is_valid_cell(c))
        .count();
    assert!(helper_cells > 0);
    for c in covered.cells().filter(|&c| covered.is_valid_cell(c)) {
        assert!((0..4).all(|i| covered.vertex_particle(covered.cell_vertex(c, i)).is_some()));
    }
}

// =============================================================================
// QUERIES
// =============================================================================

#[test]
fn test_alpha_test_uses_circumradius() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(2.0), [false; 3]);
    let tess = tessellate(&cell, &[DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z], 1.0, false);
    let finite: Vec<usize> = tess.cells().filter(|&c| tess.is_finite_cell(c)).collect();
    assert_eq!(finite.len(), 1);
    let c = finite[0];
    assert!(tess.is_valid_cell(c));
    assert!(!tess.is_ghost_cell(c));
    let (_, r2) = tess.circumsphere(c).unwrap();
    assert_relative_eq!(r2, 0.75, max_relative = 1e-6);
    assert!(tess.alpha_test(c, 0.76));
    assert!(!tess.alpha_test(c, 0.74));
    assert_relative_eq!(tess.cell_volume(c), 1.0 / 6.0, max_relative = 1e-6);

    let infinite = tess.cells().find(|&c| !tess.is_finite_cell(c)).unwrap();
    assert!(!tess.alpha_test(infinite, f64::MAX));
}

#[test]
fn test_locate_returns_containing_cell() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [false; 3]);
    let tess = tessellate(&cell, &random_points(120, 10.0, 7), 1.0, false);
    let mut rng = StdRng::seed_from_u64(8);
    let mut hint = None;
    for _ in 0..200 {
        let q = DVec3::new(rng.gen_range(-2.0..12.0), rng.gen_range(-2.0..12.0), rng.gen_range(-2.0..12.0));
        let c = tess.locate(q, hint).unwrap();
        for f in 0..4 {
            let [a, b, cc] = FACET_VERTICES[f].map(|k| tess.vertex_position(tess.cell_vertex(c, k)));
            assert!(orient(a, b, cc, q) >= 0.0);
        }
        hint = Some(c);
    }
    assert!(tess.locate(DVec3::NAN, None).is_none());
}

#[test]
fn test_user_fields() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(3.0), [false; 3]);
    let mut tess = tessellate(&cell, &random_points(20, 3.0, 9), 1.0, false);
    assert!(tess.cells().all(|c| tess.user_field(c) == 0));
    tess.set_user_field(1, 42);
    assert_eq!(tess.user_field(1), 42);
    tess.reset_user_fields(-1);
    assert!(tess.cells().all(|c| tess.user_field(c) == -1));
}

#[test]
fn test_selection_and_duplicates() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(4.0), [false; 3]);
    let mut points = random_points(30, 4.0, 10);
    points.push(points[0]);
    points.push(points[1]);
    let tess = tessellate(&cell, &points, 1.0, false);
    assert!(finite_volume(&tess) > 0.0);

    let selection: Vec<bool> = (0..points.len()).map(|i| i % 2 == 0).collect();
    let tess = DelaunayTessellation::generate(&cell, &points, 1.0, false, Some(&selection), &TaskToken::new())
        .unwrap()
        .unwrap();
    for v in 0..tess.vertex_count() {
        if let Some(i) = tess.vertex_particle(v) {
            assert!(selection[i]);
        }
    }
}

// =============================================================================
// ERRORS AND CANCELLATION
// =============================================================================

#[test]
fn test_too_few_points() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(4.0), [false; 3]);
    let task = TaskToken::new();
    let three = [DVec3::ZERO, DVec3::X, DVec3::Y];
    assert!(matches!(
        DelaunayTessellation::generate(&cell, &three, 1.0, false, None, &task),
        Err(DelaunayError::TooFewPoints { .. })
    ));
    let coplanar: Vec<DVec3> = (0..10).map(|i| DVec3::new(i as f64 * 0.3, (i * i) as f64 * 0.1, 0.0)).collect();
    assert!(matches!(
        DelaunayTessellation::generate(&cell, &coplanar, 1.0, false, None, &task),
        Err(DelaunayError::TooFewPoints { .. })
    ));
}

#[test]
fn test_degenerate_and_oversized() {
    let task = TaskToken::new();
    let points = random_points(10, 1.0, 11);
    let flat = SimulationCell::orthorhombic(DVec3::new(1.0, 1.0, 0.0), [true; 3]);
    assert!(matches!(
        DelaunayTessellation::generate(&flat, &points, 0.1, false, None, &task),
        Err(DelaunayError::DegenerateCell { .. })
    ));
    assert!(matches!(
        DelaunayTessellation::generate(&SimulationCell::cubic(1.0), &points, 1.5, false, None, &task),
        Err(DelaunayError::GhostLayerTooLarge { .. })
    ));
}

#[test]
fn test_canceled_generation() {
    let task = TaskToken::new();
    task.cancel();
    let result = DelaunayTessellation::generate(
        &SimulationCell::cubic(2.0),
        &random_points(50, 2.0, 12),
        0.5,
        false,
        None,
        &task,
    )
    .unwrap();
    assert!(result.is_none());
}
