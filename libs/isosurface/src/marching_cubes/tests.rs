//! Tests for the marching-cubes engine.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use surface_mesh::ops::{total_surface_area, total_volume};
use surface_mesh::{SurfaceMesh, TaskToken};

use super::*;
use crate::field::VoxelField;

// =============================================================================
// HELPERS
// =============================================================================

fn grid_data(shape: [usize; 3], f: impl Fn(usize, usize, usize) -> f64) -> Vec<f64> {
    let mut data = Vec::with_capacity(shape[0] * shape[1] * shape[2]);
    for k in 0..shape[2] {
        for j in 0..shape[1] {
            for i in 0..shape[0] {
                data.push(f(i, j, k));
            }
        }
    }
    data
}

fn extract(data: &[f64], shape: [usize; 3], pbc: [bool; 3], isolevel: f64, lower_is_solid: bool) -> SurfaceMesh {
    let field = VoxelField::new(data, shape, pbc).unwrap();
    MarchingCubes::new(&field, isolevel)
        .lower_is_solid(lower_is_solid)
        .generate(&TaskToken::new())
        .unwrap()
        .unwrap()
}

fn euler_characteristic(mesh: &SurfaceMesh) -> i64 {
    mesh.vertex_count() as i64 - (mesh.edge_count() / 2) as i64 + mesh.face_count() as i64
}

/// Signed distance to a sphere of radius `radius` centered in a periodic
/// unit cube sampled with `n` nodes per axis.
fn periodic_sphere(n: usize, center: DVec3, radius: f64) -> Vec<f64> {
    let h = 1.0 / n as f64;
    grid_data([n; 3], |i, j, k| {
        let mut d = DVec3::new(i as f64 * h, j as f64 * h, k as f64 * h) - center;
        d -= d.round();
        d.length() - radius
    })
}

// =============================================================================
// ACCURACY
// =============================================================================

#[test]
fn test_sphere_area_and_volume() {
    let n = 32;
    let radius = 1.0;
    let h = 3.0 * radius / (n - 1) as f64;
    let data = grid_data([n; 3], |i, j, k| {
        let p = DVec3::new(i as f64, j as f64, k as f64) * h - DVec3::splat(1.5 * radius);
        p.length() - radius
    });
    let mut mesh = extract(&data, [n; 3], [false; 3], 0.0, true);
    assert!(mesh.connect_opposite_halfedges());

    let area = total_surface_area(&mesh) * h * h;
    let volume = total_volume(&mesh) * h * h * h;
    let exact_area = 4.0 * PI * radius * radius;
    let exact_volume = 4.0 / 3.0 * PI * radius.powi(3);
    assert!((area - exact_area).abs() / exact_area < 0.02, "area {area}");
    assert!((volume - exact_volume).abs() / exact_volume < 0.02, "volume {volume}");
    assert_eq!(euler_characteristic(&mesh), 2);
}

#[test]
fn test_normals_point_away_from_solid() {
    let n = 12;
    let center = DVec3::splat(5.5);
    let distance = grid_data([n; 3], |i, j, k| DVec3::new(i as f64, j as f64, k as f64).distance(center));

    // Solid inside: lower values are solid.
    let mut inside = extract(&distance, [n; 3], [false; 3], 4.0, true);
    assert!(inside.connect_opposite_halfedges());
    assert!(total_volume(&inside) > 0.0);

    // Same ball, expressed as "higher is solid".
    let negated: Vec<f64> = distance.iter().map(|d| -d).collect();
    let mut above = extract(&negated, [n; 3], [false; 3], -4.0, false);
    assert!(above.connect_opposite_halfedges());
    assert_eq!(above.face_count(), inside.face_count());
    assert_relative_eq!(total_volume(&above), total_volume(&inside), max_relative = 1e-12);
}

// =============================================================================
// CLOSURE
// =============================================================================

#[test]
fn test_random_fields_are_closed() {
    let n = 6;
    for seed in 0..12 {
        let mut rng = StdRng::seed_from_u64(seed);
        let data: Vec<f64> = (0..n * n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        for pbc in [[false; 3], [true; 3], [true, false, true]] {
            for lower_is_solid in [false, true] {
                let mut mesh = extract(&data, [n; 3], pbc, 0.0, lower_is_solid);
                assert!(
                    mesh.connect_opposite_halfedges(),
                    "seed {seed} pbc {pbc:?} lower_is_solid {lower_is_solid}: {} open half-edges",
                    mesh.unmatched_edge_count()
                );
            }
        }
    }
}

#[test]
fn test_ties_count_as_below() {
    let data = grid_data([4; 3], |i, _, _| if i < 2 { 0.0 } else { 1.0 });
    let mut mesh = extract(&data, [4; 3], [false; 3], 0.0, false);
    assert!(mesh.connect_opposite_halfedges());
    // Nodes at exactly the isolevel are empty, so the slab x >= 2 is the solid.
    let x_min = mesh.positions().iter().map(|p| p.x).fold(f64::MAX, f64::min);
    assert_relative_eq!(x_min, 1.0);
}

#[test]
fn test_empty_and_full_fields() {
    let zeros = vec![0.0; 27];
    let mesh = extract(&zeros, [3; 3], [true; 3], 1.0, false);
    assert_eq!(mesh.face_count(), 0);

    // A fully solid periodic field has no boundary at all.
    let mesh = extract(&zeros, [3; 3], [true; 3], -1.0, false);
    assert_eq!(mesh.face_count(), 0);

    // A fully solid bounded field is capped by the halo.
    let mut mesh = extract(&zeros, [3; 3], [false; 3], -1.0, false);
    assert!(mesh.face_count() > 0);
    assert!(mesh.connect_opposite_halfedges());
    assert_eq!(euler_characteristic(&mesh), 2);
}

// =============================================================================
// DISAMBIGUATION
// =============================================================================

#[test]
fn test_interior_tunnel_joins_diagonal_corners() {
    // Corners 0 and 7 of a single cube are solid. With weakly negative
    // neighbors the trilinear interpolant joins them through the center.
    let corners = |others: f64| {
        grid_data([2; 3], |i, j, k| if (i, j, k) == (0, 0, 0) || (i, j, k) == (1, 1, 1) { 1.0 } else { others })
    };

    let mut joined = extract(&corners(-0.2), [2; 3], [false; 3], 0.0, false);
    assert!(joined.connect_opposite_halfedges());
    assert_eq!(euler_characteristic(&joined), 2);

    let mut separate = extract(&corners(-0.8), [2; 3], [false; 3], 0.0, false);
    assert!(separate.connect_opposite_halfedges());
    assert_eq!(euler_characteristic(&separate), 4);
}

/// A closed 2x2x2 grid whose single inner cube carries `corners`.
fn single_cube(corners: [f64; 8]) -> SurfaceMesh {
    let data = grid_data([2; 3], |i, j, k| corners[i + 2 * j + 4 * k]);
    extract(&data, [2; 3], [false; 3], 0.0, false)
}

#[test]
fn test_thin_interior_tunnel_is_resolved_exactly() {
    // The tunnel between corners 0 and 7 is far thinner than a cube
    // eighth and misses every node of a 9^3 lattice.
    let joined = [1.0, -0.292, -0.292, -0.292, -0.292, -0.292, -0.292, 0.8];
    let components = interior_components(&joined);
    assert!(components[0].is_some());
    assert_eq!(components[0], components[7]);
    let mut mesh = single_cube(joined);
    assert!(mesh.connect_opposite_halfedges());
    assert_eq!(euler_characteristic(&mesh), 2);

    let separate = [1.0, -0.3, -0.3, -0.3, -0.3, -0.3, -0.3, 0.8];
    let components = interior_components(&separate);
    assert_ne!(components[0], components[7]);
    let mut mesh = single_cube(separate);
    assert!(mesh.connect_opposite_halfedges());
    assert_eq!(euler_characteristic(&mesh), 4);
}

#[test]
fn test_interior_components_match_dense_sampling() {
    let trilinear = |s: &[f64; 8], p: [f64; 3]| {
        (0..8)
            .map(|c| {
                let w = |axis: usize| if (c >> axis) & 1 == 1 { p[axis] } else { 1.0 - p[axis] };
                s[c] * w(0) * w(1) * w(2)
            })
            .sum::<f64>()
    };
    let r = 32usize;
    let side = r + 1;
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..24 {
        let s: [f64; 8] = std::array::from_fn(|_| rng.gen_range(-1.0..1.0));
        let inside: Vec<bool> = (0..side * side * side)
            .map(|idx| {
                let p = [idx % side, idx / side % side, idx / (side * side)].map(|x| x as f64 / r as f64);
                trilinear(&s, p) > 0.0
            })
            .collect();
        let mut label = vec![usize::MAX; inside.len()];
        for seed in 0..inside.len() {
            if !inside[seed] || label[seed] != usize::MAX {
                continue;
            }
            label[seed] = seed;
            let mut stack = vec![seed];
            while let Some(idx) = stack.pop() {
                let p = [idx % side, idx / side % side, idx / (side * side)];
                for dim in 0..3 {
                    for step in [-1i64, 1] {
                        let x = p[dim] as i64 + step;
                        if x < 0 || x > r as i64 {
                            continue;
                        }
                        let mut q = p;
                        q[dim] = x as usize;
                        let n = q[0] + side * (q[1] + side * q[2]);
                        if inside[n] && label[n] == usize::MAX {
                            label[n] = seed;
                            stack.push(n);
                        }
                    }
                }
            }
        }
        let corner_label = |c: usize| {
            let p = corner_offset(c).map(|x| x as usize * r);
            label[p[0] + side * (p[1] + side * p[2])]
        };

        let components = interior_components(&s);
        for a in 0..8 {
            assert_eq!(components[a].is_some(), s[a] > 0.0);
            for b in 0..8 {
                if s[a] > 0.0 && s[b] > 0.0 {
                    assert_eq!(components[a] == components[b], corner_label(a) == corner_label(b), "{s:?}");
                }
            }
        }
    }
}

#[test]
fn test_case_seven_interior_decides_tunnel() {
    // Corners 1, 2 and 4 are solid and every ambiguous face joins them, so
    // the solid forms a band around corner 0 on the cube boundary.
    let tunnel = [-2.0, 0.5, 4.0, -0.25, 1.0, -0.1, -1.0, -1.0];
    let band = [-0.1, 0.2, 1.0, -1.0, 0.5, -0.2, -0.2, -0.1];
    for corners in [tunnel, band] {
        let pattern = (0..8).filter(|&c| corners[c] > 0.0).fold(0u8, |p, c| p | 1 << c);
        assert_eq!(pattern, 0b0001_0110);
        assert_eq!(crate::tables::case_of(pattern), 7);
    }

    // Empty corner 0 reaches the other empty corners through the interior:
    // the band closes into a ring.
    let mut ring = single_cube(tunnel);
    assert!(ring.connect_opposite_halfedges());
    assert_eq!(euler_characteristic(&ring), 0);

    let mut disk = single_cube(band);
    assert!(disk.connect_opposite_halfedges());
    assert_eq!(euler_characteristic(&disk), 2);
}

#[test]
fn test_three_contours_with_one_tunnel() {
    // Case 13 with three contour loops: two bound the same solid and
    // empty components and are joined, the third stays a disk.
    let corners = [0.414, -0.325, -0.177, 0.208, -0.775, 0.727, 0.057, -0.427];
    let pattern = (0..8).filter(|&c| corners[c] > 0.0).fold(0u8, |p, c| p | 1 << c);
    assert_eq!(crate::tables::case_of(pattern), 13);

    let mut mesh = single_cube(corners);
    assert!(mesh.connect_opposite_halfedges());
    // A torus around corners 0, 3 and 5 plus a sphere around corner 6.
    assert_eq!(euler_characteristic(&mesh), 2);
}

#[test]
fn test_every_corner_pattern_is_closed() {
    let mut rng = StdRng::seed_from_u64(3);
    for pattern in 1..255u16 {
        for _ in 0..4 {
            let corners: [f64; 8] = std::array::from_fn(|c| {
                let magnitude = rng.gen_range(0.05..1.0);
                if (pattern >> c) & 1 == 1 {
                    magnitude
                } else {
                    -magnitude
                }
            });
            let mut mesh = single_cube(corners);
            assert!(mesh.connect_opposite_halfedges(), "pattern {pattern:#010b} {corners:?}");
        }
    }
}

#[test]
fn test_hub_closes_around_three_loops() {
    let data = vec![0.0; 8];
    let field = VoxelField::new(&data, [2; 3], [false; 3]).unwrap();
    let params = MarchingCubes::new(&field, 0.0);
    let mut extraction = Extraction::new(&params, [2; 3], [false; 3]);
    let center = DVec3::splat(0.5);

    let mut rings = Vec::new();
    for axis in 0..3 {
        let (u, v) = (DVec3::AXES[(axis + 1) % 3], DVec3::AXES[(axis + 2) % 3]);
        let ring: Vec<usize> = (0..4)
            .map(|q| {
                let angle = q as f64 * PI / 2.0;
                let p = center + 0.45 * DVec3::AXES[axis] + 0.1 * (angle.cos() * u + angle.sin() * v);
                extraction.push_node(p)
            })
            .collect();
        rings.push(ring);
    }
    extraction.hub(&rings, center);

    let vertex = |node: usize| extraction.nodes[node].vertex;
    let mut directed = std::collections::HashMap::new();
    for t in &extraction.triangles {
        for q in 0..3 {
            *directed.entry((t[q], t[(q + 1) % 3])).or_insert(0) += 1;
        }
    }
    let mut boundary = std::collections::HashSet::new();
    for ring in &rings {
        for q in 0..ring.len() {
            boundary.insert((vertex(ring[q]), vertex(ring[(q + 1) % ring.len()])));
        }
    }
    for (&(a, b), &count) in &directed {
        assert_eq!(count, 1, "edge {a}-{b} used twice");
        if boundary.contains(&(a, b)) {
            assert!(!directed.contains_key(&(b, a)));
        } else {
            assert_eq!(directed.get(&(b, a)), Some(&1), "edge {a}-{b} unmatched");
        }
    }
    for edge in &boundary {
        assert_eq!(directed.get(edge), Some(&1));
    }
}

#[test]
fn test_complemented_field_gives_same_surface() {
    let n = 7;
    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<f64> = (0..n * n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let negated: Vec<f64> = data.iter().map(|v| -v).collect();
    let a = extract(&data, [n; 3], [true; 3], 0.1, false);
    let b = extract(&negated, [n; 3], [true; 3], -0.1, true);
    assert_eq!(a.vertex_count(), b.vertex_count());
    assert_eq!(a.face_count(), b.face_count());
    assert_relative_eq!(total_surface_area(&a), total_surface_area(&b), max_relative = 1e-12);
}

// =============================================================================
// PERIODIC DOMAINS
// =============================================================================

#[test]
fn test_periodic_sphere_across_seam_is_closed() {
    let n = 24;
    let data = periodic_sphere(n, DVec3::ZERO, 0.3);
    let mut mesh = extract(&data, [n; 3], [true; 3], 0.0, true);
    assert!(mesh.connect_opposite_halfedges());
    assert_eq!(euler_characteristic(&mesh), 2);
    for p in mesh.positions() {
        for dim in 0..3 {
            assert!(p[dim] >= 0.0 && p[dim] < n as f64);
        }
    }
    let h = 1.0 / n as f64;
    let volume = total_volume(&mesh) * h * h * h;
    let exact = 4.0 / 3.0 * PI * 0.3f64.powi(3);
    assert!((volume - exact).abs() / exact < 0.02, "volume {volume}");
}

#[test]
fn test_periodic_translation_invariance() {
    let n = 20;
    let data = periodic_sphere(n, DVec3::new(0.1, 0.45, 0.8), 0.27);
    let shift = [5usize, 11, 17];
    let rolled = grid_data([n; 3], |i, j, k| {
        let (si, sj, sk) = ((i + n - shift[0]) % n, (j + n - shift[1]) % n, (k + n - shift[2]) % n);
        data[si + n * (sj + n * sk)]
    });
    let a = extract(&data, [n; 3], [true; 3], 0.0, true);
    let b = extract(&rolled, [n; 3], [true; 3], 0.0, true);
    assert_eq!(a.vertex_count(), b.vertex_count());
    assert_eq!(a.face_count(), b.face_count());
    assert_relative_eq!(total_surface_area(&a), total_surface_area(&b), max_relative = 1e-6);

    // Sub-voxel translations change the sampling but not the area much.
    let c = extract(&periodic_sphere(n, DVec3::new(0.13, 0.41, 0.77), 0.27), [n; 3], [true; 3], 0.0, true);
    assert_relative_eq!(total_surface_area(&a), total_surface_area(&c), max_relative = 0.03);
}

#[test]
fn test_domain_matches_grid() {
    let data = vec![0.0; 4 * 5 * 6];
    let mesh = extract(&data, [4, 5, 6], [true, false, true], 1.0, false);
    let cell = mesh.domain();
    assert_eq!(cell.pbc(), [true, false, true]);
    assert_relative_eq!(cell.cell_vector(0).x, 4.0);
    assert_relative_eq!(cell.cell_vector(1).y, 4.0);
    assert_relative_eq!(cell.cell_vector(2).z, 6.0);
    assert_eq!(mesh.region_count(), 1);
}

// =============================================================================
// OPTIONS, CANCELLATION AND ERRORS
// =============================================================================

#[test]
fn test_infinite_domain_leaves_surface_open() {
    let n = 6;
    let data = grid_data([n; 3], |_, _, k| k as f64);
    let field = VoxelField::new(&data, [n; 3], [false; 3]).unwrap();

    let mut capped = MarchingCubes::new(&field, 2.5).generate(&TaskToken::new()).unwrap().unwrap();
    assert!(capped.connect_opposite_halfedges());

    let mut open = MarchingCubes::new(&field, 2.5)
        .infinite_domain(true)
        .generate(&TaskToken::new())
        .unwrap()
        .unwrap();
    assert!(open.face_count() > 0);
    assert!(!open.connect_opposite_halfedges());
    // Only the plane z = 2.5 remains.
    for p in open.positions() {
        assert_relative_eq!(p.z, 2.5);
    }
}

#[test]
fn test_canceled_run_returns_none() {
    let data = vec![0.0; 64];
    let field = VoxelField::new(&data, [4; 3], [false; 3]).unwrap();
    let task = TaskToken::new();
    task.cancel();
    assert!(MarchingCubes::new(&field, -1.0).generate(&task).unwrap().is_none());
}

#[test]
fn test_invalid_inputs() {
    let data = vec![0.0; 4];
    let field = VoxelField::new(&data, [4, 1, 1], [false; 3]).unwrap();
    assert!(matches!(
        MarchingCubes::new(&field, 0.5).generate(&TaskToken::new()),
        Err(IsosurfaceError::InvalidGrid { .. })
    ));

    let data = vec![0.0; 8];
    let field = VoxelField::new(&data, [2; 3], [false; 3]).unwrap();
    assert!(matches!(
        MarchingCubes::new(&field, f64::NAN).generate(&TaskToken::new()),
        Err(IsosurfaceError::InvalidParameter { .. })
    ));
}
