//! # Ghost Layer
//!
//! Builds the vertex set fed into the tessellation: the selected points
//! mapped into the primary cell, optional helper points on the planes
//! bounding the data along non-periodic axes, and periodic images of both
//! within the ghost layer around the primary cell.
//!
//! Each vertex receives a small deterministic offset derived from its point
//! index, identical for all periodic images of that point.

use std::collections::HashSet;

use config::constants::{COVER_DOMAIN_SPACING_FACTOR, DELAUNAY_JITTER};
use glam::DVec3;
use surface_mesh::SimulationCell;

use crate::error::DelaunayError;
use crate::predicates::orient;

/// What a tessellation vertex stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// Corner of the enclosing super-tetrahedron.
    Infinite,
    /// An input point, by index into the caller's position array.
    Particle(usize),
    /// A helper point covering a non-periodic direction.
    Helper(usize),
}

/// A vertex of the tessellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position as inserted, including the deterministic offset.
    pub position: DVec3,
    /// What the vertex stands for.
    pub kind: VertexKind,
    /// True for periodic images outside the primary cell.
    pub ghost: bool,
}

/// Primary and ghost vertices, in insertion-independent order: all primary
/// points first, followed by their images.
#[derive(Debug, Default)]
pub(crate) struct PointSet {
    pub vertices: Vec<Vertex>,
    pub primary_count: usize,
    pub helper_count: usize,
}

/// Collects the vertices of a tessellation of `positions` in `cell`.
pub(crate) fn build_point_set(
    cell: &SimulationCell,
    positions: &[DVec3],
    selection: Option<&[bool]>,
    ghost_layer_size: f64,
    cover_domain: bool,
) -> Result<PointSet, DelaunayError> {
    if !ghost_layer_size.is_finite() || ghost_layer_size < 0.0 {
        return Err(DelaunayError::invalid_parameter(format!(
            "ghost layer size must be a non-negative number, got {ghost_layer_size}"
        )));
    }
    if let Some(selection) = selection {
        if selection.len() != positions.len() {
            return Err(DelaunayError::invalid_parameter(format!(
                "selection has {} entries for {} points",
                selection.len(),
                positions.len()
            )));
        }
    }
    if cell.is_degenerate() {
        return Err(DelaunayError::degenerate_cell("simulation cell has zero volume"));
    }

    // Ghost layer thickness in reduced units per axis.
    let mut reduced_ghost = [0.0; 3];
    for dim in 0..3 {
        let height = cell.cell_height(dim);
        reduced_ghost[dim] = ghost_layer_size / height;
        if cell.has_pbc(dim) && reduced_ghost[dim] > 1.0 {
            return Err(DelaunayError::GhostLayerTooLarge {
                dim,
                ghost_layer_size,
                cell_height: height,
            });
        }
    }

    let mut set = PointSet::default();
    let mut reduced = Vec::new();
    for (index, &p) in positions.iter().enumerate() {
        if selection.is_some_and(|s| !s[index]) {
            continue;
        }
        if !p.is_finite() {
            return Err(DelaunayError::invalid_parameter(format!("point {index} is not finite")));
        }
        let p = cell.wrap_point(p);
        reduced.push(cell.to_reduced(p));
        set.vertices.push(Vertex {
            position: p,
            kind: VertexKind::Particle(index),
            ghost: false,
        });
    }

    if cover_domain && !reduced.is_empty() && ghost_layer_size > 0.0 {
        for (h, r) in cover_points(cell, &reduced, reduced_ghost, ghost_layer_size).into_iter().enumerate() {
            reduced.push(r);
            set.vertices.push(Vertex {
                position: cell.to_absolute(r),
                kind: VertexKind::Helper(h),
                ghost: false,
            });
            set.helper_count += 1;
        }
    }
    set.primary_count = set.vertices.len();

    // Periodic images within the ghost layer.
    let periodic: Vec<usize> = (0..3).filter(|&d| cell.has_pbc(d)).collect();
    if !periodic.is_empty() && ghost_layer_size > 0.0 {
        let mut shifts = Vec::new();
        for sx in -1i32..=1 {
            for sy in -1i32..=1 {
                for sz in -1i32..=1 {
                    let s = [sx, sy, sz];
                    let allowed = (0..3).all(|d| s[d] == 0 || cell.has_pbc(d));
                    if allowed && s != [0, 0, 0] {
                        shifts.push(DVec3::new(sx as f64, sy as f64, sz as f64));
                    }
                }
            }
        }
        for primary in 0..set.primary_count {
            let r = reduced[primary];
            for &shift in &shifts {
                let image = r + shift;
                let inside = periodic
                    .iter()
                    .all(|&d| image[d] >= -reduced_ghost[d] && image[d] < 1.0 + reduced_ghost[d]);
                if inside {
                    let source = set.vertices[primary];
                    set.vertices.push(Vertex {
                        position: source.position + cell.matrix() * shift,
                        kind: source.kind,
                        ghost: true,
                    });
                }
            }
        }
    }

    let unperturbed: Vec<DVec3> = set.vertices.iter().map(|v| v.position).collect();
    if !spans_volume(&unperturbed) {
        return Err(DelaunayError::too_few_points(format!(
            "{} points do not contain four non-coplanar points",
            unperturbed.len()
        )));
    }

    apply_jitter(&mut set.vertices, positions.len());
    Ok(set)
}

/// True if the points contain four that are not exactly coplanar.
fn spans_volume(points: &[DVec3]) -> bool {
    let Some(&p0) = points.first() else {
        return false;
    };
    let Some(&p1) = points.iter().find(|&&p| p != p0) else {
        return false;
    };
    let axis = p1 - p0;
    let Some(&p2) = points
        .iter()
        .max_by(|a, b| {
            let area = |p: &DVec3| axis.cross(*p - p0).length_squared();
            area(a).total_cmp(&area(b))
        })
    else {
        return false;
    };
    points.iter().any(|&p| orient(p0, p1, p2, p) != 0.0)
}

/// Range covered by the helper planes along a non-periodic axis: the cell
/// faces, widened by the ghost layer only where the data extends past them.
fn cover_bounds(lo: f64, hi: f64, reduced_ghost: f64) -> (f64, f64) {
    let a = if lo < 0.0 { lo - reduced_ghost } else { 0.0 };
    let b = if hi > 1.0 { hi + reduced_ghost } else { 1.0 };
    (a, b)
}

/// Helper points in reduced coordinates on the two planes bounding every
/// non-periodic axis. For data inside the cell the helpers span exactly the
/// cell, so the tessellated volume equals the cell volume.
fn cover_points(cell: &SimulationCell, reduced: &[DVec3], reduced_ghost: [f64; 3], ghost_layer_size: f64) -> Vec<DVec3> {
    let spacing = COVER_DOMAIN_SPACING_FACTOR * ghost_layer_size;
    let lo = reduced.iter().fold(DVec3::INFINITY, |acc, r| acc.min(*r));
    let hi = reduced.iter().fold(DVec3::NEG_INFINITY, |acc, r| acc.max(*r));
    let bounds = [0, 1, 2].map(|dim| cover_bounds(lo[dim], hi[dim], reduced_ghost[dim]));

    let samples = |dim: usize| -> Vec<f64> {
        let height = cell.cell_height(dim);
        if cell.has_pbc(dim) {
            let count = ((height / spacing).ceil() as usize).max(1);
            (0..count).map(|k| k as f64 / count as f64).collect()
        } else {
            let (a, b) = bounds[dim];
            let count = (((b - a) * height / spacing).ceil() as usize).max(1);
            (0..=count)
                .map(|k| if k == count { b } else { a + (b - a) * k as f64 / count as f64 })
                .collect()
        }
    };

    let mut seen = HashSet::new();
    let mut points = Vec::new();
    for dim in (0..3).filter(|&d| !cell.has_pbc(d)) {
        let (u, v) = ((dim + 1) % 3, (dim + 2) % 3);
        let (su, sv) = (samples(u), samples(v));
        let (a, b) = bounds[dim];
        for plane in [a, b] {
            for &x in &su {
                for &y in &sv {
                    let mut r = DVec3::ZERO;
                    r[dim] = plane;
                    r[u] = x;
                    r[v] = y;
                    if seen.insert([r.x.to_bits(), r.y.to_bits(), r.z.to_bits()]) {
                        points.push(r);
                    }
                }
            }
        }
    }
    points
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Offset in `[-1, 1)^3` derived from a point key.
fn jitter_direction(key: u64) -> DVec3 {
    let mut state = key;
    let mut unit = || (splitmix64(&mut state) >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0;
    DVec3::new(unit(), unit(), unit())
}

fn apply_jitter(vertices: &mut [Vertex], particle_count: usize) {
    let lo = vertices.iter().fold(DVec3::INFINITY, |acc, v| acc.min(v.position));
    let hi = vertices.iter().fold(DVec3::NEG_INFINITY, |acc, v| acc.max(v.position));
    let extent = (hi - lo).length();
    let amplitude = DELAUNAY_JITTER * if extent > 0.0 && extent.is_finite() { extent } else { 1.0 };
    for vertex in vertices {
        let key = match vertex.kind {
            VertexKind::Particle(i) => i as u64,
            VertexKind::Helper(h) => (particle_count + h) as u64,
            VertexKind::Infinite => continue,
        };
        vertex.position += amplitude * jitter_direction(key);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn images_of(set: &PointSet, particle: usize) -> Vec<Vertex> {
        set.vertices
            .iter()
            .copied()
            .filter(|v| v.kind == VertexKind::Particle(particle))
            .collect()
    }

    #[test]
    fn test_corner_point_has_seven_images() {
        let cell = SimulationCell::cubic(10.0);
        let positions = [DVec3::splat(0.5), DVec3::splat(5.0)];
        let set = build_point_set(&cell, &positions, None, 1.0, false).unwrap();
        assert_eq!(set.primary_count, 2);
        assert_eq!(images_of(&set, 0).len(), 8);
        assert_eq!(images_of(&set, 1).len(), 1);
        assert_eq!(images_of(&set, 0).iter().filter(|v| v.ghost).count(), 7);
    }

    #[test]
    fn test_points_are_wrapped_into_the_cell() {
        let cell = SimulationCell::orthorhombic(DVec3::splat(4.0), [true, true, false]);
        let positions = [
            DVec3::new(-1.0, 5.0, 7.0),
            DVec3::new(1.5, 1.5, 0.5),
            DVec3::new(2.5, 1.5, 0.5),
            DVec3::new(1.5, 2.5, 0.5),
        ];
        let set = build_point_set(&cell, &positions, None, 0.5, false).unwrap();
        let primary = set.vertices[0].position;
        assert!(primary.abs_diff_eq(DVec3::new(3.0, 1.0, 7.0), 1e-6));
    }

    #[test]
    fn test_jitter_is_identical_for_images() {
        let cell = SimulationCell::cubic(3.0);
        let set = build_point_set(&cell, &[DVec3::splat(0.1)], None, 0.5, false).unwrap();
        let primary = set.vertices[0].position;
        assert!(primary != DVec3::splat(0.1));
        assert!(primary.distance(DVec3::splat(0.1)) < 1e-7);
        for image in images_of(&set, 0) {
            let shift = (image.position - primary) / 3.0;
            assert!(shift.abs_diff_eq(shift.round(), 1e-9), "{shift}");
        }
    }

    #[test]
    fn test_selection_filters_points() {
        let cell = SimulationCell::orthorhombic(DVec3::splat(5.0), [false; 3]);
        let positions = [
            DVec3::ONE,
            DVec3::splat(2.0),
            DVec3::new(3.0, 1.0, 1.0),
            DVec3::new(1.0, 3.0, 1.0),
            DVec3::new(1.0, 1.0, 3.0),
        ];
        let selection = [true, false, true, true, true];
        let set = build_point_set(&cell, &positions, Some(&selection[..]), 1.0, false).unwrap();
        let kinds: Vec<_> = set.vertices.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VertexKind::Particle(0),
                VertexKind::Particle(2),
                VertexKind::Particle(3),
                VertexKind::Particle(4)
            ]
        );
    }

    #[test]
    fn test_cover_points_only_on_open_axes() {
        let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [true, true, false]);
        let positions = [DVec3::new(5.0, 5.0, 4.0), DVec3::new(2.0, 3.0, 6.0)];
        let set = build_point_set(&cell, &positions, None, 2.0, true).unwrap();
        assert_eq!(set.helper_count, 2 * 5 * 5);
        let helpers: Vec<_> = set.vertices[..set.primary_count]
            .iter()
            .filter(|v| matches!(v.kind, VertexKind::Helper(_)))
            .collect();
        assert_eq!(helpers.len(), set.helper_count);
        // Data inside the cell: the helpers sit on the cell faces.
        for h in helpers {
            let z = h.position.z;
            assert!(z.abs() < 1e-6 || (z - 10.0).abs() < 1e-6, "{z}");
        }
    }

    #[test]
    fn test_cover_bounds_follow_data_outside_cell() {
        assert_eq!(cover_bounds(0.2, 0.8, 0.1), (0.0, 1.0));
        assert_eq!(cover_bounds(0.0, 1.0, 0.1), (0.0, 1.0));
        let (a, b) = cover_bounds(-0.5, 0.5, 0.1);
        assert_relative_eq!(a, -0.6);
        assert_eq!(b, 1.0);
        let (a, b) = cover_bounds(0.5, 1.25, 0.1);
        assert_eq!(a, 0.0);
        assert_relative_eq!(b, 1.35);
    }

    #[test]
    fn test_flat_input_is_rejected() {
        let cell = SimulationCell::orthorhombic(DVec3::splat(5.0), [false; 3]);
        let flat: Vec<DVec3> = (0..6).map(|i| DVec3::new(i as f64 * 0.5, (i % 3) as f64, 1.0)).collect();
        assert!(matches!(
            build_point_set(&cell, &flat, None, 1.0, false),
            Err(DelaunayError::TooFewPoints { .. })
        ));
        // Helper planes lift flat data into a volume.
        assert!(build_point_set(&cell, &flat, None, 1.0, true).is_ok());
        assert!(!spans_volume(&[DVec3::ZERO, DVec3::X, DVec3::X * 2.0, DVec3::X * 3.0]));
        assert!(spans_volume(&[DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z]));
    }

    #[test]
    fn test_ghost_layer_limits() {
        let cell = SimulationCell::orthorhombic(DVec3::new(10.0, 10.0, 2.0), [true; 3]);
        let err = build_point_set(&cell, &[DVec3::ONE], None, 3.0, false).unwrap_err();
        assert!(matches!(err, DelaunayError::GhostLayerTooLarge { dim: 2, .. }));
        if let DelaunayError::GhostLayerTooLarge { cell_height, .. } = err {
            assert_relative_eq!(cell_height, 2.0);
        }

        let open = SimulationCell::orthorhombic(DVec3::new(10.0, 10.0, 2.0), [true, true, false]);
        assert!(build_point_set(&open, &[DVec3::ONE], None, 3.0, true).is_ok());

        assert!(matches!(
            build_point_set(&cell, &[DVec3::ONE], None, -1.0, false),
            Err(DelaunayError::InvalidParameter { .. })
        ));
        assert!(matches!(
            build_point_set(&cell, &[DVec3::ONE], Some(&[][..]), 1.0, false),
            Err(DelaunayError::InvalidParameter { .. })
        ));
    }
}
