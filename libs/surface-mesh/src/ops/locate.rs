//! # Point Location
//!
//! Determines which region contains a point and how far the point is from
//! the surface, using angle-weighted pseudonormals (Baerentzen & Aanaes,
//! IEEE TVCG 11, 2005). The closest surface feature (vertex, edge or face)
//! is found by brute force under the minimum image convention; the sign of
//! the feature's pseudonormal against the query vector decides the side.

use glam::DVec3;
use rayon::prelude::*;

use crate::mesh::{HalfEdgeId, RegionId, SurfaceMesh, VertexId};
use crate::task::TaskToken;

/// Result of a point-location query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLocation {
    /// Region containing the point (`None` if that region is unset).
    pub region: Option<RegionId>,
    /// Distance from the point to the surface.
    pub distance: f64,
    /// Nearest surface point (wrapped into the primary cell image).
    pub closest_point: DVec3,
    /// True if the point lies behind the closest feature, i.e. inside the
    /// region bounded by it.
    pub inside: bool,
}

struct ClosestFeature {
    distance_sq: f64,
    /// From the query point to the closest surface point.
    vector: DVec3,
    normal: DVec3,
    region: Option<RegionId>,
    vertex: Option<VertexId>,
}

fn closest_feature(mesh: &SurfaceMesh, location: DVec3, epsilon: f64) -> Option<ClosestFeature> {
    let cell = mesh.domain();
    let mut best = ClosestFeature {
        distance_sq: f64::MAX,
        vector: DVec3::ZERO,
        normal: DVec3::ZERO,
        region: mesh.space_filling_region(),
        vertex: None,
    };

    for v in mesh.vertices() {
        if mesh.first_vertex_edge(v).is_none() {
            continue;
        }
        let r = cell.wrap_vector(mesh.vertex_position(v) - location);
        let d = r.length_squared();
        if d < best.distance_sq {
            best.distance_sq = d;
            best.vertex = Some(v);
            best.vector = r;
        }
    }
    best.vertex?;

    for edge in mesh.edges() {
        let Some(opposite) = mesh.opposite_edge(edge) else {
            continue;
        };
        let p1 = mesh.vertex_position(mesh.vertex1(edge));
        let mut edge_dir = mesh.edge_vector(edge);
        let r = cell.wrap_vector(p1 - location);
        let length = edge_dir.length();
        if length <= f64::EPSILON {
            continue;
        }
        edge_dir /= length;
        let t = -edge_dir.dot(r);
        if t <= 0.0 || t >= length {
            continue;
        }
        let c = r + edge_dir * t;
        let d = c.length_squared();
        if d < best.distance_sq {
            let e1 = mesh.edge_vector(mesh.next_face_edge(edge));
            let e2 = mesh.edge_vector(mesh.next_face_edge(opposite));
            let pseudo_normal = edge_dir.cross(e1).normalize_or_zero() + (-edge_dir).cross(e2).normalize_or_zero();
            let face = mesh.edge_face(edge);
            if pseudo_normal.dot(c) > -epsilon || mesh.opposite_face(face).is_none() {
                best.distance_sq = d;
                best.vertex = None;
                best.vector = c;
                best.normal = pseudo_normal;
                best.region = mesh.face_region(face);
            }
        }
    }

    for face in mesh.faces() {
        let edge1 = mesh.first_face_edge(face);
        let edge2 = mesh.next_face_edge(edge1);
        let p1 = mesh.vertex_position(mesh.vertex1(edge1));
        let ev0 = mesh.edge_vector(edge1);
        let ev1 = mesh.edge_vector(edge2);
        let edge_vectors = [ev0, ev1, -ev0 - ev1];
        let r = cell.wrap_vector(p1 - location);
        let normal = ev0.cross(ev1);

        let mut vertex_vector = r;
        let mut inside_triangle = true;
        for ev in edge_vectors {
            if vertex_vector.dot(normal.cross(ev)) >= 0.0 {
                inside_triangle = false;
                break;
            }
            vertex_vector += ev;
        }
        if !inside_triangle {
            continue;
        }
        let length_sq = normal.length_squared();
        if length_sq <= f64::EPSILON {
            continue;
        }
        let normal = normal / length_sq.sqrt();
        let plane_distance = normal.dot(r);
        if (plane_distance > -epsilon || mesh.opposite_face(face).is_none())
            && plane_distance * plane_distance < best.distance_sq
        {
            best.distance_sq = plane_distance * plane_distance;
            best.vector = normal * plane_distance;
            best.vertex = None;
            best.normal = normal;
            best.region = mesh.face_region(face);
        }
    }

    if let Some(vertex) = best.vertex {
        resolve_vertex_normal(mesh, vertex, epsilon, &mut best);
    }
    Some(best)
}

/// Computes the angle-weighted pseudonormal of the closest vertex. A vertex
/// shared by several manifolds has one pseudonormal per fan; the first one
/// facing away from the query point wins.
fn resolve_vertex_normal(mesh: &SurfaceMesh, vertex: VertexId, epsilon: f64, best: &mut ClosestFeature) {
    let cell = mesh.domain();
    let center = mesh.vertex_position(vertex);
    let mut visited: Vec<HalfEdgeId> = Vec::new();
    for first in mesh.vertex_edges(vertex) {
        if visited.contains(&first) {
            continue;
        }
        let mut normal = DVec3::ZERO;
        let mut edge = first;
        let mut v1 = cell
            .wrap_vector(mesh.vertex_position(mesh.vertex2(edge)) - center)
            .normalize_or_zero();
        loop {
            visited.push(edge);
            let Some(opposite) = mesh.opposite_edge(edge) else {
                break;
            };
            let next = mesh.next_face_edge(opposite);
            let v2 = cell
                .wrap_vector(mesh.vertex_position(mesh.vertex2(next)) - center)
                .normalize_or_zero();
            let angle = v1.dot(v2).clamp(-1.0, 1.0).acos();
            let n = v2.cross(v1);
            if n != DVec3::ZERO {
                normal += n.normalize() * angle;
            }
            edge = next;
            v1 = v2;
            if edge == first || visited.contains(&edge) {
                break;
            }
        }
        best.normal = normal;
        best.region = mesh.face_region(mesh.edge_face(first));
        if normal.dot(best.vector) > -epsilon {
            break;
        }
    }
}

/// Determines the region containing `location` and its distance from the
/// surface.
///
/// Returns `None` if the point lies on the surface within `epsilon`, where
/// the side is undecidable. Points outside every region bounded by the
/// surface, as well as every point of a mesh without faces, belong to the
/// mesh's space-filling region.
pub fn locate_point(mesh: &SurfaceMesh, location: DVec3, epsilon: f64) -> Option<(Option<RegionId>, f64)> {
    let Some(best) = closest_feature(mesh, location, epsilon) else {
        return Some((mesh.space_filling_region(), f64::INFINITY));
    };
    let dot = best.normal.dot(best.vector);
    let distance = best.distance_sq.sqrt();
    if dot >= epsilon {
        Some((best.region, distance))
    } else if dot <= -epsilon {
        Some((mesh.space_filling_region(), distance))
    } else {
        None
    }
}

/// Finds the nearest surface point and the signed distance to it
/// (negative behind the surface, positive in front). Returns `None` for a
/// mesh without faces.
pub fn closest_point(mesh: &SurfaceMesh, location: DVec3, epsilon: f64) -> Option<PointLocation> {
    let best = closest_feature(mesh, location, epsilon)?;
    let dot = best.normal.dot(best.vector);
    let inside = dot >= epsilon;
    let distance = best.distance_sq.sqrt();
    Some(PointLocation {
        region: if inside { best.region } else { mesh.space_filling_region() },
        distance: if inside { -distance } else { distance },
        closest_point: mesh.domain().wrap_point(location + best.vector),
        inside,
    })
}

/// Signed surface distance of every query point (in parallel).
///
/// Returns `None` if the task is canceled. Points are `+inf` away from a
/// mesh without faces.
pub fn surface_distances(mesh: &SurfaceMesh, points: &[DVec3], epsilon: f64, task: &TaskToken) -> Option<Vec<f64>> {
    task.set_progress_maximum(points.len() as u64);
    let distances: Vec<f64> = points
        .par_iter()
        .map(|&p| {
            if task.is_canceled() {
                return f64::NAN;
            }
            closest_point(mesh, p, epsilon).map_or(f64::INFINITY, |loc| loc.distance)
        })
        .collect();
    if !task.set_progress_value(points.len() as u64) {
        return None;
    }
    Some(distances)
}
