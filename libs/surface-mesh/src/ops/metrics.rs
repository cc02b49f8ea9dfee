//! # Surface Metrics
//!
//! Face areas, total area and enclosed volumes.
//!
//! Volumes use the divergence theorem. On periodic domains the vertex
//! positions are first unwrapped per connected surface component by a
//! breadth-first walk over opposite half-edges, so a closed component that
//! straddles a cell boundary integrates to the same volume as its
//! translated, non-straddling copy.

use std::collections::VecDeque;

use glam::DVec3;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::mesh::{FaceId, RegionId, SurfaceMesh};

/// Returns the area of a face (`1/2 |e1 x e2|` for triangles, the vector
/// area of the fan for larger polygons).
pub fn face_area(mesh: &SurfaceMesh, face: FaceId) -> f64 {
    let mut corner = DVec3::ZERO;
    let mut vector_area = DVec3::ZERO;
    for e in mesh.face_edges(face) {
        let next = corner + mesh.edge_vector(e);
        vector_area += corner.cross(next);
        corner = next;
    }
    0.5 * vector_area.length()
}

/// Sums the areas of all faces (in parallel).
pub fn total_surface_area(mesh: &SurfaceMesh) -> f64 {
    (0..mesh.face_count() as u32)
        .into_par_iter()
        .map(|f| face_area(mesh, FaceId(f)))
        .sum()
}

/// Returns the position of each face's first vertex, unwrapped consistently
/// across every connected component of the surface.
fn unwrapped_face_anchors(mesh: &SurfaceMesh) -> Vec<DVec3> {
    let face_count = mesh.face_count();
    let mut anchors = vec![DVec3::ZERO; face_count];
    let mut visited = vec![false; face_count];
    let mut queue = VecDeque::new();
    let mut inconsistent = 0usize;
    for seed in mesh.faces() {
        if visited[seed.index()] {
            continue;
        }
        visited[seed.index()] = true;
        anchors[seed.index()] = mesh.vertex_position(mesh.vertex1(mesh.first_face_edge(seed)));
        queue.push_back(seed);
        while let Some(face) = queue.pop_front() {
            let mut position = anchors[face.index()];
            for e in mesh.face_edges(face) {
                let end = position + mesh.edge_vector(e);
                if let Some(opposite) = mesh.opposite_edge(e) {
                    let neighbor = mesh.edge_face(opposite);
                    // Walk the neighbor from its first edge to `opposite`,
                    // whose start vertex coincides with our `end`.
                    let mut offset = DVec3::ZERO;
                    for ne in mesh.face_edges(neighbor) {
                        if ne == opposite {
                            break;
                        }
                        offset += mesh.edge_vector(ne);
                    }
                    let anchor = end - offset;
                    if !visited[neighbor.index()] {
                        visited[neighbor.index()] = true;
                        anchors[neighbor.index()] = anchor;
                        queue.push_back(neighbor);
                    } else if anchors[neighbor.index()].distance_squared(anchor) > 1e-12 * (1.0 + anchor.length_squared()) {
                        inconsistent += 1;
                    }
                }
                position = end;
            }
        }
    }
    if inconsistent > 0 {
        warn!(
            inconsistent,
            "Surface wraps around a periodic axis; enclosed volumes are only defined modulo the cell volume"
        );
    }
    anchors
}

/// Signed volume contributions of every face (`1/6 q0 . (qi x qi+1)` over
/// the fan), using unwrapped positions.
fn face_volume_contributions(mesh: &SurfaceMesh) -> Vec<f64> {
    let anchors = unwrapped_face_anchors(mesh);
    mesh.faces()
        .map(|face| {
            let q0 = anchors[face.index()];
            let mut corner = q0;
            let mut volume = 0.0;
            for e in mesh.face_edges(face) {
                let next = corner + mesh.edge_vector(e);
                volume += q0.dot(corner.cross(next));
                corner = next;
            }
            volume / 6.0
        })
        .collect()
}

/// Returns the total volume enclosed by the mesh, counting every face.
///
/// Faces are expected to point away from the enclosed volume.
pub fn total_volume(mesh: &SurfaceMesh) -> f64 {
    face_volume_contributions(mesh).into_iter().sum()
}

/// Recomputes `surface_area` and `volume` of every region from the faces
/// assigned to it. Faces without a region are ignored.
pub fn compute_region_metrics(mesh: &mut SurfaceMesh) {
    let volumes = face_volume_contributions(mesh);
    let areas: Vec<f64> = (0..mesh.face_count() as u32)
        .into_par_iter()
        .map(|f| face_area(mesh, FaceId(f)))
        .collect();
    let mut region_area = vec![0.0; mesh.region_count()];
    let mut region_volume = vec![0.0; mesh.region_count()];
    for face in mesh.faces() {
        if let Some(region) = mesh.face_region(face) {
            region_area[region.index()] += areas[face.index()];
            region_volume[region.index()] += volumes[face.index()];
        }
    }
    for (i, (area, volume)) in region_area.into_iter().zip(region_volume).enumerate() {
        let region = mesh.region_mut(RegionId(i as u32));
        region.surface_area = area;
        region.volume = volume;
    }
    debug!(regions = mesh.region_count(), "Computed region metrics");
}
