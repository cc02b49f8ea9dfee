//! Opposite-halfedge linking with user-facing errors.

use tracing::debug;

use crate::error::MeshError;
use crate::mesh::SurfaceMesh;

/// Links every half-edge to its reversed partner and fails if the mesh does
/// not close.
///
/// A half-edge that starts and ends at the same vertex means a polyhedron
/// was welded to its own periodic image, which leaves its adjacency
/// undefined.
pub fn connect_opposite_halfedges(mesh: &mut SurfaceMesh) -> Result<(), MeshError> {
    if let Some(edge) = mesh.edges().find(|&e| mesh.vertex1(e) == mesh.vertex2(e)) {
        return Err(MeshError::self_adjacent(format!(
            "face {} touches its own periodic image at vertex {}",
            mesh.edge_face(edge).0,
            mesh.vertex1(edge).0
        )));
    }
    if mesh.connect_opposite_halfedges() {
        debug!(edges = mesh.edge_count(), "Mesh is closed");
        Ok(())
    } else {
        Err(MeshError::not_closed(mesh.unmatched_edge_count()))
    }
}
