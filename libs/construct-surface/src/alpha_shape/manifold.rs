//! # Interface Facets
//!
//! Turns the classified tessellation into a closed triangle mesh. Every
//! facet between an owned filled cell and a cell of a different region
//! becomes a face oriented away from the filled cell. In two-sided mode the
//! facet also gets a reversed face for the region on the other side.
//!
//! Faces are keyed by their particle triple, rotated so that the smallest
//! index comes first. The key keeps the orientation, so the two sides of an
//! interface have different keys, and periodic images of a facet share one.
//!
//! Half-edges are paired by circulating around the Delaunay edge inside the
//! face's region until the next interface facet is reached.

use std::collections::HashMap;

use delaunay::{DelaunayTessellation, FACET_VERTICES};
use glam::DVec3;
use surface_mesh::{FaceId, HalfEdgeId, MeshError, RegionId, SurfaceMesh, TaskToken, VertexId};
use tracing::debug;

use super::regions::{is_owned, EXTERIOR};
use crate::error::ConstructError;

/// Shifts the smallest index to the front, keeping the cyclic order.
pub(crate) fn rotate_min(mut key: [usize; 3]) -> [usize; 3] {
    let first = (0..3).min_by_key(|&i| key[i]).unwrap_or(0);
    key.rotate_left(first);
    key
}

/// Mesh produced from the interface facets.
pub(crate) struct FacetMesh {
    /// Input particle of each mesh vertex.
    pub vertex_particles: Vec<usize>,
    /// Particles that are a corner of some face.
    pub surface_particles: Vec<bool>,
}

pub(crate) struct ManifoldBuilder<'a> {
    tess: &'a DelaunayTessellation,
    positions: &'a [DVec3],
    primary: &'a [Option<usize>],
    filled_count: usize,
    two_sided: bool,
    vertex_map: Vec<Option<VertexId>>,
    vertex_particles: Vec<usize>,
    surface_particles: Vec<bool>,
    face_lookup: HashMap<[usize; 3], FaceId>,
    /// Cell and facet each face was created from.
    face_origins: Vec<(usize, usize)>,
}

impl<'a> ManifoldBuilder<'a> {
    pub(crate) fn new(
        tess: &'a DelaunayTessellation,
        positions: &'a [DVec3],
        primary: &'a [Option<usize>],
        filled_count: usize,
        two_sided: bool,
    ) -> Self {
        Self {
            tess,
            positions,
            primary,
            filled_count,
            two_sided,
            vertex_map: vec![None; positions.len()],
            vertex_particles: Vec::new(),
            surface_particles: vec![false; positions.len()],
            face_lookup: HashMap::new(),
            face_origins: Vec::new(),
        }
    }

    fn is_filled_code(&self, code: i64) -> bool {
        code >= 0 && (code as usize) < self.filled_count
    }

    fn neighbor_code(&self, cell: usize, f: usize) -> i64 {
        self.tess.cell_neighbor(cell, f).map_or(EXTERIOR, |n| self.tess.user_field(n))
    }

    fn facet_particles(&self, cell: usize, f: usize) -> Result<[usize; 3], ConstructError> {
        let mut particles = [0usize; 3];
        for (slot, &k) in particles.iter_mut().zip(&FACET_VERTICES[f]) {
            let v = self.tess.cell_vertex(cell, k);
            *slot = self.tess.vertex_particle(v).ok_or_else(|| {
                MeshError::invalid_topology(format!("interface facet {f} of cell {cell} has a non-particle corner"))
            })?;
        }
        Ok(particles)
    }

    fn mesh_vertex(&mut self, mesh: &mut SurfaceMesh, particle: usize) -> VertexId {
        if let Some(v) = self.vertex_map[particle] {
            return v;
        }
        let v = mesh.create_vertex(mesh.domain().wrap_point(self.positions[particle]));
        self.vertex_map[particle] = Some(v);
        self.vertex_particles.push(particle);
        v
    }

    fn add_face(
        &mut self,
        mesh: &mut SurfaceMesh,
        cell: usize,
        f: usize,
        region: Option<RegionId>,
    ) -> Result<FaceId, ConstructError> {
        let particles = self.facet_particles(cell, f)?;
        let vertices = particles.map(|p| self.mesh_vertex(mesh, p));
        let face = mesh.create_face(&vertices, region)?;
        if self.face_lookup.insert(rotate_min(particles), face).is_some() {
            return Err(ConstructError::wrapped_cell(format!(
                "facet {particles:?} occurs twice; the simulation cell is too small for the probe radius"
            )));
        }
        self.face_origins.push((cell, f));
        Ok(face)
    }

    /// Fails if a cell spans half the simulation cell or more.
    fn check_unwrapped(&self, cell: usize) -> Result<(), ConstructError> {
        let sim = self.tess.simulation_cell();
        let corners = self.tess.cell_vertex_positions(cell);
        if (0..3).any(|i| sim.is_wrapped_vector(corners[i] - corners[3])) {
            return Err(ConstructError::wrapped_cell(
                "a Delaunay cell spans half the simulation cell; the cell is too small for the probe radius",
            ));
        }
        Ok(())
    }

    /// Creates the interface faces. Returns `false` if canceled.
    pub(crate) fn create_faces(&mut self, mesh: &mut SurfaceMesh, task: &TaskToken) -> Result<bool, ConstructError> {
        let tess = self.tess;
        task.set_progress_maximum(tess.cell_count() as u64);
        for c in tess.cells() {
            if !task.set_progress_value_intermittent(c as u64) {
                return Ok(false);
            }
            let code = tess.user_field(c);
            if !is_owned(self.primary, c) || !self.is_filled_code(code) {
                continue;
            }
            let mut checked = false;
            for f in 0..4 {
                let other = self.neighbor_code(c, f);
                if other == code {
                    continue;
                }
                if !checked {
                    self.check_unwrapped(c)?;
                    checked = true;
                }
                let face = self.add_face(mesh, c, f, Some(RegionId(code as u32)))?;
                for &k in &FACET_VERTICES[f] {
                    if let Some(p) = tess.vertex_particle(tess.cell_vertex(c, k)) {
                        self.surface_particles[p] = true;
                    }
                }
                if self.two_sided && !self.is_filled_code(other) {
                    let (n, g) = tess.mirror_facet(c, f).ok_or_else(|| {
                        MeshError::invalid_topology(format!("facet {f} of filled cell {c} has no adjacent cell"))
                    })?;
                    let region = (other >= 0).then(|| RegionId(other as u32));
                    let back = self.add_face(mesh, n, g, region)?;
                    mesh.link_opposite_faces(face, back);
                }
            }
        }

        // Interfaces between two filled regions were created from both sides.
        if self.two_sided {
            let faces: Vec<FaceId> = mesh.faces().collect();
            for face in faces {
                if mesh.opposite_face(face).is_some() {
                    continue;
                }
                let (c, f) = self.face_origins[face.index()];
                let [a, b, d] = self.facet_particles(c, f)?;
                if let Some(&back) = self.face_lookup.get(&rotate_min([a, d, b])) {
                    mesh.link_opposite_faces(face, back);
                }
            }
        }
        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Created interface facets"
        );
        Ok(!task.is_canceled())
    }

    /// Walks around the Delaunay edge `(a, b)` starting inside `cell`, which
    /// was entered through `facet`, and returns the last cell of the same
    /// region together with the facet through which the walk would leave it.
    fn circulate(&self, cell: usize, facet: usize, a: usize, b: usize) -> Result<(usize, usize), ConstructError> {
        let tess = self.tess;
        let region = tess.user_field(cell);
        let (mut current, mut entry) = (cell, facet);
        for _ in 0..tess.cell_count() {
            let corners = tess.cell_vertices(current);
            let apex = corners[entry];
            let exit = (0..4)
                .find(|&i| corners[i] != a && corners[i] != b && corners[i] != apex)
                .ok_or_else(|| MeshError::invalid_topology(format!("cell {current} does not contain the edge")))?;
            match tess.mirror_facet(current, exit) {
                Some((next, back)) if tess.user_field(next) == region => {
                    current = next;
                    entry = back;
                }
                _ => return Ok((current, exit)),
            }
        }
        Err(MeshError::invalid_topology("circulation around a Delaunay edge does not terminate").into())
    }

    fn find_face(&self, cell: usize, facet: usize) -> Result<FaceId, ConstructError> {
        let key = rotate_min(self.facet_particles(cell, facet)?);
        self.face_lookup
            .get(&key)
            .copied()
            .ok_or_else(|| MeshError::invalid_topology(format!("adjacent facet {key:?} was not created")).into())
    }

    /// Pairs every half-edge with the half-edge of the adjacent face in the
    /// same region. Returns `false` if canceled.
    pub(crate) fn link_halfedges(&self, mesh: &mut SurfaceMesh, task: &TaskToken) -> Result<bool, ConstructError> {
        task.set_progress_maximum(mesh.face_count() as u64);
        for face in 0..mesh.face_count() {
            if !task.set_progress_value_intermittent(face as u64) {
                return Ok(false);
            }
            let face = FaceId(face as u32);
            let (cell, facet) = self.face_origins[face.index()];
            let corners = FACET_VERTICES[facet].map(|k| self.tess.cell_vertex(cell, k));
            let edges: Vec<HalfEdgeId> = mesh.face_edges(face).collect();
            for (k, &edge) in edges.iter().enumerate() {
                if mesh.opposite_edge(edge).is_some() {
                    continue;
                }
                let (exit_cell, exit_facet) = self.circulate(cell, facet, corners[k], corners[(k + 1) % 3])?;
                let adjacent = self.find_face(exit_cell, exit_facet)?;
                let (from, to) = (mesh.vertex1(edge), mesh.vertex2(edge));
                let opposite = mesh
                    .face_edges(adjacent)
                    .find(|&e| mesh.vertex1(e) == to && mesh.vertex2(e) == from)
                    .ok_or_else(|| {
                        MeshError::invalid_topology(format!(
                            "face {} has no half-edge matching face {}",
                            adjacent.index(),
                            face.index()
                        ))
                    })?;
                mesh.link_opposite_edges(edge, opposite)?;
            }
        }
        Ok(!task.is_canceled())
    }

    pub(crate) fn finish(self) -> FacetMesh {
        FacetMesh {
            vertex_particles: self.vertex_particles,
            surface_particles: self.surface_particles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::rotate_min;

    #[test]
    fn test_rotate_min_keeps_orientation() {
        assert_eq!(rotate_min([5, 2, 9]), [2, 9, 5]);
        assert_eq!(rotate_min([1, 7, 3]), [1, 7, 3]);
        assert_eq!(rotate_min([4, 3, 0]), [0, 4, 3]);
        assert_ne!(rotate_min([1, 2, 3]), rotate_min([1, 3, 2]));
    }
}
