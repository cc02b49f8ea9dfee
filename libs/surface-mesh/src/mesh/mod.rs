//! # Half-Edge Surface Mesh
//!
//! Arena-indexed half-edge mesh with spatial regions.
//!
//! Vertices, half-edges, faces and regions live in dense vectors and refer to
//! each other through `u32` handles. Every vertex keeps a singly linked list
//! of its outgoing half-edges so that vertex stars can be enumerated without
//! a global edge map. Faces belong to a region (a connected subvolume) and
//! may be paired with the reversed face of the adjacent region in two-sided
//! meshes.

use glam::{DAffine3, DVec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::SimulationCell;
use crate::error::MeshError;
use crate::properties::PropertyArray;

/// Handle of a mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Handle of a half-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HalfEdgeId(pub u32);

/// Handle of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceId(pub u32);

/// Handle of a spatial region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

impl VertexId {
    /// Returns the arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl HalfEdgeId {
    /// Returns the arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FaceId {
    /// Returns the arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RegionId {
    /// Returns the arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Aggregate attributes of one connected subvolume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Enclosed volume.
    pub volume: f64,
    /// Area of the faces bounding this region.
    pub surface_area: f64,
    /// Whether the region is solid (filled) or empty space.
    pub is_filled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HalfEdge {
    vertex1: VertexId,
    vertex2: VertexId,
    face: FaceId,
    next: HalfEdgeId,
    prev: HalfEdgeId,
    opposite: Option<HalfEdgeId>,
    next_vertex_edge: Option<HalfEdgeId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Face {
    first_edge: HalfEdgeId,
    region: Option<RegionId>,
    opposite_face: Option<FaceId>,
}

/// A half-edge surface mesh embedded in a (possibly periodic) simulation cell.
///
/// # Example
///
/// ```rust
/// use surface_mesh::{SimulationCell, SurfaceMesh};
/// use glam::DVec3;
///
/// let mut mesh = SurfaceMesh::new(SimulationCell::default());
/// let region = mesh.create_region(true);
/// let v: Vec<_> = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z]
///     .into_iter()
///     .map(|p| mesh.create_vertex(p))
///     .collect();
/// for tri in [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]] {
///     mesh.create_face(&[v[tri[0]], v[tri[1]], v[tri[2]]], Some(region)).unwrap();
/// }
/// assert!(mesh.connect_opposite_halfedges());
/// assert_eq!(mesh.edge_count(), 3 * mesh.face_count());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    domain: SimulationCell,
    positions: Vec<DVec3>,
    vertex_first_edge: Vec<Option<HalfEdgeId>>,
    edges: Vec<HalfEdge>,
    faces: Vec<Face>,
    regions: Vec<Region>,
    space_filling_region: Option<RegionId>,
    vertex_properties: Vec<PropertyArray>,
}

impl SurfaceMesh {
    /// Creates an empty mesh in the given domain.
    pub fn new(domain: SimulationCell) -> Self {
        Self {
            domain,
            ..Self::default()
        }
    }

    /// Creates an empty mesh with pre-allocated capacity.
    pub fn with_capacity(domain: SimulationCell, vertex_count: usize, face_count: usize) -> Self {
        Self {
            domain,
            positions: Vec::with_capacity(vertex_count),
            vertex_first_edge: Vec::with_capacity(vertex_count),
            edges: Vec::with_capacity(face_count * 3),
            faces: Vec::with_capacity(face_count),
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Domain and counts
    // -------------------------------------------------------------------------

    /// Returns the simulation cell the mesh is embedded in.
    #[inline]
    pub fn domain(&self) -> &SimulationCell {
        &self.domain
    }

    /// Replaces the simulation cell.
    pub fn set_domain(&mut self, domain: SimulationCell) {
        self.domain = domain;
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of half-edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns the number of regions.
    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Iterates over all vertex handles.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (0..self.positions.len() as u32).map(VertexId)
    }

    /// Iterates over all half-edge handles.
    pub fn edges(&self) -> impl Iterator<Item = HalfEdgeId> {
        (0..self.edges.len() as u32).map(HalfEdgeId)
    }

    /// Iterates over all face handles.
    pub fn faces(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len() as u32).map(FaceId)
    }

    // -------------------------------------------------------------------------
    // Vertices
    // -------------------------------------------------------------------------

    /// Appends a vertex and returns its handle.
    pub fn create_vertex(&mut self, position: DVec3) -> VertexId {
        let id = VertexId(self.positions.len() as u32);
        self.positions.push(position);
        self.vertex_first_edge.push(None);
        for property in &mut self.vertex_properties {
            property.push_zero();
        }
        id
    }

    /// Returns the position of a vertex.
    #[inline]
    pub fn vertex_position(&self, vertex: VertexId) -> DVec3 {
        self.positions[vertex.index()]
    }

    /// Moves a vertex.
    #[inline]
    pub fn set_vertex_position(&mut self, vertex: VertexId, position: DVec3) {
        self.positions[vertex.index()] = position;
    }

    /// Returns all vertex positions.
    #[inline]
    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    /// Returns all vertex positions mutably.
    #[inline]
    pub fn positions_mut(&mut self) -> &mut [DVec3] {
        &mut self.positions
    }

    /// Returns the head of the vertex's outgoing half-edge list.
    #[inline]
    pub fn first_vertex_edge(&self, vertex: VertexId) -> Option<HalfEdgeId> {
        self.vertex_first_edge[vertex.index()]
    }

    /// Iterates over the outgoing half-edges of a vertex.
    pub fn vertex_edges(&self, vertex: VertexId) -> VertexEdges<'_> {
        VertexEdges {
            mesh: self,
            current: self.first_vertex_edge(vertex),
        }
    }

    /// Returns the number of outgoing half-edges of a vertex.
    pub fn vertex_edge_count(&self, vertex: VertexId) -> usize {
        self.vertex_edges(vertex).count()
    }

    /// Applies an affine transformation to all vertex positions.
    pub fn transform_vertices(&mut self, transform: &DAffine3) {
        for p in &mut self.positions {
            *p = transform.transform_point3(*p);
        }
    }

    // -------------------------------------------------------------------------
    // Half-edges
    // -------------------------------------------------------------------------

    /// Returns the start vertex of a half-edge.
    #[inline]
    pub fn vertex1(&self, edge: HalfEdgeId) -> VertexId {
        self.edges[edge.index()].vertex1
    }

    /// Returns the end vertex of a half-edge.
    #[inline]
    pub fn vertex2(&self, edge: HalfEdgeId) -> VertexId {
        self.edges[edge.index()].vertex2
    }

    /// Returns the face a half-edge bounds.
    #[inline]
    pub fn edge_face(&self, edge: HalfEdgeId) -> FaceId {
        self.edges[edge.index()].face
    }

    /// Returns the following half-edge around the face.
    #[inline]
    pub fn next_face_edge(&self, edge: HalfEdgeId) -> HalfEdgeId {
        self.edges[edge.index()].next
    }

    /// Returns the preceding half-edge around the face.
    #[inline]
    pub fn prev_face_edge(&self, edge: HalfEdgeId) -> HalfEdgeId {
        self.edges[edge.index()].prev
    }

    /// Returns the opposite half-edge, if linked.
    #[inline]
    pub fn opposite_edge(&self, edge: HalfEdgeId) -> Option<HalfEdgeId> {
        self.edges[edge.index()].opposite
    }

    /// Returns the next outgoing half-edge of the same start vertex.
    #[inline]
    pub fn next_vertex_edge(&self, edge: HalfEdgeId) -> Option<HalfEdgeId> {
        self.edges[edge.index()].next_vertex_edge
    }

    /// Returns the minimum-image vector from `vertex1` to `vertex2`.
    pub fn edge_vector(&self, edge: HalfEdgeId) -> DVec3 {
        let e = &self.edges[edge.index()];
        self.domain
            .wrap_vector(self.positions[e.vertex2.index()] - self.positions[e.vertex1.index()])
    }

    /// Links two half-edges as opposites of each other.
    ///
    /// Fails if the edges do not run in reverse directions between the same
    /// pair of vertices or if either is already linked to a different edge.
    pub fn link_opposite_edges(&mut self, edge1: HalfEdgeId, edge2: HalfEdgeId) -> Result<(), MeshError> {
        let (a, b) = (self.edges[edge1.index()], self.edges[edge2.index()]);
        if a.vertex1 != b.vertex2 || a.vertex2 != b.vertex1 {
            return Err(MeshError::invalid_topology(format!(
                "half-edges {} and {} are not reversed copies of each other",
                edge1.0, edge2.0
            )));
        }
        if a.opposite.is_some_and(|o| o != edge2) || b.opposite.is_some_and(|o| o != edge1) {
            return Err(MeshError::invalid_topology(format!(
                "half-edge {} or {} already has an opposite",
                edge1.0, edge2.0
            )));
        }
        self.edges[edge1.index()].opposite = Some(edge2);
        self.edges[edge2.index()].opposite = Some(edge1);
        Ok(())
    }

    /// Finds an outgoing half-edge of `from` ending at `to` that has no
    /// opposite yet and bounds a face of `region`.
    pub fn find_unlinked_edge(&self, from: VertexId, to: VertexId, region: Option<RegionId>) -> Option<HalfEdgeId> {
        self.vertex_edges(from).find(|&e| {
            let edge = &self.edges[e.index()];
            edge.vertex2 == to
                && edge.opposite.is_none()
                && self.faces[edge.face.index()].region == region
        })
    }

    /// Moves an outgoing half-edge from vertex `from` to vertex `to`.
    ///
    /// The incoming half-edge preceding it in the same face is re-targeted as
    /// well, so transferring every outgoing edge of a vertex detaches it
    /// completely.
    pub fn transfer_edge_to_vertex(&mut self, edge: HalfEdgeId, from: VertexId, to: VertexId) {
        self.unlink_vertex_edge(from, edge);
        let prev = self.edges[edge.index()].prev;
        self.edges[edge.index()].vertex1 = to;
        self.edges[prev.index()].vertex2 = to;
        self.push_vertex_edge(to, edge);
    }

    fn push_vertex_edge(&mut self, vertex: VertexId, edge: HalfEdgeId) {
        self.edges[edge.index()].next_vertex_edge = self.vertex_first_edge[vertex.index()];
        self.vertex_first_edge[vertex.index()] = Some(edge);
    }

    fn unlink_vertex_edge(&mut self, vertex: VertexId, edge: HalfEdgeId) {
        let next = self.edges[edge.index()].next_vertex_edge;
        if self.vertex_first_edge[vertex.index()] == Some(edge) {
            self.vertex_first_edge[vertex.index()] = next;
        } else {
            let mut current = self.vertex_first_edge[vertex.index()];
            while let Some(e) = current {
                let following = self.edges[e.index()].next_vertex_edge;
                if following == Some(edge) {
                    self.edges[e.index()].next_vertex_edge = next;
                    break;
                }
                current = following;
            }
        }
        self.edges[edge.index()].next_vertex_edge = None;
    }

    // -------------------------------------------------------------------------
    // Faces
    // -------------------------------------------------------------------------

    /// Creates a face bounded by the given vertex cycle.
    ///
    /// One half-edge is created per polygon side, running from `vertices[i]`
    /// to `vertices[i + 1]`.
    pub fn create_face(&mut self, vertices: &[VertexId], region: Option<RegionId>) -> Result<FaceId, MeshError> {
        if vertices.len() < 3 {
            return Err(MeshError::invalid_topology(format!(
                "a face needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(bad) = vertices.iter().find(|v| v.index() >= self.positions.len()) {
            return Err(MeshError::invalid_topology(format!("vertex {} does not exist", bad.0)));
        }
        let face = FaceId(self.faces.len() as u32);
        let base = self.edges.len() as u32;
        let n = vertices.len() as u32;
        for (i, &v1) in vertices.iter().enumerate() {
            let i = i as u32;
            let v2 = vertices[((i + 1) % n) as usize];
            self.edges.push(HalfEdge {
                vertex1: v1,
                vertex2: v2,
                face,
                next: HalfEdgeId(base + (i + 1) % n),
                prev: HalfEdgeId(base + (i + n - 1) % n),
                opposite: None,
                next_vertex_edge: None,
            });
            self.push_vertex_edge(v1, HalfEdgeId(base + i));
        }
        self.faces.push(Face {
            first_edge: HalfEdgeId(base),
            region,
            opposite_face: None,
        });
        Ok(face)
    }

    /// Returns the first half-edge of a face.
    #[inline]
    pub fn first_face_edge(&self, face: FaceId) -> HalfEdgeId {
        self.faces[face.index()].first_edge
    }

    /// Iterates over the half-edges of a face in cycle order.
    pub fn face_edges(&self, face: FaceId) -> FaceEdges<'_> {
        let first = self.first_face_edge(face);
        FaceEdges {
            mesh: self,
            first,
            current: Some(first),
        }
    }

    /// Returns the vertex cycle of a face.
    pub fn face_vertices(&self, face: FaceId) -> Vec<VertexId> {
        self.face_edges(face).map(|e| self.vertex1(e)).collect()
    }

    /// Returns the region a face belongs to.
    #[inline]
    pub fn face_region(&self, face: FaceId) -> Option<RegionId> {
        self.faces[face.index()].region
    }

    /// Assigns a face to a region.
    #[inline]
    pub fn set_face_region(&mut self, face: FaceId, region: Option<RegionId>) {
        self.faces[face.index()].region = region;
    }

    /// Returns the reversed twin face of a two-sided mesh.
    #[inline]
    pub fn opposite_face(&self, face: FaceId) -> Option<FaceId> {
        self.faces[face.index()].opposite_face
    }

    /// Pairs two faces of a two-sided mesh.
    pub fn link_opposite_faces(&mut self, face1: FaceId, face2: FaceId) {
        self.faces[face1.index()].opposite_face = Some(face2);
        self.faces[face2.index()].opposite_face = Some(face1);
    }

    /// Reverses the orientation of every face.
    pub fn flip_faces(&mut self) {
        for e in &mut self.edges {
            std::mem::swap(&mut e.vertex1, &mut e.vertex2);
            std::mem::swap(&mut e.next, &mut e.prev);
            e.next_vertex_edge = None;
        }
        self.rebuild_vertex_edge_lists();
    }

    fn rebuild_vertex_edge_lists(&mut self) {
        self.vertex_first_edge.iter_mut().for_each(|h| *h = None);
        for index in (0..self.edges.len() as u32).rev() {
            let v = self.edges[index as usize].vertex1;
            self.push_vertex_edge(v, HalfEdgeId(index));
        }
    }

    /// Triangulates every face as a fan and returns vertex index triples.
    pub fn to_triangles(&self) -> Vec<[u32; 3]> {
        let mut triangles = Vec::with_capacity(self.faces.len());
        for face in self.faces() {
            let verts = self.face_vertices(face);
            for i in 1..verts.len() - 1 {
                triangles.push([verts[0].0, verts[i].0, verts[i + 1].0]);
            }
        }
        triangles
    }

    // -------------------------------------------------------------------------
    // Regions
    // -------------------------------------------------------------------------

    /// Creates a region and returns its handle.
    pub fn create_region(&mut self, is_filled: bool) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Region {
            is_filled,
            ..Region::default()
        });
        id
    }

    /// Returns a region's attributes.
    #[inline]
    pub fn region(&self, region: RegionId) -> &Region {
        &self.regions[region.index()]
    }

    /// Returns a region's attributes mutably.
    #[inline]
    pub fn region_mut(&mut self, region: RegionId) -> &mut Region {
        &mut self.regions[region.index()]
    }

    /// Returns all regions.
    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Returns the region covering all space when the mesh has no faces.
    #[inline]
    pub fn space_filling_region(&self) -> Option<RegionId> {
        self.space_filling_region
    }

    /// Sets the region covering all space when the mesh has no faces.
    pub fn set_space_filling_region(&mut self, region: Option<RegionId>) {
        self.space_filling_region = region;
    }

    // -------------------------------------------------------------------------
    // Vertex properties
    // -------------------------------------------------------------------------

    /// Attaches a per-vertex property column, replacing one of the same name.
    pub fn add_vertex_property(&mut self, property: PropertyArray) -> Result<(), MeshError> {
        if property.len() != self.vertex_count() {
            return Err(MeshError::invalid_property(format!(
                "property '{}' has {} elements but the mesh has {} vertices",
                property.name(),
                property.len(),
                self.vertex_count()
            )));
        }
        self.vertex_properties.retain(|p| p.name() != property.name());
        self.vertex_properties.push(property);
        Ok(())
    }

    /// Looks up a per-vertex property by name.
    pub fn vertex_property(&self, name: &str) -> Option<&PropertyArray> {
        self.vertex_properties.iter().find(|p| p.name() == name)
    }

    /// Returns all per-vertex properties.
    pub fn vertex_properties(&self) -> &[PropertyArray] {
        &self.vertex_properties
    }

    // -------------------------------------------------------------------------
    // Topology operations
    // -------------------------------------------------------------------------

    /// Pairs every unlinked half-edge with the reversed half-edge of an
    /// adjacent face in the same region. Returns true if the mesh is closed
    /// afterwards.
    pub fn connect_opposite_halfedges(&mut self) -> bool {
        let mut closed = true;
        for index in 0..self.edges.len() {
            let edge = self.edges[index];
            if edge.opposite.is_some() {
                continue;
            }
            let region = self.faces[edge.face.index()].region;
            match self.find_unlinked_edge(edge.vertex2, edge.vertex1, region) {
                Some(partner) if partner.index() != index => {
                    self.edges[index].opposite = Some(partner);
                    self.edges[partner.index()].opposite = Some(HalfEdgeId(index as u32));
                }
                _ => closed = false,
            }
        }
        closed
    }

    /// Returns true if every half-edge has an opposite.
    pub fn is_closed(&self) -> bool {
        self.edges.iter().all(|e| e.opposite.is_some())
    }

    /// Returns the number of half-edges without opposite.
    pub fn unmatched_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.opposite.is_none()).count()
    }

    /// Splits vertices whose star consists of several disconnected face fans.
    ///
    /// Every fan beyond the first gets its own copy of the vertex (with the
    /// vertex properties duplicated). `on_duplicate(original, copy)` is called
    /// for each new vertex. Returns the number of vertices created.
    pub fn make_manifold(&mut self, mut on_duplicate: impl FnMut(VertexId, VertexId)) -> usize {
        let original_count = self.vertex_count();
        let mut visited = vec![false; self.edges.len()];
        let mut created = 0;
        for index in 0..original_count {
            let vertex = VertexId(index as u32);
            let outgoing: Vec<HalfEdgeId> = self.vertex_edges(vertex).collect();
            let Some(&first) = outgoing.first() else {
                continue;
            };
            for e in self.vertex_star(first) {
                visited[e.index()] = true;
            }
            for &start in &outgoing[1..] {
                if visited[start.index()] {
                    continue;
                }
                let copy = self.create_vertex(self.positions[index]);
                for property in &mut self.vertex_properties {
                    property.copy_element(index, copy.index());
                }
                for e in self.vertex_star(start) {
                    visited[e.index()] = true;
                    self.transfer_edge_to_vertex(e, vertex, copy);
                }
                on_duplicate(vertex, copy);
                created += 1;
            }
        }
        if created > 0 {
            debug!(created, "Duplicated non-manifold vertices");
        }
        created
    }

    /// Collects the outgoing half-edges of the face fan containing `start`.
    ///
    /// Rotation follows `opposite(prev(e))`; on open fans the walk continues
    /// in the other direction from `start` via `next(opposite(e))`.
    fn vertex_star(&self, start: HalfEdgeId) -> Vec<HalfEdgeId> {
        let mut star = vec![start];
        let mut current = start;
        loop {
            let incoming = self.prev_face_edge(current);
            match self.opposite_edge(incoming) {
                Some(next) if next == start || star.contains(&next) => return star,
                Some(next) => {
                    star.push(next);
                    current = next;
                }
                None => break,
            }
        }
        current = start;
        while let Some(opp) = self.opposite_edge(current) {
            let next = self.next_face_edge(opp);
            if star.contains(&next) {
                break;
            }
            star.push(next);
            current = next;
        }
        star
    }

    /// Removes vertices without any incident half-edge and compacts the
    /// vertex arrays. Returns the number of removed vertices.
    pub fn delete_isolated_vertices(&mut self) -> usize {
        let keep: Vec<bool> = self.vertex_first_edge.iter().map(Option::is_some).collect();
        let removed = keep.iter().filter(|&&k| !k).count();
        if removed == 0 {
            return 0;
        }
        let mut remap = vec![VertexId(u32::MAX); keep.len()];
        let mut next = 0u32;
        for (old, &k) in keep.iter().enumerate() {
            if k {
                remap[old] = VertexId(next);
                next += 1;
            }
        }
        let mut positions = Vec::with_capacity(next as usize);
        let mut first_edges = Vec::with_capacity(next as usize);
        for (old, &k) in keep.iter().enumerate() {
            if k {
                positions.push(self.positions[old]);
                first_edges.push(self.vertex_first_edge[old]);
            }
        }
        self.positions = positions;
        self.vertex_first_edge = first_edges;
        for e in &mut self.edges {
            e.vertex1 = remap[e.vertex1.index()];
            e.vertex2 = remap[e.vertex2.index()];
        }
        for property in &mut self.vertex_properties {
            property.retain(&keep);
        }
        debug!(removed, "Deleted isolated vertices");
        removed
    }
}

/// Iterator over the outgoing half-edges of a vertex.
pub struct VertexEdges<'a> {
    mesh: &'a SurfaceMesh,
    current: Option<HalfEdgeId>,
}

impl Iterator for VertexEdges<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let edge = self.current?;
        self.current = self.mesh.next_vertex_edge(edge);
        Some(edge)
    }
}

/// Iterator over the half-edges of a face.
pub struct FaceEdges<'a> {
    mesh: &'a SurfaceMesh,
    first: HalfEdgeId,
    current: Option<HalfEdgeId>,
}

impl Iterator for FaceEdges<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let edge = self.current?;
        let next = self.mesh.next_face_edge(edge);
        self.current = (next != self.first).then_some(next);
        Some(edge)
    }
}
