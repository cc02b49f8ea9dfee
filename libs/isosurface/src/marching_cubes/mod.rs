//! # Marching Cubes
//!
//! Topologically consistent isosurface extraction on a regular grid.
//!
//! ## Algorithm
//!
//! The engine walks every cube of the grid padded by a one-node halo on each
//! non-periodic axis. Halo nodes always lie on the empty side, so the
//! surface closes at the grid boundary. On periodic axes cubes wrap around
//! and vertices on the seam are shared through an edge cache keyed by the
//! lower edge corner modulo the grid.
//!
//! Inside a cube the case tables drive the surface: `EDGE_MASK` names the
//! intersected edges and `AMBIGUOUS_FACES` the faces that need the
//! asymptotic decider on their bilinear interpolant, evaluated in a corner
//! order both neighboring cubes agree on. Each face contributes one
//! directed segment per pair of crossings and the segments chain into
//! closed contour loops.
//!
//! For cases with an interior ambiguity the corners of each side are then
//! grouped through the cube interior by an exact sweep of the trilinear
//! interpolant (see [`interior_components`]). Loops bounding the same
//! solid and the same empty component form one surface patch: a single
//! loop becomes a polygon, two loops a tunnel, more loops a hub. Either
//! way, every cube edge on the cube's boundary is used exactly once in
//! each direction, which keeps the mesh closed regardless of the interior
//! decision.
//!
//! Face normals point away from the solid side.

use config::constants::INTERIOR_VALUE_LIMIT;
use glam::{DMat3, DVec3};
use surface_mesh::{SimulationCell, SurfaceMesh, TaskToken, VertexId};
use tracing::{debug, warn};

use crate::error::IsosurfaceError;
use crate::field::VoxelSampler;
use crate::tables::{
    has_interior_ambiguity, AMBIGUOUS_FACES, EDGE_AXIS, EDGE_BETWEEN, EDGE_CORNERS, EDGE_FACES, EDGE_MASK,
    FACE_CANONICAL_CORNERS, FACE_CORNERS, NO_EDGE,
};

#[cfg(test)]
mod tests;

/// Cache slot without a vertex.
const NO_VERTEX: u32 = u32::MAX;

/// Distance of the hub vertices from the cube center, in cube units.
const HUB_RADIUS: f64 = 0.15;

/// Offset of cube corner `c` from the cube's lower corner.
#[inline]
fn corner_offset(c: usize) -> [i64; 3] {
    [(c & 1) as i64, ((c >> 1) & 1) as i64, ((c >> 2) & 1) as i64]
}

/// Marching-cubes extractor over a [`VoxelSampler`].
///
/// # Example
///
/// ```rust
/// use glam::DVec3;
/// use isosurface::{MarchingCubes, VoxelField};
/// use surface_mesh::TaskToken;
///
/// let n = 8;
/// let data: Vec<f64> = (0..n * n * n)
///     .map(|idx| {
///         let p = DVec3::new((idx % n) as f64, (idx / n % n) as f64, (idx / (n * n)) as f64);
///         p.distance(DVec3::splat(3.5))
///     })
///     .collect();
/// let field = VoxelField::new(&data, [n; 3], [false; 3]).unwrap();
/// let mut mesh = MarchingCubes::new(&field, 2.5)
///     .lower_is_solid(true)
///     .generate(&TaskToken::new())
///     .unwrap()
///     .expect("not canceled");
/// assert!(mesh.face_count() > 0);
/// assert!(mesh.connect_opposite_halfedges());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MarchingCubes<'a, S: VoxelSampler> {
    field: &'a S,
    isolevel: f64,
    lower_is_solid: bool,
    infinite_domain: bool,
}

impl<'a, S: VoxelSampler> MarchingCubes<'a, S> {
    /// Creates an extractor for the `isolevel` surface of `field`. By
    /// default values above the isolevel are solid and the surface is
    /// closed at the grid boundary.
    pub fn new(field: &'a S, isolevel: f64) -> Self {
        Self {
            field,
            isolevel,
            lower_is_solid: false,
            infinite_domain: false,
        }
    }

    /// Treats values at or below the isolevel as solid.
    pub fn lower_is_solid(mut self, lower_is_solid: bool) -> Self {
        self.lower_is_solid = lower_is_solid;
        self
    }

    /// Leaves the surface open where it meets a non-periodic grid boundary.
    pub fn infinite_domain(mut self, infinite_domain: bool) -> Self {
        self.infinite_domain = infinite_domain;
        self
    }

    /// Runs the extraction.
    ///
    /// Vertex positions are in grid-index space: node `(i, j, k)` sits at
    /// `(i, j, k)`, positions on periodic axes are wrapped into `[0, n)`.
    /// All faces belong to a single filled region. Returns `Ok(None)` if
    /// the task was canceled.
    pub fn generate(&self, task: &TaskToken) -> Result<Option<SurfaceMesh>, IsosurfaceError> {
        let shape = self.field.shape();
        let pbc = self.field.pbc();
        if let Some(dim) = (0..3).find(|&dim| shape[dim] < 2) {
            return Err(IsosurfaceError::invalid_grid(format!(
                "grid dimension {dim} has {} nodes, at least 2 are required",
                shape[dim]
            )));
        }
        if !self.isolevel.is_finite() {
            return Err(IsosurfaceError::invalid_parameter(format!(
                "isolevel must be finite, got {}",
                self.isolevel
            )));
        }
        for dim in 0..3 {
            if pbc[dim] && shape[dim] < 4 {
                warn!(dim, nodes = shape[dim], "Periodic grid dimension is too small for unambiguous minimum-image edges");
            }
        }

        let mut ranges = [(0i64, 0i64); 3];
        for dim in 0..3 {
            let n = shape[dim] as i64;
            ranges[dim] = if pbc[dim] {
                (0, n)
            } else if self.infinite_domain {
                (1, n)
            } else {
                (0, n + 1)
            };
        }

        let mut extraction = Extraction::new(self, shape, pbc);
        let slabs = (ranges[2].1 - ranges[2].0) as u64;
        task.set_progress_maximum(slabs);
        for (slab, k) in (ranges[2].0..ranges[2].1).enumerate() {
            if !task.set_progress_value(slab as u64) {
                return Ok(None);
            }
            for j in ranges[1].0..ranges[1].1 {
                for i in ranges[0].0..ranges[0].1 {
                    extraction.process_cube([i, j, k]);
                }
            }
        }
        if !task.set_progress_value(slabs) {
            return Ok(None);
        }

        debug!(
            vertices = extraction.positions.len(),
            triangles = extraction.triangles.len(),
            tunnels = extraction.tunnels,
            "Marching cubes finished"
        );
        extraction.into_mesh().map(Some)
    }
}

/// A surface vertex referenced by the cube being processed, with its
/// position in the cube's unwrapped frame.
#[derive(Debug, Clone, Copy)]
struct Node {
    vertex: u32,
    local: DVec3,
}

/// Sign data of the cube being processed, in padded coordinates.
struct Cube {
    base: [i64; 3],
    /// Corner values shifted so that `s > 0` (or `s >= 0` when the lower
    /// side is solid) means solid.
    s: [f64; 8],
    pattern: u8,
}

impl Cube {
    #[inline]
    fn is_solid(&self, corner: usize) -> bool {
        (self.pattern >> corner) & 1 == 1
    }
}

struct Extraction<'f, S: VoxelSampler> {
    field: &'f S,
    isolevel: f64,
    lower_is_solid: bool,
    shape: [i64; 3],
    pbc: [bool; 3],
    /// Padded index minus field index per axis.
    offset: [i64; 3],
    cache_dims: [usize; 3],
    edge_cache: Vec<u32>,
    positions: Vec<DVec3>,
    triangles: Vec<[u32; 3]>,
    tunnels: usize,
    nodes: Vec<Node>,
    edge_nodes: [Option<usize>; 12],
}

impl<'f, S: VoxelSampler> Extraction<'f, S> {
    fn new(params: &MarchingCubes<'f, S>, shape: [usize; 3], pbc: [bool; 3]) -> Self {
        let mut cache_dims = [0usize; 3];
        let mut offset = [0i64; 3];
        for dim in 0..3 {
            cache_dims[dim] = if pbc[dim] { shape[dim] } else { shape[dim] + 2 };
            offset[dim] = if pbc[dim] { 0 } else { 1 };
        }
        Self {
            field: params.field,
            isolevel: params.isolevel,
            lower_is_solid: params.lower_is_solid,
            shape: shape.map(|n| n as i64),
            pbc,
            offset,
            cache_dims,
            edge_cache: vec![NO_VERTEX; cache_dims[0] * cache_dims[1] * cache_dims[2] * 3],
            positions: Vec::new(),
            triangles: Vec::new(),
            tunnels: 0,
            nodes: Vec::with_capacity(16),
            edge_nodes: [None; 12],
        }
    }

    #[inline]
    fn is_solid(&self, s: f64) -> bool {
        if self.lower_is_solid {
            s >= 0.0
        } else {
            s > 0.0
        }
    }

    /// Shifted value at a padded node. Halo nodes are empty.
    fn shifted_value(&self, p: [i64; 3]) -> f64 {
        match self
            .field
            .sample(p[0] - self.offset[0], p[1] - self.offset[1], p[2] - self.offset[2])
        {
            Some(v) if self.lower_is_solid => self.isolevel - v,
            Some(v) => v - self.isolevel,
            None => f64::MIN,
        }
    }

    fn process_cube(&mut self, base: [i64; 3]) {
        let mut s = [0.0; 8];
        let mut pattern = 0u8;
        for (c, value) in s.iter_mut().enumerate() {
            let d = corner_offset(c);
            *value = self.shifted_value([base[0] + d[0], base[1] + d[1], base[2] + d[2]]);
            if self.is_solid(*value) {
                pattern |= 1 << c;
            }
        }
        if pattern == 0 || pattern == u8::MAX {
            return;
        }
        let cube = Cube { base, s, pattern };
        self.nodes.clear();
        self.edge_nodes = [None; 12];

        let crossed = EDGE_MASK[pattern as usize];
        let ambiguous = AMBIGUOUS_FACES[pattern as usize];
        let mut next = [NO_EDGE; 12];
        let mut face_connected = [None; 6];
        for (f, corners) in FACE_CORNERS.iter().enumerate() {
            // (edge, entering the solid side when walking counter-clockwise)
            let mut crossings = [(0usize, false); 4];
            let mut count = 0;
            for q in 0..4 {
                let (p0, p1) = (corners[q], corners[(q + 1) % 4]);
                let e = EDGE_BETWEEN[p0][p1] as usize;
                if (crossed >> e) & 1 == 1 {
                    crossings[count] = (e, cube.is_solid(p1));
                    count += 1;
                }
            }
            if (ambiguous >> f) & 1 == 1 {
                let connected = self.face_solid_connected(&cube, f);
                face_connected[f] = Some(connected);
                for q in 0..4 {
                    if crossings[q].1 {
                        let target = if connected { crossings[(q + 3) % 4] } else { crossings[(q + 1) % 4] };
                        next[crossings[q].0] = target.0 as u8;
                    }
                }
            } else if count == 2 {
                let (entering, exiting) = if crossings[0].1 {
                    (crossings[0].0, crossings[1].0)
                } else {
                    (crossings[1].0, crossings[0].0)
                };
                next[entering] = exiting as u8;
            }
        }

        let mut loops: Vec<Vec<usize>> = Vec::with_capacity(4);
        let mut seen = 0u16;
        for start in 0..12 {
            if next[start] == NO_EDGE || (seen >> start) & 1 == 1 {
                continue;
            }
            let mut contour = Vec::with_capacity(6);
            let mut e = start;
            while (seen >> e) & 1 == 0 {
                seen |= 1 << e;
                contour.push(e);
                if next[e] == NO_EDGE {
                    break;
                }
                e = next[e] as usize;
            }
            loops.push(contour);
        }

        let center = DVec3::new(
            base[0] as f64 + 0.5 - self.offset[0] as f64,
            base[1] as f64 + 0.5 - self.offset[1] as f64,
            base[2] as f64 + 0.5 - self.offset[2] as f64,
        );
        for patch in patches(&cube, &face_connected, &loops) {
            if let &[single] = patch.as_slice() {
                self.polygon(&cube, &loops[single]);
                continue;
            }
            let rings: Vec<Vec<usize>> = patch
                .iter()
                .map(|&l| loops[l].iter().map(|&e| self.edge_node(&cube, e)).collect())
                .collect();
            match &rings[..] {
                [first, second] => self.tunnel(first, second, center),
                _ if rings.len() <= 4 => self.hub(&rings, center),
                _ => {
                    for &l in &patch {
                        self.polygon(&cube, &loops[l]);
                    }
                    continue;
                }
            }
            self.tunnels += 1;
        }
    }

    /// Asymptotic decider: are the two solid corners of an ambiguous face
    /// joined across the face? Evaluated in the canonical corner order so
    /// both cubes sharing the face see the same determinant.
    fn face_solid_connected(&self, cube: &Cube, face: usize) -> bool {
        let [a, b, c, d] = FACE_CANONICAL_CORNERS[face];
        let det = cube.s[a] * cube.s[c] - cube.s[b] * cube.s[d];
        match (cube.is_solid(a), self.lower_is_solid) {
            (true, false) => det > 0.0,
            (true, true) => det >= 0.0,
            (false, false) => det < 0.0,
            (false, true) => det <= 0.0,
        }
    }

    /// Returns the scratch node of the surface vertex on cube edge `e`,
    /// creating the vertex or fetching it from the edge cache.
    fn edge_node(&mut self, cube: &Cube, e: usize) -> usize {
        if let Some(node) = self.edge_nodes[e] {
            return node;
        }
        let (a, b) = EDGE_CORNERS[e];
        let axis = EDGE_AXIS[e];
        let d = corner_offset(a);
        let lower = [cube.base[0] + d[0], cube.base[1] + d[1], cube.base[2] + d[2]];
        let t = cube.s[a] / (cube.s[a] - cube.s[b]);
        let mut local = DVec3::new(
            (lower[0] - self.offset[0]) as f64,
            (lower[1] - self.offset[1]) as f64,
            (lower[2] - self.offset[2]) as f64,
        );
        local[axis] += t;

        let mut key = [0usize; 3];
        for dim in 0..3 {
            key[dim] = if self.pbc[dim] {
                lower[dim].rem_euclid(self.shape[dim]) as usize
            } else {
                lower[dim] as usize
            };
        }
        let slot = ((key[2] * self.cache_dims[1] + key[1]) * self.cache_dims[0] + key[0]) * 3 + axis;
        let vertex = match self.edge_cache[slot] {
            NO_VERTEX => {
                let vertex = self.push_vertex(local);
                self.edge_cache[slot] = vertex;
                vertex
            }
            vertex => vertex,
        };
        self.nodes.push(Node { vertex, local });
        let node = self.nodes.len() - 1;
        self.edge_nodes[e] = Some(node);
        node
    }

    /// Adds an interior vertex (polygon centroid or tunnel waist).
    fn push_node(&mut self, local: DVec3) -> usize {
        let vertex = self.push_vertex(local);
        self.nodes.push(Node { vertex, local });
        self.nodes.len() - 1
    }

    fn push_vertex(&mut self, local: DVec3) -> u32 {
        let mut p = local;
        for dim in 0..3 {
            if self.pbc[dim] {
                let n = self.shape[dim] as f64;
                p[dim] = p[dim].rem_euclid(n);
                if p[dim] >= n {
                    p[dim] -= n;
                }
            }
        }
        self.positions.push(p);
        (self.positions.len() - 1) as u32
    }

    #[inline]
    fn node_distance(&self, a: usize, b: usize) -> f64 {
        self.nodes[a].local.distance(self.nodes[b].local)
    }

    #[inline]
    fn triangle(&mut self, a: usize, b: usize, c: usize) {
        self.triangles
            .push([self.nodes[a].vertex, self.nodes[b].vertex, self.nodes[c].vertex]);
    }

    /// Triangulates one contour loop. Diagonals between two vertices on the
    /// same cube face are avoided: such a diagonal would coincide with an
    /// edge of the neighboring cube's triangulation.
    fn polygon(&mut self, cube: &Cube, contour: &[usize]) {
        let n = contour.len();
        if n < 3 {
            return;
        }
        let v: Vec<usize> = contour.iter().map(|&e| self.edge_node(cube, e)).collect();
        let share_face = |x: usize, y: usize| EDGE_FACES[contour[x]] & EDGE_FACES[contour[y]] != 0;
        match n {
            3 => self.triangle(v[0], v[1], v[2]),
            4 => {
                let ok02 = !share_face(0, 2);
                let ok13 = !share_face(1, 3);
                let mut v = v;
                if ok13 && (!ok02 || self.node_distance(v[1], v[3]) < self.node_distance(v[0], v[2])) {
                    v.rotate_left(1);
                } else if !ok02 {
                    self.centroid_fan(&v);
                    return;
                }
                self.triangle(v[0], v[1], v[2]);
                self.triangle(v[0], v[2], v[3]);
            }
            5 | 6 => {
                let apex = (0..n).find(|&a| (2..n - 1).all(|t| !share_face(a, (a + t) % n)));
                match apex {
                    Some(a) => {
                        for q in 1..n - 1 {
                            self.triangle(v[a], v[(a + q) % n], v[(a + q + 1) % n]);
                        }
                    }
                    None => self.centroid_fan(&v),
                }
            }
            _ => self.centroid_fan(&v),
        }
    }

    fn centroid_fan(&mut self, v: &[usize]) {
        let centroid = v.iter().map(|&node| self.nodes[node].local).sum::<DVec3>() / v.len() as f64;
        let c = self.push_node(centroid);
        for q in 0..v.len() {
            self.triangle(v[q], v[(q + 1) % v.len()], c);
        }
    }

    /// Joins two contour loops of the same cube by a tube with a waist ring
    /// pulled towards the cube center.
    fn tunnel(&mut self, first: &[usize], second: &[usize], center: DVec3) {
        let mut waist = Vec::with_capacity(first.len());
        for &a in first {
            let pa = self.nodes[a].local;
            let b = second
                .iter()
                .copied()
                .min_by(|&x, &y| {
                    pa.distance(self.nodes[x].local)
                        .total_cmp(&pa.distance(self.nodes[y].local))
                })
                .unwrap_or(a);
            let p = 0.25 * pa + 0.25 * self.nodes[b].local + 0.5 * center;
            waist.push(self.push_node(p));
        }
        let reversed: Vec<usize> = waist.iter().rev().copied().collect();
        self.strip(first, &reversed);
        self.strip(&waist, second);
    }

    /// Joins three or more contour loops of one patch through a small
    /// octahedron around the cube center. Each loop is stitched to its own
    /// face out of four that pairwise share no edge, and the remaining faces
    /// close the patch.
    fn hub(&mut self, rings: &[Vec<usize>], center: DVec3) {
        let mut corners = [0usize; 6];
        for (slot, corner) in corners.iter_mut().enumerate() {
            let mut offset = DVec3::ZERO;
            offset[slot / 2] = if slot % 2 == 0 { HUB_RADIUS } else { -HUB_RADIUS };
            *corner = self.push_node(center + offset);
        }

        // Loops circulate against their hole when the octahedron faces
        // point outwards and the loop normals point towards the center.
        let mut twist = 0.0;
        let mut directions = Vec::with_capacity(rings.len());
        for ring in rings {
            let points: Vec<DVec3> = ring.iter().map(|&node| self.nodes[node].local).collect();
            let centroid = points.iter().sum::<DVec3>() / points.len() as f64;
            let mut area = DVec3::ZERO;
            for q in 0..points.len() {
                area += (points[q] - centroid).cross(points[(q + 1) % points.len()] - centroid);
            }
            let direction = (centroid - center).normalize_or_zero();
            twist += area.dot(direction);
            directions.push(direction);
        }
        let outward = twist < 0.0;

        // Faces by octant; the first four are mutually edge-disjoint.
        let octants = [
            [1.0, 1.0, 1.0],
            [1.0, -1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [-1.0, -1.0, -1.0],
            [-1.0, 1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, -1.0],
        ];
        let faces = octants.map(|[sx, sy, sz]| {
            let pick = |axis: usize, sign: f64| corners[2 * axis + usize::from(sign < 0.0)];
            let (x, y, z) = (pick(0, sx), pick(1, sy), pick(2, sz));
            let ccw = if sx * sy * sz > 0.0 { [x, y, z] } else { [x, z, y] };
            if outward {
                ccw
            } else {
                [ccw[0], ccw[2], ccw[1]]
            }
        });

        let holes = hole_assignment(&directions, &octants);
        for (f, face) in faces.iter().enumerate() {
            match holes.iter().position(|&h| h == f) {
                Some(r) => self.strip(&rings[r], face),
                None => self.triangle(face[0], face[1], face[2]),
            }
        }
    }

    /// Stitches a triangle strip between two loops of opposite orientation,
    /// advancing along whichever loop gives the shorter new diagonal.
    fn strip(&mut self, a: &[usize], b: &[usize]) {
        let (n, m) = (a.len(), b.len());
        if n == 0 || m == 0 {
            return;
        }
        let mut b: Vec<usize> = b.iter().rev().copied().collect();
        let start = (0..m)
            .min_by(|&x, &y| self.node_distance(a[0], b[x]).total_cmp(&self.node_distance(a[0], b[y])))
            .unwrap_or(0);
        b.rotate_left(start);

        let (mut i, mut j) = (0, 0);
        let (mut last_j_at_a0, mut last_i_at_b0) = (0, 0);
        while i < n || j < m {
            let can_a = i < n && (i + 1 < n || j > last_j_at_a0);
            let can_b = j < m && (j + 1 < m || i > last_i_at_b0);
            if !can_a && !can_b {
                break;
            }
            let advance_a = can_a
                && (!can_b || self.node_distance(a[(i + 1) % n], b[j % m]) <= self.node_distance(a[i % n], b[(j + 1) % m]));
            if advance_a {
                self.triangle(a[i % n], a[(i + 1) % n], b[j % m]);
                i += 1;
                if j == 0 {
                    last_i_at_b0 = i;
                }
            } else {
                self.triangle(b[(j + 1) % m], b[j % m], a[i % n]);
                j += 1;
                if i == 0 {
                    last_j_at_a0 = j;
                }
            }
        }
    }

    fn into_mesh(self) -> Result<SurfaceMesh, IsosurfaceError> {
        let mut extent = DVec3::ZERO;
        for dim in 0..3 {
            let n = self.shape[dim] as f64;
            extent[dim] = if self.pbc[dim] { n } else { (n - 1.0).max(1.0) };
        }
        let domain = SimulationCell::new(DMat3::from_diagonal(extent), DVec3::ZERO, self.pbc);
        let mut mesh = SurfaceMesh::with_capacity(domain, self.positions.len(), self.triangles.len());
        for p in self.positions {
            mesh.create_vertex(p);
        }
        let region = mesh.create_region(true);
        for t in self.triangles {
            mesh.create_face(&[VertexId(t[0]), VertexId(t[1]), VertexId(t[2])], Some(region))?;
        }
        Ok(mesh)
    }
}

/// Union-find over the eight cube corners.
#[derive(Debug, Clone, Copy)]
struct CornerSets([usize; 8]);

impl CornerSets {
    fn new() -> Self {
        Self([0, 1, 2, 3, 4, 5, 6, 7])
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.0[x] != x {
            self.0[x] = self.0[self.0[x]];
            x = self.0[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.0[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Groups the corners of one side (`solid` or empty) into components,
/// joined along cube edges and across faces whose decider connects that
/// side.
fn face_corner_sets(pattern: u8, face_connected: &[Option<bool>; 6], solid: bool) -> CornerSets {
    let member = |c: usize| ((pattern >> c) & 1 == 1) == solid;
    let mut sets = CornerSets::new();
    for &(a, b) in EDGE_CORNERS.iter() {
        if member(a) && member(b) {
            sets.union(a, b);
        }
    }
    for (f, connected) in face_connected.iter().enumerate() {
        if *connected == Some(solid) {
            let corners = FACE_CORNERS[f];
            for q in 0..2 {
                let (a, b) = (corners[q], corners[q + 2]);
                if member(a) && member(b) {
                    sets.union(a, b);
                }
            }
        }
    }
    sets
}

fn compact_labels(mut sets: CornerSets, member: impl Fn(usize) -> bool) -> [u8; 8] {
    let mut labels = [u8::MAX; 8];
    let mut roots: Vec<usize> = Vec::with_capacity(4);
    for c in 0..8 {
        if !member(c) {
            continue;
        }
        let root = sets.find(c);
        let label = match roots.iter().position(|&r| r == root) {
            Some(label) => label,
            None => {
                roots.push(root);
                roots.len() - 1
            }
        };
        labels[c] = label as u8;
    }
    labels
}

/// Components of one side of the cube, joined along edges, across faces
/// and, for interior-ambiguous cases, through the cube interior.
fn side_components(cube: &Cube, face_connected: &[Option<bool>; 6], solid: bool) -> [u8; 8] {
    let member = |c: usize| cube.is_solid(c) == solid;
    let mut sets = face_corner_sets(cube.pattern, face_connected, solid);
    let analytic = cube.s.iter().all(|s| s.abs() < INTERIOR_VALUE_LIMIT);
    if analytic && has_interior_ambiguity(cube.pattern) {
        let sign = if solid { 1.0 } else { -1.0 };
        let interior = interior_components(&cube.s.map(|s| sign * s));
        for a in (0..8).filter(|&a| member(a)) {
            for b in (a + 1..8).filter(|&b| member(b)) {
                if interior[a].is_some() && interior[a] == interior[b] {
                    sets.union(a, b);
                }
            }
        }
    }
    compact_labels(sets, member)
}

/// Splits the contour loops of a cube into surface patches: loops whose
/// solid side lies in the same solid component and whose empty side lies
/// in the same empty component bound one connected piece of surface.
fn patches(cube: &Cube, face_connected: &[Option<bool>; 6], loops: &[Vec<usize>]) -> Vec<Vec<usize>> {
    if loops.len() < 2 {
        return (0..loops.len()).map(|l| vec![l]).collect();
    }
    let solid = side_components(cube, face_connected, true);
    let empty = side_components(cube, face_connected, false);
    let mut patches: Vec<((u8, u8), Vec<usize>)> = Vec::with_capacity(loops.len());
    for (l, contour) in loops.iter().enumerate() {
        let (a, b) = EDGE_CORNERS[contour[0]];
        let (inside, outside) = if cube.is_solid(a) { (a, b) } else { (b, a) };
        let key = (solid[inside], empty[outside]);
        match patches.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(l),
            None => patches.push((key, vec![l])),
        }
    }
    patches.into_iter().map(|(_, members)| members).collect()
}

/// Connects the positive corners of a cube through the trilinear
/// interpolant of `values`. Returns a component id per positive corner.
///
/// The cube is swept by planes of constant z. Each slice carries a bilinear
/// function whose corner values move linearly with z, so its positive set
/// only changes topology where a vertical edge value or the slice saddle
/// determinant `v00 v11 - v10 v01` changes sign. Between those roots one
/// sample per interval decides the slice exactly, and consecutive slices
/// are joined through the vertical edges that stay positive.
fn interior_components(values: &[f64; 8]) -> [Option<usize>; 8] {
    let lower = [values[0], values[1], values[2], values[3]];
    let rise = [
        values[4] - values[0],
        values[5] - values[1],
        values[6] - values[2],
        values[7] - values[3],
    ];

    let mut breaks = vec![0.0, 1.0];
    for k in 0..4 {
        let upper = lower[k] + rise[k];
        if (lower[k] > 0.0) != (upper > 0.0) {
            breaks.push(lower[k] / (lower[k] - upper));
        }
    }
    let q2 = rise[0] * rise[3] - rise[1] * rise[2];
    let q1 = lower[0] * rise[3] + rise[0] * lower[3] - lower[1] * rise[2] - rise[1] * lower[2];
    let q0 = lower[0] * lower[3] - lower[1] * lower[2];
    breaks.extend(quadratic_roots(q2, q1, q0));
    breaks.retain(|t| (0.0..=1.0).contains(t));
    breaks.sort_by(f64::total_cmp);
    breaks.dedup();

    // Node `4 i + k`: slice corner `k` in interval `i`.
    let intervals = breaks.len() - 1;
    let mut parent: Vec<usize> = (0..4 * intervals).collect();
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    let union = |parent: &mut Vec<usize>, a: usize, b: usize| {
        let (ra, rb) = (find(parent, a), find(parent, b));
        if ra != rb {
            parent[ra.max(rb)] = ra.min(rb);
        }
    };

    let mut previous: Option<[bool; 4]> = None;
    for i in 0..intervals {
        let t = 0.5 * (breaks[i] + breaks[i + 1]);
        let v: [f64; 4] = std::array::from_fn(|k| lower[k] + rise[k] * t);
        let positive = v.map(|x| x > 0.0);
        // Slice corners in cyclic order 0, 1, 3, 2.
        for (a, b) in [(0, 1), (1, 3), (3, 2), (2, 0)] {
            if positive[a] && positive[b] {
                union(&mut parent, 4 * i + a, 4 * i + b);
            }
        }
        let saddle = v[0] * v[3] - v[1] * v[2];
        if positive[0] && positive[3] && !positive[1] && !positive[2] && saddle > 0.0 {
            union(&mut parent, 4 * i, 4 * i + 3);
        }
        if positive[1] && positive[2] && !positive[0] && !positive[3] && saddle < 0.0 {
            union(&mut parent, 4 * i + 1, 4 * i + 2);
        }
        if let Some(before) = previous {
            for k in 0..4 {
                if before[k] && positive[k] {
                    union(&mut parent, 4 * (i - 1) + k, 4 * i + k);
                }
            }
        }
        previous = Some(positive);
    }

    let mut components = [None; 8];
    for (c, component) in components.iter_mut().enumerate() {
        if values[c] > 0.0 {
            let node = if c < 4 { c } else { 4 * (intervals - 1) + c - 4 };
            *component = Some(find(&mut parent, node));
        }
    }
    components
}

/// Real roots of `a t^2 + b t + c`, degrading to the linear case when the
/// quadratic term vanishes.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() <= 1e-12 * (b.abs() + c.abs()) {
        return if b == 0.0 { Vec::new() } else { vec![-c / b] };
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }
    let q = -0.5 * (b + discriminant.sqrt().copysign(b));
    let mut roots = vec![q / a];
    if q != 0.0 {
        roots.push(c / q);
    }
    roots
}

/// Matches each loop direction to one of the first four octant faces,
/// maximizing the total alignment. Returns the face index per loop.
fn hole_assignment(directions: &[DVec3], octants: &[[f64; 3]; 8]) -> Vec<usize> {
    let normals: Vec<DVec3> = octants[..4].iter().map(|&o| DVec3::from_array(o).normalize()).collect();
    let mut best = (f64::NEG_INFINITY, Vec::new());
    let mut order = [0usize, 1, 2, 3];
    // Heap's algorithm over the 24 orderings.
    let mut counters = [0usize; 4];
    let mut score = |order: &[usize; 4]| {
        let total: f64 = directions.iter().zip(order).map(|(d, &f)| d.dot(normals[f])).sum();
        if total > best.0 {
            best = (total, order[..directions.len()].to_vec());
        }
    };
    score(&order);
    let mut i = 0;
    while i < 4 {
        if counters[i] < i {
            if i % 2 == 0 {
                order.swap(0, i);
            } else {
                order.swap(counters[i], i);
            }
            score(&order);
            counters[i] += 1;
            i = 0;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    best.1
}
