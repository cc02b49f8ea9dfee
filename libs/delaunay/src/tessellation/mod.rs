//! # Delaunay Tessellation
//!
//! Incremental Bowyer-Watson construction inside an enclosing
//! super-tetrahedron. The super-tetrahedron's corners stay in the final
//! structure as infinite vertices, so every facet of the tessellation has a
//! cell on both sides and the convex hull is bounded by infinite cells.
//!
//! ## Cell layout
//!
//! Cells are positively oriented (see [`crate::predicates`]). Facet `f` of
//! a cell lies opposite its vertex `f`; [`FACET_VERTICES`] lists the facet
//! corners counterclockwise seen from outside the cell. `neighbor(c, f)` is
//! the cell across facet `f`.

use std::collections::HashMap;

use glam::DVec3;
use surface_mesh::{SimulationCell, TaskToken};
use tracing::{debug, warn};

use crate::error::DelaunayError;
use crate::ghost::{build_point_set, Vertex, VertexKind};
use crate::predicates::{circumsphere, in_sphere, orient, signed_volume};

#[cfg(test)]
mod tests;

/// Corners of facet `f`, counterclockwise seen from outside the cell.
pub const FACET_VERTICES: [[usize; 3]; 4] = [[1, 3, 2], [0, 2, 3], [0, 3, 1], [0, 1, 2]];

/// Marker for a missing neighbor.
const NO_CELL: usize = usize::MAX;

/// Size of the super-tetrahedron relative to the extent of the input.
const SUPER_SCALE: f64 = 1.0e4;

/// Cell-local index of the `v`-th corner of facet `f`.
#[inline]
pub fn cell_facet_vertex_index(f: usize, v: usize) -> usize {
    FACET_VERTICES[f][v]
}

/// Cell/neighbor arrays shared by the builder and the finished tessellation.
#[derive(Debug, Clone, Default)]
struct Topology {
    cells: Vec<[usize; 4]>,
    neighbors: Vec<[usize; 4]>,
}

enum Walk {
    Found(usize),
    Outside,
    Lost,
}

impl Topology {
    fn facet(&self, vertices: &[Vertex], cell: usize, f: usize) -> [DVec3; 3] {
        let c = self.cells[cell];
        FACET_VERTICES[f].map(|i| vertices[c[i]].position)
    }

    fn corners(&self, vertices: &[Vertex], cell: usize) -> [DVec3; 4] {
        self.cells[cell].map(|v| vertices[v].position)
    }

    /// Visibility walk towards `p`. The facet test order rotates with every
    /// step so the walk cannot cycle on degenerate configurations.
    fn walk(&self, vertices: &[Vertex], start: usize, p: DVec3, max_steps: usize) -> Walk {
        let mut cell = start;
        for step in 0..max_steps {
            let mut next = None;
            for k in 0..4 {
                let f = (k + step) % 4;
                let [a, b, c] = self.facet(vertices, cell, f);
                if orient(a, b, c, p) < 0.0 {
                    next = Some(self.neighbors[cell][f]);
                    break;
                }
            }
            match next {
                None => return Walk::Found(cell),
                Some(NO_CELL) => return Walk::Outside,
                Some(n) => cell = n,
            }
        }
        Walk::Lost
    }

    fn contains(&self, vertices: &[Vertex], cell: usize, p: DVec3) -> bool {
        (0..4).all(|f| {
            let [a, b, c] = self.facet(vertices, cell, f);
            orient(a, b, c, p) >= 0.0
        })
    }

    fn back_index(&self, cell: usize, neighbor: usize) -> Option<usize> {
        self.neighbors[neighbor].iter().position(|&n| n == cell)
    }
}

/// A facet on the boundary of an insertion cavity.
struct CavityFacet {
    corners: [usize; 3],
    outside: usize,
    back: usize,
}

enum Boundary {
    Closed(Vec<CavityFacet>),
    /// A facet is not visible from the new point; the cell behind it joins.
    Grow(usize),
    Blocked,
}

enum Insertion {
    Inserted,
    Duplicate,
    Rejected,
}

/// Incremental construction state.
struct Builder<'a> {
    vertices: &'a [Vertex],
    topo: Topology,
    alive: Vec<bool>,
    free: Vec<usize>,
    stamp: Vec<u32>,
    epoch: u32,
    hint: usize,
    live: usize,
}

impl<'a> Builder<'a> {
    fn new(vertices: &'a [Vertex]) -> Self {
        let mut builder = Self {
            vertices,
            topo: Topology::default(),
            alive: Vec::new(),
            free: Vec::new(),
            stamp: Vec::new(),
            epoch: 0,
            hint: 0,
            live: 0,
        };
        builder.allocate([0, 1, 2, 3]);
        builder
    }

    fn allocate(&mut self, corners: [usize; 4]) -> usize {
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            self.topo.cells[slot] = corners;
            self.topo.neighbors[slot] = [NO_CELL; 4];
            self.alive[slot] = true;
            return slot;
        }
        self.topo.cells.push(corners);
        self.topo.neighbors.push([NO_CELL; 4]);
        self.alive.push(true);
        self.stamp.push(0);
        self.topo.cells.len() - 1
    }

    fn release(&mut self, cell: usize) {
        self.alive[cell] = false;
        self.free.push(cell);
        self.live -= 1;
    }

    fn next_epoch(&mut self) -> u32 {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamp.iter_mut().for_each(|s| *s = 0);
            self.epoch = 1;
        }
        self.epoch
    }

    fn locate(&self, p: DVec3) -> Option<usize> {
        let start = if self.alive[self.hint] {
            self.hint
        } else {
            self.alive.iter().position(|&a| a)?
        };
        match self.topo.walk(self.vertices, start, p, self.live + 16) {
            Walk::Found(cell) => Some(cell),
            Walk::Outside => None,
            Walk::Lost => (0..self.topo.cells.len()).find(|&c| self.alive[c] && self.topo.contains(self.vertices, c, p)),
        }
    }

    fn insert(&mut self, v: usize) -> Insertion {
        let p = self.vertices[v].position;
        let Some(start) = self.locate(p) else {
            return Insertion::Rejected;
        };
        if self.topo.cells[start].iter().any(|&u| self.vertices[u].position == p) {
            return Insertion::Duplicate;
        }

        // Cells whose circumsphere contains p.
        let epoch = self.next_epoch();
        self.stamp[start] = epoch;
        let mut cavity = vec![start];
        let mut i = 0;
        while i < cavity.len() {
            let cell = cavity[i];
            i += 1;
            for f in 0..4 {
                let n = self.topo.neighbors[cell][f];
                if n == NO_CELL || self.stamp[n] == epoch {
                    continue;
                }
                let [a, b, c, d] = self.topo.corners(self.vertices, n);
                if in_sphere(a, b, c, d, p) > 0.0 {
                    self.stamp[n] = epoch;
                    cavity.push(n);
                }
            }
        }

        // Grow the cavity until p sees every boundary facet from inside.
        let boundary = loop {
            match self.cavity_boundary(&cavity, epoch, p) {
                Boundary::Closed(boundary) => break boundary,
                Boundary::Grow(n) => {
                    self.stamp[n] = epoch;
                    cavity.push(n);
                }
                Boundary::Blocked => return Insertion::Rejected,
            }
        };

        // The boundary must be a closed surface touching every cavity vertex.
        let mut edge_uses: HashMap<(usize, usize), u32> = HashMap::new();
        for facet in &boundary {
            for k in 0..3 {
                let (a, b) = (facet.corners[k], facet.corners[(k + 1) % 3]);
                *edge_uses.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        if edge_uses.values().any(|&uses| uses != 2) {
            return Insertion::Rejected;
        }
        let on_boundary = |u: usize| boundary.iter().any(|facet| facet.corners.contains(&u));
        for &cell in &cavity {
            if !self.topo.cells[cell].iter().all(|&u| on_boundary(u)) {
                return Insertion::Rejected;
            }
        }

        for &cell in &cavity {
            self.release(cell);
        }
        let mut open_edges: HashMap<(usize, usize), (usize, usize)> = HashMap::with_capacity(boundary.len() * 3 / 2);
        for facet in &boundary {
            let [a, b, c] = facet.corners;
            let cell = self.allocate([a, b, c, v]);
            self.topo.neighbors[cell][3] = facet.outside;
            if facet.outside != NO_CELL {
                self.topo.neighbors[facet.outside][facet.back] = cell;
            }
            for k in 0..3 {
                let (s, t) = (facet.corners[(k + 1) % 3], facet.corners[(k + 2) % 3]);
                let key = (s.min(t), s.max(t));
                if let Some((other, j)) = open_edges.remove(&key) {
                    self.topo.neighbors[cell][k] = other;
                    self.topo.neighbors[other][j] = cell;
                } else {
                    open_edges.insert(key, (cell, k));
                }
            }
            self.hint = cell;
        }
        Insertion::Inserted
    }

    fn cavity_boundary(&self, cavity: &[usize], epoch: u32, p: DVec3) -> Boundary {
        let mut boundary = Vec::new();
        for &cell in cavity {
            for f in 0..4 {
                let n = self.topo.neighbors[cell][f];
                if n != NO_CELL && self.stamp[n] == epoch {
                    continue;
                }
                let [a, b, c] = self.topo.facet(self.vertices, cell, f);
                if orient(a, b, c, p) <= 0.0 {
                    return if n == NO_CELL { Boundary::Blocked } else { Boundary::Grow(n) };
                }
                let back = if n == NO_CELL {
                    0
                } else {
                    match self.topo.back_index(cell, n) {
                        Some(back) => back,
                        None => return Boundary::Blocked,
                    }
                };
                boundary.push(CavityFacet {
                    corners: FACET_VERTICES[f].map(|k| self.topo.cells[cell][k]),
                    outside: n,
                    back,
                });
            }
        }
        Boundary::Closed(boundary)
    }

    /// Drops dead slots and renumbers the remaining cells.
    fn finish(self) -> Topology {
        let mut remap = vec![NO_CELL; self.topo.cells.len()];
        let mut next = 0;
        for (old, &alive) in self.alive.iter().enumerate() {
            if alive {
                remap[old] = next;
                next += 1;
            }
        }
        let mut topo = Topology {
            cells: Vec::with_capacity(next),
            neighbors: Vec::with_capacity(next),
        };
        for (old, &alive) in self.alive.iter().enumerate() {
            if alive {
                topo.cells.push(self.topo.cells[old]);
                topo.neighbors.push(self.topo.neighbors[old].map(|n| if n == NO_CELL { NO_CELL } else { remap[n] }));
            }
        }
        topo
    }
}

/// Interleaves the low 21 bits of three coordinates.
fn morton_code(x: u64, y: u64, z: u64) -> u64 {
    fn spread(mut v: u64) -> u64 {
        v &= 0x1f_ffff;
        v = (v | v << 32) & 0x1f_0000_0000_ffff;
        v = (v | v << 16) & 0x1f_0000_ff00_00ff;
        v = (v | v << 8) & 0x100f_00f0_0f00_f00f;
        v = (v | v << 4) & 0x10c3_0c30_c30c_30c3;
        v = (v | v << 2) & 0x1249_2492_4924_9249;
        v
    }
    spread(x) | spread(y) << 1 | spread(z) << 2
}

/// Insertion order of the non-infinite vertices: along a Morton curve over
/// their bounding box, ties broken by index.
fn insertion_order(vertices: &[Vertex], first: usize) -> Vec<usize> {
    let lo = vertices[first..].iter().fold(DVec3::INFINITY, |acc, v| acc.min(v.position));
    let hi = vertices[first..].iter().fold(DVec3::NEG_INFINITY, |acc, v| acc.max(v.position));
    let extent = (hi - lo).max(DVec3::splat(f64::MIN_POSITIVE));
    let scale = ((1u64 << 21) - 1) as f64;
    let mut keyed: Vec<(u64, usize)> = (first..vertices.len())
        .map(|v| {
            let r = ((vertices[v].position - lo) / extent).clamp(DVec3::ZERO, DVec3::ONE) * scale;
            (morton_code(r.x as u64, r.y as u64, r.z as u64), v)
        })
        .collect();
    keyed.sort_unstable();
    keyed.into_iter().map(|(_, v)| v).collect()
}

/// Corners of a positively oriented tetrahedron enclosing every vertex.
fn super_tetrahedron(vertices: &[Vertex]) -> [Vertex; 4] {
    let lo = vertices.iter().fold(DVec3::INFINITY, |acc, v| acc.min(v.position));
    let hi = vertices.iter().fold(DVec3::NEG_INFINITY, |acc, v| acc.max(v.position));
    let (center, half) = if vertices.is_empty() {
        (DVec3::ZERO, 1.0)
    } else {
        ((lo + hi) * 0.5, ((hi - lo).max_element() * 0.5).max(1.0))
    };
    let l = SUPER_SCALE * half;
    let mut corners = [
        center + DVec3::splat(-2.0 * l),
        center + DVec3::new(10.0 * l, -2.0 * l, -2.0 * l),
        center + DVec3::new(-2.0 * l, 10.0 * l, -2.0 * l),
        center + DVec3::new(-2.0 * l, -2.0 * l, 10.0 * l),
    ];
    if orient(corners[0], corners[1], corners[2], corners[3]) < 0.0 {
        corners.swap(0, 1);
    }
    corners.map(|position| Vertex {
        position,
        kind: VertexKind::Infinite,
        ghost: false,
    })
}

/// A 3D Delaunay tessellation of a periodic point cloud and its ghost layer.
///
/// # Example
///
/// ```rust
/// use delaunay::DelaunayTessellation;
/// use glam::DVec3;
/// use surface_mesh::{SimulationCell, TaskToken};
///
/// let cell = SimulationCell::orthorhombic(DVec3::splat(4.0), [false; 3]);
/// let points = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z, DVec3::ONE];
/// let tess = DelaunayTessellation::generate(&cell, &points, 1.0, false, None, &TaskToken::new())
///     .unwrap()
///     .unwrap();
/// let volume: f64 = tess.cells().filter(|&c| tess.is_valid_cell(c)).map(|c| tess.cell_volume(c)).sum();
/// assert!((volume - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct DelaunayTessellation {
    cell: SimulationCell,
    vertices: Vec<Vertex>,
    topo: Topology,
    user_fields: Vec<i64>,
    primary_count: usize,
    helper_count: usize,
    particle_count: usize,
}

impl DelaunayTessellation {
    /// Tessellates the selected `positions` together with their periodic
    /// images within `ghost_layer_size` of the primary cell.
    ///
    /// With `cover_domain`, helper points on the cell faces of every
    /// non-periodic axis are added so the space around the points is
    /// covered by finite cells. Data outside the cell pushes those faces
    /// out by the ghost layer. Returns `Ok(None)` if the task was canceled.
    pub fn generate(
        cell: &SimulationCell,
        positions: &[DVec3],
        ghost_layer_size: f64,
        cover_domain: bool,
        selection: Option<&[bool]>,
        task: &TaskToken,
    ) -> Result<Option<Self>, DelaunayError> {
        let points = build_point_set(cell, positions, selection, ghost_layer_size, cover_domain)?;
        let ghost_count = points.vertices.len() - points.primary_count;

        let mut vertices = super_tetrahedron(&points.vertices).to_vec();
        vertices.extend_from_slice(&points.vertices);
        let order = insertion_order(&vertices, 4);

        task.set_progress_maximum(order.len() as u64);
        let mut builder = Builder::new(&vertices);
        let (mut duplicates, mut rejected) = (0usize, 0usize);
        for (step, &v) in order.iter().enumerate() {
            if !task.set_progress_value_intermittent(step as u64) {
                return Ok(None);
            }
            match builder.insert(v) {
                Insertion::Inserted => {}
                Insertion::Duplicate => duplicates += 1,
                Insertion::Rejected => rejected += 1,
            }
        }
        if duplicates > 0 {
            warn!(duplicates, "Skipped duplicate points during Delaunay insertion");
        }
        if rejected > 0 {
            warn!(rejected, "Skipped points whose insertion cavity was degenerate");
        }
        let topo = builder.finish();
        if task.is_canceled() {
            return Ok(None);
        }

        let tessellation = Self {
            cell: *cell,
            user_fields: vec![0; topo.cells.len()],
            topo,
            vertices,
            primary_count: points.primary_count,
            helper_count: points.helper_count,
            particle_count: positions.len(),
        };
        let finite = tessellation.cells().filter(|&c| tessellation.is_finite_cell(c)).count();
        if finite == 0 {
            return Err(DelaunayError::too_few_points(format!(
                "{} points do not span a tetrahedron",
                points.primary_count
            )));
        }
        debug!(
            primary = points.primary_count,
            ghosts = ghost_count,
            helpers = points.helper_count,
            cells = tessellation.cell_count(),
            finite,
            "Built Delaunay tessellation"
        );
        Ok(Some(tessellation))
    }

    /// Cell the tessellation was built in.
    pub fn simulation_cell(&self) -> &SimulationCell {
        &self.cell
    }

    /// Number of vertices, infinite ones included.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of tetrahedra, infinite ones included.
    pub fn cell_count(&self) -> usize {
        self.topo.cells.len()
    }

    /// Iterates over all cell indices.
    pub fn cells(&self) -> std::ops::Range<usize> {
        0..self.topo.cells.len()
    }

    /// Number of points inside the primary cell (particles and helpers).
    pub fn primary_vertex_count(&self) -> usize {
        self.primary_count
    }

    /// Number of cover-domain helper points.
    pub fn helper_vertex_count(&self) -> usize {
        self.helper_count
    }

    /// Length of the position array the tessellation was built from.
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Vertex `v`.
    pub fn vertex(&self, v: usize) -> &Vertex {
        &self.vertices[v]
    }

    /// Inserted position of vertex `v`.
    pub fn vertex_position(&self, v: usize) -> DVec3 {
        self.vertices[v].position
    }

    /// Index of the input point a vertex (or its image) stands for.
    pub fn vertex_particle(&self, v: usize) -> Option<usize> {
        match self.vertices[v].kind {
            VertexKind::Particle(i) => Some(i),
            _ => None,
        }
    }

    /// True for periodic images outside the primary cell.
    pub fn is_ghost_vertex(&self, v: usize) -> bool {
        self.vertices[v].ghost
    }

    /// True for cover-domain helper points.
    pub fn is_helper_vertex(&self, v: usize) -> bool {
        matches!(self.vertices[v].kind, VertexKind::Helper(_))
    }

    /// True for corners of the enclosing tetrahedron.
    pub fn is_infinite_vertex(&self, v: usize) -> bool {
        self.vertices[v].kind == VertexKind::Infinite
    }

    /// Index identifying a point across all its periodic images. Helpers
    /// follow the particles; infinite vertices sort last.
    pub fn vertex_point_index(&self, v: usize) -> usize {
        match self.vertices[v].kind {
            VertexKind::Particle(i) => i,
            VertexKind::Helper(h) => self.particle_count + h,
            VertexKind::Infinite => usize::MAX,
        }
    }

    /// Corner `i` of `cell`.
    pub fn cell_vertex(&self, cell: usize, i: usize) -> usize {
        self.topo.cells[cell][i]
    }

    /// The four corners of `cell`.
    pub fn cell_vertices(&self, cell: usize) -> [usize; 4] {
        self.topo.cells[cell]
    }

    /// Corner positions of `cell`.
    pub fn cell_vertex_positions(&self, cell: usize) -> [DVec3; 4] {
        self.topo.corners(&self.vertices, cell)
    }

    /// Cell across facet `f`. Only the outer facets of the enclosing
    /// tetrahedron have no neighbor.
    pub fn cell_neighbor(&self, cell: usize, f: usize) -> Option<usize> {
        let n = self.topo.neighbors[cell][f];
        (n != NO_CELL).then_some(n)
    }

    /// The same facet seen from the adjacent cell: `(neighbor, facet index)`.
    pub fn mirror_facet(&self, cell: usize, f: usize) -> Option<(usize, usize)> {
        let n = self.cell_neighbor(cell, f)?;
        let back = self.topo.back_index(cell, n)?;
        Some((n, back))
    }

    /// True if no corner is a vertex of the enclosing tetrahedron.
    pub fn is_finite_cell(&self, cell: usize) -> bool {
        self.topo.cells[cell].iter().all(|&v| !self.is_infinite_vertex(v))
    }

    /// True for finite cells spanned by input points only.
    pub fn is_valid_cell(&self, cell: usize) -> bool {
        self.topo.cells[cell]
            .iter()
            .all(|&v| matches!(self.vertices[v].kind, VertexKind::Particle(_)))
    }

    /// Corner with the smallest point index. Among the periodic images of a
    /// cell exactly one has this corner in the primary cell.
    pub fn head_vertex(&self, cell: usize) -> usize {
        let corners = self.topo.cells[cell];
        corners
            .into_iter()
            .min_by_key(|&v| self.vertex_point_index(v))
            .unwrap_or(corners[0])
    }

    /// True if the cell is a periodic image of a cell owned by the primary
    /// cell.
    pub fn is_ghost_cell(&self, cell: usize) -> bool {
        self.is_ghost_vertex(self.head_vertex(cell))
    }

    /// Sorted point indices of the corners; equal for all periodic images
    /// of a cell.
    pub fn cell_point_key(&self, cell: usize) -> [usize; 4] {
        let mut key = self.topo.cells[cell].map(|v| self.vertex_point_index(v));
        key.sort_unstable();
        key
    }

    /// Circumcenter and squared circumradius of a finite cell.
    pub fn circumsphere(&self, cell: usize) -> Option<(DVec3, f64)> {
        if !self.is_finite_cell(cell) {
            return None;
        }
        let [a, b, c, d] = self.cell_vertex_positions(cell);
        circumsphere(a, b, c, d)
    }

    /// Alpha-shape criterion: the squared circumradius does not exceed
    /// `alpha`. Infinite and flat cells fail.
    pub fn alpha_test(&self, cell: usize, alpha: f64) -> bool {
        self.circumsphere(cell).is_some_and(|(_, radius_sq)| radius_sq <= alpha)
    }

    /// Unsigned volume of a cell.
    pub fn cell_volume(&self, cell: usize) -> f64 {
        let [a, b, c, d] = self.cell_vertex_positions(cell);
        signed_volume(a, b, c, d).abs()
    }

    /// Free per-cell integer slot for client algorithms. Starts at zero.
    pub fn user_field(&self, cell: usize) -> i64 {
        self.user_fields[cell]
    }

    /// Stores `value` in the user slot of `cell`.
    pub fn set_user_field(&mut self, cell: usize, value: i64) {
        self.user_fields[cell] = value;
    }

    /// Sets the user slot of every cell to `value`.
    pub fn reset_user_fields(&mut self, value: i64) {
        self.user_fields.iter_mut().for_each(|f| *f = value);
    }

    /// Finds the cell containing `p`, walking from `hint` when given.
    ///
    /// The result may be an infinite cell when `p` lies outside the convex
    /// hull of the points.
    pub fn locate(&self, p: DVec3, hint: Option<usize>) -> Option<usize> {
        if !p.is_finite() || self.topo.cells.is_empty() {
            return None;
        }
        let start = hint.filter(|&c| c < self.topo.cells.len()).unwrap_or(0);
        match self.topo.walk(&self.vertices, start, p, self.topo.cells.len() + 16) {
            Walk::Found(cell) => Some(cell),
            Walk::Outside => None,
            Walk::Lost => self.cells().find(|&c| self.topo.contains(&self.vertices, c, p)),
        }
    }
}
