//! # Periodic Vertex Weld
//!
//! Merges vertices that coincide under the minimum image convention. Meshes
//! assembled from per-replica pieces carry one vertex copy per replica; the
//! weld joins them with a union-find and moves every half-edge of a removed
//! copy onto the surviving representative before compacting the vertex
//! arrays.

use std::collections::HashMap;

use glam::DVec3;
use tracing::debug;

use crate::error::MeshError;
use crate::mesh::{SurfaceMesh, VertexId};

/// Disjoint-set forest over vertex indices. The smallest index of a set is
/// its root.
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi as usize] = lo;
        }
    }
}

/// Welds vertices closer than `relative_tolerance` times the longest edge
/// adjacent to either of them. Returns the number of removed vertices.
///
/// # Example
///
/// ```rust
/// use surface_mesh::{ops::weld_periodic_vertices, SimulationCell, SurfaceMesh};
/// use glam::DVec3;
///
/// let mut mesh = SurfaceMesh::new(SimulationCell::cubic(10.0));
/// let a = mesh.create_vertex(DVec3::new(0.0, 1.0, 1.0));
/// let b = mesh.create_vertex(DVec3::new(1.0, 1.0, 1.0));
/// let c = mesh.create_vertex(DVec3::new(0.0, 2.0, 1.0));
/// // Periodic image of `a` used by a second face.
/// let a2 = mesh.create_vertex(DVec3::new(10.0, 1.0, 1.0));
/// let d = mesh.create_vertex(DVec3::new(9.0, 1.0, 1.0));
/// mesh.create_face(&[a, b, c], None).unwrap();
/// mesh.create_face(&[a2, c, d], None).unwrap();
/// assert_eq!(weld_periodic_vertices(&mut mesh, 1e-9).unwrap(), 1);
/// assert_eq!(mesh.vertex_count(), 4);
/// ```
pub fn weld_periodic_vertices(mesh: &mut SurfaceMesh, relative_tolerance: f64) -> Result<usize, MeshError> {
    if !(relative_tolerance > 0.0) {
        return Err(MeshError::invalid_parameter(format!(
            "weld tolerance must be positive, got {relative_tolerance}"
        )));
    }
    let n = mesh.vertex_count();
    if n < 2 {
        return Ok(0);
    }

    // Per-vertex weld radius from the longest adjacent edge.
    let mut thresholds = vec![0.0f64; n];
    for e in mesh.edges() {
        let length = mesh.edge_vector(e).length();
        for v in [mesh.vertex1(e), mesh.vertex2(e)] {
            let t = &mut thresholds[v.index()];
            *t = t.max(length * relative_tolerance);
        }
    }
    let bin_size = thresholds.iter().copied().fold(0.0, f64::max);
    if bin_size <= 0.0 {
        return Ok(0);
    }

    let cell = *mesh.domain();
    let pbc = cell.pbc();
    let mut bins_per_axis = [i64::MAX; 3];
    for dim in 0..3 {
        if pbc[dim] {
            bins_per_axis[dim] = ((cell.cell_height(dim) / bin_size).floor() as i64).clamp(1, 1 << 40);
        }
    }
    let bin_of = |p: DVec3| -> [i64; 3] {
        let r = cell.to_reduced(cell.wrap_point(p));
        let mut key = [0i64; 3];
        for dim in 0..3 {
            if pbc[dim] {
                let nb = bins_per_axis[dim];
                key[dim] = ((r[dim] * nb as f64).floor() as i64).rem_euclid(nb);
            } else {
                key[dim] = (r[dim] * cell.cell_height(dim) / bin_size).floor() as i64;
            }
        }
        key
    };

    let mut grid: HashMap<[i64; 3], Vec<u32>> = HashMap::new();
    for v in 0..n {
        grid.entry(bin_of(mesh.positions()[v])).or_default().push(v as u32);
    }

    let mut sets = UnionFind::new(n);
    let mut neighbor_keys = Vec::with_capacity(27);
    for v in 0..n {
        let p = mesh.positions()[v];
        let key = bin_of(p);
        neighbor_keys.clear();
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                for dz in -1..=1i64 {
                    let mut k = [key[0] + dx, key[1] + dy, key[2] + dz];
                    for dim in 0..3 {
                        if pbc[dim] {
                            k[dim] = k[dim].rem_euclid(bins_per_axis[dim]);
                        }
                    }
                    if !neighbor_keys.contains(&k) {
                        neighbor_keys.push(k);
                    }
                }
            }
        }
        for k in &neighbor_keys {
            let Some(candidates) = grid.get(k) else {
                continue;
            };
            for &w in candidates {
                if w as usize <= v {
                    continue;
                }
                let radius = thresholds[v].max(thresholds[w as usize]);
                if cell.wrap_vector(mesh.positions()[w as usize] - p).length() <= radius {
                    sets.union(v as u32, w);
                }
            }
        }
    }

    let mut merged = 0;
    for v in 0..n as u32 {
        let root = sets.find(v);
        if root == v {
            continue;
        }
        let outgoing: Vec<_> = mesh.vertex_edges(VertexId(v)).collect();
        for e in outgoing {
            mesh.transfer_edge_to_vertex(e, VertexId(v), VertexId(root));
        }
        merged += 1;
    }
    if merged > 0 {
        mesh.delete_isolated_vertices();
        debug!(merged, remaining = mesh.vertex_count(), "Welded periodic vertices");
    }
    Ok(merged)
}
