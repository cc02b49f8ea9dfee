//! # Cell Classification and Region Flood Fill
//!
//! Every Delaunay cell carries a region code in its user field:
//!
//! - `>= 0`: id of the mesh region the cell belongs to
//! - [`EXTERIOR`]: not part of any region (open space of a one-sided mesh,
//!   infinite cells, unmatched ghost cells)
//! - [`UNASSIGNED`]: filled, waiting for the flood fill
//!
//! Only owned cells are flood filled. Ghost cells receive the code of the
//! owned cell connecting the same four particles.

use std::collections::{HashMap, VecDeque};

use delaunay::DelaunayTessellation;
use surface_mesh::TaskToken;
use tracing::debug;

pub(crate) const EXTERIOR: i64 = -1;
pub(crate) const UNASSIGNED: i64 = -2;

/// Maps every finite cell to the owned cell with the same particles.
/// Owned cells map to themselves; infinite and unmatched ghost cells map to
/// `None`.
pub(crate) fn primary_cells(tess: &DelaunayTessellation) -> Vec<Option<usize>> {
    let mut owned_by_key = HashMap::new();
    for c in tess.cells() {
        if tess.is_finite_cell(c) && !tess.is_ghost_cell(c) {
            owned_by_key.insert(tess.cell_point_key(c), c);
        }
    }
    tess.cells()
        .map(|c| {
            if !tess.is_finite_cell(c) {
                None
            } else if !tess.is_ghost_cell(c) {
                Some(c)
            } else {
                owned_by_key.get(&tess.cell_point_key(c)).copied()
            }
        })
        .collect()
}

#[inline]
pub(crate) fn is_owned(primary: &[Option<usize>], cell: usize) -> bool {
    primary[cell] == Some(cell)
}

/// Applies the alpha criterion to every cell.
///
/// Filled cells get the largest cluster id among their particles when
/// `cluster_ids` is given, [`UNASSIGNED`] when `flood_fill` is set, and
/// region 0 otherwise. Returns `false` if canceled.
pub(crate) fn classify_cells(
    tess: &mut DelaunayTessellation,
    alpha: f64,
    cluster_ids: Option<&[i64]>,
    flood_fill: bool,
    task: &TaskToken,
) -> bool {
    task.set_progress_maximum(tess.cell_count() as u64);
    let mut filled = 0usize;
    for c in tess.cells() {
        if !task.set_progress_value_intermittent(c as u64) {
            return false;
        }
        let code = if tess.is_valid_cell(c) && tess.alpha_test(c, alpha) {
            filled += 1;
            match cluster_ids {
                Some(ids) => tess
                    .cell_vertices(c)
                    .iter()
                    .filter_map(|&v| tess.vertex_particle(v))
                    .map(|p| ids[p].max(0))
                    .max()
                    .unwrap_or(0),
                None if flood_fill => UNASSIGNED,
                None => 0,
            }
        } else {
            EXTERIOR
        };
        tess.set_user_field(c, code);
    }
    debug!(cells = tess.cell_count(), filled, "Classified Delaunay cells");
    !task.is_canceled()
}

/// Groups connected owned cells whose code satisfies `selects` into new
/// regions numbered from `first_region`. Returns the volume of each new
/// region, or `None` if canceled.
pub(crate) fn flood_fill(
    tess: &mut DelaunayTessellation,
    primary: &[Option<usize>],
    first_region: usize,
    selects: impl Fn(i64) -> bool,
    task: &TaskToken,
) -> Option<Vec<f64>> {
    let mut volumes = Vec::new();
    let mut queue = VecDeque::new();
    for seed in tess.cells() {
        if !is_owned(primary, seed) || !selects(tess.user_field(seed)) {
            continue;
        }
        if !task.set_progress_value_intermittent(seed as u64) {
            return None;
        }
        let region = (first_region + volumes.len()) as i64;
        let mut volume = 0.0;
        tess.set_user_field(seed, region);
        queue.push_back(seed);
        while let Some(current) = queue.pop_front() {
            volume += tess.cell_volume(current);
            for f in 0..4 {
                let Some(next) = tess.cell_neighbor(current, f).and_then(|n| primary[n]) else {
                    continue;
                };
                if selects(tess.user_field(next)) {
                    tess.set_user_field(next, region);
                    queue.push_back(next);
                }
            }
        }
        volumes.push(volume);
    }
    if task.is_canceled() {
        return None;
    }
    Some(volumes)
}

/// Sums the volumes of the owned cells per region code.
pub(crate) fn region_volumes(tess: &DelaunayTessellation, primary: &[Option<usize>], region_count: usize) -> Vec<f64> {
    let mut volumes = vec![0.0; region_count];
    for c in tess.cells() {
        let code = tess.user_field(c);
        if is_owned(primary, c) && code >= 0 && (code as usize) < region_count {
            volumes[code as usize] += tess.cell_volume(c);
        }
    }
    volumes
}

/// Copies the code of each owned cell onto its ghost copies. Ghost cells
/// without an owned counterpart become [`EXTERIOR`].
pub(crate) fn propagate_to_ghosts(tess: &mut DelaunayTessellation, primary: &[Option<usize>]) {
    for c in tess.cells() {
        if is_owned(primary, c) {
            continue;
        }
        let code = primary[c].map_or(EXTERIOR, |p| tess.user_field(p));
        tess.set_user_field(c, code);
    }
}

/// Returns the region shared by all owned cells, if there is one.
pub(crate) fn space_filling_region(tess: &DelaunayTessellation, primary: &[Option<usize>]) -> Option<usize> {
    let mut codes = tess.cells().filter(|&c| is_owned(primary, c)).map(|c| tess.user_field(c));
    let first = codes.next()?;
    (first >= 0 && codes.all(|code| code == first)).then_some(first as usize)
}
