//! # Cutoff Neighbor Finder
//!
//! Cell-list lookup of all particles within a cutoff radius of a query
//! point, honoring periodic images.
//!
//! Particles are sorted into a grid of bins aligned with the simulation
//! cell. Along periodic axes positions are wrapped into the primary cell
//! and a query visits every periodic image within the cutoff, so a cutoff
//! larger than the cell yields several images of one particle. Along
//! non-periodic axes particles outside the cell are clamped into the
//! boundary bins.

use config::constants::MAX_NEIGHBOR_BINS_PER_DIM;
use glam::DVec3;
use surface_mesh::{SimulationCell, TaskToken};

use crate::error::ConstructError;

/// One particle image found by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the particle in the input array.
    pub index: usize,
    /// Vector from the query point to the particle image.
    pub delta: DVec3,
    /// Squared length of `delta`.
    pub distance_squared: f64,
}

/// Spatial bins over the simulation cell.
#[derive(Debug, Clone)]
pub struct CutoffNeighborFinder {
    cell: SimulationCell,
    cutoff: f64,
    cutoff_squared: f64,
    bins: [usize; 3],
    /// Cutoff in reduced units along each axis.
    reduced_cutoff: DVec3,
    /// `bin_start[b]..bin_start[b + 1]` indexes `entries` for bin `b`.
    bin_start: Vec<usize>,
    entries: Vec<(usize, DVec3)>,
}

impl CutoffNeighborFinder {
    /// Bins the (selected) particles. Returns `Ok(None)` if canceled.
    pub fn prepare(
        cutoff: f64,
        positions: &[DVec3],
        cell: &SimulationCell,
        selection: Option<&[bool]>,
        task: &TaskToken,
    ) -> Result<Option<Self>, ConstructError> {
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(ConstructError::invalid_parameter(format!(
                "neighbor cutoff must be positive, got {cutoff}"
            )));
        }
        if cell.is_degenerate() {
            return Err(ConstructError::degenerate_cell("simulation cell has zero volume"));
        }
        if let Some(selection) = selection {
            if selection.len() != positions.len() {
                return Err(ConstructError::length_mismatch("selection", positions.len(), selection.len()));
            }
        }

        let mut bins = [1usize; 3];
        let mut reduced_cutoff = DVec3::ZERO;
        for dim in 0..3 {
            let height = cell.cell_height(dim);
            reduced_cutoff[dim] = cutoff / height;
            bins[dim] = ((height / cutoff).floor() as usize).clamp(1, MAX_NEIGHBOR_BINS_PER_DIM);
        }

        let mut finder = Self {
            cell: *cell,
            cutoff,
            cutoff_squared: cutoff * cutoff,
            bins,
            reduced_cutoff,
            bin_start: Vec::new(),
            entries: Vec::new(),
        };

        // Counting sort of the particles by bin.
        let mut keyed: Vec<(usize, usize, DVec3)> = Vec::with_capacity(positions.len());
        for (index, &p) in positions.iter().enumerate() {
            if !selection.map_or(true, |s| s[index]) {
                continue;
            }
            if !task.set_progress_value_intermittent(index as u64) {
                return Ok(None);
            }
            let wrapped = cell.wrap_point(p);
            let reduced = cell.to_reduced(wrapped);
            keyed.push((finder.bin_of(reduced), index, wrapped));
        }
        let bin_total = bins[0] * bins[1] * bins[2];
        let mut bin_start = vec![0usize; bin_total + 1];
        for &(bin, _, _) in &keyed {
            bin_start[bin + 1] += 1;
        }
        for b in 0..bin_total {
            bin_start[b + 1] += bin_start[b];
        }
        let mut fill = bin_start.clone();
        let mut entries = vec![(0usize, DVec3::ZERO); keyed.len()];
        for (bin, index, wrapped) in keyed {
            entries[fill[bin]] = (index, wrapped);
            fill[bin] += 1;
        }
        finder.bin_start = bin_start;
        finder.entries = entries;
        Ok(Some(finder))
    }

    /// Query radius the bins were sized for.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Bin count per cell axis.
    pub fn bins(&self) -> [usize; 3] {
        self.bins
    }

    /// Number of binned particles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no particle was binned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bin_coordinate(&self, reduced: f64, dim: usize) -> i64 {
        (reduced * self.bins[dim] as f64).floor() as i64
    }

    fn bin_of(&self, reduced: DVec3) -> usize {
        let mut coords = [0usize; 3];
        for dim in 0..3 {
            let n = self.bins[dim] as i64;
            coords[dim] = self.bin_coordinate(reduced[dim], dim).clamp(0, n - 1) as usize;
        }
        coords[0] + self.bins[0] * (coords[1] + self.bins[1] * coords[2])
    }

    /// Calls `visit` for every particle image strictly within the cutoff of
    /// `center`.
    pub fn visit(&self, center: DVec3, mut visit: impl FnMut(Neighbor)) {
        let reduced = self.cell.to_reduced(center);
        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        for dim in 0..3 {
            let n = self.bins[dim] as i64;
            let a = self.bin_coordinate(reduced[dim] - self.reduced_cutoff[dim], dim);
            let b = self.bin_coordinate(reduced[dim] + self.reduced_cutoff[dim], dim);
            if self.cell.has_pbc(dim) {
                lo[dim] = a;
                hi[dim] = b;
            } else {
                lo[dim] = a.clamp(0, n - 1);
                hi[dim] = b.clamp(0, n - 1);
            }
        }
        for bz in lo[2]..=hi[2] {
            for by in lo[1]..=hi[1] {
                for bx in lo[0]..=hi[0] {
                    let mut shift = DVec3::ZERO;
                    let mut coords = [0usize; 3];
                    for (dim, raw) in [bx, by, bz].into_iter().enumerate() {
                        let n = self.bins[dim] as i64;
                        let image = raw.div_euclid(n);
                        coords[dim] = raw.rem_euclid(n) as usize;
                        if image != 0 {
                            shift += image as f64 * self.cell.cell_vector(dim);
                        }
                    }
                    let bin = coords[0] + self.bins[0] * (coords[1] + self.bins[1] * coords[2]);
                    for &(index, position) in &self.entries[self.bin_start[bin]..self.bin_start[bin + 1]] {
                        let delta = position + shift - center;
                        let distance_squared = delta.length_squared();
                        if distance_squared < self.cutoff_squared {
                            visit(Neighbor {
                                index,
                                delta,
                                distance_squared,
                            });
                        }
                    }
                }
            }
        }
    }

    /// Collects the neighbors of `center`.
    pub fn find(&self, center: DVec3) -> Vec<Neighbor> {
        let mut found = Vec::new();
        self.visit(center, |n| found.push(n));
        found
    }
}
