//! # Scalar Fields
//!
//! [`VoxelSampler`] is the seam between a scalar field and the
//! marching-cubes engine. Implementors only provide in-range node values;
//! the provided [`VoxelSampler::sample`] adds the halo convention: indices
//! wrap on periodic axes and fall off the grid (returning `None`) on the
//! others.

use crate::error::IsosurfaceError;

/// Read access to a scalar field on a regular grid of nodes.
pub trait VoxelSampler: Sync {
    /// Number of nodes along each axis.
    fn shape(&self) -> [usize; 3];

    /// Periodicity of each axis.
    fn pbc(&self) -> [bool; 3];

    /// Value at node `(i, j, k)`; indices are always in range.
    fn value(&self, i: usize, j: usize, k: usize) -> f64;

    /// Value at a possibly out-of-range node. Periodic axes wrap; on
    /// non-periodic axes, nodes outside the grid yield `None`.
    fn sample(&self, i: i64, j: i64, k: i64) -> Option<f64> {
        let shape = self.shape();
        let pbc = self.pbc();
        let mut index = [0usize; 3];
        for (dim, raw) in [i, j, k].into_iter().enumerate() {
            let n = shape[dim] as i64;
            let wrapped = if pbc[dim] { raw.rem_euclid(n) } else { raw };
            if wrapped < 0 || wrapped >= n {
                return None;
            }
            index[dim] = wrapped as usize;
        }
        Some(self.value(index[0], index[1], index[2]))
    }
}

/// Borrowed view of x-fastest scalar data as a [`VoxelSampler`].
///
/// # Example
///
/// ```rust
/// use isosurface::{VoxelField, VoxelSampler};
///
/// let data: Vec<f64> = (0..8).map(f64::from).collect();
/// let field = VoxelField::new(&data, [2, 2, 2], [true, false, false]).unwrap();
/// assert_eq!(field.value(1, 1, 0), 3.0);
/// assert_eq!(field.sample(-1, 0, 0), Some(1.0));
/// assert_eq!(field.sample(0, 2, 0), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VoxelField<'a> {
    data: &'a [f64],
    shape: [usize; 3],
    pbc: [bool; 3],
}

impl<'a> VoxelField<'a> {
    /// Wraps `data`, which must hold `shape[0] * shape[1] * shape[2]` values.
    pub fn new(data: &'a [f64], shape: [usize; 3], pbc: [bool; 3]) -> Result<Self, IsosurfaceError> {
        if shape.iter().any(|&n| n == 0) {
            return Err(IsosurfaceError::invalid_grid(format!("empty grid dimension in {shape:?}")));
        }
        let expected = shape[0] * shape[1] * shape[2];
        if data.len() != expected {
            return Err(IsosurfaceError::length_mismatch(expected, data.len()));
        }
        Ok(Self { data, shape, pbc })
    }

    /// Returns the underlying values.
    pub fn data(&self) -> &'a [f64] {
        self.data
    }
}

impl VoxelSampler for VoxelField<'_> {
    fn shape(&self) -> [usize; 3] {
        self.shape
    }

    fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    #[inline]
    fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[i + self.shape[0] * (j + self.shape[1] * k)]
    }
}
