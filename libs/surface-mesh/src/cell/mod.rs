//! # Simulation Cell
//!
//! Affine simulation domain with per-axis periodic boundary conditions.
//!
//! The three cell vectors are the columns of a 3x3 matrix; together with an
//! origin they define the parallelepiped the reconstruction works in. All
//! periodic geometry (minimum image convention, wrapping, face normals)
//! goes through this type.

use config::constants::DEGENERATE_CELL_VOLUME;
use glam::{DAffine3, DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// A parallelepiped simulation domain with optional periodicity per axis.
///
/// # Example
///
/// ```rust
/// use surface_mesh::SimulationCell;
/// use glam::DVec3;
///
/// let cell = SimulationCell::orthorhombic(DVec3::splat(8.0), [true, true, false]);
/// assert_eq!(cell.volume(), 512.0);
///
/// // Minimum image convention along periodic axes only.
/// let v = cell.wrap_vector(DVec3::new(6.0, 0.0, 6.0));
/// assert_eq!(v, DVec3::new(-2.0, 0.0, 6.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationCell {
    /// Cell vectors as matrix columns.
    matrix: DMat3,
    /// Position of the cell corner at reduced coordinates (0,0,0).
    origin: DVec3,
    /// Periodic boundary flags per axis.
    pbc: [bool; 3],
    /// Cached inverse of `matrix` (zero for a singular cell).
    inverse: DMat3,
}

impl SimulationCell {
    /// Creates a cell from its vector matrix, origin and periodicity flags.
    pub fn new(matrix: DMat3, origin: DVec3, pbc: [bool; 3]) -> Self {
        let det = matrix.determinant();
        let inverse = if det != 0.0 { matrix.inverse() } else { DMat3::ZERO };
        Self {
            matrix,
            origin,
            pbc,
            inverse,
        }
    }

    /// Creates an axis-aligned cell with its corner at the origin.
    pub fn orthorhombic(lengths: DVec3, pbc: [bool; 3]) -> Self {
        Self::new(DMat3::from_diagonal(lengths), DVec3::ZERO, pbc)
    }

    /// Creates a fully periodic cube of the given edge length.
    pub fn cubic(length: f64) -> Self {
        Self::orthorhombic(DVec3::splat(length), [true; 3])
    }

    /// Returns the cell vector matrix (vectors as columns).
    #[inline]
    pub fn matrix(&self) -> DMat3 {
        self.matrix
    }

    /// Returns the inverse cell matrix.
    #[inline]
    pub fn inverse_matrix(&self) -> DMat3 {
        self.inverse
    }

    /// Returns the cell origin.
    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Returns the periodic boundary flags.
    #[inline]
    pub fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    /// Returns whether the given axis is periodic.
    #[inline]
    pub fn has_pbc(&self, dim: usize) -> bool {
        self.pbc[dim]
    }

    /// Returns the cell vector along the given axis.
    #[inline]
    pub fn cell_vector(&self, dim: usize) -> DVec3 {
        self.matrix.col(dim)
    }

    /// Returns the (absolute) cell volume.
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Returns true if the cell volume is numerically zero.
    pub fn is_degenerate(&self) -> bool {
        self.volume() <= DEGENERATE_CELL_VOLUME
    }

    /// Returns true if the cell vectors form a left-handed system.
    pub fn is_left_handed(&self) -> bool {
        self.matrix.determinant() < 0.0
    }

    /// Converts an absolute point to reduced cell coordinates.
    #[inline]
    pub fn to_reduced(&self, p: DVec3) -> DVec3 {
        self.inverse * (p - self.origin)
    }

    /// Converts reduced cell coordinates to an absolute point.
    #[inline]
    pub fn to_absolute(&self, r: DVec3) -> DVec3 {
        self.matrix * r + self.origin
    }

    /// Converts an absolute vector to reduced cell coordinates.
    #[inline]
    pub fn reduced_vector(&self, v: DVec3) -> DVec3 {
        self.inverse * v
    }

    /// Returns the affine transformation from reduced to absolute coordinates.
    pub fn affine(&self) -> DAffine3 {
        DAffine3::from_mat3_translation(self.matrix, self.origin)
    }

    /// Applies the minimum image convention along periodic axes.
    pub fn wrap_vector(&self, v: DVec3) -> DVec3 {
        if !self.pbc.iter().any(|&p| p) {
            return v;
        }
        let mut r = self.reduced_vector(v);
        for dim in 0..3 {
            if self.pbc[dim] {
                r[dim] -= r[dim].round();
            }
        }
        self.matrix * r
    }

    /// Maps a point into the primary cell image along periodic axes.
    pub fn wrap_point(&self, p: DVec3) -> DVec3 {
        if !self.pbc.iter().any(|&p| p) {
            return p;
        }
        let mut r = self.to_reduced(p);
        for dim in 0..3 {
            if self.pbc[dim] {
                r[dim] -= r[dim].floor();
                // floor() of values just below an integer can round up to 1.0
                if r[dim] >= 1.0 {
                    r[dim] = 0.0;
                }
            }
        }
        self.to_absolute(r)
    }

    /// Returns true if the vector spans half a cell or more along any
    /// periodic axis, i.e. its minimum image differs from itself.
    pub fn is_wrapped_vector(&self, v: DVec3) -> bool {
        let r = self.reduced_vector(v);
        (0..3).any(|dim| self.pbc[dim] && r[dim].abs() >= 0.5)
    }

    /// Unit normal of the cell face spanned by the two other cell vectors,
    /// oriented towards the positive side of `dim`.
    pub fn cell_normal(&self, dim: usize) -> DVec3 {
        let a = self.matrix.col((dim + 1) % 3);
        let b = self.matrix.col((dim + 2) % 3);
        let n = a.cross(b).normalize_or_zero();
        if n.dot(self.matrix.col(dim)) < 0.0 {
            -n
        } else {
            n
        }
    }

    /// Perpendicular distance between the two cell faces normal to `dim`.
    pub fn cell_height(&self, dim: usize) -> f64 {
        self.matrix.col(dim).dot(self.cell_normal(dim))
    }

    /// Returns a copy of this cell with a different matrix and origin but the
    /// same periodicity.
    pub fn with_geometry(&self, matrix: DMat3, origin: DVec3) -> Self {
        Self::new(matrix, origin, self.pbc)
    }
}

impl Default for SimulationCell {
    fn default() -> Self {
        Self::new(DMat3::IDENTITY, DVec3::ZERO, [false; 3])
    }
}

#[cfg(test)]
mod tests;
