//! # Construction Errors

use delaunay::DelaunayError;
use isosurface::IsosurfaceError;
use surface_mesh::MeshError;
use thiserror::Error;

/// Errors raised by the surface construction methods.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstructError {
    /// Parameter outside its valid range
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the failure
        message: String,
    },

    /// The simulation cell has (near) zero volume.
    #[error("Degenerate cell: {message}")]
    DegenerateCell {
        /// Description of the failure
        message: String,
    },

    /// A per-particle array does not match the number of particles.
    #[error("Length mismatch for {name}: expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Name of the offending array
        name: String,
        /// Number of particles
        expected: usize,
        /// Length of the array as given
        actual: usize,
    },

    /// A tetrahedron spans half the cell or more along a periodic axis, so
    /// its facets cannot be mapped onto the periodic mesh.
    #[error("Cannot construct manifold: {message}")]
    WrappedCell {
        /// Description of the failure
        message: String,
    },

    /// The tessellation could not be built.
    #[error(transparent)]
    Delaunay(#[from] DelaunayError),

    /// Isosurface extraction failed.
    #[error(transparent)]
    Isosurface(#[from] IsosurfaceError),

    /// The surface mesh is topologically inconsistent.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl ConstructError {
    /// Creates an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a degenerate cell error.
    pub fn degenerate_cell(message: impl Into<String>) -> Self {
        Self::DegenerateCell {
            message: message.into(),
        }
    }

    /// Creates a length mismatch error.
    pub fn length_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// Creates a wrapped cell error.
    pub fn wrapped_cell(message: impl Into<String>) -> Self {
        Self::WrappedCell {
            message: message.into(),
        }
    }
}
