//! # Isosurface Errors

use surface_mesh::MeshError;
use thiserror::Error;

/// Errors raised by isosurface extraction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IsosurfaceError {
    /// Grid shape unusable for marching cubes
    #[error("Invalid grid: {message}")]
    InvalidGrid {
        /// Description of the failure
        message: String,
    },

    /// Number of samples does not match the grid shape
    #[error("Data length mismatch: expected {expected} values, got {actual}")]
    DataLengthMismatch {
        /// Number of grid points
        expected: usize,
        /// Number of samples given
        actual: usize,
    },

    /// The grid's cell has (near) zero volume.
    #[error("Degenerate cell: {message}")]
    DegenerateCell {
        /// Description of the failure
        message: String,
    },

    /// Parameter outside its valid range
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the failure
        message: String,
    },

    /// Mesh post-processing failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl IsosurfaceError {
    /// Creates an invalid grid error.
    pub fn invalid_grid(message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            message: message.into(),
        }
    }

    /// Creates a data length mismatch error.
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::DataLengthMismatch { expected, actual }
    }

    /// Creates a degenerate cell error.
    pub fn degenerate_cell(message: impl Into<String>) -> Self {
        Self::DegenerateCell {
            message: message.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}
