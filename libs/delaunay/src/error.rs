//! # Delaunay Errors

use thiserror::Error;

/// Errors raised while building a tessellation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DelaunayError {
    /// The simulation cell has (near) zero volume.
    #[error("Degenerate cell: {message}")]
    DegenerateCell {
        /// Description of the failure
        message: String,
    },

    /// Resolving neighbors would need more than one periodic image.
    #[error("Ghost layer of thickness {ghost_layer_size} exceeds the cell height {cell_height} along axis {dim}")]
    GhostLayerTooLarge {
        /// Cell axis index
        dim: usize,
        /// Requested ghost layer thickness
        ghost_layer_size: f64,
        /// Distance between the cell faces normal to the axis
        cell_height: f64,
    },

    /// No tetrahedron could be formed from the input.
    #[error("Too few points: {message}")]
    TooFewPoints {
        /// Description of the failure
        message: String,
    },

    /// Parameter outside its valid range
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the failure
        message: String,
    },
}

impl DelaunayError {
    /// Creates a degenerate cell error.
    pub fn degenerate_cell(message: impl Into<String>) -> Self {
        Self::DegenerateCell {
            message: message.into(),
        }
    }

    /// Creates a too-few-points error.
    pub fn too_few_points(message: impl Into<String>) -> Self {
        Self::TooFewPoints {
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
