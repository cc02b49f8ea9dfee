//! # Mesh Errors
//!
//! Error types for mesh store and post-processing operations.

use thiserror::Error;

/// Errors that can occur while building or processing a surface mesh.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// Some half-edges have no opposite partner after linking.
    #[error("Mesh is not closed: {unmatched} half-edges without opposite")]
    NotClosed {
        /// Count of unpaired half-edges
        unmatched: usize,
    },

    /// A polyhedron touches itself across a periodic boundary.
    #[error("Self-adjacent polyhedron: {message}")]
    SelfAdjacentPolyhedron {
        /// Description of the failure
        message: String,
    },

    /// Invalid mesh topology
    #[error("Invalid topology: {message}")]
    InvalidTopology {
        /// Description of the failure
        message: String,
    },

    /// Degenerate geometry
    #[error("Degenerate geometry: {message}")]
    DegenerateGeometry {
        /// Description of the failure
        message: String,
    },

    /// Parameter outside its valid range
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the failure
        message: String,
    },

    /// Property column of wrong shape
    #[error("Invalid property: {message}")]
    InvalidProperty {
        /// Description of the failure
        message: String,
    },
}

impl MeshError {
    /// Creates a not-closed error.
    pub fn not_closed(unmatched: usize) -> Self {
        Self::NotClosed { unmatched }
    }

    /// Creates a self-adjacent polyhedron error.
    pub fn self_adjacent(message: impl Into<String>) -> Self {
        Self::SelfAdjacentPolyhedron {
            message: message.into(),
        }
    }

    /// Creates an invalid topology error.
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            message: message.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates an invalid property error.
    pub fn invalid_property(message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            message: message.into(),
        }
    }
}
