//! # Surface Mesh
//!
//! Half-edge surface mesh store for periodic surface reconstruction,
//! together with the post-processing operations applied to finished meshes.
//!
//! ## Architecture
//!
//! ```text
//! isosurface / construct-surface → surface-mesh (SurfaceMesh) → ops
//! ```
//!
//! ## Contents
//!
//! - **SimulationCell**: affine domain with per-axis periodicity
//! - **SurfaceMesh**: arena-indexed vertices, half-edges, faces and regions
//! - **TaskToken**: cooperative cancellation and progress
//! - **ops**: periodic weld, opposite-halfedge linking, Taubin smoothing,
//!   area/volume metrics and point location

pub mod cell;
pub mod error;
pub mod mesh;
pub mod ops;
pub mod properties;
pub mod task;

pub use cell::SimulationCell;
pub use error::MeshError;
pub use mesh::{FaceId, HalfEdgeId, Region, RegionId, SurfaceMesh, VertexId};
pub use properties::{PropertyArray, PropertyData};
pub use task::TaskToken;
