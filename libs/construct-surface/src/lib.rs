//! # Construct Surface
//!
//! Closed surface meshes for particle systems in periodic simulation cells.
//!
//! ## Architecture
//!
//! ```text
//! Particles + SimulationCell
//!   ├─ construct_alpha_shape     → delaunay → regions → interface facets → SurfaceMesh
//!   └─ construct_density_surface → CutoffNeighborFinder → density grid → isosurface → SurfaceMesh
//! ```
//!
//! Both methods return a [`SurfaceReconstruction`]: the mesh, a
//! [`ReconstructionSummary`] and the per-particle outputs that were
//! requested. Cancellation through the [`surface_mesh::TaskToken`] yields
//! `Ok(None)`.

pub mod alpha_shape;
pub mod density;
pub mod error;
pub mod neighbors;
pub mod params;
pub mod particles;
pub mod results;

pub use alpha_shape::construct_alpha_shape;
pub use density::{construct_density_surface, DensityField};
pub use error::ConstructError;
pub use neighbors::{CutoffNeighborFinder, Neighbor};
pub use params::{AlphaShapeParams, DensityParams};
pub use particles::Particles;
pub use results::{ReconstructionSummary, SurfaceReconstruction};
