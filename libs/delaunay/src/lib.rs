//! # Delaunay
//!
//! Three-dimensional Delaunay tessellations of point clouds in periodic
//! simulation cells.
//!
//! ## Architecture
//!
//! ```text
//! positions + SimulationCell → ghost (primary points, helpers, images)
//!                            → tessellation (Bowyer-Watson, exact predicates)
//! ```
//!
//! Points are inserted together with their periodic images inside a ghost
//! layer around the primary cell. Each finite cell is either owned by the
//! primary cell or a ghost copy of an owned cell, decided by its head
//! vertex (see [`DelaunayTessellation::is_ghost_cell`]).

pub mod error;
pub mod ghost;
pub mod predicates;
pub mod tessellation;

pub use error::DelaunayError;
pub use ghost::{Vertex, VertexKind};
pub use tessellation::{cell_facet_vertex_index, DelaunayTessellation, FACET_VERTICES};
