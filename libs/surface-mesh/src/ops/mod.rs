//! # Mesh Operations
//!
//! Post-processing of finished surface meshes: periodic vertex welding,
//! opposite-halfedge linking, Taubin smoothing, area/volume metrics and
//! point-location queries.

pub mod locate;
pub mod manifold;
pub mod metrics;
pub mod smooth;
pub mod weld;

pub use locate::{closest_point, locate_point, surface_distances, PointLocation};
pub use manifold::connect_opposite_halfedges;
pub use metrics::{compute_region_metrics, face_area, total_surface_area, total_volume};
pub use smooth::{smooth_mesh, SmoothingParams};
pub use weld::weld_periodic_vertices;
