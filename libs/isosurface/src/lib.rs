//! # Isosurface
//!
//! Closed, consistently oriented isosurfaces of scalar fields sampled on
//! regular, optionally periodic grids.
//!
//! ## Architecture
//!
//! ```text
//! VoxelSampler → MarchingCubes → SurfaceMesh (grid space)
//! VoxelGrid → construct_isosurface → SurfaceMesh (world space) + histogram
//! ```
//!
//! ## Example
//!
//! ```rust
//! use isosurface::{construct_isosurface, IsosurfaceParams, VoxelGrid};
//! use surface_mesh::{SimulationCell, TaskToken};
//!
//! let n = 10;
//! let values: Vec<f64> = (0..n * n * n)
//!     .map(|idx| {
//!         let (i, j, k) = (idx % n, idx / n % n, idx / (n * n));
//!         let d = |x: usize| x as f64 - 4.5;
//!         -(d(i).powi(2) + d(j).powi(2) + d(k).powi(2)).sqrt()
//!     })
//!     .collect();
//! let grid = VoxelGrid::new([n; 3], SimulationCell::cubic(9.0), values).unwrap();
//! let params = IsosurfaceParams { isolevel: -3.0, ..IsosurfaceParams::default() };
//! let result = construct_isosurface(&grid, &params, &TaskToken::new()).unwrap().unwrap();
//! assert!(result.surface_area > 0.0);
//! assert!(result.mesh.is_closed());
//! ```

pub mod error;
pub mod field;
pub mod grid;
pub mod marching_cubes;
pub mod tables;

pub use error::IsosurfaceError;
pub use field::{VoxelField, VoxelSampler};
pub use grid::{construct_isosurface, grid_to_cell_transform, Histogram, Isosurface, IsosurfaceParams, VoxelGrid};
pub use marching_cubes::MarchingCubes;
