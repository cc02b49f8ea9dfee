//! # Config Crate
//!
//! Tolerances and default parameters shared by the mesh, isosurface,
//! Delaunay and reconstruction crates.
//!
//! - [`constants`]: compile-time values (precision, ghost layer, kernel
//!   cutoff, Taubin coefficients, defaults)
//! - [`settings`]: [`ReconstructionConfig`], a validated runtime snapshot
//!   of the tunables
//!
//! ```rust
//! use config::constants::{approx_zero, GHOST_LAYER_FACTOR};
//!
//! assert!(approx_zero(1e-11));
//! // Ghost layer thickness for a probe radius of 2.
//! assert_eq!(2.0 * GHOST_LAYER_FACTOR, 7.0);
//! ```

pub mod constants;
pub mod settings;

pub use settings::{ConfigError, ReconstructionConfig};
