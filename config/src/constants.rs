//! # Configuration Constants
//!
//! Centralized constants for the surface reconstruction engine. Numerical
//! tolerances, default construction parameters and smoothing coefficients
//! are defined here so that no crate scatters literals.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point comparison tolerances
//! - **Construction**: Default parameters of the reconstruction paths
//! - **Smoothing**: Taubin filter coefficients
//! - **Scheduling**: Progress and cancellation granularity

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons.
///
/// Used for determining if two floating-point values are "equal" within
/// numerical tolerance, e.g. when rejecting zero-length edges or
/// zero-area faces.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f64, b: f64) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-11));
/// ```
pub const EPSILON: f64 = 1e-10;

/// Relative tolerance of the periodic vertex weld.
///
/// Two vertices are merged when their minimum-image distance is below this
/// factor times the longest edge adjacent to either of them.
///
/// # Example
///
/// ```rust
/// use config::constants::WELD_RELATIVE_TOLERANCE;
///
/// let longest_edge = 2.0;
/// let threshold = WELD_RELATIVE_TOLERANCE * longest_edge;
/// assert!(threshold < 1e-8);
/// ```
pub const WELD_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Tolerance used by point-location queries to decide on which side of a
/// face, edge or vertex pseudonormal a query point lies.
pub const LOCATE_EPSILON: f64 = 1e-9;

/// Minimum simulation cell volume (in cubed length units) below which a
/// cell counts as degenerate.
pub const DEGENERATE_CELL_VOLUME: f64 = EPSILON * EPSILON * EPSILON;

/// Relative amplitude of the deterministic perturbation applied to points
/// before Delaunay insertion.
///
/// The perturbation breaks exact co-sphericity of lattice-like inputs. It is
/// scaled by the extent of the point set and is the same for all periodic
/// images of a particle.
pub const DELAUNAY_JITTER: f64 = 1e-9;

// =============================================================================
// CONSTRUCTION CONSTANTS
// =============================================================================

/// Thickness of the periodic ghost layer in units of the probe radius.
///
/// # Example
///
/// ```rust
/// use config::constants::GHOST_LAYER_FACTOR;
///
/// let probe_radius = 2.0;
/// assert_eq!(probe_radius * GHOST_LAYER_FACTOR, 7.0);
/// ```
pub const GHOST_LAYER_FACTOR: f64 = 3.5;

/// Cutoff of the Gaussian kernels in units of the largest scaled radius.
pub const GAUSSIAN_CUTOFF_FACTOR: f64 = 3.0;

/// Default probe sphere radius of the alpha-shape method.
pub const DEFAULT_PROBE_RADIUS: f64 = 4.0;

/// Default number of Taubin smoothing iterations.
pub const DEFAULT_SMOOTHING_LEVEL: usize = 8;

/// Default number of voxels along the longest axis of the density grid.
pub const DEFAULT_GRID_RESOLUTION: usize = 50;

/// Default isolevel of the Gaussian density field.
pub const DEFAULT_ISOLEVEL: f64 = 0.6;

/// Default scaling factor applied to particle radii by the density method.
pub const DEFAULT_RADIUS_FACTOR: f64 = 1.0;

/// Largest corner magnitude for which marching cubes resolves the cube
/// interior analytically. Cubes touching the empty halo carry sentinel
/// values far beyond it and keep their face-level corner grouping.
pub const INTERIOR_VALUE_LIMIT: f64 = 1e100;

/// Number of histogram bins reported for a voxel field.
pub const DEFAULT_HISTOGRAM_BINS: usize = 64;

/// Spacing of the helper points covering non-periodic directions, in units
/// of the ghost layer thickness.
pub const COVER_DOMAIN_SPACING_FACTOR: f64 = 1.0;

/// Radius assumed for particles without an explicit radius.
pub const DEFAULT_PARTICLE_RADIUS: f64 = 0.5;

/// Upper bound on the number of bins per axis of the cutoff neighbor finder.
pub const MAX_NEIGHBOR_BINS_PER_DIM: usize = 128;

// =============================================================================
// SMOOTHING CONSTANTS
// =============================================================================

/// Pass-band frequency `k_PB` of the Taubin low-pass filter.
pub const TAUBIN_PASS_BAND: f64 = 0.1;

/// Positive scale factor `lambda` of the Taubin filter.
///
/// The negative factor follows as `mu = 1 / (k_PB - 1 / lambda)`.
///
/// # Example
///
/// ```rust
/// use config::constants::{taubin_mu, TAUBIN_LAMBDA, TAUBIN_PASS_BAND};
///
/// let mu = taubin_mu(TAUBIN_PASS_BAND, TAUBIN_LAMBDA);
/// assert!(mu < -TAUBIN_LAMBDA);
/// ```
pub const TAUBIN_LAMBDA: f64 = 0.5;

// =============================================================================
// SCHEDULING CONSTANTS
// =============================================================================

/// Number of work items processed between two cancellation checks.
pub const PROGRESS_CHUNK: usize = 1024;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Computes the negative Taubin scale factor from pass band and lambda.
#[inline]
pub fn taubin_mu(pass_band: f64, lambda: f64) -> f64 {
    1.0 / (pass_band - 1.0 / lambda)
}

/// Checks if two f64 values are approximately equal within EPSILON.
///
/// # Example
///
/// ```rust
/// use config::constants::approx_equal;
///
/// assert!(approx_equal(1.0, 1.0 + 1e-11));
/// assert!(!approx_equal(1.0, 1.1));
/// ```
#[inline]
pub fn approx_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Checks if a f64 value is approximately zero within EPSILON.
///
/// # Example
///
/// ```rust
/// use config::constants::approx_zero;
///
/// assert!(approx_zero(1e-11));
/// assert!(!approx_zero(0.1));
/// ```
#[inline]
pub fn approx_zero(value: f64) -> bool {
    value.abs() < EPSILON
}
