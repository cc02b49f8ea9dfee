//! # Construction Parameters
//!
//! Per-call parameters of the two point-cloud methods. Defaults come from
//! the `config` crate; [`AlphaShapeParams::from_config`] and
//! [`DensityParams::from_config`] take them from a validated
//! [`ReconstructionConfig`] instead.

use config::constants::{
    DEFAULT_GRID_RESOLUTION, DEFAULT_ISOLEVEL, DEFAULT_PROBE_RADIUS, DEFAULT_RADIUS_FACTOR,
    GAUSSIAN_CUTOFF_FACTOR, GHOST_LAYER_FACTOR,
};
use config::settings::ReconstructionConfig;
use serde::{Deserialize, Serialize};
use surface_mesh::ops::SmoothingParams;

use crate::error::ConstructError;

fn smoothing_from_config(config: &ReconstructionConfig, iterations: usize) -> SmoothingParams {
    SmoothingParams {
        iterations,
        pass_band: config.taubin_pass_band,
        lambda: config.taubin_lambda,
    }
}

/// Parameters of the alpha-shape method.
///
/// # Example
///
/// ```rust
/// use construct_surface::AlphaShapeParams;
///
/// let params = AlphaShapeParams {
///     probe_radius: 2.5,
///     identify_regions: true,
///     ..Default::default()
/// };
/// assert!(params.validate().is_ok());
/// assert_eq!(params.alpha(), 6.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaShapeParams {
    /// Radius of the probe sphere; tetrahedra whose circumradius does not
    /// exceed it are filled.
    pub probe_radius: f64,
    /// Taubin smoothing applied to the finished mesh.
    pub smoothing: SmoothingParams,
    /// Ghost layer thickness in units of the probe radius.
    pub ghost_layer_factor: f64,
    /// Build a two-sided mesh and split space into filled and empty regions.
    pub identify_regions: bool,
    /// Report which particles lie on the surface.
    pub select_surface_particles: bool,
    /// Report the region containing each particle.
    pub map_particles_to_regions: bool,
    /// Report the signed distance of each particle from the surface.
    pub compute_surface_distance: bool,
    /// Copy particle properties onto the mesh vertices.
    pub transfer_properties: bool,
}

impl Default for AlphaShapeParams {
    fn default() -> Self {
        Self {
            probe_radius: DEFAULT_PROBE_RADIUS,
            smoothing: SmoothingParams::default(),
            ghost_layer_factor: GHOST_LAYER_FACTOR,
            identify_regions: false,
            select_surface_particles: false,
            map_particles_to_regions: false,
            compute_surface_distance: false,
            transfer_properties: false,
        }
    }
}

impl AlphaShapeParams {
    /// Default parameters with the global tunables taken from `config`.
    pub fn from_config(config: &ReconstructionConfig) -> Self {
        Self {
            smoothing: smoothing_from_config(config, config.smoothing_level),
            ghost_layer_factor: config.ghost_layer_factor,
            ..Self::default()
        }
    }

    /// Squared probe radius.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.probe_radius * self.probe_radius
    }

    #[inline]
    /// Ghost layer thickness in length units.
    pub fn ghost_layer_size(&self) -> f64 {
        self.probe_radius * self.ghost_layer_factor
    }

    /// Rejects non-positive or non-finite radii and factors.
    pub fn validate(&self) -> Result<(), ConstructError> {
        if !(self.probe_radius.is_finite() && self.probe_radius > 0.0) {
            return Err(ConstructError::invalid_parameter(format!(
                "probe radius must be positive, got {}",
                self.probe_radius
            )));
        }
        if !(self.ghost_layer_factor.is_finite() && self.ghost_layer_factor > 0.0) {
            return Err(ConstructError::invalid_parameter(format!(
                "ghost layer factor must be positive, got {}",
                self.ghost_layer_factor
            )));
        }
        self.smoothing.validate()?;
        Ok(())
    }
}

/// Parameters of the Gaussian density method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityParams {
    /// Scaling factor applied to every particle radius.
    pub radius_factor: f64,
    /// Density value at which the surface is extracted.
    pub isolevel: f64,
    /// Number of voxels along the longest grid axis.
    pub grid_resolution: usize,
    /// Kernel cutoff in units of the largest scaled radius.
    pub cutoff_factor: f64,
    /// Taubin smoothing applied to the finished mesh.
    pub smoothing: SmoothingParams,
    /// Blend floating-point particle properties onto the mesh vertices.
    pub transfer_properties: bool,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            radius_factor: DEFAULT_RADIUS_FACTOR,
            isolevel: DEFAULT_ISOLEVEL,
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            cutoff_factor: GAUSSIAN_CUTOFF_FACTOR,
            smoothing: SmoothingParams::with_iterations(0),
            transfer_properties: false,
        }
    }
}

impl DensityParams {
    /// Default parameters with the global tunables taken from `config`.
    ///
    /// The density surface is not smoothed by default, so only the filter
    /// coefficients are taken over.
    pub fn from_config(config: &ReconstructionConfig) -> Self {
        Self {
            cutoff_factor: config.gaussian_cutoff_factor,
            smoothing: smoothing_from_config(config, 0),
            ..Self::default()
        }
    }

    /// Rejects non-positive factors and resolutions below 2.
    pub fn validate(&self) -> Result<(), ConstructError> {
        if !(self.radius_factor.is_finite() && self.radius_factor > 0.0) {
            return Err(ConstructError::invalid_parameter(format!(
                "radius factor must be positive, got {}",
                self.radius_factor
            )));
        }
        if !self.isolevel.is_finite() {
            return Err(ConstructError::invalid_parameter(format!(
                "isolevel must be finite, got {}",
                self.isolevel
            )));
        }
        if self.grid_resolution == 0 {
            return Err(ConstructError::invalid_parameter("grid resolution must be at least 1"));
        }
        if !(self.cutoff_factor.is_finite() && self.cutoff_factor > 0.0) {
            return Err(ConstructError::invalid_parameter(format!(
                "cutoff factor must be positive, got {}",
                self.cutoff_factor
            )));
        }
        self.smoothing.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_defaults() {
        let params = AlphaShapeParams::default();
        assert_eq!(params.probe_radius, DEFAULT_PROBE_RADIUS);
        assert_eq!(params.ghost_layer_size(), DEFAULT_PROBE_RADIUS * GHOST_LAYER_FACTOR);
        assert!(!params.identify_regions);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_probe_radius() {
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let params = AlphaShapeParams {
                probe_radius: radius,
                ..Default::default()
            };
            assert!(matches!(params.validate(), Err(ConstructError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn test_density_validation() {
        assert!(DensityParams::default().validate().is_ok());
        let params = DensityParams {
            grid_resolution: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
        let params = DensityParams {
            radius_factor: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_from_config() {
        let config = ReconstructionConfig::new(1e-9, 2.5, 4.0, 0.1, 0.6, 3).unwrap();
        let alpha = AlphaShapeParams::from_config(&config);
        assert_eq!(alpha.ghost_layer_factor, 2.5);
        assert_eq!(alpha.smoothing.iterations, 3);
        assert_eq!(alpha.smoothing.lambda, 0.6);
        let density = DensityParams::from_config(&config);
        assert_eq!(density.cutoff_factor, 4.0);
        assert_eq!(density.smoothing.iterations, 0);
    }

    #[test]
    fn test_serde_round_trip() {
        let params = AlphaShapeParams {
            probe_radius: 1.5,
            identify_regions: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: AlphaShapeParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
