//! Validated snapshot of the tunable reconstruction settings.
//!
//! Downstream crates take their defaults from this struct rather than from
//! literals, so a consumer may override tolerances in one place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_SMOOTHING_LEVEL, GAUSSIAN_CUTOFF_FACTOR, GHOST_LAYER_FACTOR, TAUBIN_LAMBDA,
    TAUBIN_PASS_BAND, WELD_RELATIVE_TOLERANCE,
};

/// Immutable snapshot of global reconstruction settings that can be shared
/// between crates.
///
/// # Examples
/// ```
/// use config::settings::ReconstructionConfig;
/// let config = ReconstructionConfig::default();
/// assert!(config.weld_tolerance > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Relative tolerance of the periodic vertex weld.
    pub weld_tolerance: f64,
    /// Ghost layer thickness in units of the probe radius.
    pub ghost_layer_factor: f64,
    /// Gaussian cutoff in units of the largest scaled radius.
    pub gaussian_cutoff_factor: f64,
    /// Taubin pass-band frequency.
    pub taubin_pass_band: f64,
    /// Taubin positive scale factor.
    pub taubin_lambda: f64,
    /// Default number of smoothing iterations.
    pub smoothing_level: usize,
}

impl ReconstructionConfig {
    /// Builds a configuration enforcing strict validation of every value.
    ///
    /// # Examples
    /// ```
    /// use config::settings::ReconstructionConfig;
    /// let cfg = ReconstructionConfig::new(1e-9, 3.5, 3.0, 0.1, 0.5, 4).expect("valid config");
    /// assert_eq!(cfg.smoothing_level, 4);
    /// ```
    pub fn new(
        weld_tolerance: f64,
        ghost_layer_factor: f64,
        gaussian_cutoff_factor: f64,
        taubin_pass_band: f64,
        taubin_lambda: f64,
        smoothing_level: usize,
    ) -> Result<Self, ConfigError> {
        if !(weld_tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(weld_tolerance));
        }
        if !(ghost_layer_factor > 0.0) {
            return Err(ConfigError::InvalidFactor {
                name: "ghost_layer_factor",
                value: ghost_layer_factor,
            });
        }
        if !(gaussian_cutoff_factor > 0.0) {
            return Err(ConfigError::InvalidFactor {
                name: "gaussian_cutoff_factor",
                value: gaussian_cutoff_factor,
            });
        }
        // mu = 1 / (k_PB - 1/lambda) must be negative and finite.
        if !(taubin_lambda > 0.0) || !(taubin_pass_band >= 0.0) || taubin_pass_band * taubin_lambda >= 1.0 {
            return Err(ConfigError::InvalidTaubin {
                pass_band: taubin_pass_band,
                lambda: taubin_lambda,
            });
        }
        Ok(Self {
            weld_tolerance,
            ghost_layer_factor,
            gaussian_cutoff_factor,
            taubin_pass_band,
            taubin_lambda,
            smoothing_level,
        })
    }
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            weld_tolerance: WELD_RELATIVE_TOLERANCE,
            ghost_layer_factor: GHOST_LAYER_FACTOR,
            gaussian_cutoff_factor: GAUSSIAN_CUTOFF_FACTOR,
            taubin_pass_band: TAUBIN_PASS_BAND,
            taubin_lambda: TAUBIN_LAMBDA,
            smoothing_level: DEFAULT_SMOOTHING_LEVEL,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Raised when the weld tolerance is zero, negative or NaN.
    #[error("tolerance must be positive: {0}")]
    InvalidTolerance(f64),
    /// Raised when a scale factor is zero, negative or NaN.
    #[error("{name} must be positive: {value}")]
    InvalidFactor {
        /// Name of the factor
        name: &'static str,
        /// Rejected value
        value: f64,
    },
    /// Raised when the Taubin coefficients do not yield a shrink-free filter.
    #[error("invalid Taubin coefficients: k_PB = {pass_band}, lambda = {lambda}")]
    InvalidTaubin {
        /// Pass-band frequency
        pass_band: f64,
        /// Positive smoothing weight
        lambda: f64,
    },
}
