//! # Taubin Smoothing
//!
//! Shrink-free Laplacian smoothing (Taubin 1995). Every iteration applies a
//! smoothing pass with positive `lambda` followed by an inflation pass with
//! negative `mu = 1 / (k_PB - 1 / lambda)`. Per-vertex displacements are
//! computed in parallel against a frozen copy of the positions, then applied
//! in one sweep, so the result does not depend on thread scheduling.

use config::constants::{taubin_mu, DEFAULT_SMOOTHING_LEVEL, TAUBIN_LAMBDA, TAUBIN_PASS_BAND};
use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MeshError;
use crate::mesh::{SurfaceMesh, VertexId};
use crate::task::TaskToken;

/// Parameters of the Taubin filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Number of lambda/mu iterations. Zero leaves the mesh untouched.
    pub iterations: usize,
    /// Pass-band frequency `k_PB`.
    pub pass_band: f64,
    /// Positive scale factor of the smoothing pass.
    pub lambda: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_SMOOTHING_LEVEL,
            pass_band: TAUBIN_PASS_BAND,
            lambda: TAUBIN_LAMBDA,
        }
    }
}

impl SmoothingParams {
    /// Creates parameters with the given iteration count and default
    /// filter coefficients.
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Returns the negative inflation factor.
    pub fn mu(&self) -> f64 {
        taubin_mu(self.pass_band, self.lambda)
    }

    /// Checks that the coefficients give a shrink-free filter.
    pub fn validate(&self) -> Result<(), MeshError> {
        if !(self.lambda > 0.0) || !(self.pass_band >= 0.0) || self.pass_band * self.lambda >= 1.0 {
            return Err(MeshError::invalid_parameter(format!(
                "invalid Taubin coefficients: k_PB = {}, lambda = {}",
                self.pass_band, self.lambda
            )));
        }
        Ok(())
    }
}

/// Smooths the mesh in place. Returns `Ok(false)` if the task was canceled,
/// in which case the positions are partially smoothed and should be
/// discarded.
///
/// # Example
///
/// ```rust
/// use surface_mesh::{ops::{smooth_mesh, SmoothingParams}, SimulationCell, SurfaceMesh, TaskToken};
///
/// let mut mesh = SurfaceMesh::new(SimulationCell::default());
/// let task = TaskToken::new();
/// assert!(smooth_mesh(&mut mesh, &SmoothingParams::with_iterations(0), &task).unwrap());
/// ```
pub fn smooth_mesh(mesh: &mut SurfaceMesh, params: &SmoothingParams, task: &TaskToken) -> Result<bool, MeshError> {
    params.validate()?;
    if params.iterations == 0 || mesh.vertex_count() == 0 {
        return Ok(!task.is_canceled());
    }
    let mu = params.mu();
    task.set_progress_maximum(params.iterations as u64);
    for iteration in 0..params.iterations {
        if !task.set_progress_value(iteration as u64) {
            return Ok(false);
        }
        smoothing_pass(mesh, params.lambda);
        smoothing_pass(mesh, mu);
    }
    debug!(
        iterations = params.iterations,
        lambda = params.lambda,
        mu,
        "Smoothed surface mesh"
    );
    Ok(task.set_progress_value(params.iterations as u64))
}

/// Moves each vertex by `prefactor` times the mean of its outgoing edge
/// vectors.
fn smoothing_pass(mesh: &mut SurfaceMesh, prefactor: f64) {
    let displacements: Vec<DVec3> = {
        let mesh = &*mesh;
        (0..mesh.vertex_count() as u32)
            .into_par_iter()
            .map(|v| {
                let mut sum = DVec3::ZERO;
                let mut count = 0usize;
                for e in mesh.vertex_edges(VertexId(v)) {
                    sum += mesh.edge_vector(e);
                    count += 1;
                }
                if count == 0 {
                    DVec3::ZERO
                } else {
                    sum * (prefactor / count as f64)
                }
            })
            .collect()
    };
    for (p, d) in mesh.positions_mut().iter_mut().zip(displacements) {
        *p += d;
    }
}
