//! # Reconstruction Results

use serde::{Deserialize, Serialize};
use surface_mesh::{RegionId, SurfaceMesh};

/// Scalar summary of a reconstructed surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionSummary {
    /// Total area of the surface separating filled from empty space.
    pub surface_area: f64,
    /// Volume of the simulation cell.
    pub cell_volume: f64,
    /// Summed volume of the filled regions.
    pub filled_volume: f64,
    /// Volume of empty space, the sum of the empty regions when they are identified.
    pub empty_volume: f64,
    /// `filled_volume / cell_volume`
    pub filled_fraction: f64,
    /// Surface area per unit cell volume.
    pub specific_surface_area: f64,
    /// Number of filled regions.
    pub filled_region_count: usize,
    /// Number of empty regions; zero unless regions are identified.
    pub empty_region_count: usize,
}

impl ReconstructionSummary {
    /// Derives the ratios from the raw totals.
    pub(crate) fn new(
        surface_area: f64,
        cell_volume: f64,
        filled_volume: f64,
        empty_volume: f64,
        filled_region_count: usize,
        empty_region_count: usize,
    ) -> Self {
        let ratio = |x: f64| if cell_volume > 0.0 { x / cell_volume } else { 0.0 };
        Self {
            surface_area,
            cell_volume,
            filled_volume,
            empty_volume,
            filled_fraction: ratio(filled_volume),
            specific_surface_area: ratio(surface_area),
            filled_region_count,
            empty_region_count,
        }
    }
}

/// A surface mesh plus the optional per-particle outputs of a method.
#[derive(Debug, Clone)]
pub struct SurfaceReconstruction {
    /// The closed surface mesh in world space.
    pub mesh: SurfaceMesh,
    /// Areas, volumes and region counts.
    pub summary: ReconstructionSummary,
    /// Input particle of every mesh vertex (alpha-shape method only).
    pub vertex_particles: Option<Vec<usize>>,
    /// True for particles that are a corner of at least one surface facet.
    pub surface_particles: Option<Vec<bool>>,
    /// Region containing each particle.
    pub particle_regions: Option<Vec<Option<RegionId>>>,
    /// Signed distance of each particle from the surface, negative inside
    /// filled space.
    pub surface_distances: Option<Vec<f64>>,
}

impl SurfaceReconstruction {
    pub(crate) fn new(mesh: SurfaceMesh, summary: ReconstructionSummary) -> Self {
        Self {
            mesh,
            summary,
            vertex_particles: None,
            surface_particles: None,
            particle_regions: None,
            surface_distances: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_summary_ratios() {
        let summary = ReconstructionSummary::new(12.0, 8.0, 2.0, 6.0, 1, 1);
        assert_relative_eq!(summary.filled_fraction, 0.25);
        assert_relative_eq!(summary.specific_surface_area, 1.5);

        let empty = ReconstructionSummary::new(1.0, 0.0, 0.0, 0.0, 0, 0);
        assert_eq!(empty.filled_fraction, 0.0);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = ReconstructionSummary::new(3.0, 1.0, 0.5, 0.5, 2, 1);
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["filled_region_count"], 2);
        assert_eq!(json["surface_area"], 3.0);
    }
}
