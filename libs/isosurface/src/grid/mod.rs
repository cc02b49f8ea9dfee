//! # Voxel Grids
//!
//! Front end that turns a scalar voxel grid embedded in a simulation cell
//! into a world-space isosurface mesh.
//!
//! ## Grid to world mapping
//!
//! Node `(i, j, k)` maps to reduced cell coordinates `i / n` along periodic
//! axes (the grid repeats with the cell) and `i / (n - 1)` along
//! non-periodic axes (the first and last node lie on the cell faces).

use config::constants::DEFAULT_HISTOGRAM_BINS;
use glam::{DAffine3, DMat3, DVec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use surface_mesh::ops::{connect_opposite_halfedges, total_surface_area};
use surface_mesh::{MeshError, PropertyArray, PropertyData, SimulationCell, SurfaceMesh, TaskToken};
use tracing::{debug, info};

use crate::error::IsosurfaceError;
use crate::field::VoxelField;
use crate::marching_cubes::MarchingCubes;


/// Scalar values on a regular grid of nodes spanning a simulation cell,
/// with optional per-node property columns.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    shape: [usize; 3],
    domain: SimulationCell,
    values: Vec<f64>,
    properties: Vec<PropertyArray>,
}

impl VoxelGrid {
    /// Creates a grid from x-fastest `values`.
    pub fn new(shape: [usize; 3], domain: SimulationCell, values: Vec<f64>) -> Result<Self, IsosurfaceError> {
        let expected = shape[0] * shape[1] * shape[2];
        if values.len() != expected {
            return Err(IsosurfaceError::length_mismatch(expected, values.len()));
        }
        Ok(Self {
            shape,
            domain,
            values,
            properties: Vec::new(),
        })
    }

    /// Attaches a per-node property column, replacing one of the same name.
    pub fn add_property(&mut self, property: PropertyArray) -> Result<(), IsosurfaceError> {
        let nodes = self.values.len();
        if property.len() != nodes {
            return Err(IsosurfaceError::length_mismatch(nodes, property.len()));
        }
        self.properties.retain(|p| p.name() != property.name());
        self.properties.push(property);
        Ok(())
    }

    /// Node count per axis.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Cell the grid spans.
    pub fn domain(&self) -> &SimulationCell {
        &self.domain
    }

    /// Scalar values, x fastest.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Extra per-node columns.
    pub fn properties(&self) -> &[PropertyArray] {
        &self.properties
    }

    /// Returns the scalar field as a sampler, periodic where the cell is.
    pub fn field(&self) -> Result<VoxelField<'_>, IsosurfaceError> {
        VoxelField::new(&self.values, self.shape, self.domain.pbc())
    }
}

/// Parameters of [`construct_isosurface`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsosurfaceParams {
    /// Field value of the extracted surface.
    pub isolevel: f64,
    /// Treat values at or below the isolevel as the solid side.
    pub lower_is_solid: bool,
    /// Interpolate every grid property onto the mesh vertices.
    pub transfer_properties: bool,
    /// Bin count of the reported value histogram.
    pub histogram_bins: usize,
}

impl Default for IsosurfaceParams {
    fn default() -> Self {
        Self {
            isolevel: 0.0,
            lower_is_solid: false,
            transfer_properties: false,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl IsosurfaceParams {
    /// Rejects a non-finite isolevel and an empty histogram.
    pub fn validate(&self) -> Result<(), IsosurfaceError> {
        if !self.isolevel.is_finite() {
            return Err(IsosurfaceError::invalid_parameter(format!(
                "isolevel must be finite, got {}",
                self.isolevel
            )));
        }
        if self.histogram_bins == 0 {
            return Err(IsosurfaceError::invalid_parameter("histogram needs at least one bin"));
        }
        Ok(())
    }
}

/// Value distribution of a scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Smallest field value.
    pub min: f64,
    /// Largest field value.
    pub max: f64,
    /// Node count per bin.
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bins `values` uniformly over their range. The maximum falls into the
    /// last bin; a constant field puts everything into the first.
    pub fn from_values(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let mut counts = vec![0u64; bins];
        if values.is_empty() {
            return Self { min: 0.0, max: 0.0, counts };
        }
        let width = (max - min) / bins as f64;
        for &v in values {
            let bin = if width > 0.0 { ((v - min) / width) as usize } else { 0 };
            counts[bin.min(bins - 1)] += 1;
        }
        Self { min, max, counts }
    }

    /// Width of one bin in field units.
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len().max(1) as f64
    }
}

/// A world-space isosurface and field statistics.
#[derive(Debug, Clone)]
pub struct Isosurface {
    /// Closed mesh in world space.
    pub mesh: SurfaceMesh,
    /// Total area of the mesh.
    pub surface_area: f64,
    /// Distribution of the field values.
    pub histogram: Histogram,
}

/// Maps grid-index space of a grid with `shape` nodes onto `domain`.
pub fn grid_to_cell_transform(domain: &SimulationCell, shape: [usize; 3]) -> DAffine3 {
    let mut scale = DVec3::ONE;
    for dim in 0..3 {
        let divisor = if domain.has_pbc(dim) { shape[dim] } else { shape[dim].saturating_sub(1) };
        scale[dim] = 1.0 / divisor.max(1) as f64;
    }
    domain.affine() * DAffine3::from_mat3(DMat3::from_diagonal(scale))
}

/// Extracts the isosurface of a voxel grid in world space.
///
/// Returns `Ok(None)` if the task was canceled. The mesh is closed, its
/// faces point away from the solid side and it lives in the grid's cell.
pub fn construct_isosurface(
    grid: &VoxelGrid,
    params: &IsosurfaceParams,
    task: &TaskToken,
) -> Result<Option<Isosurface>, IsosurfaceError> {
    params.validate()?;
    let shape = grid.shape();
    if shape.iter().any(|&n| n <= 1) {
        return Err(IsosurfaceError::invalid_grid(format!(
            "cannot construct an isosurface for a {} x {} x {} grid; every dimension needs at least 2 nodes",
            shape[0], shape[1], shape[2]
        )));
    }
    if grid.domain().is_degenerate() {
        return Err(IsosurfaceError::degenerate_cell("voxel grid cell has zero volume"));
    }

    let field = grid.field()?;
    let Some(mut mesh) = MarchingCubes::new(&field, params.isolevel)
        .lower_is_solid(params.lower_is_solid)
        .generate(task)?
    else {
        return Ok(None);
    };

    if params.transfer_properties {
        for property in grid.properties() {
            let transferred = interpolate_property(&mesh, property, shape, grid.domain().pbc())?;
            mesh.add_vertex_property(transferred)?;
        }
        if task.is_canceled() {
            return Ok(None);
        }
    }

    mesh.transform_vertices(&grid_to_cell_transform(grid.domain(), shape));
    mesh.set_domain(*grid.domain());
    if grid.domain().is_left_handed() {
        mesh.flip_faces();
    }
    if task.is_canceled() {
        return Ok(None);
    }

    connect_opposite_halfedges(&mut mesh)?;
    let surface_area = total_surface_area(&mesh);
    let histogram = Histogram::from_values(grid.values(), params.histogram_bins);
    debug!(
        min = histogram.min,
        max = histogram.max,
        bins = histogram.counts.len(),
        "Field value range"
    );
    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        surface_area,
        "Constructed isosurface"
    );
    Ok(Some(Isosurface {
        mesh,
        surface_area,
        histogram,
    }))
}

/// Trilinearly interpolates a node property at the mesh vertices, which
/// are still in grid-index space. Indices wrap on periodic axes and clamp
/// on the others.
fn interpolate_property(
    mesh: &SurfaceMesh,
    property: &PropertyArray,
    shape: [usize; 3],
    pbc: [bool; 3],
) -> Result<PropertyArray, MeshError> {
    let components = property.components();
    if components == 0 {
        return Err(MeshError::invalid_property(format!(
            "property '{}' has no components",
            property.name()
        )));
    }
    let mut values = vec![0.0; components * mesh.vertex_count()];
    values
        .par_chunks_mut(components)
        .zip(mesh.positions().par_iter())
        .for_each(|(out, p)| {
            let mut lower = [0usize; 3];
            let mut upper = [0usize; 3];
            let mut frac = [0.0f64; 3];
            for dim in 0..3 {
                let n = shape[dim] as i64;
                let fl = p[dim].floor();
                frac[dim] = p[dim] - fl;
                let fl = fl as i64;
                if pbc[dim] {
                    lower[dim] = fl.rem_euclid(n) as usize;
                    upper[dim] = (fl + 1).rem_euclid(n) as usize;
                } else {
                    lower[dim] = fl.clamp(0, n - 1) as usize;
                    upper[dim] = (fl + 1).clamp(0, n - 1) as usize;
                }
            }
            for c in 0..8 {
                let pick = |dim: usize| (c >> dim) & 1 == 1;
                let mut weight = 1.0;
                let mut node = [0usize; 3];
                for dim in 0..3 {
                    if pick(dim) {
                        weight *= frac[dim];
                        node[dim] = upper[dim];
                    } else {
                        weight *= 1.0 - frac[dim];
                        node[dim] = lower[dim];
                    }
                }
                if weight == 0.0 {
                    continue;
                }
                let index = node[0] + shape[0] * (node[1] + shape[1] * node[2]);
                for (component, value) in out.iter_mut().enumerate() {
                    *value += weight * property.get_f64(index, component);
                }
            }
        });
    PropertyArray::from_data(property.name(), components, PropertyData::Float(values))
}
