//! # Gaussian Density Surfaces
//!
//! Every particle contributes `exp(-d² / (2 r²))` to a scalar field, where
//! `r` is its scaled radius. The field is sampled on a regular grid and the
//! surface is the marching-cubes isosurface at the requested level.
//!
//! Along periodic axes the grid covers one cell repeat. Along non-periodic
//! axes it covers the bounding box of the particles, padded by the kernel
//! cutoff so the surface closes inside the grid.


use glam::{DMat3, DVec3};
use isosurface::{grid_to_cell_transform, MarchingCubes, VoxelSampler};
use rayon::prelude::*;
use surface_mesh::ops::{compute_region_metrics, connect_opposite_halfedges, smooth_mesh, total_surface_area};
use surface_mesh::{PropertyArray, PropertyData, SimulationCell, SurfaceMesh, TaskToken};
use tracing::{debug, info};

use crate::error::ConstructError;
use crate::neighbors::CutoffNeighborFinder;
use crate::params::DensityParams;
use crate::particles::Particles;
use crate::results::{ReconstructionSummary, SurfaceReconstruction};

/// Rasterized density values, x-fastest.
#[derive(Debug, Clone)]
pub struct DensityField {
    shape: [usize; 3],
    pbc: [bool; 3],
    values: Vec<f64>,
}

impl DensityField {
    /// Node values, x fastest.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl VoxelSampler for DensityField {
    fn shape(&self) -> [usize; 3] {
        self.shape
    }

    fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[i + self.shape[0] * (j + self.shape[1] * k)]
    }
}

#[inline]
fn gaussian(distance_squared: f64, radius: f64) -> f64 {
    (-distance_squared / (2.0 * radius * radius)).exp()
}

/// Cell spanned by the density grid: the simulation cell along periodic
/// axes, the padded particle range along the others.
fn grid_cell(cell: &SimulationCell, particles: &Particles<'_>, cutoff: f64) -> SimulationCell {
    let mut columns = [cell.cell_vector(0), cell.cell_vector(1), cell.cell_vector(2)];
    let mut origin = cell.origin();
    for dim in 0..3 {
        if cell.has_pbc(dim) {
            continue;
        }
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for (i, &p) in particles.positions.iter().enumerate() {
            if particles.is_selected(i) {
                let r = cell.to_reduced(p)[dim];
                lo = lo.min(r);
                hi = hi.max(r);
            }
        }
        let margin = cutoff / columns[dim].length();
        lo -= margin;
        hi += margin;
        origin += lo * columns[dim];
        columns[dim] *= hi - lo;
    }
    cell.with_geometry(DMat3::from_cols(columns[0], columns[1], columns[2]), origin)
}

/// Number of grid nodes per axis for cubic voxels with `resolution` voxels
/// along the longest cell vector.
fn grid_shape(grid: &SimulationCell, resolution: usize) -> [usize; 3] {
    let lengths = [0, 1, 2].map(|dim| grid.cell_vector(dim).length());
    let voxel = lengths.iter().copied().fold(0.0, f64::max) / resolution as f64;
    lengths.map(|len| ((len / voxel) as usize).max(2))
}

/// Evaluates the density at every grid node. Returns `None` if canceled.
fn rasterize(
    finder: &CutoffNeighborFinder,
    grid: &SimulationCell,
    shape: [usize; 3],
    radii: &[f64],
    task: &TaskToken,
) -> Option<Vec<f64>> {
    let to_world = grid_to_cell_transform(grid, shape);
    let [nx, ny, _] = shape;
    let values: Vec<f64> = (0..shape.iter().product::<usize>())
        .into_par_iter()
        .map(|index| {
            if task.is_canceled() {
                return 0.0;
            }
            let node = DVec3::new((index % nx) as f64, (index / nx % ny) as f64, (index / (nx * ny)) as f64);
            let mut density = 0.0;
            finder.visit(to_world.transform_point3(node), |n| {
                density += gaussian(n.distance_squared, radii[n.index]);
            });
            density
        })
        .collect();
    (!task.is_canceled()).then_some(values)
}

/// Blends the floating-point particle properties at every mesh vertex,
/// weighting each particle by its kernel value. Integer properties cannot be
/// blended and are skipped.
fn transfer_properties(
    mesh: &SurfaceMesh,
    finder: &CutoffNeighborFinder,
    particles: &Particles<'_>,
    radii: &[f64],
) -> Result<Vec<PropertyArray>, ConstructError> {
    let sources: Vec<&PropertyArray> = particles.properties.iter().filter(|p| p.is_float()).collect();
    let skipped = particles.properties.len() - sources.len();
    if skipped > 0 {
        debug!(skipped, "Integer particle properties are not transferred to the density surface");
    }
    let stride: usize = sources.iter().map(|p| p.components()).sum();
    if stride == 0 {
        return Ok(Vec::new());
    }

    let mut blended = vec![0.0; stride * mesh.vertex_count()];
    blended
        .par_chunks_mut(stride)
        .zip(mesh.positions().par_iter())
        .for_each(|(out, &position)| {
            let mut weight_sum = 0.0;
            finder.visit(position, |n| {
                let weight = gaussian(n.distance_squared, radii[n.index]);
                weight_sum += weight;
                let mut slot = 0;
                for property in &sources {
                    for component in 0..property.components() {
                        out[slot] += weight * property.get_f64(n.index, component);
                        slot += 1;
                    }
                }
            });
            if weight_sum != 0.0 {
                out.iter_mut().for_each(|v| *v /= weight_sum);
            }
        });

    let mut offset = 0;
    let mut transferred = Vec::with_capacity(sources.len());
    for property in sources {
        let components = property.components();
        let values: Vec<f64> = blended
            .chunks(stride)
            .flat_map(|chunk| chunk[offset..offset + components].iter().copied())
            .collect();
        transferred.push(PropertyArray::from_data(
            property.name(),
            components,
            PropertyData::Float(values),
        )?);
        offset += components;
    }
    Ok(transferred)
}

/// Builds the Gaussian density isosurface of `particles` in `cell`.
///
/// Returns `Ok(None)` if the task was canceled.
///
/// # Errors
///
/// Fails for invalid parameters, a degenerate cell, and an isosurface that
/// does not close.
///
/// # Example
///
/// ```rust
/// use construct_surface::{construct_density_surface, DensityParams, Particles};
/// use glam::DVec3;
/// use surface_mesh::{SimulationCell, TaskToken};
///
/// let positions = [DVec3::splat(5.0)];
/// let radii = [1.0];
/// let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [false; 3]);
/// let params = DensityParams {
///     isolevel: 0.5,
///     grid_resolution: 40,
///     ..Default::default()
/// };
/// let particles = Particles::new(&positions).with_radii(&radii);
/// let result = construct_density_surface(&cell, &particles, &params, &TaskToken::new())
///     .unwrap()
///     .unwrap();
/// // exp(-d²/2) = 0.5 at d = sqrt(2 ln 2)
/// let radius = (2.0 * 2f64.ln()).sqrt();
/// let expected = 4.0 * std::f64::consts::PI * radius * radius;
/// assert!((result.summary.surface_area - expected).abs() / expected < 0.05);
/// ```
pub fn construct_density_surface(
    cell: &SimulationCell,
    particles: &Particles<'_>,
    params: &DensityParams,
    task: &TaskToken,
) -> Result<Option<SurfaceReconstruction>, ConstructError> {
    params.validate()?;
    particles.validate()?;
    if cell.is_degenerate() {
        return Err(ConstructError::degenerate_cell("simulation cell has zero volume"));
    }
    let selected = (0..particles.len()).filter(|&i| particles.is_selected(i)).count();
    if selected == 0 {
        let mut mesh = SurfaceMesh::new(*cell);
        mesh.create_region(true);
        let summary = ReconstructionSummary::new(0.0, cell.volume(), 0.0, cell.volume(), 1, 0);
        return Ok(Some(SurfaceReconstruction::new(mesh, summary)));
    }

    let radii: Vec<f64> = (0..particles.len())
        .map(|i| particles.radius(i) * params.radius_factor)
        .collect();
    let max_radius = (0..particles.len())
        .filter(|&i| particles.is_selected(i))
        .map(|i| radii[i])
        .fold(0.0, f64::max);
    let cutoff = params.cutoff_factor * max_radius;

    let grid = grid_cell(cell, particles, cutoff);
    let shape = grid_shape(&grid, params.grid_resolution);
    debug!(nx = shape[0], ny = shape[1], nz = shape[2], cutoff, "Density grid");

    let Some(finder) = CutoffNeighborFinder::prepare(cutoff, particles.positions, cell, particles.selection, task)?
    else {
        return Ok(None);
    };
    let Some(values) = rasterize(&finder, &grid, shape, &radii, task) else {
        return Ok(None);
    };
    let field = DensityField {
        shape,
        pbc: cell.pbc(),
        values,
    };

    let Some(mut mesh) = MarchingCubes::new(&field, params.isolevel)
        .lower_is_solid(false)
        .generate(task)?
    else {
        return Ok(None);
    };
    mesh.transform_vertices(&grid_to_cell_transform(&grid, shape));
    mesh.set_domain(grid);

    if params.transfer_properties {
        for property in transfer_properties(&mesh, &finder, particles, &radii)? {
            mesh.add_vertex_property(property)?;
        }
        if task.is_canceled() {
            return Ok(None);
        }
    }

    if grid.is_left_handed() {
        mesh.flip_faces();
    }
    connect_opposite_halfedges(&mut mesh)?;
    if !smooth_mesh(&mut mesh, &params.smoothing, task)? {
        return Ok(None);
    }

    compute_region_metrics(&mut mesh);
    let surface_area = total_surface_area(&mesh);
    let cell_volume = cell.volume();
    let filled_volume = mesh
        .regions()
        .first()
        .map_or(0.0, |r| r.volume)
        .clamp(0.0, cell_volume);
    let summary = ReconstructionSummary::new(
        surface_area,
        cell_volume,
        filled_volume,
        cell_volume - filled_volume,
        1,
        0,
    );
    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        surface_area,
        "Constructed density surface"
    );
    Ok(Some(SurfaceReconstruction::new(mesh, summary)))
}
