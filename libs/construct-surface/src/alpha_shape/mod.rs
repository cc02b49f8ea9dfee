//! # Alpha-Shape Surfaces
//!
//! Constructs the surface of the space covered by a probe sphere rolled
//! over a particle system.
//!
//! ## Pipeline
//!
//! ```text
//! particles → Delaunay tessellation with ghost layer (3.5 ρ)
//!           → classify cells (circumradius ≤ ρ ⇒ filled)
//!           → flood fill filled regions, then empty regions
//!           → interface facets + half-edge circulation
//!           → make manifold → smoothing → region metrics
//! ```
//!
//! Without region identification the mesh is one-sided: a single filled
//! region whose faces point into open space. With region identification
//! every interface carries a face for each side, filled regions come first
//! and empty regions follow.

mod manifold;
mod regions;

#[cfg(test)]
mod tests;

use config::constants::LOCATE_EPSILON;
use delaunay::DelaunayTessellation;
use glam::DVec3;
use surface_mesh::ops::{compute_region_metrics, face_area, smooth_mesh, surface_distances, total_surface_area};
use surface_mesh::{MeshError, RegionId, SimulationCell, SurfaceMesh, TaskToken};
use tracing::{debug, info};

use self::manifold::{FacetMesh, ManifoldBuilder};
use self::regions::{
    classify_cells, flood_fill, is_owned, primary_cells, propagate_to_ghosts, region_volumes, space_filling_region,
    EXTERIOR, UNASSIGNED,
};
use crate::error::ConstructError;
use crate::params::AlphaShapeParams;
use crate::particles::Particles;
use crate::results::{ReconstructionSummary, SurfaceReconstruction};

/// Builds the alpha-shape surface of `particles` in `cell`.
///
/// Returns `Ok(None)` if the task was canceled.
///
/// # Errors
///
/// Fails for a non-positive probe radius, a degenerate cell, a probe
/// radius whose ghost layer exceeds a periodic cell dimension, inputs
/// without a tetrahedron, and meshes that cannot be closed.
///
/// # Example
///
/// ```rust
/// use construct_surface::{construct_alpha_shape, AlphaShapeParams, Particles};
/// use glam::DVec3;
/// use surface_mesh::{SimulationCell, TaskToken};
///
/// // A slightly distorted 3x3x3 lattice.
/// let mut positions = Vec::new();
/// for k in 0..3 {
///     for j in 0..3 {
///         for i in 0..3 {
///             let jitter = 0.02 * ((i * 7 + j * 5 + k * 3) % 4) as f64;
///             positions.push(DVec3::new(i as f64 + jitter, j as f64 - jitter, k as f64) + DVec3::splat(2.0));
///         }
///     }
/// }
/// let cell = SimulationCell::orthorhombic(DVec3::splat(6.0), [false; 3]);
/// let params = AlphaShapeParams {
///     probe_radius: 1.5,
///     ..Default::default()
/// };
/// let result = construct_alpha_shape(&cell, &Particles::new(&positions), &params, &TaskToken::new())
///     .unwrap()
///     .unwrap();
/// assert!(result.mesh.is_closed());
/// assert!(result.summary.filled_volume > 7.0 && result.summary.filled_volume < 9.0);
/// ```
pub fn construct_alpha_shape(
    cell: &SimulationCell,
    particles: &Particles<'_>,
    params: &AlphaShapeParams,
    task: &TaskToken,
) -> Result<Option<SurfaceReconstruction>, ConstructError> {
    params.validate()?;
    particles.validate()?;
    if cell.is_degenerate() {
        return Err(ConstructError::degenerate_cell("simulation cell has zero volume"));
    }
    let identify = params.identify_regions;
    let selected = (0..particles.len()).filter(|&i| particles.is_selected(i)).count();
    if selected == 0 {
        return Ok(Some(empty_reconstruction(cell, particles, params)));
    }

    let Some(mut tess) = DelaunayTessellation::generate(
        cell,
        particles.positions,
        params.ghost_layer_size(),
        identify,
        particles.selection,
        task,
    )?
    else {
        return Ok(None);
    };

    // Regions
    let primary = primary_cells(&tess);
    let clusters = if identify { particles.cluster_ids } else { None };
    let flood = identify && clusters.is_none();
    if !classify_cells(&mut tess, params.alpha(), clusters, flood, task) {
        return Ok(None);
    }
    let mut volumes = if flood {
        let Some(volumes) = flood_fill(&mut tess, &primary, 0, |code| code == UNASSIGNED, task) else {
            return Ok(None);
        };
        volumes
    } else {
        let count = clusters.map_or(1, |ids| ids.iter().copied().max().unwrap_or(0).max(0) as usize + 1);
        region_volumes(&tess, &primary, count)
    };
    let filled_count = volumes.len();
    let mut empty_count = 0;
    if identify {
        let Some(empty) = flood_fill(&mut tess, &primary, filled_count, |code| code == EXTERIOR, task) else {
            return Ok(None);
        };
        empty_count = empty.len();
        volumes.extend(empty);
    }
    propagate_to_ghosts(&mut tess, &primary);
    debug!(filled_count, empty_count, "Identified spatial regions");

    // Mesh
    let mut mesh = SurfaceMesh::new(*cell);
    for r in 0..filled_count + empty_count {
        mesh.create_region(r < filled_count);
    }
    mesh.set_space_filling_region(space_filling_region(&tess, &primary).map(|r| RegionId(r as u32)));

    let mut builder = ManifoldBuilder::new(&tess, particles.positions, &primary, filled_count, identify);
    if !builder.create_faces(&mut mesh, task)? || !builder.link_halfedges(&mut mesh, task)? {
        return Ok(None);
    }
    if !mesh.is_closed() {
        return Err(MeshError::not_closed(mesh.unmatched_edge_count()).into());
    }
    let FacetMesh {
        mut vertex_particles,
        surface_particles,
    } = builder.finish();

    if params.transfer_properties {
        for property in particles.properties {
            mesh.add_vertex_property(property.mapped_copy(&vertex_particles))?;
        }
    }
    let duplicated = mesh.make_manifold(|original, _| vertex_particles.push(vertex_particles[original.index()]));
    if duplicated > 0 {
        debug!(duplicated, "Split vertices shared by touching surface sheets");
    }

    if !smooth_mesh(&mut mesh, &params.smoothing, task)? {
        return Ok(None);
    }

    // Metrics
    compute_region_metrics(&mut mesh);
    for (r, &volume) in volumes.iter().enumerate() {
        mesh.region_mut(RegionId(r as u32)).volume = volume;
    }
    let surface_area = if identify {
        mesh.faces()
            .filter(|&f| is_outer_face(mesh.face_region(f), filled_count))
            .map(|f| face_area(&mesh, f))
            .sum()
    } else {
        total_surface_area(&mesh)
    };
    let filled_volume: f64 = volumes[..filled_count].iter().sum();
    let empty_volume = if identify {
        volumes[filled_count..].iter().sum()
    } else {
        (cell.volume() - filled_volume).max(0.0)
    };
    let summary = ReconstructionSummary::new(
        surface_area,
        cell.volume(),
        filled_volume,
        empty_volume,
        filled_count,
        empty_count,
    );

    // Per-particle outputs
    let needs_regions = params.map_particles_to_regions || (params.compute_surface_distance && identify);
    let particle_regions = if needs_regions {
        let Some(regions) = map_particles_to_regions(&tess, &primary, particles, filled_count, task) else {
            return Ok(None);
        };
        Some(regions)
    } else {
        None
    };
    let distances = if params.compute_surface_distance {
        let wrapped: Vec<DVec3> = particles.positions.iter().map(|&p| cell.wrap_point(p)).collect();
        let Some(mut distances) = surface_distances(&mesh, &wrapped, LOCATE_EPSILON, task) else {
            return Ok(None);
        };
        // On a two-sided mesh the nearest face may belong to either side, so
        // the sign comes from the region of the particle.
        if let (true, Some(regions)) = (identify, &particle_regions) {
            for (d, region) in distances.iter_mut().zip(regions) {
                let inside = region.is_some_and(|r| r.index() < filled_count);
                *d = if inside { -d.abs() } else { d.abs() };
            }
        }
        Some(distances)
    } else {
        None
    };

    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        surface_area,
        filled_volume,
        filled_regions = filled_count,
        empty_regions = empty_count,
        "Constructed alpha-shape surface"
    );

    let mut result = SurfaceReconstruction::new(mesh, summary);
    result.vertex_particles = Some(vertex_particles);
    result.surface_particles = params.select_surface_particles.then_some(surface_particles);
    result.particle_regions = particle_regions.filter(|_| params.map_particles_to_regions);
    result.surface_distances = distances;
    Ok(Some(result))
}

/// Whether a face of a two-sided mesh counts towards the outer surface
/// area. Faces of empty regions do. So do faces without a region: they
/// border cells outside every region, which is exterior space. Faces of
/// filled regions lie on the filled side of an interface and do not.
fn is_outer_face(region: Option<RegionId>, filled_count: usize) -> bool {
    match region {
        Some(region) => region.index() >= filled_count,
        None => true,
    }
}

/// Assigns each particle the region of the cells around it, preferring
/// filled regions for particles on the surface. Unselected particles take
/// the region of the cell containing them. Returns `None` if canceled.
fn map_particles_to_regions(
    tess: &DelaunayTessellation,
    primary: &[Option<usize>],
    particles: &Particles<'_>,
    filled_count: usize,
    task: &TaskToken,
) -> Option<Vec<Option<RegionId>>> {
    let mut regions = vec![None; particles.len()];
    for filled_pass in [true, false] {
        for c in tess.cells() {
            let code = tess.user_field(c);
            if !is_owned(primary, c) || code < 0 || ((code as usize) < filled_count) != filled_pass {
                continue;
            }
            for v in tess.cell_vertices(c) {
                if let Some(p) = tess.vertex_particle(v) {
                    regions[p].get_or_insert(RegionId(code as u32));
                }
            }
        }
    }

    let cell = tess.simulation_cell();
    let mut hint = None;
    task.set_progress_maximum(particles.len() as u64);
    for (i, &position) in particles.positions.iter().enumerate() {
        if particles.is_selected(i) {
            continue;
        }
        if !task.set_progress_value_intermittent(i as u64) {
            return None;
        }
        if let Some(c) = tess.locate(cell.wrap_point(position), hint) {
            hint = Some(c);
            let code = tess.user_field(c);
            regions[i] = (code >= 0).then(|| RegionId(code as u32));
        }
    }
    Some(regions)
}

/// Result for an input without selected particles: no faces, and with
/// region identification a single empty region filling the cell.
fn empty_reconstruction(
    cell: &SimulationCell,
    particles: &Particles<'_>,
    params: &AlphaShapeParams,
) -> SurfaceReconstruction {
    let mut mesh = SurfaceMesh::new(*cell);
    let (filled_count, empty_count) = if params.identify_regions {
        let empty = mesh.create_region(false);
        mesh.region_mut(empty).volume = cell.volume();
        mesh.set_space_filling_region(Some(empty));
        (0, 1)
    } else {
        mesh.create_region(true);
        (1, 0)
    };
    let summary = ReconstructionSummary::new(0.0, cell.volume(), 0.0, cell.volume(), filled_count, empty_count);
    let n = particles.len();
    let mut result = SurfaceReconstruction::new(mesh, summary);
    result.vertex_particles = Some(Vec::new());
    result.surface_particles = params.select_surface_particles.then(|| vec![false; n]);
    result.particle_regions = params.map_particles_to_regions.then(|| {
        let region = params.identify_regions.then_some(RegionId(0));
        vec![region; n]
    });
    result.surface_distances = params.compute_surface_distance.then(|| vec![f64::INFINITY; n]);
    result
}
