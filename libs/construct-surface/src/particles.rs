//! # Particle Input
//!
//! Borrowed view of a particle system: positions plus optional per-particle
//! radii, selection, cluster ids and property columns.

use config::constants::DEFAULT_PARTICLE_RADIUS;
use glam::DVec3;
use surface_mesh::PropertyArray;

use crate::error::ConstructError;

/// Particle data handed to the construction methods.
///
/// # Example
///
/// ```rust
/// use construct_surface::Particles;
/// use glam::DVec3;
///
/// let positions = [DVec3::ZERO, DVec3::X];
/// let radii = [0.5, 0.7];
/// let particles = Particles::new(&positions).with_radii(&radii);
/// assert_eq!(particles.len(), 2);
/// assert!(particles.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Particles<'a> {
    /// Particle positions; may lie outside the cell on periodic axes.
    pub positions: &'a [DVec3],
    /// Per-particle radii for the density method; a uniform default when absent.
    pub radii: Option<&'a [f64]>,
    /// Only selected particles take part in the construction.
    pub selection: Option<&'a [bool]>,
    /// Cluster id per particle; predefines the filled regions of an
    /// alpha-shape surface.
    pub cluster_ids: Option<&'a [i64]>,
    /// Columns copied (alpha shape) or blended (density) onto the mesh
    /// vertices when property transfer is enabled.
    pub properties: &'a [PropertyArray],
}

impl<'a> Particles<'a> {
    /// A view over `positions` with every optional column unset.
    pub fn new(positions: &'a [DVec3]) -> Self {
        Self {
            positions,
            radii: None,
            selection: None,
            cluster_ids: None,
            properties: &[],
        }
    }

    /// Sets the per-particle radii.
    pub fn with_radii(mut self, radii: &'a [f64]) -> Self {
        self.radii = Some(radii);
        self
    }

    /// Restricts the construction to the flagged particles.
    pub fn with_selection(mut self, selection: &'a [bool]) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Sets cluster ids defining the filled regions.
    pub fn with_cluster_ids(mut self, cluster_ids: &'a [i64]) -> Self {
        self.cluster_ids = Some(cluster_ids);
        self
    }

    /// Sets the property columns to transfer onto the mesh.
    pub fn with_properties(mut self, properties: &'a [PropertyArray]) -> Self {
        self.properties = properties;
        self
    }

    /// Number of particles, selected or not.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if there are no particles at all.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns true if particle `index` takes part in the construction.
    #[inline]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.map_or(true, |s| s[index])
    }

    /// Radius of particle `index`, falling back to the default radius.
    #[inline]
    pub fn radius(&self, index: usize) -> f64 {
        self.radii.map_or(DEFAULT_PARTICLE_RADIUS, |r| r[index])
    }

    /// Checks that every per-particle array has one entry per particle and
    /// that positions and radii are usable.
    pub fn validate(&self) -> Result<(), ConstructError> {
        let n = self.len();
        let check = |name: &str, len: usize| {
            if len == n {
                Ok(())
            } else {
                Err(ConstructError::length_mismatch(name, n, len))
            }
        };
        if let Some(radii) = self.radii {
            check("radii", radii.len())?;
            if let Some(bad) = radii.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
                return Err(ConstructError::invalid_parameter(format!(
                    "particle radii must be positive and finite, got {bad}"
                )));
            }
        }
        if let Some(selection) = self.selection {
            check("selection", selection.len())?;
        }
        if let Some(cluster_ids) = self.cluster_ids {
            check("cluster ids", cluster_ids.len())?;
        }
        for property in self.properties {
            check(property.name(), property.len())?;
        }
        if let Some(i) = self.positions.iter().position(|p| !p.is_finite()) {
            return Err(ConstructError::invalid_parameter(format!(
                "position of particle {i} is not finite"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use surface_mesh::PropertyArray;

    use super::*;

    #[test]
    fn test_defaults() {
        let positions = [DVec3::ZERO, DVec3::ONE];
        let particles = Particles::new(&positions);
        assert!(particles.is_selected(1));
        assert_eq!(particles.radius(0), DEFAULT_PARTICLE_RADIUS);
        assert!(particles.validate().is_ok());
    }

    #[test]
    fn test_length_mismatch() {
        let positions = [DVec3::ZERO, DVec3::ONE];
        let selection = [true];
        let err = Particles::new(&positions).with_selection(&selection).validate().unwrap_err();
        assert_eq!(err, ConstructError::length_mismatch("selection", 2, 1));

        let properties = [PropertyArray::float("Charge", 1, 3)];
        let err = Particles::new(&positions).with_properties(&properties).validate().unwrap_err();
        assert!(matches!(err, ConstructError::LengthMismatch { expected: 2, actual: 3, .. }));
    }

    #[test]
    fn test_rejects_bad_values() {
        let positions = [DVec3::ZERO, DVec3::ONE];
        let radii = [0.5, 0.0];
        assert!(Particles::new(&positions).with_radii(&radii).validate().is_err());
        let positions = [DVec3::ZERO, DVec3::new(f64::NAN, 0.0, 0.0)];
        assert!(Particles::new(&positions).validate().is_err());
    }
}
