//! # Geometric Predicates
//!
//! Thin wrappers over the adaptive exact predicates of the `robust` crate,
//! plus the floating-point circumsphere used by the alpha test.
//!
//! ## Conventions
//!
//! `orient(a, b, c, d) > 0` when `d` lies below the plane through `a, b, c`,
//! "below" meaning `a, b, c` appear counterclockwise seen from above. Every
//! tetrahedron of a tessellation is stored with positive orientation, so
//! that `in_sphere(a, b, c, d, e) > 0` when `e` lies inside the
//! circumsphere.

use glam::DVec3;
use robust::{insphere, orient3d, Coord3D};

#[inline]
fn coord(p: DVec3) -> Coord3D<f64> {
    Coord3D { x: p.x, y: p.y, z: p.z }
}

/// Exact orientation of `d` relative to the plane through `a, b, c`.
#[inline]
pub fn orient(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> f64 {
    orient3d(coord(a), coord(b), coord(c), coord(d))
}

/// Exact insphere test for a positively oriented tetrahedron.
#[inline]
pub fn in_sphere(a: DVec3, b: DVec3, c: DVec3, d: DVec3, e: DVec3) -> f64 {
    insphere(coord(a), coord(b), coord(c), coord(d), coord(e))
}

/// Signed volume of a tetrahedron, positive for a right-handed
/// `(b - a, c - a, d - a)` frame.
#[inline]
pub fn signed_volume(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> f64 {
    (b - a).dot((c - a).cross(d - a)) / 6.0
}

/// Center and squared radius of the sphere through four points, or `None`
/// when they are (numerically) coplanar.
pub fn circumsphere(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> Option<(DVec3, f64)> {
    let (b, c, d) = (b - a, c - a, d - a);
    let det = 2.0 * b.dot(c.cross(d));
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let offset = (b.length_squared() * c.cross(d) + c.length_squared() * d.cross(b) + d.length_squared() * b.cross(c)) / det;
    let radius_sq = offset.length_squared();
    radius_sq.is_finite().then_some((a + offset, radius_sq))
}
