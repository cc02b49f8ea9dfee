//! Tests for the simulation cell geometry.

use super::*;
use approx::assert_relative_eq;

// =============================================================================
// CONSTRUCTION TESTS
// =============================================================================

#[test]
fn test_cubic_cell_volume() {
    let cell = SimulationCell::cubic(3.0);
    assert_relative_eq!(cell.volume(), 27.0);
    assert!(!cell.is_degenerate());
    assert_eq!(cell.pbc(), [true; 3]);
}

#[test]
fn test_flat_cell_is_degenerate() {
    let cell = SimulationCell::orthorhombic(DVec3::new(1.0, 1.0, 0.0), [true; 3]);
    assert!(cell.is_degenerate());
    assert_eq!(cell.inverse_matrix(), DMat3::ZERO);
}

#[test]
fn test_left_handed_cell() {
    let cell = SimulationCell::new(
        DMat3::from_diagonal(DVec3::new(1.0, 1.0, -1.0)),
        DVec3::ZERO,
        [false; 3],
    );
    assert!(cell.is_left_handed());
    assert_relative_eq!(cell.volume(), 1.0);
}

// =============================================================================
// COORDINATE TESTS
// =============================================================================

#[test]
fn test_reduced_roundtrip_triclinic() {
    let matrix = DMat3::from_cols(
        DVec3::new(4.0, 0.0, 0.0),
        DVec3::new(1.0, 3.0, 0.0),
        DVec3::new(0.5, 0.5, 5.0),
    );
    let cell = SimulationCell::new(matrix, DVec3::new(-1.0, 2.0, 0.5), [true; 3]);
    let p = DVec3::new(1.3, 2.7, 3.1);
    let back = cell.to_absolute(cell.to_reduced(p));
    assert_relative_eq!(back.x, p.x, epsilon = 1e-12);
    assert_relative_eq!(back.y, p.y, epsilon = 1e-12);
    assert_relative_eq!(back.z, p.z, epsilon = 1e-12);
}

#[test]
fn test_wrap_vector_respects_pbc_flags() {
    let cell = SimulationCell::orthorhombic(DVec3::splat(10.0), [true, false, true]);
    let v = cell.wrap_vector(DVec3::new(6.0, 6.0, -6.0));
    assert_relative_eq!(v.x, -4.0);
    assert_relative_eq!(v.y, 6.0);
    assert_relative_eq!(v.z, 4.0);
}

#[test]
fn test_wrap_point_into_primary_image() {
    let cell = SimulationCell::cubic(2.0);
    let p = cell.wrap_point(DVec3::new(-0.5, 4.5, 1.0));
    assert_relative_eq!(p.x, 1.5);
    assert_relative_eq!(p.y, 0.5);
    assert_relative_eq!(p.z, 1.0);
}

#[test]
fn test_is_wrapped_vector() {
    let cell = SimulationCell::cubic(10.0);
    assert!(!cell.is_wrapped_vector(DVec3::new(4.9, 0.0, 0.0)));
    assert!(cell.is_wrapped_vector(DVec3::new(0.0, -5.0, 0.0)));
}

// =============================================================================
// NORMAL TESTS
// =============================================================================

#[test]
fn test_cell_height_of_sheared_cell() {
    let matrix = DMat3::from_cols(
        DVec3::new(2.0, 0.0, 0.0),
        DVec3::new(1.0, 2.0, 0.0),
        DVec3::new(0.0, 0.0, 3.0),
    );
    let cell = SimulationCell::new(matrix, DVec3::ZERO, [true; 3]);
    // volume / |b x c| = 12 / (3 * sqrt(5))
    assert_relative_eq!(cell.cell_height(0), 4.0 / 5f64.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(cell.cell_height(1), 2.0, epsilon = 1e-12);
    assert_relative_eq!(cell.cell_height(2), 3.0, epsilon = 1e-12);
    assert!(cell.cell_normal(1).dot(cell.cell_vector(1)) > 0.0);
}
