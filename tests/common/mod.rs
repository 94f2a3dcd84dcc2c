//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;
use surfscan::HeightField;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Assert two fields agree cell by cell: same presence, heights within `epsilon`
pub fn assert_fields_match(expected: &HeightField, actual: &HeightField, epsilon: f64) {
    assert_eq!(expected.size(), actual.size(), "field sizes differ");
    for ((coord, e), (_, a)) in expected.cells().zip(actual.cells()) {
        match (e, a) {
            (Some(e), Some(a)) => assert!(
                (e - a).abs() <= epsilon,
                "height mismatch at {}: {} vs {}",
                coord,
                e,
                a
            ),
            (None, None) => {}
            _ => panic!("presence mismatch at {}: {:?} vs {:?}", coord, e, a),
        }
    }
}
