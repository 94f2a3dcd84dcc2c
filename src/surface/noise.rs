//! Measurement noise
//!
//! Noise is applied with an explicit generator so callers decide whether a
//! run is reproducible (seeded `StdRng`) or not (entropy-seeded).

use rand::Rng;

use crate::error::{Result, ScanError};
use crate::types::HeightField;

/// Perturb every present cell of `field` with uniform noise
///
/// Each present height gets an offset drawn uniformly from
/// `[-amplitude / 2, amplitude / 2)`. Absent cells pass through unchanged.
/// A perturbed height below zero becomes absent: negative heights are
/// treated as "no return" rather than clamped to zero.
pub fn apply_noise<R: Rng + ?Sized>(
    field: &HeightField,
    amplitude: f64,
    rng: &mut R,
) -> Result<HeightField> {
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(ScanError::InvalidNoiseAmplitude(amplitude));
    }

    let mut dropped = 0usize;
    let noisy = field.map_present(|z| {
        let perturbed = z + (rng.gen::<f64>() - 0.5) * amplitude;
        if perturbed < 0.0 {
            dropped += 1;
            None
        } else {
            Some(perturbed)
        }
    });

    if dropped > 0 {
        tracing::debug!("Noise pushed {} cells below zero; marked absent", dropped);
    }

    Ok(noisy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridCoord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flat_field(size: usize, height: f64) -> HeightField {
        HeightField::from_rows(vec![vec![Some(height); size]; size]).unwrap()
    }

    #[test]
    fn test_rejects_bad_amplitude() {
        let field = flat_field(2, 1.0);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            apply_noise(&field, -0.1, &mut rng),
            Err(ScanError::InvalidNoiseAmplitude(_))
        ));
        assert!(apply_noise(&field, f64::NAN, &mut rng).is_err());
        assert!(apply_noise(&field, f64::INFINITY, &mut rng).is_err());
    }

    #[test]
    fn test_zero_amplitude_is_identity() {
        let field = flat_field(5, 0.3);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(apply_noise(&field, 0.0, &mut rng).unwrap(), field);
    }

    #[test]
    fn test_noise_within_bounds() {
        let field = flat_field(20, 10.0);
        let mut rng = StdRng::seed_from_u64(3);
        let amplitude = 0.4;

        let noisy = apply_noise(&field, amplitude, &mut rng).unwrap();
        for (_, value) in noisy.cells() {
            let z = value.unwrap();
            assert!((z - 10.0).abs() <= amplitude / 2.0 + 1e-12);
        }
    }

    #[test]
    fn test_absent_cells_pass_through() {
        let field = HeightField::from_rows(vec![vec![None, Some(1.0)], vec![Some(1.0), None]])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let noisy = apply_noise(&field, 0.1, &mut rng).unwrap();
        assert!(!noisy.is_present(GridCoord::new(0, 0)));
        assert!(!noisy.is_present(GridCoord::new(1, 1)));
        assert!(noisy.is_present(GridCoord::new(0, 1)));
    }

    #[test]
    fn test_negative_heights_become_absent() {
        // Every cell starts at zero, so roughly half the draws go negative
        let field = flat_field(30, 0.0);
        let mut rng = StdRng::seed_from_u64(11);

        let noisy = apply_noise(&field, 1.0, &mut rng).unwrap();
        let present = noisy.present_count();
        assert!(present > 0 && present < field.cell_count());
        for (_, value) in noisy.cells() {
            if let Some(z) = value {
                assert!(z >= 0.0);
            }
        }
    }
}
