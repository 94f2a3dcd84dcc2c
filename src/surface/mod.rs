//! Procedural ground-truth surfaces
//!
//! The [`SurfaceModel`] produces the height field that a synthetic
//! acquisition "measures". Generation is purely a function of grid size and
//! profile; noise is drawn from the model's own seedable generator so a run
//! can be reproduced exactly under test.
//!
//! # Profiles
//!
//! - [`SurfaceProfile::Coin`] - A flat disk with a gentle central bulge and a
//!   raised rim band. Cells outside the unit disk are absent.
//! - [`SurfaceProfile::Hill`] - A single Gaussian hill covering the whole grid.
//!
//! # Example
//!
//! ```
//! use surfscan::surface::{SurfaceModel, SurfaceProfile};
//!
//! let mut model = SurfaceModel::with_seed(SurfaceProfile::Coin, 42);
//! let truth = model.generate(32).unwrap();
//! let noisy = model.add_noise(&truth, 0.03).unwrap();
//! assert_eq!(noisy.size(), 32);
//! ```

pub mod noise;

pub use noise::apply_noise;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::HeightField;

/// Height of the central bulge at the disk centre
pub const BULGE_HEIGHT: f64 = 0.1;

/// Inner radius fraction of the raised rim band (exclusive)
pub const RIM_INNER: f64 = 0.8;

/// Outer radius fraction of the raised rim band (exclusive)
pub const RIM_OUTER: f64 = 0.95;

/// Extra height added inside the rim band
pub const RIM_HEIGHT: f64 = 0.15;

/// Falloff coefficient of the Gaussian hill
pub const HILL_FALLOFF: f64 = 4.0;

/// Shape of the generated ground truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceProfile {
    /// Coin-like disk with bulge and rim; absent outside the unit disk
    #[default]
    Coin,
    /// Gaussian hill; every cell present
    Hill,
}

impl SurfaceProfile {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SurfaceProfile::Coin => "Coin",
            SurfaceProfile::Hill => "Hill",
        }
    }

    /// Height at normalized radius `r`, or `None` outside the domain
    pub fn height_at(&self, r: f64) -> Option<f64> {
        match self {
            SurfaceProfile::Coin => {
                if r > 1.0 {
                    return None;
                }
                let mut z = BULGE_HEIGHT * (1.0 - r * r);
                if r > RIM_INNER && r < RIM_OUTER {
                    z += RIM_HEIGHT;
                }
                Some(z)
            }
            SurfaceProfile::Hill => Some((-HILL_FALLOFF * r * r).exp()),
        }
    }
}

impl std::fmt::Display for SurfaceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Map a grid index onto `[-1, 1]`
///
/// A one-cell grid maps to the centre.
fn normalize(index: usize, size: usize) -> f64 {
    if size <= 1 {
        return 0.0;
    }
    (index as f64 / (size - 1) as f64) * 2.0 - 1.0
}

/// Generates ground-truth fields and perturbs them with reproducible noise
#[derive(Debug, Clone)]
pub struct SurfaceModel {
    profile: SurfaceProfile,
    rng: StdRng,
}

impl SurfaceModel {
    /// Create a model whose noise is seeded from OS entropy
    pub fn new(profile: SurfaceProfile) -> Self {
        Self {
            profile,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a model with a fixed noise seed
    pub fn with_seed(profile: SurfaceProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a model from an optional seed
    pub fn from_seed(profile: SurfaceProfile, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(profile, seed),
            None => Self::new(profile),
        }
    }

    /// The profile this model generates
    pub fn profile(&self) -> SurfaceProfile {
        self.profile
    }

    /// Generate the ground-truth field for a `size x size` grid
    pub fn generate(&self, size: usize) -> Result<HeightField> {
        if size == 0 {
            return Err(ScanError::InvalidDimension { size });
        }

        let rows = (0..size)
            .map(|i| {
                let x = normalize(i, size);
                (0..size)
                    .map(|j| {
                        let y = normalize(j, size);
                        self.profile.height_at((x * x + y * y).sqrt())
                    })
                    .collect()
            })
            .collect();

        let field = HeightField::from_rows(rows)?;
        tracing::debug!(
            "Generated {} surface {}x{} ({} present cells)",
            self.profile,
            size,
            size,
            field.present_count()
        );
        Ok(field)
    }

    /// Return a noisy copy of `field` using this model's generator
    ///
    /// See [`apply_noise`] for the perturbation rule.
    pub fn add_noise(&mut self, field: &HeightField, amplitude: f64) -> Result<HeightField> {
        apply_noise(field, amplitude, &mut self.rng)
    }
}
