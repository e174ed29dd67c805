//! Seeding with a density proportional to the values of a weight image.

use super::{
    draw_voxel_indices, draw_voxel_jitter, sampling_attempt_cap, SeedOutcome, Seeder3,
};
use crate::{
    error::{SeedingError, SeedingResult},
    geometry::{
        Dim3::{X, Y, Z},
        Idx3, Point3, PointTransformation3,
    },
    interpolation::{Interpolator3, LinearInterpolator3},
    io::Verbosity,
    num::VoxelValue,
    volume::{fgr, Volume3},
};
use rand::{Rng, RngCore};
use std::{fmt, str::FromStr};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// How the weight at a candidate position is looked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum WeightLookup {
    /// Candidates are voxels, and seeds are placed uniformly within the accepted voxel.
    Nearest,
    /// Candidates are continuous positions between the outermost voxel centers,
    /// weighted by trilinear interpolation.
    Linear,
}

impl fmt::Display for WeightLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Nearest => "nearest",
                Self::Linear => "linear",
            }
        )
    }
}

impl FromStr for WeightLookup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            other => Err(format!("unknown weight lookup mode {:?}", other)),
        }
    }
}

/// Configuration parameters for the rejection seeder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct RejectionSeederConfig {
    /// How the weight at a candidate position is looked up.
    pub lookup: WeightLookup,
    /// Number of candidates allowed per seed, or `None` to derive it from the weights.
    pub max_sampling_attempts: Option<usize>,
}

impl RejectionSeederConfig {
    pub const DEFAULT_LOOKUP: WeightLookup = WeightLookup::Nearest;
    pub const DEFAULT_MAX_SAMPLING_ATTEMPTS: Option<usize> = None;

    /// Returns an error if any of the configuration parameter values are invalid.
    pub fn validate(&self) -> SeedingResult<()> {
        if self.max_sampling_attempts == Some(0) {
            Err(SeedingError::ZeroMaxAttempts)
        } else {
            Ok(())
        }
    }
}

impl Default for RejectionSeederConfig {
    fn default() -> Self {
        RejectionSeederConfig {
            lookup: Self::DEFAULT_LOOKUP,
            max_sampling_attempts: Self::DEFAULT_MAX_SAMPLING_ATTEMPTS,
        }
    }
}

/// Summary of the positive weights in an image.
#[derive(Clone, Debug)]
struct WeightStatistics {
    max_weight: fgr,
    weight_sum: fgr,
    lower: Idx3<usize>,
    upper: Idx3<usize>,
}

/// Generator of seed points with a density proportional to the voxel values
/// of a non-negative weight image.
///
/// The image is cropped to the bounding box of its positive voxels, padded by
/// one voxel where possible, and candidates drawn uniformly within the
/// cropped region are accepted with probability `weight / max_weight`.
#[derive(Clone, Debug)]
pub struct RejectionSeeder3 {
    weights: Volume3<fgr>,
    interpolator: LinearInterpolator3,
    lookup: WeightLookup,
    max_weight: fgr,
    weighted_volume: fgr,
    max_sampling_attempts: usize,
    description: String,
}

impl RejectionSeeder3 {
    /// Creates a new rejection seeder.
    ///
    /// # Parameters
    ///
    /// - `weights`: Image of non-negative seeding weights. A private copy of the relevant region is kept.
    /// - `config`: Configuration parameters for the seeder.
    /// - `verbosity`: Whether to print status messages.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new seeder.
    /// - `Err`: Contains an error if the configuration is invalid or if the image has
    /// negative or non-finite values or no positive values.
    ///
    /// # Type parameters
    ///
    /// - `T`: Type of the voxel values.
    pub fn new<T>(
        weights: &Volume3<T>,
        config: RejectionSeederConfig,
        verbosity: &Verbosity,
    ) -> SeedingResult<Self>
    where
        T: VoxelValue,
    {
        config.validate()?;

        let statistics = compute_weight_statistics(weights)?;
        let shape = weights.shape();
        let lower = Idx3::with_each_component(|dim| statistics.lower[dim].saturating_sub(1));
        let upper = Idx3::with_each_component(|dim| {
            usize::min(statistics.upper[dim] + 1, shape[dim] - 1)
        });

        let cropped = weights.cropped(&lower, &upper).mapv(|value| value.to_float::<fgr>());
        let n_cropped_voxels = cropped.number_of_voxels();

        if verbosity.print_messages() {
            println!(
                "Cropped rejection sampling image {} from {} to {} voxels (bounds {} to {}), max weight {}",
                weights.name(),
                weights.number_of_voxels(),
                n_cropped_voxels,
                lower,
                upper,
                statistics.max_weight
            );
        }

        let max_sampling_attempts = config.max_sampling_attempts.unwrap_or_else(|| {
            let acceptance_probability =
                statistics.weight_sum / (n_cropped_voxels as fgr * statistics.max_weight);
            sampling_attempt_cap(acceptance_probability)
        });

        let description = format!("rejection sampling ({}, {} lookup)", weights.name(), config.lookup);

        Ok(Self {
            weights: cropped,
            interpolator: LinearInterpolator3,
            lookup: config.lookup,
            max_weight: statistics.max_weight,
            weighted_volume: statistics.weight_sum * n_cropped_voxels as fgr,
            max_sampling_attempts,
            description,
        })
    }

    /// Returns a reference to the cropped weight image.
    pub fn weights(&self) -> &Volume3<fgr> {
        &self.weights
    }

    /// Returns the weight lookup mode.
    pub fn lookup(&self) -> WeightLookup {
        self.lookup
    }

    /// Returns the largest weight in the image.
    pub fn max_weight(&self) -> fgr {
        self.max_weight
    }

    /// Returns the sum of positive weights multiplied by the number of
    /// voxels in the cropped region.
    pub fn weighted_volume(&self) -> fgr {
        self.weighted_volume
    }

    fn draw_threshold<R: Rng + ?Sized>(&self, rng: &mut R) -> fgr {
        // In (0, max_weight], so zero weights are never accepted.
        self.max_weight * (1.0 - rng.gen::<fgr>())
    }

    fn get_seed_nearest(&self, rng: &mut dyn RngCore) -> Option<Point3<fgr>> {
        let indices = draw_voxel_indices(rng, &self.weights.shape());
        let threshold = self.draw_threshold(rng);
        if self.weights.value(&indices) >= threshold {
            let offset = draw_voxel_jitter(rng);
            Some(
                self.weights
                    .voxel_to_scanner()
                    .transform_voxel(&indices, &offset),
            )
        } else {
            None
        }
    }

    fn get_seed_linear(&self, rng: &mut dyn RngCore) -> Option<Point3<fgr>> {
        let shape = self.weights.shape();
        let [u, v, w]: [fgr; 3] = rng.gen();
        let voxel_position = Point3::new(
            u * (shape[X] - 1) as fgr,
            v * (shape[Y] - 1) as fgr,
            w * (shape[Z] - 1) as fgr,
        );
        let threshold = self.draw_threshold(rng);
        let weight = self
            .interpolator
            .interp_volume_value(&self.weights, &voxel_position)
            .unwrap_or(0.0);
        if weight >= threshold {
            Some(self.weights.voxel_to_scanner().transform(&voxel_position))
        } else {
            None
        }
    }
}

impl Seeder3 for RejectionSeeder3 {
    fn description(&self) -> &str {
        &self.description
    }

    fn max_sampling_attempts(&self) -> Option<usize> {
        Some(self.max_sampling_attempts)
    }

    fn seeding_volume(&self) -> fgr {
        self.weighted_volume * self.weights.voxel_volume()
    }

    fn get_seed(&self, rng: &mut dyn RngCore) -> SeedingResult<SeedOutcome> {
        for _ in 0..self.max_sampling_attempts {
            let candidate = match self.lookup {
                WeightLookup::Nearest => self.get_seed_nearest(rng),
                WeightLookup::Linear => self.get_seed_linear(rng),
            };
            if let Some(point) = candidate {
                return Ok(SeedOutcome::Seed(point));
            }
        }
        Err(SeedingError::SamplingAttemptsExceeded {
            seeder: self.description.clone(),
            attempts: self.max_sampling_attempts,
        })
    }
}

/// Scans the image in raster order, verifying that all values are finite and
/// non-negative and finding the extent and magnitude of the positive values.
fn compute_weight_statistics<T: VoxelValue>(weights: &Volume3<T>) -> SeedingResult<WeightStatistics> {
    let mut max_weight: fgr = 0.0;
    let mut weight_sum: fgr = 0.0;
    let mut bounds: Option<(Idx3<usize>, Idx3<usize>)> = None;

    for ((i, j, k), &value) in weights.values().indexed_iter() {
        let value = value.to_float::<fgr>();
        let indices = Idx3::new(i, j, k);
        if !value.is_finite() {
            return Err(SeedingError::NonFiniteWeight {
                volume: weights.name().to_string(),
                indices,
                value,
            });
        }
        if value < 0.0 {
            return Err(SeedingError::NegativeWeight {
                volume: weights.name().to_string(),
                indices,
                value,
            });
        }
        if value > 0.0 {
            max_weight = fgr::max(max_weight, value);
            weight_sum += value;
            bounds = Some(match bounds {
                None => (indices.clone(), indices),
                Some((lower, upper)) => (lower.min_with(&indices), upper.max_with(&indices)),
            });
        }
    }

    match bounds {
        Some((lower, upper)) => Ok(WeightStatistics {
            max_weight,
            weight_sum,
            lower,
            upper,
        }),
        None => Err(SeedingError::EmptyWeights(weights.name().to_string())),
    }
}
