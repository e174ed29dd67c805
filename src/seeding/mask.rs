//! Seeding uniformly within the non-zero voxels of a mask.

use super::{
    draw_voxel_indices, draw_voxel_jitter, SeedOutcome, Seeder3, SAMPLING_ATTEMPT_SAFETY_FACTOR,
};
use crate::{
    error::{SeedingError, SeedingResult},
    geometry::PointTransformation3,
    io::Verbosity,
    num::VoxelValue,
    volume::{fgr, Volume3},
};
use rand::RngCore;
use std::sync::Arc;

/// Generator of seed points uniformly distributed over the non-zero voxels
/// of a mask.
///
/// Voxels are drawn uniformly from the whole grid until a non-zero one is
/// found, and the seed is placed uniformly within it.
#[derive(Clone, Debug)]
pub struct MaskSeeder3<T> {
    mask: Arc<Volume3<T>>,
    n_nonzero_voxels: usize,
    max_sampling_attempts: usize,
    description: String,
}

impl<T: VoxelValue> MaskSeeder3<T> {
    /// Creates a new mask seeder.
    ///
    /// # Parameters
    ///
    /// - `mask`: Volume whose non-zero voxels make up the seeding region.
    /// - `max_sampling_attempts`: Number of voxel draws allowed per seed, or `None` to derive it from the mask occupancy.
    /// - `verbosity`: Whether to print status messages.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new seeder.
    /// - `Err`: Contains an error if the mask has no non-zero voxels or the attempt cap is zero.
    pub fn new(
        mask: Arc<Volume3<T>>,
        max_sampling_attempts: Option<usize>,
        verbosity: &Verbosity,
    ) -> SeedingResult<Self> {
        if max_sampling_attempts == Some(0) {
            return Err(SeedingError::ZeroMaxAttempts);
        }
        let n_nonzero_voxels = mask.count_nonzero();
        if n_nonzero_voxels == 0 {
            return Err(SeedingError::EmptyMask(mask.name().to_string()));
        }
        let max_sampling_attempts = max_sampling_attempts.unwrap_or_else(|| {
            let n_draws_per_hit =
                (mask.number_of_voxels() + n_nonzero_voxels - 1) / n_nonzero_voxels;
            SAMPLING_ATTEMPT_SAFETY_FACTOR.saturating_mul(n_draws_per_hit)
        });
        if verbosity.print_messages() {
            println!(
                "Seeding from {} of {} voxels in {}",
                n_nonzero_voxels,
                mask.number_of_voxels(),
                mask.name()
            );
        }
        let description = format!("random seeding mask ({})", mask.name());
        Ok(Self {
            mask,
            n_nonzero_voxels,
            max_sampling_attempts,
            description,
        })
    }

    /// Returns a reference to the mask.
    pub fn mask(&self) -> &Volume3<T> {
        &self.mask
    }

    /// Returns the number of non-zero voxels in the mask.
    pub fn number_of_nonzero_voxels(&self) -> usize {
        self.n_nonzero_voxels
    }
}

impl<T: VoxelValue> Seeder3 for MaskSeeder3<T> {
    fn description(&self) -> &str {
        &self.description
    }

    fn max_sampling_attempts(&self) -> Option<usize> {
        Some(self.max_sampling_attempts)
    }

    fn seeding_volume(&self) -> fgr {
        self.n_nonzero_voxels as fgr * self.mask.voxel_volume()
    }

    fn get_seed(&self, rng: &mut dyn RngCore) -> SeedingResult<SeedOutcome> {
        let shape = self.mask.shape();
        for _ in 0..self.max_sampling_attempts {
            let indices = draw_voxel_indices(rng, &shape);
            if self.mask.value(&indices).is_nonzero() {
                let offset = draw_voxel_jitter(rng);
                return Ok(SeedOutcome::Seed(
                    self.mask.voxel_to_scanner().transform_voxel(&indices, &offset),
                ));
            }
        }
        Err(SeedingError::SamplingAttemptsExceeded {
            seeder: self.description.clone(),
            attempts: self.max_sampling_attempts,
        })
    }
}
