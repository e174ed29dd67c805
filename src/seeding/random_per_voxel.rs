//! Seeding a fixed number of random points in every non-zero voxel.

use super::{
    cursor::{SharedVoxelTraversal, VoxelSubSampler},
    draw_voxel_jitter, SeedOutcome, Seeder3,
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

/// Counts the seeds handed out for the current voxel.
#[derive(Clone, Debug)]
struct SeedCounter {
    samples_per_voxel: usize,
    n_emitted: usize,
}

impl VoxelSubSampler for SeedCounter {
    type Sample = ();

    fn next_sample(&mut self) -> Option<()> {
        if self.n_emitted < self.samples_per_voxel {
            self.n_emitted += 1;
            Some(())
        } else {
            None
        }
    }

    fn restart(&mut self) {
        self.n_emitted = 0;
    }

    fn samples_per_voxel(&self) -> Option<usize> {
        Some(self.samples_per_voxel)
    }
}

/// Generator of a fixed number of uniformly random seed points within every
/// non-zero voxel of a mask.
///
/// Voxels are visited in raster order, and the seeder is exhausted once
/// every voxel has received its seeds.
pub struct RandomPerVoxelSeeder3<T> {
    traversal: SharedVoxelTraversal<T, SeedCounter>,
    samples_per_voxel: usize,
    n_seeds: usize,
    description: String,
}

impl<T: VoxelValue> RandomPerVoxelSeeder3<T> {
    /// Creates a new random-per-voxel seeder.
    ///
    /// # Parameters
    ///
    /// - `mask`: Volume whose non-zero voxels receive seeds.
    /// - `samples_per_voxel`: Number of seeds to place in each non-zero voxel. Must be at least one.
    /// - `verbosity`: Whether to print status messages.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new seeder.
    /// - `Err`: Contains an error if `samples_per_voxel` is zero or the total number of seeds overflows.
    pub fn new(
        mask: Arc<Volume3<T>>,
        samples_per_voxel: usize,
        verbosity: &Verbosity,
    ) -> SeedingResult<Self> {
        if samples_per_voxel == 0 {
            return Err(SeedingError::ZeroSamplesPerVoxel);
        }
        let description = format!(
            "random per voxel ({} seeds per voxel of {})",
            samples_per_voxel,
            mask.name()
        );
        let counter = SeedCounter {
            samples_per_voxel,
            n_emitted: 0,
        };
        let traversal = SharedVoxelTraversal::new(mask, counter, verbosity);
        let n_seeds = traversal
            .number_of_units()
            .ok_or_else(|| SeedingError::TooManySeeds {
                seeder: description.clone(),
            })?;
        Ok(Self {
            traversal,
            samples_per_voxel,
            n_seeds,
            description,
        })
    }

    /// Returns the number of seeds placed in each non-zero voxel.
    pub fn samples_per_voxel(&self) -> usize {
        self.samples_per_voxel
    }
}

impl<T: VoxelValue> Seeder3 for RandomPerVoxelSeeder3<T> {
    fn description(&self) -> &str {
        &self.description
    }

    fn number_of_seeds(&self) -> Option<usize> {
        Some(self.n_seeds)
    }

    fn seeding_volume(&self) -> fgr {
        self.traversal.number_of_nonzero_voxels() as fgr * self.traversal.mask().voxel_volume()
    }

    fn get_seed(&self, rng: &mut dyn RngCore) -> SeedingResult<SeedOutcome> {
        Ok(match self.traversal.claim_next_unit() {
            Some((indices, ())) => {
                let offset = draw_voxel_jitter(rng);
                SeedOutcome::Seed(
                    self.traversal
                        .mask()
                        .voxel_to_scanner()
                        .transform_voxel(&indices, &offset),
                )
            }
            None => SeedOutcome::Exhausted,
        })
    }
}
