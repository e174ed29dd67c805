//! Seeding on a regular sub-grid within every non-zero voxel.

use super::{
    cursor::{SharedVoxelTraversal, VoxelSubSampler},
    SeedOutcome, Seeder3,
};
use crate::{
    error::{SeedingError, SeedingResult},
    geometry::{
        Dim3::{X, Y, Z},
        Idx3, PointTransformation3, Vec3,
    },
    io::Verbosity,
    num::VoxelValue,
    volume::{fgr, Volume3},
};
use rand::RngCore;
use std::sync::Arc;

/// Steps through the `os x os x os` sub-grid positions of a voxel, with the
/// last index varying fastest.
#[derive(Clone, Debug)]
struct SubGridCounter {
    oversampling: usize,
    next: Option<Idx3<usize>>,
}

impl VoxelSubSampler for SubGridCounter {
    type Sample = Idx3<usize>;

    fn next_sample(&mut self) -> Option<Idx3<usize>> {
        let current = self.next.take()?;
        let mut next = current.clone();
        next[Z] += 1;
        if next[Z] == self.oversampling {
            next[Z] = 0;
            next[Y] += 1;
            if next[Y] == self.oversampling {
                next[Y] = 0;
                next[X] += 1;
            }
        }
        if next[X] < self.oversampling {
            self.next = Some(next);
        }
        Some(current)
    }

    fn restart(&mut self) {
        self.next = Some(Idx3::origin());
    }

    fn samples_per_voxel(&self) -> Option<usize> {
        self.oversampling.checked_pow(3)
    }
}

/// Generator of seed points on a regular `os x os x os` grid within every
/// non-zero voxel of a mask.
///
/// The sub-grid points are centered within the voxel, so for an
/// oversampling factor of one the seeds are the voxel centers.
pub struct GridPerVoxelSeeder3<T> {
    traversal: SharedVoxelTraversal<T, SubGridCounter>,
    oversampling: usize,
    n_seeds: usize,
    step: fgr,
    offset: fgr,
    description: String,
}

impl<T: VoxelValue> GridPerVoxelSeeder3<T> {
    /// Creates a new grid-per-voxel seeder.
    ///
    /// # Parameters
    ///
    /// - `mask`: Volume whose non-zero voxels receive seeds.
    /// - `oversampling`: Number of sub-grid points along each axis of a voxel. Must be at least one.
    /// - `verbosity`: Whether to print status messages.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new seeder.
    /// - `Err`: Contains an error if `oversampling` is zero or the total number of seeds overflows.
    pub fn new(
        mask: Arc<Volume3<T>>,
        oversampling: usize,
        verbosity: &Verbosity,
    ) -> SeedingResult<Self> {
        if oversampling == 0 {
            return Err(SeedingError::ZeroOversampling);
        }
        let step = 1.0 / oversampling as fgr;
        let offset = -0.5 + 0.5 * step;
        let description = format!(
            "grid per voxel ({}x{}x{} seeds per voxel of {})",
            oversampling,
            oversampling,
            oversampling,
            mask.name()
        );
        let counter = SubGridCounter {
            oversampling,
            next: None,
        };
        let traversal = SharedVoxelTraversal::new(mask, counter, verbosity);
        let n_seeds = traversal
            .number_of_units()
            .ok_or_else(|| SeedingError::TooManySeeds {
                seeder: description.clone(),
            })?;
        Ok(Self {
            traversal,
            oversampling,
            n_seeds,
            step,
            offset,
            description,
        })
    }

    /// Returns the number of sub-grid points along each axis of a voxel.
    pub fn oversampling(&self) -> usize {
        self.oversampling
    }

    fn sub_grid_offset(&self, sub_indices: &Idx3<usize>) -> Vec3<fgr> {
        Vec3::with_each_component(|dim| self.offset + self.step * sub_indices[dim] as fgr)
    }
}

impl<T: VoxelValue> Seeder3 for GridPerVoxelSeeder3<T> {
    fn description(&self) -> &str {
        &self.description
    }

    fn number_of_seeds(&self) -> Option<usize> {
        Some(self.n_seeds)
    }

    fn seeding_volume(&self) -> fgr {
        self.traversal.number_of_nonzero_voxels() as fgr * self.traversal.mask().voxel_volume()
    }

    fn get_seed(&self, _rng: &mut dyn RngCore) -> SeedingResult<SeedOutcome> {
        Ok(match self.traversal.claim_next_unit() {
            Some((indices, sub_indices)) => SeedOutcome::Seed(
                self.traversal
                    .mask()
                    .voxel_to_scanner()
                    .transform_voxel(&indices, &self.sub_grid_offset(&sub_indices)),
            ),
            None => SeedOutcome::Exhausted,
        })
    }
}
