//! Generation of seed points for streamline tractography.

pub mod config;
pub mod cursor;
pub mod grid_per_voxel;
pub mod mask;
pub mod random_per_voxel;
pub mod rejection;
pub mod sphere;

use crate::{
    error::SeedingResult,
    geometry::{
        Dim3::{X, Y, Z},
        Idx3, In3D, Point3, Vec3,
    },
    io::Verbosity,
    random::WorkerRngFactory,
    volume::fgr,
};
use indicatif::ParallelProgressIterator;
use rand::{Rng, RngCore};
use rayon::prelude::*;

/// Number of expected sampling attempts per accepted seed that a rejection
/// sampling loop may use before giving up.
pub const SAMPLING_ATTEMPT_SAFETY_FACTOR: usize = 1000;

/// Result of requesting a seed point from a seeder.
#[derive(Clone, Debug, PartialEq)]
pub enum SeedOutcome {
    /// A seed point in scanner coordinates.
    Seed(Point3<fgr>),
    /// The seeder has produced all of its seed points.
    Exhausted,
}

impl SeedOutcome {
    /// Returns the seed point, or `None` if the seeder was exhausted.
    pub fn into_point(self) -> Option<Point3<fgr>> {
        match self {
            Self::Seed(point) => Some(point),
            Self::Exhausted => None,
        }
    }

    /// Whether the seeder was exhausted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Defines the properties of a 3D seed point generator.
///
/// A single seeder is shared between all the tracking workers of a session,
/// which call `get_seed` concurrently. Each worker supplies its own random
/// number generator.
pub trait Seeder3: Sync + Send {
    /// Returns a description of the seeder for diagnostic output.
    fn description(&self) -> &str;

    /// Returns the maximum number of candidate draws a single `get_seed` call
    /// will make before reporting an error, or `None` if sampling is not
    /// capped.
    fn max_sampling_attempts(&self) -> Option<usize> {
        None
    }

    /// Returns the total number of seed points the seeder will produce, or
    /// `None` if it produces seed points indefinitely.
    fn number_of_seeds(&self) -> Option<usize> {
        None
    }

    /// Whether the seeder eventually becomes exhausted.
    fn is_finite(&self) -> bool {
        self.number_of_seeds().is_some()
    }

    /// Returns the physical volume of the seeding region.
    fn seeding_volume(&self) -> fgr;

    /// Produces the next seed point.
    ///
    /// # Parameters
    ///
    /// - `rng`: Random number generator owned by the calling worker.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains a `SeedOutcome` with either a new seed point or an exhaustion signal.
    /// - `Err`: Contains an error if sampling exceeded its safety cap.
    fn get_seed(&self, rng: &mut dyn RngCore) -> SeedingResult<SeedOutcome>;
}

/// Iterator over the seed points produced for a single worker.
///
/// Ends when the seeder is exhausted or after yielding the first error.
pub struct SeedStream<'a, R> {
    seeder: &'a dyn Seeder3,
    rng: R,
    is_finished: bool,
}

impl<'a, R: RngCore> SeedStream<'a, R> {
    /// Creates a new stream drawing from the given seeder with the given random number generator.
    pub fn new(seeder: &'a dyn Seeder3, rng: R) -> Self {
        Self {
            seeder,
            rng,
            is_finished: false,
        }
    }
}

impl<R: RngCore> Iterator for SeedStream<'_, R> {
    type Item = SeedingResult<Point3<fgr>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished {
            return None;
        }
        match self.seeder.get_seed(&mut self.rng) {
            Ok(SeedOutcome::Seed(point)) => Some(Ok(point)),
            Ok(SeedOutcome::Exhausted) => {
                self.is_finished = true;
                None
            }
            Err(err) => {
                self.is_finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Draws seed points from the given seeder using all available threads.
///
/// # Parameters
///
/// - `seeder`: Seeder to draw from.
/// - `max_seeds`: Maximum number of seed points to draw.
/// - `rng_factory`: Factory providing an independent random number generator for each worker.
/// - `verbosity`: Whether and how to report progress.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the drawn seed points, in no particular order. For a finite seeder
/// this is all of its seed points if `max_seeds` is large enough.
/// - `Err`: Contains the first error encountered while sampling.
pub fn draw_seeds_in_parallel(
    seeder: &dyn Seeder3,
    max_seeds: usize,
    rng_factory: &WorkerRngFactory,
    verbosity: &Verbosity,
) -> SeedingResult<Vec<Point3<fgr>>> {
    let n_requests = seeder
        .number_of_seeds()
        .map_or(max_seeds, |n_seeds| usize::min(n_seeds, max_seeds));

    if verbosity.print_messages() {
        println!(
            "Drawing {} seed points from {}",
            n_requests,
            seeder.description()
        );
    }

    let seed_points = (0..n_requests)
        .into_par_iter()
        .progress_with(verbosity.create_progress_bar(n_requests as u64))
        .map_init(
            || rng_factory.create(),
            |rng, _| seeder.get_seed(rng),
        )
        .filter_map(|outcome| match outcome {
            Ok(SeedOutcome::Seed(point)) => Some(Ok(point)),
            Ok(SeedOutcome::Exhausted) => None,
            Err(err) => Some(Err(err)),
        })
        .collect::<SeedingResult<Vec<_>>>()?;

    if verbosity.print_messages() {
        println!("Drew {} seed points", seed_points.len());
    }
    Ok(seed_points)
}

/// Draws uniformly distributed voxel indices within the given shape.
pub(crate) fn draw_voxel_indices<R>(rng: &mut R, shape: &In3D<usize>) -> Idx3<usize>
where
    R: Rng + ?Sized,
{
    let i = rng.gen_range(0..shape[X]);
    let j = rng.gen_range(0..shape[Y]);
    let k = rng.gen_range(0..shape[Z]);
    Idx3::new(i, j, k)
}

/// Draws a uniformly distributed offset within a voxel, in `[-0.5, 0.5)` along each axis.
pub(crate) fn draw_voxel_jitter<R>(rng: &mut R) -> Vec3<fgr>
where
    R: Rng + ?Sized,
{
    let [x, y, z]: [fgr; 3] = rng.gen();
    Vec3::new(x - 0.5, y - 0.5, z - 0.5)
}

/// Computes how many candidate draws a rejection sampling loop with the
/// given acceptance probability may make before giving up.
pub(crate) fn sampling_attempt_cap(acceptance_probability: fgr) -> usize {
    let cap = (SAMPLING_ATTEMPT_SAFETY_FACTOR as fgr / acceptance_probability).ceil();
    if cap.is_finite() && cap < usize::MAX as fgr {
        usize::max(cap as usize, 1)
    } else {
        usize::MAX
    }
}
