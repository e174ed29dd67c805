//! Seeding uniformly within a sphere.

use super::{SeedOutcome, Seeder3};
use crate::{
    error::{SeedingError, SeedingResult},
    geometry::{
        Dim3::{X, Y, Z},
        Point3, Vec3,
    },
    volume::fgr,
};
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// Generator of seed points uniformly distributed within a sphere in
/// scanner coordinates.
#[derive(Clone, Debug)]
pub struct SphereSeeder3 {
    center: Point3<fgr>,
    radius: fgr,
    description: String,
}

impl SphereSeeder3 {
    /// Creates a new sphere seeder.
    ///
    /// # Parameters
    ///
    /// - `center`: Center of the sphere in scanner coordinates.
    /// - `radius`: Radius of the sphere. Must be finite and positive.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new seeder.
    /// - `Err`: Contains an error if the center or radius is invalid.
    pub fn new(center: Point3<fgr>, radius: fgr) -> SeedingResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SeedingError::InvalidRadius(radius));
        }
        if ![X, Y, Z].iter().all(|&dim| center[dim].is_finite()) {
            return Err(SeedingError::InvalidCenter);
        }
        let description = format!("sphere (center {}, radius {})", center, radius);
        Ok(Self {
            center,
            radius,
            description,
        })
    }

    /// Returns a reference to the center of the sphere.
    pub fn center(&self) -> &Point3<fgr> {
        &self.center
    }

    /// Returns the radius of the sphere.
    pub fn radius(&self) -> fgr {
        self.radius
    }
}

impl Seeder3 for SphereSeeder3 {
    fn description(&self) -> &str {
        &self.description
    }

    fn seeding_volume(&self) -> fgr {
        4.0 * PI * self.radius.powi(3) / 3.0
    }

    fn get_seed(&self, rng: &mut dyn RngCore) -> SeedingResult<SeedOutcome> {
        // Acceptance rate is pi/6, so the loop ends quickly.
        let direction = loop {
            let [x, y, z]: [fgr; 3] = rng.gen();
            let candidate = Vec3::new(2.0 * x - 1.0, 2.0 * y - 1.0, 2.0 * z - 1.0);
            if candidate.squared_length() <= 1.0 {
                break candidate;
            }
        };
        Ok(SeedOutcome::Seed(&self.center + &(direction * self.radius)))
    }
}
