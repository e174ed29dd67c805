//! Selection and construction of seeders.

use super::{
    grid_per_voxel::GridPerVoxelSeeder3,
    mask::MaskSeeder3,
    random_per_voxel::RandomPerVoxelSeeder3,
    rejection::{RejectionSeeder3, RejectionSeederConfig, WeightLookup},
    sphere::SphereSeeder3,
    Seeder3,
};
use crate::{
    error::{SeedingError, SeedingResult},
    geometry::{
        Dim3::{X, Y, Z},
        Point3,
    },
    io::Verbosity,
    num::VoxelValue,
    volume::{fgr, Volume3},
};
use std::{fmt, str::FromStr, sync::Arc};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Strategy for generating seed points, with its parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SeedingStrategy {
    /// Uniformly within a sphere in scanner coordinates.
    Sphere { center: Point3<fgr>, radius: fgr },
    /// Uniformly within the non-zero voxels of a mask.
    Mask { max_sampling_attempts: Option<usize> },
    /// A fixed number of random seeds in every non-zero voxel of a mask.
    RandomPerVoxel { samples_per_voxel: usize },
    /// A regular sub-grid of seeds in every non-zero voxel of a mask.
    GridPerVoxel { oversampling: usize },
    /// With a density proportional to the values of a weight image.
    Rejection(RejectionSeederConfig),
}

impl SeedingStrategy {
    pub const DEFAULT_SAMPLES_PER_VOXEL: usize = 1;
    pub const DEFAULT_OVERSAMPLING: usize = 1;

    /// Returns the name used for the strategy in textual specifications.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Mask { .. } => "mask",
            Self::RandomPerVoxel { .. } => "random_per_voxel",
            Self::GridPerVoxel { .. } => "grid_per_voxel",
            Self::Rejection(_) => "rejection",
        }
    }

    /// Whether the strategy needs an input volume.
    pub fn requires_volume(&self) -> bool {
        !matches!(self, Self::Sphere { .. })
    }

    /// Returns an error if any of the strategy parameters are invalid.
    pub fn validate(&self) -> SeedingResult<()> {
        match self {
            Self::Sphere { center, radius } => {
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(SeedingError::InvalidRadius(*radius));
                }
                if ![X, Y, Z].iter().all(|&dim| center[dim].is_finite()) {
                    return Err(SeedingError::InvalidCenter);
                }
            }
            Self::Mask {
                max_sampling_attempts,
            } => {
                if *max_sampling_attempts == Some(0) {
                    return Err(SeedingError::ZeroMaxAttempts);
                }
            }
            Self::RandomPerVoxel { samples_per_voxel } => {
                if *samples_per_voxel == 0 {
                    return Err(SeedingError::ZeroSamplesPerVoxel);
                }
            }
            Self::GridPerVoxel { oversampling } => {
                if *oversampling == 0 {
                    return Err(SeedingError::ZeroOversampling);
                }
            }
            Self::Rejection(config) => config.validate()?,
        }
        Ok(())
    }
}

impl fmt::Display for SeedingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sphere { center, radius } => write!(
                f,
                "sphere:{},{},{},{}",
                center[X], center[Y], center[Z], radius
            ),
            Self::Mask {
                max_sampling_attempts: None,
            } => write!(f, "mask"),
            Self::Mask {
                max_sampling_attempts: Some(max_sampling_attempts),
            } => write!(f, "mask:{}", max_sampling_attempts),
            Self::RandomPerVoxel { samples_per_voxel } => {
                write!(f, "random_per_voxel:{}", samples_per_voxel)
            }
            Self::GridPerVoxel { oversampling } => write!(f, "grid_per_voxel:{}", oversampling),
            Self::Rejection(RejectionSeederConfig {
                lookup,
                max_sampling_attempts: None,
            }) => write!(f, "rejection:{}", lookup),
            Self::Rejection(RejectionSeederConfig {
                lookup,
                max_sampling_attempts: Some(max_sampling_attempts),
            }) => write!(f, "rejection:{},{}", lookup, max_sampling_attempts),
        }
    }
}

impl FromStr for SeedingStrategy {
    type Err = SeedingError;

    /// Parses one of the forms `sphere:x,y,z,radius`, `mask[:max_attempts]`,
    /// `random_per_voxel[:num]`, `grid_per_voxel[:oversampling]` and
    /// `rejection[:nearest|linear[,max_attempts]]`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| SeedingError::InvalidStrategy {
            text: text.to_string(),
            reason,
        };
        let (name, arguments) = match text.trim().split_once(':') {
            Some((name, arguments)) => (name.trim(), Some(arguments)),
            None => (text.trim(), None),
        };

        let strategy = match name.to_lowercase().as_str() {
            "sphere" => {
                let values: Vec<fgr> = parse_values(arguments.unwrap_or(""), 4, 4).map_err(invalid)?;
                Self::Sphere {
                    center: Point3::new(values[0], values[1], values[2]),
                    radius: values[3],
                }
            }
            "mask" => Self::Mask {
                max_sampling_attempts: parse_optional_value(arguments).map_err(invalid)?,
            },
            "random_per_voxel" => Self::RandomPerVoxel {
                samples_per_voxel: parse_optional_value(arguments)
                    .map_err(invalid)?
                    .unwrap_or(Self::DEFAULT_SAMPLES_PER_VOXEL),
            },
            "grid_per_voxel" => Self::GridPerVoxel {
                oversampling: parse_optional_value(arguments)
                    .map_err(invalid)?
                    .unwrap_or(Self::DEFAULT_OVERSAMPLING),
            },
            "rejection" => {
                let mut config = RejectionSeederConfig::default();
                if let Some(arguments) = arguments {
                    let mut parts = arguments.splitn(2, ',');
                    if let Some(lookup) = parts.next().filter(|part| !part.trim().is_empty()) {
                        config.lookup = lookup.parse::<WeightLookup>().map_err(invalid)?;
                    }
                    config.max_sampling_attempts =
                        parse_optional_value(parts.next()).map_err(invalid)?;
                }
                Self::Rejection(config)
            }
            other => return Err(invalid(format!("unknown seeding strategy {:?}", other))),
        };
        strategy.validate()?;
        Ok(strategy)
    }
}

/// Parses a comma-separated list of between `min_count` and `max_count` values.
fn parse_values<V>(arguments: &str, min_count: usize, max_count: usize) -> Result<Vec<V>, String>
where
    V: FromStr,
    V::Err: fmt::Display,
{
    let values = arguments
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<V>()
                .map_err(|err| format!("could not parse {:?}: {}", part.trim(), err))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() < min_count || values.len() > max_count {
        Err(format!(
            "expected {} comma-separated values, got {}",
            if min_count == max_count {
                min_count.to_string()
            } else {
                format!("{}-{}", min_count, max_count)
            },
            values.len()
        ))
    } else {
        Ok(values)
    }
}

fn parse_optional_value<V>(arguments: Option<&str>) -> Result<Option<V>, String>
where
    V: FromStr,
    V::Err: fmt::Display,
{
    match arguments.map(str::trim) {
        None | Some("") => Ok(None),
        Some(argument) => parse_values(argument, 1, 1).map(|mut values| values.pop()),
    }
}

/// Configuration parameters for seeding.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SeederConfig {
    /// Seeding strategy and its parameters.
    pub strategy: SeedingStrategy,
    /// Whether and how to print status output.
    #[cfg_attr(feature = "serialization", serde(skip))]
    pub verbosity: Verbosity,
}

impl SeederConfig {
    /// Creates a new configuration for the given strategy with no status output.
    pub fn new(strategy: SeedingStrategy) -> Self {
        Self {
            strategy,
            verbosity: Verbosity::default(),
        }
    }

    /// Returns the configuration with the given verbosity.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Returns an error if any of the configuration parameter values are invalid.
    pub fn validate(&self) -> SeedingResult<()> {
        self.strategy.validate()
    }
}

impl FromStr for SeederConfig {
    type Err = SeedingError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        text.parse().map(Self::new)
    }
}

/// Creates the seeder described by the given configuration.
///
/// # Parameters
///
/// - `config`: Configuration selecting the seeding strategy.
/// - `volume`: Mask or weight image, required by every strategy except `Sphere`.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the new seeder, ready to be shared between workers.
/// - `Err`: Contains a configuration or data error.
///
/// # Type parameters
///
/// - `T`: Type of the voxel values.
pub fn build_seeder<T>(
    config: &SeederConfig,
    volume: Option<Arc<Volume3<T>>>,
) -> SeedingResult<Box<dyn Seeder3>>
where
    T: VoxelValue + 'static,
{
    config.validate()?;
    let verbosity = &config.verbosity;

    let required_volume = || {
        volume
            .clone()
            .ok_or_else(|| SeedingError::MissingVolume(config.strategy.name().to_string()))
    };

    let seeder: Box<dyn Seeder3> = match &config.strategy {
        SeedingStrategy::Sphere { center, radius } => {
            Box::new(SphereSeeder3::new(center.clone(), *radius)?)
        }
        SeedingStrategy::Mask {
            max_sampling_attempts,
        } => Box::new(MaskSeeder3::new(
            required_volume()?,
            *max_sampling_attempts,
            verbosity,
        )?),
        SeedingStrategy::RandomPerVoxel { samples_per_voxel } => Box::new(
            RandomPerVoxelSeeder3::new(required_volume()?, *samples_per_voxel, verbosity)?,
        ),
        SeedingStrategy::GridPerVoxel { oversampling } => Box::new(GridPerVoxelSeeder3::new(
            required_volume()?,
            *oversampling,
            verbosity,
        )?),
        SeedingStrategy::Rejection(rejection_config) => Box::new(RejectionSeeder3::new(
            required_volume()?.as_ref(),
            rejection_config.clone(),
            verbosity,
        )?),
    };

    if verbosity.print_messages() {
        println!("Created seeder: {}", seeder.description());
    }
    Ok(seeder)
}
