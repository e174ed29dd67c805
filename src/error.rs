//! Errors encountered while setting up or running a seeder.

use crate::geometry::Idx3;
use thiserror::Error;

/// Broad classification of a seeding error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedingErrorKind {
    /// Invalid construction parameters.
    Configuration,
    /// Malformed or empty input volume.
    Data,
    /// A sampling loop exceeded its safety cap, which should not happen for valid input.
    InternalInconsistency,
}

/// Error produced by seeder construction or seed sampling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeedingError {
    #[error("Sphere radius must be finite and positive, got {0}")]
    InvalidRadius(f64),

    #[error("Sphere center must have finite coordinates")]
    InvalidCenter,

    #[error("Number of seeds per voxel must be larger than zero")]
    ZeroSamplesPerVoxel,

    #[error("Oversampling factor must be larger than zero")]
    ZeroOversampling,

    #[error("Total number of seeds for {seeder} exceeds the largest representable count")]
    TooManySeeds { seeder: String },

    #[error("Maximum number of sampling attempts must be larger than zero")]
    ZeroMaxAttempts,

    #[error("Invalid seeding strategy specification {text:?}: {reason}")]
    InvalidStrategy { text: String, reason: String },

    #[error("Seeding strategy {0} requires an input volume")]
    MissingVolume(String),

    #[error("Cannot have negative values in an image used for rejection sampling: value {value} at voxel {indices} of {volume}")]
    NegativeWeight {
        volume: String,
        indices: Idx3<usize>,
        value: f64,
    },

    #[error("Cannot use non-finite values for rejection sampling: value {value} at voxel {indices} of {volume}")]
    NonFiniteWeight {
        volume: String,
        indices: Idx3<usize>,
        value: f64,
    },

    #[error("Cannot use image {0} for rejection sampling - image is empty")]
    EmptyWeights(String),

    #[error("Cannot seed from mask {0} - mask contains no non-zero voxels")]
    EmptyMask(String),

    #[error("Volume {0} has a singular voxel-to-scanner transformation")]
    SingularTransformation(String),

    #[error("Volume {name} has {ndim} dimensions, but at least 3 are required")]
    TooFewDimensions { name: String, ndim: usize },

    #[error("{seeder} seeder gave up after {attempts} sampling attempts")]
    SamplingAttemptsExceeded { seeder: String, attempts: usize },
}

impl SeedingError {
    /// Returns the classification of the error.
    pub fn kind(&self) -> SeedingErrorKind {
        match self {
            Self::InvalidRadius(_)
            | Self::InvalidCenter
            | Self::ZeroSamplesPerVoxel
            | Self::ZeroOversampling
            | Self::TooManySeeds { .. }
            | Self::ZeroMaxAttempts
            | Self::InvalidStrategy { .. }
            | Self::MissingVolume(_) => SeedingErrorKind::Configuration,
            Self::NegativeWeight { .. }
            | Self::NonFiniteWeight { .. }
            | Self::EmptyWeights(_)
            | Self::EmptyMask(_)
            | Self::SingularTransformation(_)
            | Self::TooFewDimensions { .. } => SeedingErrorKind::Data,
            Self::SamplingAttemptsExceeded { .. } => SeedingErrorKind::InternalInconsistency,
        }
    }
}

/// Result type for seeding operations.
pub type SeedingResult<T> = Result<T, SeedingError>;
