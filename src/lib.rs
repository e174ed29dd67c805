//! The `tractseed` crate generates seed points for streamline tractography.
pub mod error;
pub mod geometry;
pub mod interpolation;
pub mod io;
pub mod num;
pub mod random;
pub mod seeding;
pub mod volume;
