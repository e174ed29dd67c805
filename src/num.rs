//! Utilities related to numbers.

use num;
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync + Send + num::Float + num::cast::FromPrimitive + fmt::Debug + fmt::Display
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Marker trait for the scalar types that can be stored in a volume.
///
/// Any primitive number qualifies. Voxel values are only ever compared
/// against zero or converted to floating point.
pub trait VoxelValue: Copy + Sync + Send + PartialOrd + num::Zero + num::ToPrimitive + fmt::Debug {
    /// Whether the value counts as set in a binary mask.
    fn is_nonzero(self) -> bool {
        !self.is_zero()
    }

    /// Converts the value to the given floating point type.
    ///
    /// Values that cannot be represented become NaN.
    fn to_float<F: BFloat>(self) -> F {
        <F as num::NumCast>::from(self).unwrap_or_else(F::nan)
    }
}

impl<T> VoxelValue for T where
    T: Copy + Sync + Send + PartialOrd + num::Zero + num::ToPrimitive + fmt::Debug
{
}
