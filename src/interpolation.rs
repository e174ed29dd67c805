//! Interpolation of voxel values.

use crate::{
    geometry::{
        Dim3::{self, X, Y, Z},
        Idx3, In3D, Point3,
    },
    num::VoxelValue,
    volume::{fgr, Volume3},
};

/// Defines the properties of a 3D interpolator.
pub trait Interpolator3: Clone + Sync + Send {
    /// Computes the interpolated value of a volume at the given position.
    ///
    /// # Parameters
    ///
    /// - `volume`: Volume to interpolate.
    /// - `voxel_position`: Position in continuous voxel coordinates where the interpolated value should be computed.
    ///
    /// # Returns
    ///
    /// An `Option` which is either:
    ///
    /// - `Some`: Contains the interpolated value.
    /// - `None`: The position lies outside the range spanned by the voxel centers.
    ///
    /// # Type parameters
    ///
    /// - `T`: Type of the voxel values.
    fn interp_volume_value<T>(&self, volume: &Volume3<T>, voxel_position: &Point3<fgr>) -> Option<fgr>
    where
        T: VoxelValue;
}

/// Trilinear interpolator between the eight voxel centers surrounding a position.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearInterpolator3;

impl LinearInterpolator3 {
    /// Finds the lower voxel index and the fractional distance towards the
    /// next voxel center along one dimension.
    fn lower_index_and_weight(position: fgr, size: usize) -> Option<(usize, fgr)> {
        let max_position = (size - 1) as fgr;
        if !(position >= 0.0 && position <= max_position) {
            return None;
        }
        if size == 1 {
            return Some((0, 0.0));
        }
        let lower = usize::min(position.floor() as usize, size - 2);
        Some((lower, position - lower as fgr))
    }
}

impl Interpolator3 for LinearInterpolator3 {
    fn interp_volume_value<T>(&self, volume: &Volume3<T>, voxel_position: &Point3<fgr>) -> Option<fgr>
    where
        T: VoxelValue,
    {
        let shape = volume.shape();
        let mut lower = In3D::same(0_usize);
        let mut weights = In3D::same(0.0);
        for dim in Dim3::slice() {
            let (idx, weight) = Self::lower_index_and_weight(voxel_position[dim], shape[dim])?;
            lower[dim] = idx;
            weights[dim] = weight;
        }

        let mut value = 0.0;
        for corner in 0..8_usize {
            let offsets = In3D::new(corner & 1, (corner >> 1) & 1, corner >> 2);
            let mut corner_weight = 1.0;
            for dim in Dim3::slice() {
                corner_weight *= if offsets[dim] == 1 {
                    weights[dim]
                } else {
                    1.0 - weights[dim]
                };
            }
            if corner_weight == 0.0 {
                continue;
            }
            let indices = Idx3::new(
                lower[X] + offsets[X],
                lower[Y] + offsets[Y],
                lower[Z] + offsets[Z],
            );
            value += corner_weight * volume.value(&indices).to_float::<fgr>();
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    fn linear_ramp() -> Volume3<f32> {
        let values = Array3::from_shape_fn((3, 4, 2), |(i, j, k)| (i + 2 * j + 3 * k) as f32);
        Volume3::with_identity_transformation("ramp".to_string(), values)
    }

    #[test]
    fn interpolation_reproduces_voxel_values() {
        let volume = linear_ramp();
        let value = LinearInterpolator3
            .interp_volume_value(&volume, &Point3::new(2.0, 3.0, 1.0))
            .unwrap();
        assert_abs_diff_eq!(value, 11.0);
    }

    #[test]
    fn interpolation_is_exact_for_linear_data() {
        let volume = linear_ramp();
        let value = LinearInterpolator3
            .interp_volume_value(&volume, &Point3::new(0.25, 1.5, 0.75))
            .unwrap();
        assert_abs_diff_eq!(value, 0.25 + 3.0 + 2.25, epsilon = 1e-12);
    }

    #[test]
    fn positions_outside_voxel_centers_are_rejected() {
        let volume = linear_ramp();
        assert!(LinearInterpolator3
            .interp_volume_value(&volume, &Point3::new(-0.1, 1.0, 0.5))
            .is_none());
        assert!(LinearInterpolator3
            .interp_volume_value(&volume, &Point3::new(1.0, 3.01, 0.5))
            .is_none());
    }

    #[test]
    fn single_voxel_axes_are_handled() {
        let volume = Volume3::with_identity_transformation(
            "flat".to_string(),
            Array3::from_elem((2, 2, 1), 4.0_f64),
        );
        let value = LinearInterpolator3
            .interp_volume_value(&volume, &Point3::new(0.5, 0.5, 0.0))
            .unwrap();
        assert_abs_diff_eq!(value, 4.0);
    }
}
