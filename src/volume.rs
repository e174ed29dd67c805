//! Scalar volumes defined on a regular voxel grid.

use crate::{
    error::{SeedingError, SeedingResult},
    geometry::{
        AffineTransformation3,
        Dim3::{X, Y, Z},
        Idx3, In3D, Point3,
    },
    num::VoxelValue,
};
use ndarray::{parallel::prelude::*, prelude::*, ArrayD};

/// Floating-point precision to use for voxel and scanner coordinates.
#[allow(non_camel_case_types)]
pub type fgr = f64;

/// A 3D scalar volume together with the affine transformation from
/// continuous voxel coordinates to scanner coordinates.
///
/// The center of voxel `[i, j, k]` lies at voxel coordinate `(i, j, k)`.
#[derive(Clone, Debug)]
pub struct Volume3<T> {
    name: String,
    values: Array3<T>,
    voxel_to_scanner: AffineTransformation3<fgr>,
}

impl<T: VoxelValue> Volume3<T> {
    /// Creates a new volume given a name, the voxel values and the
    /// voxel-to-scanner transformation.
    pub fn new(
        name: String,
        values: Array3<T>,
        voxel_to_scanner: AffineTransformation3<fgr>,
    ) -> Self {
        Self {
            name,
            values,
            voxel_to_scanner,
        }
    }

    /// Creates a new volume whose voxel and scanner coordinates coincide.
    pub fn with_identity_transformation(name: String, values: Array3<T>) -> Self {
        Self::new(name, values, AffineTransformation3::identity())
    }

    /// Creates a new volume from an array with three or more dimensions.
    ///
    /// Only the first 3D volume (index 0 along every axis beyond the third)
    /// is kept.
    pub fn from_dyn(
        name: String,
        values: ArrayD<T>,
        voxel_to_scanner: AffineTransformation3<fgr>,
    ) -> SeedingResult<Self> {
        let ndim = values.ndim();
        if ndim < 3 {
            return Err(SeedingError::TooFewDimensions { name, ndim });
        }
        let mut view = values.view();
        while view.ndim() > 3 {
            view = view.index_axis_move(Axis(3), 0);
        }
        let values = match view.into_dimensionality::<Ix3>() {
            Ok(view) => view.to_owned(),
            Err(_) => return Err(SeedingError::TooFewDimensions { name, ndim }),
        };
        Ok(Self::new(name, values, voxel_to_scanner))
    }

    /// Returns a reference to the name of the volume.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to the 3D array of voxel values.
    pub fn values(&self) -> &Array3<T> {
        &self.values
    }

    /// Returns a reference to the voxel-to-scanner transformation.
    pub fn voxel_to_scanner(&self) -> &AffineTransformation3<fgr> {
        &self.voxel_to_scanner
    }

    /// Computes the scanner-to-voxel transformation.
    pub fn scanner_to_voxel(&self) -> SeedingResult<AffineTransformation3<fgr>> {
        self.voxel_to_scanner
            .inverse()
            .ok_or_else(|| SeedingError::SingularTransformation(self.name.clone()))
    }

    /// Returns the number of voxels along each axis.
    pub fn shape(&self) -> In3D<usize> {
        let (nx, ny, nz) = self.values.dim();
        In3D::new(nx, ny, nz)
    }

    /// Returns the total number of voxels.
    pub fn number_of_voxels(&self) -> usize {
        self.values.len()
    }

    /// Returns the voxel value at the given 3D index.
    pub fn value(&self, indices: &Idx3<usize>) -> T {
        self.values[indices.to_array()]
    }

    /// Counts the voxels holding a non-zero value.
    pub fn count_nonzero(&self) -> usize {
        self.values.par_iter().filter(|value| value.is_nonzero()).count()
    }

    /// Returns the physical volume of a single voxel.
    pub fn voxel_volume(&self) -> fgr {
        self.voxel_to_scanner.voxel_volume()
    }

    /// Finds the indices of the voxel whose center is closest to the given
    /// position in continuous voxel coordinates, or `None` if the position
    /// lies outside the volume.
    pub fn nearest_voxel(&self, voxel_position: &Point3<fgr>) -> Option<Idx3<usize>> {
        let shape = self.shape();
        let mut indices = Idx3::origin();
        for dim in [X, Y, Z] {
            let idx = (voxel_position[dim] + 0.5).floor();
            if !(idx >= 0.0 && idx < shape[dim] as fgr) {
                return None;
            }
            indices[dim] = idx as usize;
        }
        Some(indices)
    }

    /// Creates a new, independently owned volume containing a copy of the
    /// voxels from `lower` to `upper` (both inclusive).
    ///
    /// The voxel-to-scanner transformation is adjusted so that every copied
    /// voxel keeps its scanner position.
    ///
    /// # Panics
    ///
    /// If the bounds are reversed or extend past the volume.
    pub fn cropped(&self, lower: &Idx3<usize>, upper: &Idx3<usize>) -> Self {
        let sub_values = self.values.slice(s![
            lower[X]..=upper[X],
            lower[Y]..=upper[Y],
            lower[Z]..=upper[Z]
        ]);
        Self::new(
            self.name.clone(),
            sub_values.to_owned(),
            self.voxel_to_scanner.translated_by_voxels(lower),
        )
    }

    /// Creates a new volume with the same name and transformation, holding
    /// the values produced by applying the given mapping to each voxel.
    pub fn mapv<U, M>(&self, mapping: M) -> Volume3<U>
    where
        U: VoxelValue,
        M: Fn(T) -> U,
    {
        Volume3::new(
            self.name.clone(),
            self.values.mapv(mapping),
            self.voxel_to_scanner.clone(),
        )
    }
}
