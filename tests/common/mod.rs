#![allow(dead_code)]

use ndarray::Array3;
use std::{collections::HashMap, sync::Arc};
use tractseed::{
    geometry::{
        AffineTransformation3, Idx3, Point3, PointTransformation3, Vec3,
    },
    num::VoxelValue,
    volume::{fgr, Volume3},
};

pub fn all_ones_mask(nx: usize, ny: usize, nz: usize) -> Arc<Volume3<u8>> {
    Arc::new(Volume3::with_identity_transformation(
        "ones".to_string(),
        Array3::ones((nx, ny, nz)),
    ))
}

/// A shell-like mask with an oblique voxel-to-scanner transformation.
pub fn oblique_shell_mask() -> Arc<Volume3<f32>> {
    let values = Array3::from_shape_fn((6, 5, 4), |(i, j, k)| {
        if i == 0 || j == 4 || (k == 2 && i % 2 == 1) {
            1.0
        } else {
            0.0
        }
    });
    Arc::new(Volume3::new(
        "shell".to_string(),
        values,
        oblique_transformation(),
    ))
}

pub fn oblique_transformation() -> AffineTransformation3<fgr> {
    AffineTransformation3::new(
        [[1.8, 0.3, 0.0], [-0.2, 2.1, 0.4], [0.1, 0.0, 2.5]],
        Vec3::new(-40.0, 12.5, 3.0),
    )
}

/// Uniform weights in the cube `[lower, lower + size)^3` of an otherwise empty volume.
pub fn uniform_cube_weights(shape: usize, lower: usize, size: usize) -> Volume3<f32> {
    let inside = |idx: usize| idx >= lower && idx < lower + size;
    let values = Array3::from_shape_fn((shape, shape, shape), |(i, j, k)| {
        if inside(i) && inside(j) && inside(k) {
            2.5
        } else {
            0.0
        }
    });
    Volume3::with_identity_transformation("cube".to_string(), values)
}

/// Finds the voxel of the given volume containing the given scanner position.
pub fn containing_voxel<T>(volume: &Volume3<T>, point: &Point3<fgr>) -> Idx3<usize>
where
    T: VoxelValue,
{
    let scanner_to_voxel = volume
        .scanner_to_voxel()
        .expect("Volume transformation is singular");
    let voxel_position = scanner_to_voxel.transform(point);
    volume.nearest_voxel(&voxel_position).unwrap_or_else(|| {
        panic!(
            "Seed {} (voxel position {}) lies outside volume {}",
            point,
            voxel_position,
            volume.name()
        )
    })
}

pub fn count_seeds_per_voxel<T>(volume: &Volume3<T>, seeds: &[Point3<fgr>]) -> HashMap<Idx3<usize>, usize>
where
    T: VoxelValue,
{
    let mut counts = HashMap::new();
    for seed in seeds {
        *counts.entry(containing_voxel(volume, seed)).or_insert(0) += 1;
    }
    counts
}

pub fn assert_seeds_in_nonzero_voxels<T>(volume: &Volume3<T>, seeds: &[Point3<fgr>])
where
    T: VoxelValue,
{
    for seed in seeds {
        let indices = containing_voxel(volume, seed);
        assert!(
            volume.value(&indices).is_nonzero(),
            "Seed {} lies in zero voxel {} of {}",
            seed,
            indices,
            volume.name()
        );
    }
}
