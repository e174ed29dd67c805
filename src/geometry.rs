//! Geometric utility objects.

use crate::num::BFloat;
use num;
use std::{
    fmt,
    ops::{Add, Index, IndexMut, Mul, Sub},
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "for-testing"))]
use approx::{AbsDiffEq, RelativeEq};

/// Denotes the x-, y- or z-dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dim3 {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Dim3 {
    /// Creates an array for iterating over the x-, y- and z-dimensions.
    pub fn slice() -> [Self; 3] {
        [Self::X, Self::Y, Self::Z]
    }
}

use Dim3::{X, Y, Z};

/// Represents any quantity with three dimensional components.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct In3D<T>([T; 3]);

impl<T> In3D<T> {
    /// Creates a new 3D quantity given the three components.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Creates a new 3D quantity by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> T,
    {
        Self::new(
            create_component(X),
            create_component(Y),
            create_component(Z),
        )
    }

    /// Creates a new 3D quantity with the given value copied into all components.
    pub fn same(a: T) -> Self
    where
        T: Copy,
    {
        Self([a, a, a])
    }
}

impl<T> Index<Dim3> for In3D<T> {
    type Output = T;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<T> IndexMut<Dim3> for In3D<T> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim as usize]
    }
}

impl<T: fmt::Display> fmt::Display for In3D<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self[X], self[Y], self[Z])
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<T> AbsDiffEq for In3D<T>
where
    T: AbsDiffEq,
    T::Epsilon: Copy,
{
    type Epsilon = <T as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        Dim3::slice()
            .iter()
            .all(|&dim| T::abs_diff_eq(&self[dim], &other[dim], epsilon))
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<T> RelativeEq for In3D<T>
where
    T: RelativeEq,
    T::Epsilon: Copy,
{
    fn default_max_relative() -> Self::Epsilon {
        T::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        Dim3::slice()
            .iter()
            .all(|&dim| T::relative_eq(&self[dim], &other[dim], epsilon, max_relative))
    }
}

#[cfg(any(test, feature = "for-testing"))]
macro_rules! impl_approx_eq_3d {
    ($T:ident <$F:ident>) => {
        impl<$F> AbsDiffEq for $T<$F>
        where
            $F: BFloat + AbsDiffEq,
            $F::Epsilon: Copy,
        {
            type Epsilon = <In3D<$F> as AbsDiffEq>::Epsilon;

            fn default_epsilon() -> Self::Epsilon {
                In3D::<$F>::default_epsilon()
            }

            fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
                In3D::<$F>::abs_diff_eq(&self.0, &other.0, epsilon)
            }
        }

        impl<$F> RelativeEq for $T<$F>
        where
            $F: BFloat + RelativeEq,
            $F::Epsilon: Copy,
        {
            fn default_max_relative() -> Self::Epsilon {
                In3D::<$F>::default_max_relative()
            }

            fn relative_eq(
                &self,
                other: &Self,
                epsilon: Self::Epsilon,
                max_relative: Self::Epsilon,
            ) -> bool {
                In3D::<$F>::relative_eq(&self.0, &other.0, epsilon, max_relative)
            }
        }
    };
}

/// A 3D vector.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Vec3<F>(In3D<F>);

impl<F: BFloat> Vec3<F> {
    /// Creates a new 3D vector given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new 3D vector by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Creates a new 3D vector with all components set to zero.
    pub fn zero() -> Self {
        Self::new(F::zero(), F::zero(), F::zero())
    }

    /// Creates a new vector with all component equal to the given value.
    pub fn equal_components(a: F) -> Self {
        Self::new(a, a, a)
    }

    /// Computes the squared length of the vector.
    pub fn squared_length(&self) -> F {
        self[X] * self[X] + self[Y] * self[Y] + self[Z] * self[Z]
    }

    /// Computes the length of the vector.
    pub fn length(&self) -> F {
        self.squared_length().sqrt()
    }

    /// Computes the dot product of the vector with another vector.
    pub fn dot(&self, other: &Self) -> F {
        self[X] * other[X] + self[Y] * other[Y] + self[Z] * other[Z]
    }
}

impl<F: BFloat> Index<Dim3> for Vec3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: BFloat> IndexMut<Dim3> for Vec3<F> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<'a, F: BFloat> Add<&'a Vec3<F>> for &'a Vec3<F> {
    type Output = Vec3<F>;
    fn add(self, other: Self) -> Self::Output {
        Vec3::with_each_component(|dim| self[dim] + other[dim])
    }
}

impl<F: BFloat> Add<Vec3<F>> for Vec3<F> {
    type Output = Self;
    fn add(self, other: Self) -> Self::Output {
        &self + &other
    }
}

impl<F: BFloat> Mul<F> for &Vec3<F> {
    type Output = Vec3<F>;
    fn mul(self, factor: F) -> Self::Output {
        Vec3::with_each_component(|dim| self[dim] * factor)
    }
}

impl<F: BFloat> Mul<F> for Vec3<F> {
    type Output = Self;
    fn mul(self, factor: F) -> Self::Output {
        &self * factor
    }
}

impl<F: BFloat> fmt::Display for Vec3<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl_approx_eq_3d!(Vec3<F>);

/// A 3D spatial coordinate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Point3<F>(In3D<F>);

impl<F: BFloat> Point3<F> {
    /// Creates a new 3D point given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new 3D point by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Creates a new 3D point with all components set to zero.
    pub fn origin() -> Self {
        Self::new(F::zero(), F::zero(), F::zero())
    }

    /// Creates a new point located at the given voxel indices displaced by the given
    /// offset, in continuous voxel coordinates.
    pub fn from_voxel(indices: &Idx3<usize>, offset: &Vec3<F>) -> Self {
        Self::with_each_component(|dim| {
            F::from_usize(indices[dim]).unwrap_or_else(F::nan) + offset[dim]
        })
    }

    /// Constructs a new vector from the point components.
    pub fn to_vec3(&self) -> Vec3<F> {
        Vec3::with_each_component(|dim| self[dim])
    }

    /// Computes the distance to the given point.
    pub fn distance_to(&self, other: &Self) -> F {
        (self - other).length()
    }
}

impl<F: BFloat> Index<Dim3> for Point3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: BFloat> IndexMut<Dim3> for Point3<F> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<'a, F: BFloat> Sub<&'a Point3<F>> for &'a Point3<F> {
    type Output = Vec3<F>;
    fn sub(self, other: Self) -> Self::Output {
        Vec3::new(self[X] - other[X], self[Y] - other[Y], self[Z] - other[Z])
    }
}

impl<'a, F: BFloat> Add<&'a Vec3<F>> for &'a Point3<F> {
    type Output = Point3<F>;
    fn add(self, vector: &Vec3<F>) -> Self::Output {
        Point3::new(
            self[X] + vector[X],
            self[Y] + vector[Y],
            self[Z] + vector[Z],
        )
    }
}

impl<F: BFloat> Add<Vec3<F>> for Point3<F> {
    type Output = Self;
    fn add(self, vector: Vec3<F>) -> Self::Output {
        &self + &vector
    }
}

impl<F: BFloat> fmt::Display for Point3<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self[X], self[Y], self[Z])
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl_approx_eq_3d!(Point3<F>);

/// A 3D index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Idx3<I>(In3D<I>);

impl<I: num::Integer> Idx3<I> {
    /// Creates a new 3D index given the three components.
    pub fn new(i: I, j: I, k: I) -> Self {
        Self(In3D::new(i, j, k))
    }

    /// Creates a new 3D index by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> I,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Creates a new 3D index with all components set to zero.
    pub fn origin() -> Self {
        Self::new(I::zero(), I::zero(), I::zero())
    }

    /// Constructs a new 3D index by taking the component-wise max with the given index.
    pub fn max_with(&self, other: &Self) -> Self
    where
        I: Copy,
    {
        Self::with_each_component(|dim| I::max(self[dim], other[dim]))
    }

    /// Constructs a new 3D index by taking the component-wise min with the given index.
    pub fn min_with(&self, other: &Self) -> Self
    where
        I: Copy,
    {
        Self::with_each_component(|dim| I::min(self[dim], other[dim]))
    }

    /// Converts the index into a fixed size array suitable for indexing `ndarray` arrays.
    pub fn to_array(&self) -> [I; 3]
    where
        I: Copy,
    {
        [self[X], self[Y], self[Z]]
    }
}

impl<I: num::Integer> Index<Dim3> for Idx3<I> {
    type Output = I;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<I: num::Integer> IndexMut<Dim3> for Idx3<I> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<I: num::Integer + fmt::Display> fmt::Display for Idx3<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Defines the properties of a transformation of 3D points.
pub trait PointTransformation3<F: BFloat>: Sync + Send {
    /// Returns the transformed version of the given 3D point.
    fn transform(&self, point: &Point3<F>) -> Point3<F>;

    /// Returns the transformed version of the continuous voxel position given
    /// by the voxel indices displaced by the offset.
    fn transform_voxel(&self, indices: &Idx3<usize>, offset: &Vec3<F>) -> Point3<F> {
        self.transform(&Point3::from_voxel(indices, offset))
    }
}

/// Affine transformation of 3D points, consisting of a linear part
/// followed by a translation.
///
/// Used as the voxel-to-scanner transformation of a volume, mapping
/// continuous voxel coordinates (voxel centers at integer positions)
/// to physical scanner coordinates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct AffineTransformation3<F> {
    rows: In3D<Vec3<F>>,
    translation: Vec3<F>,
}

impl<F: BFloat> AffineTransformation3<F> {
    /// Creates a new affine transformation from the rows of the linear part
    /// and the translation vector.
    pub fn new(rows: [[F; 3]; 3], translation: Vec3<F>) -> Self {
        let [row_x, row_y, row_z] = rows;
        Self {
            rows: In3D::new(
                Vec3::new(row_x[0], row_x[1], row_x[2]),
                Vec3::new(row_y[0], row_y[1], row_y[2]),
                Vec3::new(row_z[0], row_z[1], row_z[2]),
            ),
            translation,
        }
    }

    /// Creates the identity transformation.
    pub fn identity() -> Self {
        Self::from_voxel_extents_and_origin(&Vec3::equal_components(F::one()), &Point3::origin())
    }

    /// Creates an axis-aligned transformation scaling voxel coordinates by the given voxel
    /// extents and placing the center of voxel `[0, 0, 0]` at the given origin.
    pub fn from_voxel_extents_and_origin(voxel_extents: &Vec3<F>, origin: &Point3<F>) -> Self {
        let zero = F::zero();
        Self::new(
            [
                [voxel_extents[X], zero, zero],
                [zero, voxel_extents[Y], zero],
                [zero, zero, voxel_extents[Z]],
            ],
            origin.to_vec3(),
        )
    }

    /// Applies only the linear part of the transformation to the given vector.
    pub fn transform_vector(&self, vector: &Vec3<F>) -> Vec3<F> {
        Vec3::with_each_component(|dim| self.rows[dim].dot(vector))
    }

    /// Computes the determinant of the linear part.
    pub fn determinant(&self) -> F {
        let r = &self.rows;
        r[X][X] * (r[Y][Y] * r[Z][Z] - r[Y][Z] * r[Z][Y])
            - r[X][Y] * (r[Y][X] * r[Z][Z] - r[Y][Z] * r[Z][X])
            + r[X][Z] * (r[Y][X] * r[Z][Y] - r[Y][Y] * r[Z][X])
    }

    /// Computes the physical volume covered by a single voxel.
    pub fn voxel_volume(&self) -> F {
        self.determinant().abs()
    }

    /// Creates the transformation of a sub-volume whose voxel `[0, 0, 0]`
    /// corresponds to voxel `offset` of the volume described by this transformation.
    pub fn translated_by_voxels(&self, offset: &Idx3<usize>) -> Self {
        let shift = self.transform_vector(&Point3::from_voxel(offset, &Vec3::zero()).to_vec3());
        Self {
            rows: self.rows.clone(),
            translation: &self.translation + &shift,
        }
    }

    /// Computes the inverse transformation, or returns `None` if the
    /// linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == F::zero() || !det.is_finite() {
            return None;
        }
        let r = &self.rows;
        let cofactor = |a: Dim3, b: Dim3, c: Dim3, d: Dim3| r[a][b] * r[c][d] - r[a][d] * r[c][b];
        let inv_det = F::one() / det;
        let inverse_rows = [
            [
                cofactor(Y, Y, Z, Z) * inv_det,
                cofactor(X, Z, Z, Y) * inv_det,
                cofactor(X, Y, Y, Z) * inv_det,
            ],
            [
                cofactor(Y, Z, Z, X) * inv_det,
                cofactor(X, X, Z, Z) * inv_det,
                cofactor(X, Z, Y, X) * inv_det,
            ],
            [
                cofactor(Y, X, Z, Y) * inv_det,
                cofactor(X, Y, Z, X) * inv_det,
                cofactor(X, X, Y, Y) * inv_det,
            ],
        ];
        let mut inverse = Self::new(inverse_rows, Vec3::zero());
        let shifted = inverse.transform_vector(&self.translation);
        inverse.translation = shifted * (-F::one());
        Some(inverse)
    }
}

impl<F: BFloat> PointTransformation3<F> for AffineTransformation3<F> {
    fn transform(&self, point: &Point3<F>) -> Point3<F> {
        let transformed = &self.transform_vector(&point.to_vec3()) + &self.translation;
        Point3::with_each_component(|dim| transformed[dim])
    }
}

impl<F: BFloat> Default for AffineTransformation3<F> {
    fn default() -> Self {
        Self::identity()
    }
}
