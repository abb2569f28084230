// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and scalar helpers shared by both indexes.

use core::cmp::Ordering;
use core::fmt::Debug;

use crate::error::{IndexError, Result};

/// Axis-aligned rectangle in 2D.
///
/// A degenerate rectangle (zero width and/or height) is valid and stands for a
/// point or an axis-aligned segment. Rectangles are never normalized: one with
/// `min > max` on either axis is rejected by [`Aabb2D::validate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb2D<T> {
    /// Minimum x
    pub min_x: T,
    /// Minimum y
    pub min_y: T,
    /// Maximum x
    pub max_x: T,
    /// Maximum y
    pub max_y: T,
}

impl<T> Aabb2D<T> {
    /// Create a new AABB from min/max corners.
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Copy> Aabb2D<T> {
    /// Degenerate AABB covering exactly one point.
    pub const fn from_point(x: T, y: T) -> Self {
        Self::new(x, y, x, y)
    }
}

impl<T: Copy + PartialOrd> Aabb2D<T> {
    /// Whether this AABB contains the point. Points on the boundary are inside.
    pub fn contains_point(&self, x: T, y: T) -> bool {
        le(self.min_x, x) && le(self.min_y, y) && le(x, self.max_x) && le(y, self.max_y)
    }

    /// Whether `other` lies entirely within this AABB.
    pub fn contains(&self, other: &Self) -> bool {
        le(self.min_x, other.min_x)
            && le(self.min_y, other.min_y)
            && le(other.max_x, self.max_x)
            && le(other.max_y, self.max_y)
    }

    /// Whether two AABBs overlap.
    ///
    /// Two boxes intersect unless one lies entirely to one side of the other on
    /// some axis. Touching edges and corners count as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        le(self.min_x, other.max_x)
            && le(other.min_x, self.max_x)
            && le(self.min_y, other.max_y)
            && le(other.min_y, self.max_y)
    }

    /// Smallest AABB enclosing both.
    pub fn union(&self, other: &Self) -> Self {
        union_aabb(*self, *other)
    }
}

impl<T: Scalar> Aabb2D<T> {
    /// Create an AABB from origin and size.
    pub fn from_xywh(x: T, y: T, w: T, h: T) -> Self {
        Self::new(x, y, T::add(x, w), T::add(y, h))
    }

    /// Check that the AABB is well-formed: finite coordinates and
    /// `min <= max` on both axes.
    pub fn validate(&self) -> Result<()> {
        let finite = T::is_finite(self.min_x)
            && T::is_finite(self.min_y)
            && T::is_finite(self.max_x)
            && T::is_finite(self.max_y);
        if !finite {
            return Err(IndexError::InvalidGeometry("rectangle has a non-finite coordinate"));
        }
        if !le(self.min_x, self.max_x) {
            return Err(IndexError::InvalidGeometry("rectangle has min_x > max_x"));
        }
        if !le(self.min_y, self.max_y) {
            return Err(IndexError::InvalidGeometry("rectangle has min_y > max_y"));
        }
        Ok(())
    }

    pub(crate) fn centroid_x(&self) -> T {
        T::mid(self.min_x, self.max_x)
    }

    pub(crate) fn centroid_y(&self) -> T {
        T::mid(self.min_y, self.max_y)
    }
}

/// Point in 2D.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point2D<T> {
    /// Horizontal coordinate.
    pub x: T,
    /// Vertical coordinate.
    pub y: T,
}

impl<T> Point2D<T> {
    /// Create a new point.
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Scalar> Point2D<T> {
    /// Check that both coordinates are finite.
    pub fn validate(&self) -> Result<()> {
        if T::is_finite(self.x) && T::is_finite(self.y) {
            Ok(())
        } else {
            Err(IndexError::InvalidGeometry("point has a non-finite coordinate"))
        }
    }

    /// Squared Euclidean distance, computed in the widened accumulator type.
    ///
    /// For `i64` the result saturates at `i128::MAX`, which only distances
    /// beyond roughly `1.3e19` reach.
    pub fn distance_squared(&self, other: &Self) -> T::Acc {
        let dx = T::acc_sub(T::widen(self.x), T::widen(other.x));
        let dy = T::acc_sub(T::widen(self.y), T::widen(other.y));
        T::acc_add(T::acc_mul(dx, dx), T::acc_mul(dy, dy))
    }
}

/// Numeric scalar abstraction used by both indexes.
///
/// Besides plain arithmetic this carries an associated widened accumulator type
/// for areas and squared distances (f32→f64, f64→f64, i64→i128), and the
/// floor-division used to map coordinates onto grid cells.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Widened accumulator type suitable for area/distance computations.
    ///
    /// Arithmetic on it goes through [`Scalar::acc_add`], [`Scalar::acc_sub`]
    /// and [`Scalar::acc_mul`], which saturate for integer accumulators.
    type Acc: Copy + PartialOrd + Debug;

    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Midpoint between a and b (used for centroid ordering).
    fn mid(a: Self, b: Self) -> Self;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> Self::Acc;

    /// Convert a cell coordinate to the accumulator type.
    fn acc_from_i64(n: i64) -> Self::Acc;

    /// Accumulator sum.
    fn acc_add(a: Self::Acc, b: Self::Acc) -> Self::Acc;

    /// Accumulator difference: a - b.
    fn acc_sub(a: Self::Acc, b: Self::Acc) -> Self::Acc;

    /// Accumulator product.
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc;

    /// False for NaN and infinities.
    fn is_finite(v: Self) -> bool;

    /// Index of the grid cell of side `size` containing `v`: `floor(v / size)`.
    ///
    /// `size` must be positive. Results saturate at the `i64` range.
    fn cell_index(v: Self, size: Self) -> i64;
}

#[inline]
fn floor_to_i64(v: f64) -> i64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Saturating float-to-cell conversion is intended; inputs are validated finite."
    )]
    let i = v as i64;
    if (i as f64) > v { i.saturating_sub(1) } else { i }
}

impl Scalar for f32 {
    type Acc = f64;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as f64
    }

    #[inline]
    fn acc_from_i64(n: i64) -> Self::Acc {
        n as f64
    }

    #[inline]
    fn acc_add(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a + b
    }

    #[inline]
    fn acc_sub(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a - b
    }

    #[inline]
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a * b
    }

    #[inline]
    fn is_finite(v: Self) -> bool {
        v.is_finite()
    }

    #[inline]
    fn cell_index(v: Self, size: Self) -> i64 {
        // Carried out in f64 so cell edges agree with the widened distance math.
        floor_to_i64(v as f64 / size as f64)
    }
}

impl Scalar for f64 {
    type Acc = Self;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v
    }

    #[inline]
    fn acc_from_i64(n: i64) -> Self::Acc {
        n as Self
    }

    #[inline]
    fn acc_add(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a + b
    }

    #[inline]
    fn acc_sub(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a - b
    }

    #[inline]
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a * b
    }

    #[inline]
    fn is_finite(v: Self) -> bool {
        v.is_finite()
    }

    #[inline]
    fn cell_index(v: Self, size: Self) -> i64 {
        floor_to_i64(v / size)
    }
}

impl Scalar for i64 {
    type Acc = i128;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a.saturating_add(b)
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a.saturating_sub(b)
    }

    #[inline]
    fn zero() -> Self {
        0
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        // Average without overflow: (a & b) + ((a ^ b) >> 1)
        (a & b) + ((a ^ b) >> 1)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as i128
    }

    #[inline]
    fn acc_from_i64(n: i64) -> Self::Acc {
        n as i128
    }

    // i128 holds any difference of two i64 values, but not every product.
    #[inline]
    fn acc_add(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_add(b)
    }

    #[inline]
    fn acc_sub(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_sub(b)
    }

    #[inline]
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_mul(b)
    }

    #[inline]
    fn is_finite(_v: Self) -> bool {
        true
    }

    #[inline]
    fn cell_index(v: Self, size: Self) -> i64 {
        v.div_euclid(size)
    }
}

/// Area of an AABB in the scalar's widened accumulator type.
///
/// Saturates at `i128::MAX` for `i64` rectangles wider than the accumulator.
#[inline]
pub fn area<T: Scalar>(a: &Aabb2D<T>) -> T::Acc {
    let w = T::acc_sub(T::widen(a.max_x), T::widen(a.min_x));
    let h = T::acc_sub(T::widen(a.max_y), T::widen(a.min_y));
    T::acc_mul(w, h)
}

/// Half-perimeter (width + height) of an AABB in the widened accumulator type.
///
/// Breaks ties between splits when all candidates have zero area, e.g. for
/// point-like or segment-like boxes.
#[inline]
pub fn margin<T: Scalar>(a: &Aabb2D<T>) -> T::Acc {
    let w = T::acc_sub(T::widen(a.max_x), T::widen(a.min_x));
    let h = T::acc_sub(T::widen(a.max_y), T::widen(a.min_y));
    T::acc_add(w, h)
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o == Ordering::Less)
        .unwrap_or(false)
}

pub(crate) fn union_aabb<T: PartialOrd + Copy>(a: Aabb2D<T>, b: Aabb2D<T>) -> Aabb2D<T> {
    Aabb2D {
        min_x: min_t(a.min_x, b.min_x),
        min_y: min_t(a.min_y, b.min_y),
        max_x: max_t(a.max_x, b.max_x),
        max_y: max_t(a.max_y, b.max_y),
    }
}

#[cfg(feature = "kurbo")]
impl From<kurbo::Rect> for Aabb2D<f64> {
    /// Corners are taken as-is; an unnormalized `Rect` is rejected on insertion.
    fn from(r: kurbo::Rect) -> Self {
        Self::new(r.x0, r.y0, r.x1, r.y1)
    }
}

#[cfg(feature = "kurbo")]
impl From<kurbo::Point> for Point2D<f64> {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x, p.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_intersect() {
        let a = Aabb2D::new(0, 0, 10, 10);
        assert!(a.intersects(&Aabb2D::new(10, 0, 20, 10)), "shared edge");
        assert!(a.intersects(&Aabb2D::new(10, 10, 20, 20)), "shared corner");
        assert!(!a.intersects(&Aabb2D::new(11, 0, 20, 10)), "disjoint on x");
        assert!(!a.intersects(&Aabb2D::new(0, -5, 10, -1)), "disjoint on y");
    }

    #[test]
    fn degenerate_rectangles_are_valid() {
        assert_eq!(Aabb2D::from_point(3.0, 4.0).validate(), Ok(()));
        assert_eq!(Aabb2D::new(0.0, 2.0, 5.0, 2.0).validate(), Ok(()));
        assert!(Aabb2D::from_point(3.0, 4.0).intersects(&Aabb2D::new(0.0, 0.0, 3.0, 4.0)));
    }

    #[test]
    fn malformed_rectangles_are_rejected() {
        assert!(matches!(
            Aabb2D::new(5.0, 0.0, 1.0, 1.0).validate(),
            Err(IndexError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Aabb2D::<i64>::new(0, 5, 1, 1).validate(),
            Err(IndexError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Aabb2D::new(f64::NAN, 0.0, 1.0, 1.0).validate(),
            Err(IndexError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Point2D::new(0.0_f32, f32::INFINITY).validate(),
            Err(IndexError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn cell_index_floors_toward_negative_infinity() {
        assert_eq!(f64::cell_index(9.99, 10.0), 0);
        assert_eq!(f64::cell_index(10.0, 10.0), 1);
        assert_eq!(f64::cell_index(-0.5, 10.0), -1);
        assert_eq!(f32::cell_index(-10.0, 10.0), -1);
        assert_eq!(i64::cell_index(-1, 10), -1);
        assert_eq!(i64::cell_index(-10, 10), -1);
        assert_eq!(i64::cell_index(-11, 10), -2);
        assert_eq!(f64::cell_index(-1.0e300, 1.0e-10), i64::MIN);
    }

    #[test]
    fn metrics_use_widened_accumulators() {
        let big = Aabb2D::new(i64::MIN / 2, 0, i64::MAX / 2, 4);
        assert!(area(&big) > 0);
        assert_eq!(margin(&Aabb2D::new(0.0, 0.0, 3.0, 0.0)), 3.0);
        assert_eq!(Point2D::new(0.0, 0.0).distance_squared(&Point2D::new(3.0, 4.0)), 25.0);
    }

    #[test]
    fn extreme_integer_metrics_saturate_in_order() {
        let far = Point2D::new(i64::MIN, 0).distance_squared(&Point2D::new(i64::MAX, 0));
        assert_eq!(far, i128::MAX);
        let diagonal =
            Point2D::new(i64::MIN, i64::MIN).distance_squared(&Point2D::new(i64::MAX, i64::MAX));
        assert_eq!(diagonal, i128::MAX);
        // Still exact (and ordered) just below the saturation point.
        let edge = Point2D::new(0, 0).distance_squared(&Point2D::new(i64::MAX, 0));
        assert_eq!(edge, i128::from(i64::MAX) * i128::from(i64::MAX));
        assert!(edge < far);

        let whole_plane = Aabb2D::new(i64::MIN, i64::MIN, i64::MAX, i64::MAX);
        assert_eq!(area(&whole_plane), i128::MAX);
        assert_eq!(margin(&whole_plane), 2 * i128::from(u64::MAX));
        let quadrant = Aabb2D::new(0, 0, i64::MAX, i64::MAX);
        assert!(area(&quadrant) < area(&whole_plane));
        assert_eq!(i64::acc_add(area(&whole_plane), area(&quadrant)), i128::MAX);
    }
}
