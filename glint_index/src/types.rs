// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box primitive and the scalar abstraction used by backends.

use core::cmp::Ordering;
use core::fmt::Debug;

/// Axis-aligned bounding box in 2D.
///
/// Boxes are closed on every edge: a box with `min == max` on both axes is a
/// point and still contains that point. A box is *empty* when either maximum is
/// below its minimum; empty boxes never intersect anything.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb2D<T> {
    /// Minimum x (left)
    pub min_x: T,
    /// Minimum y (top)
    pub min_y: T,
    /// Maximum x (right)
    pub max_x: T,
    /// Maximum y (bottom)
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

impl<T: Copy + PartialOrd> Aabb2D<T> {
    /// Whether this AABB contains the point (edges included).
    pub fn contains_point(&self, x: T, y: T) -> bool {
        le(self.min_x, x) && le(self.min_y, y) && le(x, self.max_x) && le(y, self.max_y)
    }

    /// Whether `other` lies entirely inside this box.
    ///
    /// An empty `other` is contained in every non-empty box.
    pub fn contains(&self, other: &Self) -> bool {
        if other.is_empty() {
            return !self.is_empty();
        }
        le(self.min_x, other.min_x)
            && le(self.min_y, other.min_y)
            && le(other.max_x, self.max_x)
            && le(other.max_y, self.max_y)
    }

    /// The intersection of two AABBs. May be empty.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min_x: max_t(self.min_x, other.min_x),
            min_y: max_t(self.min_y, other.min_y),
            max_x: min_t(self.max_x, other.max_x),
            max_y: min_t(self.max_y, other.max_y),
        }
    }

    /// Whether the two boxes share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && !self.intersect(other).is_empty()
    }

    /// Smallest box covering both inputs. Empty inputs are ignored.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        union_aabb(*self, *other)
    }

    /// Return true if the AABB is inverted (no points). Assumes no NaN.
    pub fn is_empty(&self) -> bool {
        lt(self.max_x, self.min_x) || lt(self.max_y, self.min_y)
    }
}

impl<T: Scalar> Aabb2D<T> {
    /// Create an AABB from origin and size.
    pub fn from_xywh(x: T, y: T, w: T, h: T) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: T::add(x, w),
            max_y: T::add(y, h),
        }
    }

    /// Width of the box, clamped at zero.
    pub fn width(&self) -> T {
        T::max_zero(T::sub(self.max_x, self.min_x))
    }

    /// Height of the box, clamped at zero.
    pub fn height(&self) -> T {
        T::max_zero(T::sub(self.max_y, self.min_y))
    }
}

/// Numeric scalar abstraction for 2D AABBs used by backends.
///
/// Backends need a handful of arithmetic operations for split heuristics and
/// centroid ordering, plus a widened accumulator (`f32` → `f64`) for areas.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Widened accumulator type suitable for area/cost computations.
    type Acc: Copy
        + PartialOrd
        + core::ops::Add<Output = Self::Acc>
        + core::ops::Sub<Output = Self::Acc>
        + core::ops::Mul<Output = Self::Acc>
        + Debug;

    /// `a + b`
    fn add(a: Self, b: Self) -> Self;

    /// `a - b`
    fn sub(a: Self, b: Self) -> Self;

    /// Max of the value and zero.
    fn max_zero(v: Self) -> Self;

    /// Midpoint between a and b.
    fn mid(a: Self, b: Self) -> Self;

    /// Convert to the accumulator type.
    fn widen(v: Self) -> Self::Acc;

    /// Convert a count to the accumulator type (split weighting).
    fn acc_from_usize(n: usize) -> Self::Acc;
}

// Both float widths accumulate in `f64`.
macro_rules! float_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
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
            fn max_zero(v: Self) -> Self {
                if v > 0.0 { v } else { 0.0 }
            }

            #[inline]
            fn mid(a: Self, b: Self) -> Self {
                (a + b) / 2.0
            }

            #[inline]
            fn widen(v: Self) -> f64 {
                f64::from(v)
            }

            #[inline]
            fn acc_from_usize(n: usize) -> f64 {
                n as f64
            }
        }
    )*};
}

float_scalar!(f32, f64);

/// Area of an AABB in the widened accumulator type. Empty boxes have zero area.
#[inline]
pub fn area<T: Scalar>(a: &Aabb2D<T>) -> T::Acc {
    T::widen(a.width()) * T::widen(a.height())
}

/// Helper alias for the widened accumulator type associated with a scalar `T`.
pub type ScalarAcc<T> = <T as Scalar>::Acc;

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
    matches!(a.partial_cmp(&b), Some(Ordering::Less | Ordering::Equal))
}

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    matches!(a.partial_cmp(&b), Some(Ordering::Less))
}

/// Raw corner-wise union; callers handle empty inputs.
pub(crate) fn union_aabb<T: PartialOrd + Copy>(a: Aabb2D<T>, b: Aabb2D<T>) -> Aabb2D<T> {
    Aabb2D {
        min_x: min_t(a.min_x, b.min_x),
        min_y: min_t(a.min_y, b.min_y),
        max_x: max_t(a.max_x, b.max_x),
        max_y: max_t(a.max_y, b.max_y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_boxes_are_not_empty() {
        let p = Aabb2D::new(3.0, 4.0, 3.0, 4.0);
        assert!(!p.is_empty());
        assert!(p.contains_point(3.0, 4.0));
    }

    #[test]
    fn union_ignores_empty_operands() {
        let empty = Aabb2D::new(1.0, 1.0, 0.0, 0.0);
        let a = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(empty.union(&a), a);
        assert_eq!(a.union(&empty), a);
        assert!(!empty.intersects(&a));
    }

    #[test]
    fn containment_is_edge_inclusive() {
        let outer = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains(&Aabb2D::new(0.0, 0.0, 10.0, 10.0)));
        assert!(outer.contains(&Aabb2D::new(2.0, 2.0, 5.0, 5.0)));
        assert!(!outer.contains(&Aabb2D::new(2.0, 2.0, 11.0, 5.0)));
    }

    #[test]
    fn touching_edges_intersect() {
        let a = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb2D::new(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersects(&b));
        let c = Aabb2D::new(10.5, 0.0, 20.0, 10.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn area_of_inverted_box_is_zero() {
        let inverted = Aabb2D::new(5.0_f32, 5.0, 0.0, 0.0);
        assert_eq!(area(&inverted), 0.0);
        assert_eq!(area(&Aabb2D::from_xywh(0.0_f32, 0.0, 2.0, 3.0)), 6.0);
    }
}
