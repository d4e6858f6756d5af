//! Axis Aligned Bounding Box.

use crate::bounding_volume::BoundingVolume;
use crate::math::{Point, Real, Vector, DIM};

/// An Axis-Aligned Bounding Box (AABB).
///
/// An AABB is the simplest bounding volume, defined by its minimum and maximum corners.
/// It's called "axis-aligned" because its edges are always parallel to the coordinate axes,
/// making it very fast to test and to merge.
///
/// # Structure
///
/// - **mins**: The point with the smallest coordinates on each axis.
/// - **maxs**: The point with the largest coordinates on each axis.
/// - **Invariant**: `mins.x ≤ maxs.x`, `mins.y ≤ maxs.y` and `mins.z ≤ maxs.z`.
///
/// The only sanctioned violation of the invariant is [`Aabb::new_invalid`], the identity
/// element of [`BoundingVolume::merge`]. It is used as the bound of an empty tree and is never
/// hit by any intersection test.
///
/// Zero-extent boxes (e.g. built from a zero-radius sphere) are perfectly valid and take part
/// in every test like any other box.
///
/// # Example
///
/// ```rust
/// # #[cfg(feature = "f32")] {
/// use dynbvh3d::bounding_volume::{Aabb, BoundingVolume};
/// use dynbvh3d::na::Point3;
///
/// let a = Aabb::from_sphere(&Point3::origin(), 1.0);
/// let b = Aabb::from_sphere(&Point3::new(10.0, 0.0, 0.0), 1.0);
/// let ab = a.merged(&b);
///
/// assert_eq!(ab.mins, Point3::new(-1.0, -1.0, -1.0));
/// assert_eq!(ab.maxs, Point3::new(11.0, 1.0, 1.0));
/// assert!(ab.contains(&a) && ab.contains(&b));
/// # }
/// ```
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Debug, PartialEq, Copy, Clone)]
#[repr(C)]
pub struct Aabb {
    /// The point with minimum coordinates.
    pub mins: Point<Real>,
    /// The point with maximum coordinates.
    pub maxs: Point<Real>,
}

impl Aabb {
    /// Creates a new AABB from its minimum and maximum corners.
    ///
    /// Each component of `mins` should be smaller or equal to the matching component
    /// of `maxs`.
    #[inline]
    pub fn new(mins: Point<Real>, maxs: Point<Real>) -> Aabb {
        Aabb { mins, maxs }
    }

    /// Creates an invalid AABB with inverted bounds.
    ///
    /// The resulting AABB has `mins` set to maximum values and `maxs` set to
    /// minimum values. Merging anything into it yields that thing, and it never
    /// intersects nor contains any point.
    #[inline]
    pub fn new_invalid() -> Self {
        Self::new(
            Vector::repeat(Real::MAX).into(),
            Vector::repeat(-Real::MAX).into(),
        )
    }

    /// Creates a new AABB from its center and half-extents.
    #[inline]
    pub fn from_half_extents(center: Point<Real>, half_extents: Vector<Real>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// The AABB of the sphere with the given `center` and `radius`.
    ///
    /// A zero radius gives a degenerate, zero-extent, box.
    #[inline]
    pub fn from_sphere(center: &Point<Real>, radius: Real) -> Self {
        Self::from_half_extents(*center, Vector::repeat(radius))
    }

    /// Does this AABB satisfy `mins <= maxs` on every axis?
    ///
    /// This is `false` for [`Aabb::new_invalid`].
    #[inline]
    pub fn is_valid(&self) -> bool {
        na::partial_le(&self.mins, &self.maxs)
    }

    /// The center of this `Aabb`.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        na::center(&self.mins, &self.maxs)
    }

    /// The extents of this `Aabb`.
    #[inline]
    pub fn extents(&self) -> Vector<Real> {
        self.maxs - self.mins
    }

    /// The half extents of this `Aabb`.
    #[inline]
    pub fn half_extents(&self) -> Vector<Real> {
        (self.maxs - self.mins) * 0.5
    }

    /// The index of the axis along which this `Aabb` is the widest.
    ///
    /// Ties are resolved in favor of the axis with the largest index, i.e., a cube
    /// returns the `z` axis.
    pub fn widest_axis(&self) -> usize {
        let extents = self.extents();
        if extents.x > extents.y {
            if extents.x > extents.z {
                0
            } else {
                2
            }
        } else if extents.y > extents.z {
            1
        } else {
            2
        }
    }

    /// The volume of this `Aabb`.
    #[inline]
    pub fn volume(&self) -> Real {
        let extents = self.extents();
        extents.x * extents.y * extents.z
    }

    /// The half area of this `Aabb`.
    #[inline]
    pub fn half_area(&self) -> Real {
        let extents = self.extents();
        extents.x * (extents.y + extents.z) + extents.y * extents.z
    }

    /// The surface area of this `Aabb`.
    ///
    /// This is the cost metric of the surface area heuristic (SAH) driving every
    /// structural decision of the dynamic BVH.
    #[inline]
    pub fn surface_area(&self) -> Real {
        self.half_area() * 2.0
    }

    /// Tests if the given `point` is inside of this `Aabb` (boundary included).
    pub fn contains_local_point(&self, point: &Point<Real>) -> bool {
        for i in 0..DIM {
            if point[i] < self.mins[i] || point[i] > self.maxs[i] {
                return false;
            }
        }

        true
    }

    /// Tests if this `Aabb` intersects the sphere with the given `center` and `radius`.
    pub fn intersects_sphere(&self, center: &Point<Real>, radius: Real) -> bool {
        if !self.is_valid() {
            return false;
        }

        let closest = center.sup(&self.mins).inf(&self.maxs);
        na::distance_squared(&closest, center) <= radius * radius
    }
}

impl BoundingVolume for Aabb {
    #[inline]
    fn center(&self) -> Point<Real> {
        self.center()
    }

    #[inline]
    fn intersects(&self, other: &Aabb) -> bool {
        na::partial_le(&self.mins, &other.maxs) && na::partial_ge(&self.maxs, &other.mins)
    }

    #[inline]
    fn contains(&self, other: &Aabb) -> bool {
        na::partial_le(&self.mins, &other.mins) && na::partial_ge(&self.maxs, &other.maxs)
    }

    #[inline]
    fn merge(&mut self, other: &Aabb) {
        self.mins = self.mins.inf(&other.mins);
        self.maxs = self.maxs.sup(&other.maxs);
    }

    #[inline]
    fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            mins: self.mins.inf(&other.mins),
            maxs: self.maxs.sup(&other.maxs),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Aabb;
    use crate::bounding_volume::BoundingVolume;
    use crate::math::{Point, Vector};

    #[test]
    fn surface_area_of_unit_cube() {
        let aabb = Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0));
        approx::assert_relative_eq!(aabb.surface_area(), 6.0);
        approx::assert_relative_eq!(aabb.volume(), 1.0);

        let flat = Aabb::new(Point::origin(), Point::new(2.0, 3.0, 0.0));
        approx::assert_relative_eq!(flat.surface_area(), 12.0);
    }

    #[test]
    fn invalid_aabb_is_merge_identity() {
        let sphere = Aabb::from_sphere(&Point::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(Aabb::new_invalid().merged(&sphere), sphere);
        assert!(!Aabb::new_invalid().is_valid());
        assert!(!Aabb::new_invalid().intersects(&sphere));
        assert!(!Aabb::new_invalid().intersects_sphere(&Point::origin(), 1.0e6));
    }

    #[test]
    fn degenerate_boxes_still_intersect() {
        let point_box = Aabb::from_sphere(&Point::new(1.0, 1.0, 1.0), 0.0);
        assert!(point_box.is_valid());
        assert_eq!(point_box.extents(), Vector::zeros());

        let unit = Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0));
        assert!(unit.intersects(&point_box));
        assert!(unit.contains(&point_box));
        assert!(point_box.intersects(&point_box));
    }

    #[test]
    fn widest_axis_and_sphere_overlap() {
        let aabb = Aabb::new(Point::origin(), Point::new(1.0, 5.0, 2.0));
        assert_eq!(aabb.widest_axis(), 1);

        assert!(aabb.intersects_sphere(&Point::new(2.0, 1.0, 1.0), 1.0));
        assert!(!aabb.intersects_sphere(&Point::new(2.0, 1.0, 1.0), 0.99));
        assert!(aabb.contains_local_point(&Point::new(0.5, 4.0, 2.0)));
        assert!(!aabb.contains_local_point(&Point::new(0.5, 4.0, 2.1)));
    }
}
