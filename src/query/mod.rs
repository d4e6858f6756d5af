//! Non-persistent geometric queries.
//!
//! Only ray-casting is needed by the dynamic BVH: a [`Ray`] is tested against the
//! [`Aabb`](crate::bounding_volume::Aabb) of every visited node with the classic slab test.

pub use self::ray::Ray;

mod ray;
