use core::mem;

use crate::bounding_volume::Aabb;
use crate::math::{Real, DIM};
use crate::query::Ray;
use num::Zero;

impl Aabb {
    /// Clips the given ray against this `Aabb` using the slab test.
    ///
    /// Returns the parameters `(t_near, t_far)` delimiting the part of the ray inside of
    /// this box, or `None` if the ray misses it. Only the forward part of the ray (`t ≥ 0`)
    /// is considered, so a ray starting inside of the box yields `t_near == 0`.
    ///
    /// Degenerate boxes can be hit; [`Aabb::new_invalid`] never is.
    pub fn intersects_ray(&self, ray: &Ray) -> Option<(Real, Real)> {
        if !self.is_valid() {
            return None;
        }

        let mut tmin: Real = 0.0;
        let mut tmax: Real = Real::MAX;

        for i in 0usize..DIM {
            if ray.dir[i].is_zero() {
                if ray.origin[i] < self.mins[i] || ray.origin[i] > self.maxs[i] {
                    return None;
                }
            } else {
                let denom = 1.0 / ray.dir[i];
                let mut inter_with_near_halfspace = (self.mins[i] - ray.origin[i]) * denom;
                let mut inter_with_far_halfspace = (self.maxs[i] - ray.origin[i]) * denom;

                if inter_with_near_halfspace > inter_with_far_halfspace {
                    mem::swap(
                        &mut inter_with_near_halfspace,
                        &mut inter_with_far_halfspace,
                    )
                }

                tmin = tmin.max(inter_with_near_halfspace);
                tmax = tmax.min(inter_with_far_halfspace);

                if tmin > tmax {
                    // This covers the case where tmax is negative because tmin is
                    // initialized at zero.
                    return None;
                }
            }
        }

        Some((tmin, tmax))
    }
}
