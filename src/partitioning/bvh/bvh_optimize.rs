use super::{Bvh, BvhError, BvhNodeAdaptor, BvhNodeId};
use crate::bounding_volume::BoundingVolume;
use crate::math::Real;
use alloc::vec::Vec;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

/// A local restructuring of the grand-children of an internal node `N`.
///
/// Each rotation swaps two nodes belonging to different levels (or different sides) below
/// `N`. In the names below, `L` and `R` are the children of `N`, and `LL`, `LR`, `RL`, `RR`
/// their own children.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BvhRotation {
    /// Swaps `L` and `RL`.
    LeftRightLeft,
    /// Swaps `L` and `RR`.
    LeftRightRight,
    /// Swaps `R` and `LL`.
    RightLeftLeft,
    /// Swaps `R` and `LR`.
    RightLeftRight,
    /// Swaps `LL` and `RR`.
    LeftLeftRightRight,
    /// Swaps `LL` and `RL`.
    LeftLeftRightLeft,
}

struct RotationCandidate {
    rotation: BvhRotation,
    swapped: (BvhNodeId, BvhNodeId),
    cost: Real,
}

impl<T, A> Bvh<T, A>
where
    T: Clone + PartialEq,
    A: BvhNodeAdaptor<T>,
{
    /// Refits all the nodes scheduled since the last call, and improves the tree with local
    /// rotations along the way.
    ///
    /// Scheduled nodes are processed in passes, deepest level first, so a node is always
    /// handled after all its scheduled descendants. Every processed internal node gets its
    /// bound recomputed from its children, then the best of six rotations of its
    /// grand-children is applied if it reduces the summed surface area of its children by
    /// more than [`BvhConfig::rotation_threshold`](super::BvhConfig::rotation_threshold).
    /// The parent of each processed node is scheduled in turn, so the refit reaches the root.
    ///
    /// Once this returns, every internal bound is exactly the union of its children’s, and
    /// calling it again without changes in between does nothing.
    ///
    /// Returns the number of rotations applied. Fails if leaves may hold more than one object.
    pub fn optimize(&mut self) -> Result<usize, BvhError> {
        if self.config.leaf_obj_max != 1 {
            log::error!(
                "Cannot optimize a BVH with up to {} objects per leaf.",
                self.config.leaf_obj_max
            );
            return Err(BvhError::OptimizeRequiresSingleObjectLeaves {
                leaf_obj_max: self.config.leaf_obj_max,
            });
        }

        let mut num_rotations = 0;
        let mut num_passes = 0;
        let mut sweep = Vec::new();

        loop {
            let Some(max_depth) = self.max_pending_depth() else {
                break;
            };

            sweep.clear();
            sweep.extend(
                self.refit_nodes
                    .iter()
                    .copied()
                    .filter(|id| self.nodes[id.0].depth == max_depth),
            );
            sweep.sort_unstable();

            for id in &sweep {
                let _ = self.refit_nodes.remove(id);
            }

            for id in &sweep {
                // Leaf bounds are already up-to-date.
                if !self.nodes[id.0].is_leaf() {
                    self.refit_internal(*id);
                    if self.try_rotate(*id) {
                        num_rotations += 1;
                    }
                }

                if let Some(parent) = self.nodes[id.0].parent {
                    let _ = self.refit_nodes.insert(parent);
                }
            }

            num_passes += 1;
        }

        if num_passes > 0 {
            log::debug!(
                "BVH optimized in {} passes with {} rotations.",
                num_passes,
                num_rotations
            );
        }

        Ok(num_rotations)
    }

    fn max_pending_depth(&self) -> Option<u32> {
        self.refit_nodes
            .iter()
            .map(|id| self.nodes[id.0].depth)
            .max()
    }

    /// Applies the best rotation of the grand-children of `id`, if it is good enough.
    ///
    /// The children of `id` must have up-to-date bounds.
    fn try_rotate(&mut self, id: BvhNodeId) -> bool {
        let Some((left, right)) = self.children(id) else {
            return false;
        };

        let area = |node: BvhNodeId| self.nodes[node.0].aabb.surface_area();
        let merged_area = |a: BvhNodeId, b: BvhNodeId| {
            self.nodes[a.0]
                .aabb
                .merged(&self.nodes[b.0].aabb)
                .surface_area()
        };

        let current_cost = area(left) + area(right);
        let left_children = self.children(left);
        let right_children = self.children(right);
        let mut candidates: SmallVec<[RotationCandidate; 6]> = SmallVec::new();

        if let Some((rl, rr)) = right_children {
            candidates.push(RotationCandidate {
                rotation: BvhRotation::LeftRightLeft,
                swapped: (left, rl),
                cost: area(rl) + merged_area(left, rr),
            });
            candidates.push(RotationCandidate {
                rotation: BvhRotation::LeftRightRight,
                swapped: (left, rr),
                cost: area(rr) + merged_area(left, rl),
            });
        }

        if let Some((ll, lr)) = left_children {
            candidates.push(RotationCandidate {
                rotation: BvhRotation::RightLeftLeft,
                swapped: (right, ll),
                cost: merged_area(right, lr) + area(ll),
            });
            candidates.push(RotationCandidate {
                rotation: BvhRotation::RightLeftRight,
                swapped: (right, lr),
                cost: merged_area(right, ll) + area(lr),
            });

            if let Some((rl, rr)) = right_children {
                candidates.push(RotationCandidate {
                    rotation: BvhRotation::LeftLeftRightRight,
                    swapped: (ll, rr),
                    cost: merged_area(rr, lr) + merged_area(rl, ll),
                });
                candidates.push(RotationCandidate {
                    rotation: BvhRotation::LeftLeftRightLeft,
                    swapped: (ll, rl),
                    cost: merged_area(rl, lr) + merged_area(ll, rr),
                });
            }
        }

        // On ties, the first candidate wins.
        let Some(best) = candidates
            .into_iter()
            .min_by_key(|candidate| OrderedFloat(candidate.cost))
        else {
            return false;
        };

        if best.cost >= current_cost
            || (current_cost - best.cost) <= self.config.rotation_threshold * current_cost
        {
            return false;
        }

        log::debug!(
            "Applying BVH rotation {:?} at node {:?}: SAH {} -> {}.",
            best.rotation,
            id,
            current_cost,
            best.cost
        );

        let (a, b) = best.swapped;
        self.swap_subtrees(a, b);

        for parent in [self.nodes[a.0].parent, self.nodes[b.0].parent]
            .into_iter()
            .flatten()
        {
            if parent != id {
                self.refit_internal(parent);
            }
        }
        self.refit_internal(id);

        true
    }

    /// Exchanges the positions of two nodes that are not ancestors of one another.
    fn swap_subtrees(&mut self, a: BvhNodeId, b: BvhNodeId) {
        let (Some(parent_a), Some(parent_b)) = (self.nodes[a.0].parent, self.nodes[b.0].parent)
        else {
            return;
        };

        self.replace_child(parent_a, a, b);
        self.replace_child(parent_b, b, a);
        self.nodes[a.0].parent = Some(parent_b);
        self.nodes[b.0].parent = Some(parent_a);

        let depth_a = self.nodes[parent_b.0].depth + 1;
        let depth_b = self.nodes[parent_a.0].depth + 1;
        self.set_depth(a, depth_a);
        self.set_depth(b, depth_b);
    }
}
