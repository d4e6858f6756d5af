use super::{Bvh, BvhNode, BvhNodeContent, BvhNodeId};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real};
use crate::query::Ray;
use alloc::vec::Vec;
use smallvec::SmallVec;

const TRAVERSAL_STACK_SIZE: usize = 32;

/// Iterator over the leaves of a [`Bvh`] that pass a test and whose every ancestor passes it.
///
/// Created by [`Bvh::leaves`].
pub struct Leaves<'a, T, A, Check: Fn(&BvhNode<T>) -> bool> {
    tree: &'a Bvh<T, A>,
    stack: SmallVec<[BvhNodeId; TRAVERSAL_STACK_SIZE]>,
    check: Check,
}

impl<'a, T, A, Check: Fn(&BvhNode<T>) -> bool> Iterator for Leaves<'a, T, A, Check> {
    type Item = BvhNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let node = &self.tree.nodes[id.0];

            if !(self.check)(node) {
                continue;
            }

            match node.content {
                BvhNodeContent::Internal { left, right } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
                BvhNodeContent::Leaf(_) => return Some(id),
            }
        }

        None
    }
}

/// Controls the execution flow of [`Bvh::traverse_with`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalAction {
    /// The traversal will continue on the children of the tested node.
    Continue,
    /// The traversal will skip all descendants of the tested node.
    Prune,
    /// The traversal will exit immediately.
    EarlyExit,
}

impl<T, A> Bvh<T, A> {
    #[inline(always)]
    pub(super) fn traversal_stack() -> SmallVec<[BvhNodeId; TRAVERSAL_STACK_SIZE]> {
        Default::default()
    }

    /// Traverses the tree in depth-first pre-order, left child first.
    ///
    /// The closure is called on every visited node (internal or leaf, the root included) and
    /// decides whether to visit its children, skip them, or stop the traversal altogether.
    pub fn traverse_with(
        &self,
        mut check_node: impl FnMut(BvhNodeId, &BvhNode<T>) -> TraversalAction,
    ) {
        let mut stack = Self::traversal_stack();
        stack.push(self.root);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];

            match check_node(id, node) {
                TraversalAction::Continue => {
                    if let BvhNodeContent::Internal { left, right } = node.content {
                        stack.push(right);
                        stack.push(left);
                    }
                }
                TraversalAction::Prune => {}
                TraversalAction::EarlyExit => return,
            }
        }
    }

    /// Collects every node whose bound passes `hit_test`, descending only below nodes that
    /// pass it.
    ///
    /// Nodes are listed in depth-first pre-order. The root is tested like any other node, so
    /// an empty tree (whose root bound is [`Aabb::new_invalid`]) only returns its root if
    /// `hit_test` accepts invalid boxes.
    pub fn traverse(&self, mut hit_test: impl FnMut(&Aabb) -> bool) -> Vec<BvhNodeId> {
        let mut result = Vec::new();
        self.traverse_with(|id, node| {
            if hit_test(&node.aabb) {
                result.push(id);
                TraversalAction::Continue
            } else {
                TraversalAction::Prune
            }
        });
        result
    }

    /// Collects every node whose bound is hit by `ray`.
    ///
    /// The ray starts at its origin and has no maximum length.
    pub fn traverse_ray(&self, ray: &Ray) -> Vec<BvhNodeId> {
        self.traverse(|aabb| aabb.intersects_ray(ray).is_some())
    }

    /// Collects every node whose bound intersects `volume` (touching boundaries count).
    pub fn traverse_volume(&self, volume: &Aabb) -> Vec<BvhNodeId> {
        self.traverse(|aabb| aabb.intersects(volume))
    }

    /// Collects every node whose bound intersects the sphere with the given `center` and
    /// `radius`.
    pub fn traverse_sphere(&self, center: &Point<Real>, radius: Real) -> Vec<BvhNodeId> {
        self.traverse(|aabb| aabb.intersects_sphere(center, radius))
    }

    /// Iterates through the leaves passing `check_node`, skipping the subtrees of all
    /// internal nodes failing it.
    pub fn leaves<F: Fn(&BvhNode<T>) -> bool>(&self, check_node: F) -> Leaves<'_, T, A, F> {
        let mut stack = Self::traversal_stack();
        stack.push(self.root);
        Leaves {
            tree: self,
            stack,
            check: check_node,
        }
    }

    /// Iterates through the leaves whose bound intersects `volume`.
    ///
    /// This is [`Bvh::traverse_volume`] without the internal nodes, and without allocation.
    pub fn overlapping_leaves<'a>(
        &'a self,
        volume: &'a Aabb,
    ) -> Leaves<'a, T, A, impl Fn(&BvhNode<T>) -> bool + 'a> {
        self.leaves(move |node| node.aabb.intersects(volume))
    }
}
