use super::bvh_tree::{BvhNodeContent, LeafObjects};
use super::{Bvh, BvhNode, BvhNodeAdaptor, BvhNodeId};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real};
use alloc::vec::Vec;
use ordered_float::OrderedFloat;

/// An object with its geometry sampled once, for the duration of a build.
pub(super) struct BvhBuildItem<T> {
    pub object: T,
    pub aabb: Aabb,
    pub center: Point<Real>,
}

impl<T> BvhBuildItem<T> {
    pub fn new<A: BvhNodeAdaptor<T>>(adaptor: &A, object: T) -> Self {
        let center = adaptor.object_position(&object);
        let aabb = Aabb::from_sphere(&center, adaptor.radius(&object));
        Self {
            object,
            aabb,
            center,
        }
    }
}

impl<T, A> Bvh<T, A>
where
    T: Clone + PartialEq,
    A: BvhNodeAdaptor<T>,
{
    /// Turns the existing node `target` into a subtree containing all `items`.
    ///
    /// The parent and depth of `target` are left unchanged, and every placed object is
    /// mapped to its new leaf.
    pub(super) fn build_subtree(&mut self, target: BvhNodeId, mut items: Vec<BvhBuildItem<T>>) {
        if items.len() <= self.config.leaf_obj_max {
            let mut aabb = Aabb::new_invalid();
            let mut objects = LeafObjects::with_capacity(items.len());

            for item in items {
                self.adaptor.map_object_to_leaf(&item.object, target);
                aabb.merge(&item.aabb);
                objects.push(item.object);
            }

            let node = &mut self.nodes[target.0];
            node.aabb = aabb;
            node.content = BvhNodeContent::Leaf(objects);
            return;
        }

        let bounds = items
            .iter()
            .fold(Aabb::new_invalid(), |acc, item| acc.merged(&item.aabb));
        let axis = bounds.widest_axis();

        // `items.len() >= 2` here, so both halves are non-empty.
        items.sort_by_key(|item| OrderedFloat(item.center[axis]));
        let right_items = items.split_off(items.len() / 2);

        let depth = self.nodes[target.0].depth;
        let left = BvhNodeId(
            self.nodes
                .insert(BvhNode::empty_leaf(Some(target), depth + 1)),
        );
        let right = BvhNodeId(
            self.nodes
                .insert(BvhNode::empty_leaf(Some(target), depth + 1)),
        );
        log::trace!(
            "Splitting {} objects of BVH node {:?} along axis {}.",
            items.len() + right_items.len(),
            target,
            axis
        );

        self.build_subtree(left, items);
        self.build_subtree(right, right_items);

        let node = &mut self.nodes[target.0];
        node.content = BvhNodeContent::Internal { left, right };
        self.refit_internal(target);
    }
}
