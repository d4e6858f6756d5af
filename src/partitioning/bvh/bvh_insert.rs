use super::bvh_build::BvhBuildItem;
use super::bvh_tree::{BvhNodeContent, LeafObjects};
use super::{Bvh, BvhNode, BvhNodeAdaptor, BvhNodeId};
use crate::bounding_volume::BoundingVolume;
use alloc::vec::Vec;

impl<T, A> Bvh<T, A>
where
    T: Clone + PartialEq,
    A: BvhNodeAdaptor<T>,
{
    /// Inserts a new object into this tree.
    ///
    /// The insertion point is found by walking down from the root. At each internal node,
    /// the object goes to the child for which the summed surface area of both children after
    /// insertion is the smallest (the left child on ties). If even the best of these is much
    /// worse than keeping both children together, they are pushed down one level and the
    /// object gets its own leaf next to them (see [`BvhConfig::merge_discount`](super::BvhConfig::merge_discount)).
    ///
    /// Once a leaf is reached, the object is added to it, or the leaf is split into a
    /// subtree if it is full. Ancestors only ever grow here. The object must not already
    /// be in this tree.
    pub fn insert(&mut self, object: T) {
        let item = BvhBuildItem::new(&self.adaptor, object);
        let item_area = item.aabb.surface_area();
        let mut curr = self.root;

        while let Some((left, right)) = self.children(curr) {
            let left_aabb = self.nodes[left.0].aabb;
            let right_aabb = self.nodes[right.0].aabb;

            let send_left = right_aabb.surface_area() + left_aabb.merged(&item.aabb).surface_area();
            let send_right = left_aabb.surface_area() + right_aabb.merged(&item.aabb).surface_area();
            let merge = left_aabb.merged(&right_aabb).surface_area() + item_area;

            if merge < send_left.min(send_right) * self.config.merge_discount {
                self.push_down_and_insert(curr, left, right, item);
                return;
            }

            curr = if send_left <= send_right { left } else { right };
        }

        self.insert_in_leaf(curr, item);
    }

    /// Replaces the children of `id` by a new internal node holding them, and a new leaf
    /// holding `item`.
    fn push_down_and_insert(
        &mut self,
        id: BvhNodeId,
        left: BvhNodeId,
        right: BvhNodeId,
        item: BvhBuildItem<T>,
    ) {
        let depth = self.nodes[id.0].depth;
        let children_aabb = self.nodes[left.0].aabb.merged(&self.nodes[right.0].aabb);

        let pushed = BvhNodeId(self.nodes.insert(BvhNode {
            aabb: children_aabb,
            parent: Some(id),
            depth: depth + 1,
            content: BvhNodeContent::Internal { left, right },
        }));
        self.nodes[left.0].parent = Some(pushed);
        self.nodes[right.0].parent = Some(pushed);
        self.set_depth(left, depth + 2);
        self.set_depth(right, depth + 2);

        let mut objects = LeafObjects::new();
        objects.push(item.object);
        let leaf = BvhNodeId(self.nodes.insert(BvhNode {
            aabb: item.aabb,
            parent: Some(id),
            depth: depth + 1,
            content: BvhNodeContent::Leaf(objects),
        }));
        for object in self.nodes[leaf.0].objects() {
            self.adaptor.map_object_to_leaf(object, leaf);
        }

        let node = &mut self.nodes[id.0];
        node.content = BvhNodeContent::Internal {
            left: pushed,
            right: leaf,
        };
        node.aabb = children_aabb.merged(&item.aabb);
        self.propagate_expansion(id, &item.aabb);

        log::trace!(
            "Pushed the children of BVH node {:?} down to {:?} to insert leaf {:?}.",
            id,
            pushed,
            leaf
        );
    }

    fn insert_in_leaf(&mut self, leaf: BvhNodeId, item: BvhBuildItem<T>) {
        let leaf_obj_max = self.config.leaf_obj_max;
        let node = &mut self.nodes[leaf.0];
        let old_aabb = node.aabb;
        let BvhNodeContent::Leaf(objects) = &mut node.content else {
            unreachable!("The insertion walk always ends on a leaf.")
        };

        if objects.len() < leaf_obj_max {
            self.adaptor.map_object_to_leaf(&item.object, leaf);
            objects.push(item.object);
            node.aabb.merge(&item.aabb);
            self.propagate_expansion(leaf, &item.aabb);
            return;
        }

        let mut items: Vec<_> = objects
            .drain(..)
            .map(|object| BvhBuildItem::new(&self.adaptor, object))
            .collect();
        items.push(item);
        log::trace!("Splitting full BVH leaf {:?}.", leaf);
        self.build_subtree(leaf, items);

        let new_aabb = self.nodes[leaf.0].aabb;
        if new_aabb.contains(&old_aabb) {
            self.propagate_expansion(leaf, &new_aabb);
        } else {
            // The old leaf bound had some margin the tight rebuild dropped.
            let parent = self.nodes[leaf.0].parent;
            self.refit_ancestors(parent);
        }
    }
}
