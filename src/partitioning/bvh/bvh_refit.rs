use super::bvh_tree::BvhNodeContent;
use super::{Bvh, BvhError, BvhNodeAdaptor, BvhNodeId};
use crate::bounding_volume::{Aabb, BoundingVolume};
use alloc::vec::Vec;

impl<T, A> Bvh<T, A>
where
    T: Clone + PartialEq,
    A: BvhNodeAdaptor<T>,
{
    /// Reports that the position or radius of `object` changed.
    ///
    /// The bound of the object’s leaf is recomputed. If the old bound still contains the new
    /// one, nothing else happens. Otherwise, the leaf takes the new bound and is scheduled for
    /// the next [`Bvh::optimize`], which refits its ancestors. Until then, the ancestors may
    /// not contain the leaf and queries may miss the object.
    pub fn notify_object_changed(&mut self, object: &T) -> Result<(), BvhError> {
        let leaf = self.leaf_of(object)?;
        let objects = self.nodes[leaf.0].objects();

        if !objects.contains(object) {
            log::error!("The object mapped to BVH node {:?} isn’t there.", leaf);
            return Err(BvhError::DanglingLeaf(leaf));
        }

        let aabb = self.objects_aabb(objects);
        let node = &mut self.nodes[leaf.0];

        if node.aabb.contains(&aabb) {
            return Ok(());
        }

        node.aabb = aabb;
        let _ = self.refit_nodes.insert(leaf);
        Ok(())
    }

    /// Drains the objects queued by the adaptor and reports each of them with
    /// [`Bvh::notify_object_changed`].
    ///
    /// Returns the number of objects processed, or the first error met. All the drained
    /// objects are reported either way.
    pub fn sync_moved_objects(&mut self) -> Result<usize, BvhError> {
        let mut moved = Vec::new();
        self.adaptor.drain_moved_objects(&mut moved);

        // Drained objects are gone from the adaptor, so they are all processed even after a
        // failure.
        let mut first_error = None;
        for object in &moved {
            if let Err(err) = self.notify_object_changed(object) {
                let _ = first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(moved.len()),
        }
    }

    /// Removes `object` from this tree.
    ///
    /// If its leaf becomes empty, the leaf is deleted and its sibling takes the place of their
    /// parent. All ancestors are then refitted up to the root, so bounds are exact along that
    /// path when this returns.
    pub fn remove(&mut self, object: &T) -> Result<(), BvhError> {
        let leaf = self.leaf_of(object)?;
        let node = &mut self.nodes[leaf.0];
        let parent = node.parent;

        let removed = match &mut node.content {
            BvhNodeContent::Leaf(objects) => match objects.iter().position(|o| o == object) {
                Some(i) => {
                    let _ = objects.remove(i);
                    Some(objects.is_empty())
                }
                None => None,
            },
            BvhNodeContent::Internal { .. } => None,
        };

        let Some(now_empty) = removed else {
            log::error!("The object mapped to BVH node {:?} isn’t there.", leaf);
            return Err(BvhError::DanglingLeaf(leaf));
        };

        self.adaptor.unmap_object(object);

        if !now_empty {
            let aabb = self.objects_aabb(self.nodes[leaf.0].objects());
            self.nodes[leaf.0].aabb = aabb;
            self.refit_ancestors(parent);
            return Ok(());
        }

        match (parent, self.sibling(leaf)) {
            (Some(parent), Some(sibling)) => self.collapse_leaf(leaf, parent, sibling),
            (None, _) => {
                // The tree is now empty.
                self.nodes[leaf.0].aabb = Aabb::new_invalid();
                let _ = self.refit_nodes.remove(&leaf);
            }
            (Some(_), None) => {
                log::error!("BVH leaf {:?} isn’t a child of its parent.", leaf);
                return Err(BvhError::DanglingLeaf(leaf));
            }
        }

        Ok(())
    }

    /// Deletes the empty `leaf`, and moves its `sibling` in place of their `parent`.
    fn collapse_leaf(&mut self, leaf: BvhNodeId, parent: BvhNodeId, sibling: BvhNodeId) {
        let _ = self.nodes.remove(leaf.0);
        let sibling_node = self.nodes.remove(sibling.0);
        let parent_depth = self.nodes[parent.0].depth;

        match &sibling_node.content {
            BvhNodeContent::Internal { left, right } => {
                for child in [*left, *right] {
                    self.nodes[child.0].parent = Some(parent);
                    self.set_depth(child, parent_depth + 1);
                }
            }
            BvhNodeContent::Leaf(objects) => {
                for object in objects {
                    self.adaptor.map_object_to_leaf(object, parent);
                }
            }
        }

        let node = &mut self.nodes[parent.0];
        node.aabb = sibling_node.aabb;
        node.content = sibling_node.content;

        // The freed ids may be reused by the next insertion.
        let _ = self.refit_nodes.remove(&leaf);
        if self.refit_nodes.remove(&sibling) {
            let _ = self.refit_nodes.insert(parent);
        }

        let grand_parent = self.nodes[parent.0].parent;
        self.refit_ancestors(grand_parent);

        log::trace!(
            "Collapsed BVH leaf {:?}: node {:?} takes the content of {:?}.",
            leaf,
            parent,
            sibling
        );
    }
}
