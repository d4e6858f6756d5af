use super::{Bvh, BvhNodeAdaptor, BvhNodeContent, BvhNodeId};
use crate::bounding_volume::BoundingVolume;
use crate::utils::hashset::HashSet;
use alloc::vec;

impl<T, A> Bvh<T, A>
where
    T: Clone + PartialEq,
    A: BvhNodeAdaptor<T>,
{
    /// Counts the number of leaves that can be reached from the node `id`.
    ///
    /// This is mostly a utility for debugging.
    pub fn reachable_leaf_count(&self, id: BvhNodeId) -> u32 {
        match self.nodes[id.0].content {
            BvhNodeContent::Leaf(_) => 1,
            BvhNodeContent::Internal { left, right } => {
                self.reachable_leaf_count(left) + self.reachable_leaf_count(right)
            }
        }
    }

    /// Panics if the tree isn’t well-formed.
    ///
    /// The tree is well-formed if it is topologically correct and geometrically correct:
    /// - every node is reachable from the root exactly once, and each child points back to
    ///   its parent with a depth one greater than its parent’s;
    /// - only the root may be an empty leaf, and no leaf exceeds the configured capacity;
    /// - the adaptor maps every object to the leaf containing it;
    /// - every internal bound is exactly the union of its children’s bounds, and every leaf
    ///   bound contains the bounds of its objects.
    ///
    /// The geometric part only holds when no change notification is waiting for
    /// [`Bvh::optimize`]. See [`Bvh::assert_well_formed_topology_only`] otherwise.
    pub fn assert_well_formed(&self) {
        self.assert_well_formed_with(true)
    }

    /// Panics if the tree isn’t topologically well-formed.
    ///
    /// This runs all the checks of [`Bvh::assert_well_formed`] except the ones involving bounds.
    pub fn assert_well_formed_topology_only(&self) {
        self.assert_well_formed_with(false)
    }

    fn assert_well_formed_with(&self, check_geometry: bool) {
        let root = &self.nodes[self.root.0];
        assert!(root.parent.is_none(), "The BVH root has a parent.");
        assert_eq!(root.depth, 0, "The BVH root must have a depth of 0.");

        let mut loop_detection = HashSet::new();
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            assert!(
                loop_detection.insert(id),
                "Detected loop. Node {:?} visited twice.",
                id
            );
            let node = &self.nodes[id.0];

            match &node.content {
                BvhNodeContent::Internal { left, right } => {
                    for child in [*left, *right] {
                        let Some(child_node) = self.nodes.get(child.0) else {
                            panic!("Node {:?} has the dead child {:?}.", id, child);
                        };
                        assert_eq!(child_node.parent, Some(id), "Wrong parent link.");
                        assert_eq!(child_node.depth, node.depth + 1, "Wrong depth.");
                        stack.push(child);
                    }

                    if check_geometry {
                        let union = self.nodes[left.0]
                            .aabb
                            .merged(&self.nodes[right.0].aabb);
                        assert_eq!(
                            node.aabb, union,
                            "The bound of {:?} isn’t the union of its children’s.",
                            id
                        );
                    }
                }
                BvhNodeContent::Leaf(objects) => {
                    assert!(objects.len() <= self.config.leaf_obj_max);
                    assert!(
                        id == self.root || !objects.is_empty(),
                        "Found the empty non-root leaf {:?}.",
                        id
                    );

                    for object in objects {
                        assert_eq!(self.adaptor.leaf(object), Some(id), "Wrong object mapping.");

                        if check_geometry {
                            assert!(
                                node.aabb.contains(&self.adaptor.object_aabb(object)),
                                "Leaf {:?} doesn’t contain one of its objects.",
                                id
                            );
                        }
                    }
                }
            }
        }

        assert_eq!(
            loop_detection.len(),
            self.nodes.len(),
            "Some BVH nodes aren’t reachable from the root."
        );
    }
}
