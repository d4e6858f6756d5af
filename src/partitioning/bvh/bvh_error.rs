use super::BvhNodeId;

/// Errors reported by the operations of a [`Bvh`](super::Bvh).
///
/// Each of them denotes a broken contract between the tree, its adaptor and their owner. The
/// tree is left untouched when one is returned.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BvhError {
    /// Tree rotations were requested on a tree whose leaves may hold several objects.
    #[error("BVH optimization requires leaves with a single object, but `leaf_obj_max` is {leaf_obj_max}")]
    OptimizeRequiresSingleObjectLeaves {
        /// The configured maximum number of objects per leaf.
        leaf_obj_max: usize,
    },
    /// The object isn’t mapped to any leaf by the adaptor.
    #[error("the object isn’t mapped to any leaf of this BVH")]
    UnmappedObject,
    /// The adaptor maps the object to a node that is dead, isn’t a leaf, or doesn’t contain it.
    #[error("the object is mapped to {0:?}, which isn’t a leaf containing it")]
    DanglingLeaf(BvhNodeId),
}
