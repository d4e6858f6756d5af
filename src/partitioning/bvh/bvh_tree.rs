use super::bvh_build::BvhBuildItem;
use super::{BvhError, BvhNodeAdaptor};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::Real;
use crate::utils::hashset::HashSet;
use alloc::vec::Vec;
use slab::Slab;
use smallvec::SmallVec;

/// An index identifying a single node of a [`Bvh`].
///
/// Node indices are stable: a node keeps its index for as long as it lives, including
/// across rotations. A leaf emptied by a removal is freed and its index may be reused by
/// a later insertion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BvhNodeId(pub(super) usize);

impl BvhNodeId {
    /// The raw index of this node in the arena of its tree.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The objects of a leaf, stored inline as long as there are few of them.
pub(super) type LeafObjects<T> = SmallVec<[T; 1]>;

/// What a [`BvhNode`] holds: either objects (leaf) or exactly two children (internal node).
#[derive(Clone, Debug, PartialEq)]
pub enum BvhNodeContent<T> {
    /// A leaf containing up to [`BvhConfig::leaf_obj_max`] objects.
    ///
    /// Only the root may be an empty leaf.
    Leaf(SmallVec<[T; 1]>),
    /// An internal node owning two children.
    Internal {
        /// The left child.
        left: BvhNodeId,
        /// The right child.
        right: BvhNodeId,
    },
}

/// A node (internal or leaf) of a [`Bvh`].
#[derive(Clone, Debug, PartialEq)]
pub struct BvhNode<T> {
    pub(super) aabb: Aabb,
    pub(super) parent: Option<BvhNodeId>,
    pub(super) depth: u32,
    pub(super) content: BvhNodeContent<T>,
}

impl<T> BvhNode<T> {
    #[inline]
    pub(super) fn empty_leaf(parent: Option<BvhNodeId>, depth: u32) -> Self {
        Self {
            aabb: Aabb::new_invalid(),
            parent,
            depth,
            content: BvhNodeContent::Leaf(LeafObjects::new()),
        }
    }

    /// The bounding volume of this node.
    ///
    /// For an internal node, it is the union of its children’s bounds. For a leaf, it
    /// contains the bounds of all its objects, with the margin left by past moves.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// The parent of this node, or `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<BvhNodeId> {
        self.parent
    }

    /// The distance from the root to this node (the root has a depth of 0).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The content of this node.
    #[inline]
    pub fn content(&self) -> &BvhNodeContent<T> {
        &self.content
    }

    /// Is this node a leaf?
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.content, BvhNodeContent::Leaf(_))
    }

    /// The `(left, right)` children of this node, or `None` if it is a leaf.
    #[inline]
    pub fn children(&self) -> Option<(BvhNodeId, BvhNodeId)> {
        match self.content {
            BvhNodeContent::Internal { left, right } => Some((left, right)),
            BvhNodeContent::Leaf(_) => None,
        }
    }

    /// The objects stored by this node.
    ///
    /// This is always empty for internal nodes.
    #[inline]
    pub fn objects(&self) -> &[T] {
        match &self.content {
            BvhNodeContent::Leaf(objects) => objects,
            BvhNodeContent::Internal { .. } => &[],
        }
    }
}

/// Parameters of a [`Bvh`], fixed at construction time.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BvhConfig {
    /// The maximum number of objects a leaf can hold before being split.
    ///
    /// Must be at least 1. Values other than 1 are supported by every operation except
    /// [`Bvh::optimize`], since tree rotations assume one object per leaf.
    pub leaf_obj_max: usize,
    /// Discount factor deciding when an insertion pushes both children of an internal node
    /// down one level and gives the new object its own leaf next to them.
    ///
    /// This happens when `SA(left ∪ right) + SA(new) < merge_discount * min(cost of
    /// sending the object left, cost of sending it right)`. Set to zero to disable.
    pub merge_discount: Real,
    /// Minimum relative reduction of the children’s summed surface area a rotation must
    /// achieve to be applied by [`Bvh::optimize`].
    pub rotation_threshold: Real,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            leaf_obj_max: 1,
            merge_discount: 0.3,
            rotation_threshold: 0.0,
        }
    }
}

impl BvhConfig {
    /// Sets [`BvhConfig::leaf_obj_max`].
    pub fn with_leaf_obj_max(mut self, leaf_obj_max: usize) -> Self {
        self.leaf_obj_max = leaf_obj_max;
        self
    }

    /// Sets [`BvhConfig::merge_discount`].
    pub fn with_merge_discount(mut self, merge_discount: Real) -> Self {
        self.merge_discount = merge_discount;
        self
    }

    /// Sets [`BvhConfig::rotation_threshold`].
    pub fn with_rotation_threshold(mut self, rotation_threshold: Real) -> Self {
        self.rotation_threshold = rotation_threshold;
        self
    }
}

/// A dynamic Bounding Volume Hierarchy over moving objects.
///
/// The tree is binary, its nodes live in an arena and are addressed by [`BvhNodeId`]. It
/// knows nothing of the concrete object type `T`: positions, radii and the object-to-leaf
/// index are all handled by the adaptor `A`.
///
/// Typical per-frame usage:
/// 1. the scene moves objects and reports them through [`Bvh::notify_object_changed`] (or
///    queues them in the adaptor, then calls [`Bvh::sync_moved_objects`]);
/// 2. [`Bvh::optimize`] refits the touched branches bottom-up and applies tree rotations;
/// 3. renderers and picking code run [`Bvh::traverse_ray`], [`Bvh::traverse_volume`], etc.
///
/// Every operation runs to completion before returning. The tree is not synchronized: all
/// calls must be serialized by its owner.
///
/// # Example
///
/// ```rust
/// # #[cfg(feature = "f32")] {
/// use dynbvh3d::partitioning::{Bvh, MapAdaptor, ObjectBounds};
/// use dynbvh3d::query::Ray;
/// use dynbvh3d::na::{Point3, Vector3};
///
/// let mut adaptor = MapAdaptor::new();
/// adaptor.insert_object(0, ObjectBounds::new(Point3::new(0.0, 0.0, 0.0)));
/// adaptor.insert_object(1, ObjectBounds::new(Point3::new(10.0, 0.0, 0.0)));
/// adaptor.insert_object(2, ObjectBounds::new(Point3::new(0.0, 10.0, 0.0)));
///
/// let mut bvh = Bvh::new(adaptor, [0, 1, 2]);
/// assert_eq!(bvh.count_nodes(), 5);
///
/// let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::x());
/// let hits = bvh.traverse_ray(&ray);
/// assert!(hits.contains(&bvh.leaf_of(&0).unwrap()));
/// assert!(!hits.contains(&bvh.leaf_of(&2).unwrap()));
///
/// // Move an object, then let the tree catch up.
/// let _ = bvh.adaptor_mut().set_position(0, Point3::new(50.0, 50.0, 50.0));
/// assert_eq!(bvh.sync_moved_objects(), Ok(1));
/// bvh.optimize().unwrap();
/// assert!(bvh.root_aabb().contains_local_point(&Point3::new(50.0, 50.0, 50.0)));
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Bvh<T, A> {
    pub(super) nodes: Slab<BvhNode<T>>,
    pub(super) root: BvhNodeId,
    pub(super) adaptor: A,
    pub(super) config: BvhConfig,
    // Nodes waiting for the next `optimize`.
    pub(super) refit_nodes: HashSet<BvhNodeId>,
}

impl<T, A> Bvh<T, A> {
    /// The root of this tree.
    ///
    /// The root always exists: an empty tree is made of a single empty leaf.
    #[inline]
    pub fn root(&self) -> BvhNodeId {
        self.root
    }

    /// The AABB bounding everything contained by this tree.
    ///
    /// This is [`Aabb::new_invalid`] if the tree is empty.
    #[inline]
    pub fn root_aabb(&self) -> Aabb {
        self.nodes[self.root.0].aabb
    }

    /// The node with the given index, if it exists.
    #[inline]
    pub fn node(&self, id: BvhNodeId) -> Option<&BvhNode<T>> {
        self.nodes.get(id.0)
    }

    /// Iterates through all the nodes of this tree, in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (BvhNodeId, &BvhNode<T>)> {
        self.nodes.iter().map(|(id, node)| (BvhNodeId(id), node))
    }

    /// The adaptor bridging this tree and its objects.
    #[inline]
    pub fn adaptor(&self) -> &A {
        &self.adaptor
    }

    /// Mutable access to the adaptor bridging this tree and its objects.
    ///
    /// Changing the geometry of an object through this reference must be followed by a
    /// change notification for the tree to see it.
    #[inline]
    pub fn adaptor_mut(&mut self) -> &mut A {
        &mut self.adaptor
    }

    /// The configuration this tree was built with.
    #[inline]
    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    /// The total number of nodes (internal and leaves) of this tree.
    #[inline]
    pub fn count_nodes(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// The number of leaves of this tree.
    ///
    /// An empty tree has one (empty) leaf.
    pub fn leaf_count(&self) -> u32 {
        self.nodes.iter().filter(|(_, node)| node.is_leaf()).count() as u32
    }

    /// The number of objects stored in this tree.
    pub fn object_count(&self) -> usize {
        self.nodes.iter().map(|(_, node)| node.objects().len()).sum()
    }

    /// Does this tree not contain any object?
    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.0].objects().is_empty() && self.nodes[self.root.0].is_leaf()
    }

    /// The number of levels of this tree, i.e., the number of nodes on its longest
    /// root-to-leaf path.
    pub fn depth(&self) -> u32 {
        self.nodes
            .iter()
            .map(|(_, node)| node.depth + 1)
            .max()
            .unwrap_or(0)
    }

    /// The number of nodes waiting for the next call to [`Bvh::optimize`].
    #[inline]
    pub fn pending_refit_count(&self) -> usize {
        self.refit_nodes.len()
    }

    #[inline]
    pub(super) fn children(&self, id: BvhNodeId) -> Option<(BvhNodeId, BvhNodeId)> {
        self.nodes[id.0].children()
    }

    /// The other child of the parent of `id`.
    pub(super) fn sibling(&self, id: BvhNodeId) -> Option<BvhNodeId> {
        let parent = self.nodes[id.0].parent?;
        match self.children(parent)? {
            (left, right) if left == id => Some(right),
            (left, right) if right == id => Some(left),
            _ => None,
        }
    }

    pub(super) fn replace_child(&mut self, parent: BvhNodeId, old: BvhNodeId, new: BvhNodeId) {
        if let BvhNodeContent::Internal { left, right } = &mut self.nodes[parent.0].content {
            if *left == old {
                *left = new;
            } else if *right == old {
                *right = new;
            }
        }
    }

    /// Sets the depth of `id` and updates the depths of all its descendants accordingly.
    pub(super) fn set_depth(&mut self, id: BvhNodeId, depth: u32) {
        let mut stack: SmallVec<[(BvhNodeId, u32); 32]> = SmallVec::new();
        stack.push((id, depth));

        while let Some((curr, curr_depth)) = stack.pop() {
            let node = &mut self.nodes[curr.0];
            node.depth = curr_depth;
            if let BvhNodeContent::Internal { left, right } = node.content {
                stack.push((left, curr_depth + 1));
                stack.push((right, curr_depth + 1));
            }
        }
    }

    /// Recomputes the AABB of an internal node as the union of its children’s.
    ///
    /// Does nothing on leaves.
    pub(super) fn refit_internal(&mut self, id: BvhNodeId) {
        if let Some((left, right)) = self.children(id) {
            let aabb = self.nodes[left.0].aabb.merged(&self.nodes[right.0].aabb);
            self.nodes[id.0].aabb = aabb;
        }
    }

    /// Refits `start` and all its ancestors, up to the root.
    ///
    /// This is the only place where internal bounds may shrink.
    pub(super) fn refit_ancestors(&mut self, start: Option<BvhNodeId>) {
        let mut curr = start;
        while let Some(id) = curr {
            self.refit_internal(id);
            curr = self.nodes[id.0].parent;
        }
    }

    /// Enlarges the ancestors of `from` so they contain `aabb`.
    ///
    /// Stops at the first ancestor that already contains it.
    pub(super) fn propagate_expansion(&mut self, from: BvhNodeId, aabb: &Aabb) {
        let mut curr = self.nodes[from.0].parent;
        while let Some(id) = curr {
            let node = &mut self.nodes[id.0];
            if node.aabb.contains(aabb) {
                break;
            }
            node.aabb.merge(aabb);
            curr = node.parent;
        }
    }
}

impl<T, A> Bvh<T, A>
where
    T: Clone + PartialEq,
    A: BvhNodeAdaptor<T>,
{
    /// Builds a tree containing `objects`, with the default configuration.
    ///
    /// With the default configuration, each leaf holds a single object, which is required
    /// by [`Bvh::optimize`].
    pub fn new(adaptor: A, objects: impl IntoIterator<Item = T>) -> Self {
        Self::with_config(adaptor, objects, BvhConfig::default())
    }

    /// Builds a tree containing `objects`.
    ///
    /// The objects are partitioned recursively: each set is sorted along the widest axis of
    /// its bounds and split at the median. Without objects, the tree is a single empty leaf.
    ///
    /// # Panics
    ///
    /// Panics if `config.leaf_obj_max` is zero.
    pub fn with_config(adaptor: A, objects: impl IntoIterator<Item = T>, config: BvhConfig) -> Self {
        assert!(
            config.leaf_obj_max >= 1,
            "A BVH leaf must be able to hold at least one object."
        );

        let mut nodes = Slab::new();
        let root = BvhNodeId(nodes.insert(BvhNode::empty_leaf(None, 0)));
        let mut result = Self {
            nodes,
            root,
            adaptor,
            config,
            refit_nodes: HashSet::new(),
        };

        let items: Vec<_> = objects
            .into_iter()
            .map(|object| BvhBuildItem::new(&result.adaptor, object))
            .collect();

        if !items.is_empty() {
            result.build_subtree(root, items);
        }

        result
    }

    /// The leaf currently containing `object`, as recorded by the adaptor.
    ///
    /// Fails if the adaptor doesn’t know the object, or maps it to a node that no longer
    /// exists. Both indicate that the adaptor and the tree went out of sync.
    pub fn leaf_of(&self, object: &T) -> Result<BvhNodeId, BvhError> {
        match self.adaptor.leaf(object) {
            Some(leaf) if self.nodes.contains(leaf.0) => Ok(leaf),
            Some(leaf) => {
                log::error!("The adaptor maps an object to the dead BVH node {:?}.", leaf);
                Err(BvhError::DanglingLeaf(leaf))
            }
            None => {
                log::error!("The object isn’t mapped to any leaf of this BVH.");
                Err(BvhError::UnmappedObject)
            }
        }
    }

    /// The tight union of the AABBs of `objects`.
    pub(super) fn objects_aabb(&self, objects: &[T]) -> Aabb {
        objects.iter().fold(Aabb::new_invalid(), |acc, object| {
            acc.merged(&self.adaptor.object_aabb(object))
        })
    }
}
