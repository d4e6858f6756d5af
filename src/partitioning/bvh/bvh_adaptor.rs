use super::BvhNodeId;
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use crate::utils::hashmap::HashMap;
use crate::utils::hashset::HashSet;
use alloc::vec::Vec;
use core::hash::Hash;

/// The radius given to objects that don’t define a bounding radius of their own.
pub const DEFAULT_OBJECT_RADIUS: Real = 1.0;

/// The bridge between a [`Bvh`](super::Bvh) and the objects it indexes.
///
/// The tree never inspects objects: it asks the adaptor for their position and radius,
/// and tells it which leaf holds each object. Each object is bounded by the box of the
/// sphere centered at its position.
///
/// The object-to-leaf index kept by the adaptor is what lets [`Bvh::remove`](super::Bvh::remove)
/// and [`Bvh::notify_object_changed`](super::Bvh::notify_object_changed) find their leaf
/// without searching the tree.
pub trait BvhNodeAdaptor<T> {
    /// The world-space center of the object’s bounding sphere.
    fn object_position(&self, object: &T) -> Point<Real>;

    /// The world-space radius of the object’s bounding sphere.
    fn radius(&self, _object: &T) -> Real {
        DEFAULT_OBJECT_RADIUS
    }

    /// The AABB of the object’s bounding sphere.
    fn object_aabb(&self, object: &T) -> Aabb {
        Aabb::from_sphere(&self.object_position(object), self.radius(object))
    }

    /// Records that `object` now lives in `leaf`, replacing any previous mapping.
    ///
    /// This is called whenever the object is placed in a leaf, including when its leaf is
    /// split or collapsed and the object ends up in another node.
    fn map_object_to_leaf(&mut self, object: &T, leaf: BvhNodeId);

    /// Forgets the leaf of `object`, which just left the tree.
    ///
    /// Adaptors emitting change notifications should stop doing so for this object.
    fn unmap_object(&mut self, object: &T);

    /// The leaf currently containing `object`, if any.
    fn leaf(&self, object: &T) -> Option<BvhNodeId>;

    /// Moves all the objects that changed since the last call into `out`.
    ///
    /// Only objects currently in the tree must be reported. The default implementation
    /// reports nothing, for adaptors whose owners call
    /// [`Bvh::notify_object_changed`](super::Bvh::notify_object_changed) themselves.
    fn drain_moved_objects(&mut self, _out: &mut Vec<T>) {}
}

/// The geometry of an object registered in a [`MapAdaptor`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ObjectBounds {
    /// The world-space center of the object.
    pub position: Point<Real>,
    /// The local-space radius of the object, if it has one.
    pub bounding_radius: Option<Real>,
    /// The scaling factors of the object’s transform.
    pub scale: Vector<Real>,
}

impl ObjectBounds {
    /// Bounds of an object without radius of its own, at `position`.
    pub fn new(position: Point<Real>) -> Self {
        Self {
            position,
            bounding_radius: None,
            scale: Vector::repeat(1.0),
        }
    }

    /// Bounds of an unscaled object with the given local `radius`.
    pub fn with_radius(position: Point<Real>, radius: Real) -> Self {
        Self {
            bounding_radius: Some(radius),
            ..Self::new(position)
        }
    }

    /// Sets the scaling factors of these bounds.
    pub fn scaled(mut self, scale: Vector<Real>) -> Self {
        self.scale = scale;
        self
    }

    /// The world-space radius of the object.
    ///
    /// This is the local radius scaled by the largest scaling factor, so the sphere keeps
    /// enclosing the object under non-uniform scaling. Objects without radius get
    /// [`DEFAULT_OBJECT_RADIUS`], whatever their scale.
    pub fn world_radius(&self) -> Real {
        match self.bounding_radius {
            Some(radius) => radius * self.scale.amax(),
            None => DEFAULT_OBJECT_RADIUS,
        }
    }
}

/// A ready-to-use [`BvhNodeAdaptor`] storing object geometry and leaf mappings in hash maps.
///
/// Objects are identified by a small copyable key (an entity id, a slot index…). Geometry
/// changes made through [`MapAdaptor::set_position`] and friends are queued for objects
/// currently in a tree, and handed to it by [`Bvh::sync_moved_objects`](super::Bvh::sync_moved_objects).
///
/// Querying the position of a key that was never registered with
/// [`MapAdaptor::insert_object`] panics.
#[derive(Clone, Debug)]
pub struct MapAdaptor<K> {
    objects: HashMap<K, ObjectBounds>,
    leaves: HashMap<K, BvhNodeId>,
    moved: HashSet<K>,
}

impl<K> Default for MapAdaptor<K> {
    fn default() -> Self {
        Self {
            objects: HashMap::default(),
            leaves: HashMap::default(),
            moved: HashSet::default(),
        }
    }
}

impl<K: Copy + Eq + Hash> MapAdaptor<K> {
    /// An adaptor without any object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the geometry of `key`.
    ///
    /// Returns the previous geometry. Replacing the geometry of an object already in a tree
    /// counts as a change.
    pub fn insert_object(&mut self, key: K, bounds: ObjectBounds) -> Option<ObjectBounds> {
        let previous = self.objects.insert(key, bounds);
        if previous.is_some() {
            self.object_changed(key);
        }
        previous
    }

    /// Forgets the geometry of `key`.
    ///
    /// The object must not be in any tree anymore.
    pub fn remove_object(&mut self, key: &K) -> Option<ObjectBounds> {
        let _ = self.moved.remove(key);
        self.objects.remove(key)
    }

    /// The geometry of `key`.
    pub fn bounds(&self, key: &K) -> Option<&ObjectBounds> {
        self.objects.get(key)
    }

    /// Moves `key` to `position`.
    ///
    /// Returns `false` if `key` isn’t registered.
    pub fn set_position(&mut self, key: K, position: Point<Real>) -> bool {
        self.modify(key, |bounds| bounds.position = position)
    }

    /// Changes the scaling factors of `key`.
    ///
    /// Returns `false` if `key` isn’t registered.
    pub fn set_scale(&mut self, key: K, scale: Vector<Real>) -> bool {
        self.modify(key, |bounds| bounds.scale = scale)
    }

    /// Changes the local bounding radius of `key`.
    ///
    /// Returns `false` if `key` isn’t registered.
    pub fn set_bounding_radius(&mut self, key: K, radius: Option<Real>) -> bool {
        self.modify(key, |bounds| bounds.bounding_radius = radius)
    }

    /// Is `key` currently mapped to a leaf, i.e., will its changes be reported?
    pub fn is_subscribed(&self, key: &K) -> bool {
        self.leaves.contains_key(key)
    }

    /// The number of changed objects waiting to be reported.
    pub fn pending_moves(&self) -> usize {
        self.moved.len()
    }

    fn modify(&mut self, key: K, f: impl FnOnce(&mut ObjectBounds)) -> bool {
        match self.objects.get_mut(&key) {
            Some(bounds) => {
                f(bounds);
                self.object_changed(key);
                true
            }
            None => false,
        }
    }

    fn object_changed(&mut self, key: K) {
        if self.leaves.contains_key(&key) {
            let _ = self.moved.insert(key);
        }
    }
}

impl<K: Copy + Eq + Hash> BvhNodeAdaptor<K> for MapAdaptor<K> {
    fn object_position(&self, object: &K) -> Point<Real> {
        debug_assert!(
            self.objects.contains_key(object),
            "Object not registered with `MapAdaptor::insert_object`."
        );
        self.objects[object].position
    }

    fn radius(&self, object: &K) -> Real {
        debug_assert!(
            self.objects.contains_key(object),
            "Object not registered with `MapAdaptor::insert_object`."
        );
        self.objects[object].world_radius()
    }

    fn map_object_to_leaf(&mut self, object: &K, leaf: BvhNodeId) {
        let _ = self.leaves.insert(*object, leaf);
    }

    fn unmap_object(&mut self, object: &K) {
        let _ = self.leaves.remove(object);
        let _ = self.moved.remove(object);
    }

    fn leaf(&self, object: &K) -> Option<BvhNodeId> {
        self.leaves.get(object).copied()
    }

    fn drain_moved_objects(&mut self, out: &mut Vec<K>) {
        out.extend(self.moved.drain());
    }
}
