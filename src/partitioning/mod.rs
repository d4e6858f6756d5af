//! Spatial partitioning tools.

pub use self::bvh::{
    Bvh, BvhConfig, BvhError, BvhNode, BvhNodeAdaptor, BvhNodeContent, BvhNodeId, MapAdaptor,
    ObjectBounds, TraversalAction, DEFAULT_OBJECT_RADIUS,
};

pub mod bvh;
