//! A dynamic bounding volume hierarchy over moving objects.
//!
//! See [`Bvh`] for an overview, and [`BvhNodeAdaptor`] for the way the tree talks to the
//! objects it indexes.

pub use bvh_adaptor::{BvhNodeAdaptor, MapAdaptor, ObjectBounds, DEFAULT_OBJECT_RADIUS};
pub use bvh_error::BvhError;
pub use bvh_traverse::{Leaves, TraversalAction};
pub use bvh_tree::{Bvh, BvhConfig, BvhNode, BvhNodeContent, BvhNodeId};

mod bvh_adaptor;
mod bvh_build;
mod bvh_error;
mod bvh_insert;
mod bvh_optimize;
mod bvh_refit;
mod bvh_traverse;
mod bvh_tree;
mod bvh_validation;
