//! Various unsorted logical utilities.

pub mod hashmap;
pub mod hashset;
