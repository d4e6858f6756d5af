//! A hash-map usable with or without the standard library.

/// Hashmap using [`hashbrown::HashMap`] with its default hasher.
pub type HashMap<K, V> = hashbrown::hash_map::HashMap<K, V>;
