//! A hash-set usable with or without the standard library.

/// Hashset using [`hashbrown::HashSet`] with its default hasher.
pub type HashSet<K> = hashbrown::hash_set::HashSet<K>;
