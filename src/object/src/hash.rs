use std::hash::{self, BuildHasher, BuildHasherDefault, Hasher};

use rustc_hash::FxHasher;

pub type FxBuildHasher = BuildHasherDefault<FxHasher>;
pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
pub type FxHashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

pub fn fx_hash_one(value: impl hash::Hash) -> u64 {
    FxBuildHasher::default().hash_one(value)
}

/// Folds `value` into an existing hash `seed`. Used to mix an object handle's integral encoding
/// into a method name's hash.
pub fn hash_combine(seed: u64, value: u64) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(seed);
    hasher.write_u64(value);
    hasher.finish()
}
