//! Fast hash map/set aliases built on `rustc-hash`'s `FxHasher`.
//!
//! Used throughout the engine for the high-churn, non-adversarial-input
//! maps built during a single analysis run (file indices, detector state,
//! clustering scratch space).

use std::collections::{HashMap, HashSet};

use rustc_hash::FxBuildHasher;

pub type FxHashMap<K, V> = HashMap<K, V, FxBuildHasher>;
pub type FxHashSet<T> = HashSet<T, FxBuildHasher>;
