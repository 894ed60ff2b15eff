//! Tile cache abstraction.
//!
//! Grounded on `original_source/cache/cache.go`'s `Cacher` interface and
//! `original_source/cache/inmem.go`'s LRU-backed implementation: a small
//! `set`/`get`/`exists`/`delete` contract with interchangeable backends
//! selected by configuration (`cache.type`).

mod lru;

pub use lru::Lru;

use log::debug;
use std::sync::Arc;

/// Cache key for a tile: `name_x_y_z`, matching the service contract.
pub fn tile_key(name: &str, x: u32, y: u32, z: u32) -> String {
    format!("{name}_{x}_{y}_{z}")
}

pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: Vec<u8>);
}

/// Always-miss cache; used when `cache.type = "noop"` (the default).
pub struct Noop;

impl Cache for Noop {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }
    fn set(&self, _key: &str, _value: Vec<u8>) {}
}

/// In-memory LRU-backed cache; used when `cache.type = "memory"`.
pub struct Memory {
    lru: Arc<lru::Lru>,
}

impl Memory {
    pub fn new(capacity: usize) -> Self {
        let on_evict: lru::EvictionListener = Box::new(|key, value| {
            debug!("cache evict key={key} bytes={}", value.len());
        });
        Memory {
            lru: Arc::new(lru::Lru::new(capacity, Some(on_evict))),
        }
    }
}

impl Cache for Memory {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lru.get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        debug!("cache insert key={key} bytes={}", value.len());
        self.lru.set(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_never_hits() {
        let c = Noop;
        c.set("k", vec![1, 2, 3]);
        assert!(c.get("k").is_none());
    }

    #[test]
    fn memory_round_trips() {
        let c = Memory::new(4);
        c.set("k", vec![1, 2, 3]);
        assert_eq!(c.get("k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn tile_key_format() {
        assert_eq!(tile_key("places", 1, 2, 3), "places_1_2_3");
    }
}
