//! Bounded, thread-safe LRU container.
//!
//! Ported from `original_source/container/lru/lru.go`'s
//! `map[string]*list.Element` + `container/list` pairing. Rust's
//! `container::list` equivalent would need unsafe aliasing to splice
//! nodes in and out by reference, so this uses a slab (`Vec<Node>`) of
//! fixed slots addressed by index instead: the same doubly linked
//! recency list, just with `usize` links rather than pointers.

use std::collections::HashMap;
use std::sync::RwLock;

/// Invoked exactly once per entry removed because capacity was exceeded.
/// Never invoked for `delete` or for `set` replacing an existing key.
pub type EvictionListener = Box<dyn Fn(&str, &[u8]) + Send + Sync>;

struct Node {
    key: String,
    value: Vec<u8>,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Inner {
    slab: Vec<Node>,
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

impl Inner {
    fn detach(&mut self, i: usize) {
        let (prev, next) = (self.slab[i].prev, self.slab[i].next);
        match prev {
            Some(p) => self.slab[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slab[n].prev = prev,
            None => self.tail = prev,
        }
        self.slab[i].prev = None;
        self.slab[i].next = None;
    }

    fn push_front(&mut self, i: usize) {
        self.slab[i].prev = None;
        self.slab[i].next = self.head;
        if let Some(h) = self.head {
            self.slab[h].prev = Some(i);
        }
        self.head = Some(i);
        if self.tail.is_none() {
            self.tail = Some(i);
        }
    }

    fn touch(&mut self, i: usize) {
        if self.head == Some(i) {
            return;
        }
        self.detach(i);
        self.push_front(i);
    }
}

/// Bounded LRU cache of byte payloads keyed by string.
pub struct Lru {
    inner: RwLock<Inner>,
    on_evict: Option<EvictionListener>,
}

impl Lru {
    /// `capacity` is an entry count, not a byte budget. Must be > 0;
    /// callers validate this at configuration time (see `config.rs`).
    pub fn new(capacity: usize, on_evict: Option<EvictionListener>) -> Self {
        Lru {
            inner: RwLock::new(Inner {
                slab: Vec::new(),
                index: HashMap::new(),
                head: None,
                tail: None,
                capacity,
            }),
            on_evict,
        }
    }

    pub fn set(&self, key: &str, value: Vec<u8>) {
        let mut inner = self.inner.write().unwrap();
        if let Some(&i) = inner.index.get(key) {
            inner.slab[i].value = value;
            inner.touch(i);
            return;
        }
        let i = inner.slab.len();
        inner.slab.push(Node {
            key: key.to_string(),
            value,
            prev: None,
            next: None,
        });
        inner.index.insert(key.to_string(), i);
        inner.push_front(i);

        if inner.index.len() > inner.capacity {
            let victim = inner.tail;
            if let Some(v) = victim {
                inner.detach(v);
                let node = &inner.slab[v];
                let evicted_key = node.key.clone();
                let evicted_value = node.value.clone();
                inner.index.remove(&evicted_key);
                if let Some(cb) = &self.on_evict {
                    cb(&evicted_key, &evicted_value);
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut inner = self.inner.write().unwrap();
        let i = *inner.index.get(key)?;
        inner.touch(i);
        Some(inner.slab[i].value.clone())
    }

    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let inner = self.inner.read().unwrap();
        let &i = inner.index.get(key)?;
        Some(inner.slab[i].value.clone())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.inner.read().unwrap().index.contains_key(key)
    }

    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.write().unwrap();
        if let Some(i) = inner.index.remove(key) {
            inner.detach(i);
        }
    }

    pub fn size(&self) -> usize {
        self.inner.read().unwrap().index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn eviction_fires_once_for_overflow() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let e2 = evicted.clone();
        let lru = Lru::new(2, Some(Box::new(move |k, _| e2.lock().unwrap().push(k.to_string()))));
        lru.set("a", b"1".to_vec());
        lru.set("b", b"2".to_vec());
        lru.set("c", b"3".to_vec());
        assert_eq!(lru.size(), 2);
        assert_eq!(&*evicted.lock().unwrap(), &["a".to_string()]);
        assert!(!lru.exists("a"));
        assert!(lru.exists("b"));
        assert!(lru.exists("c"));
    }

    #[test]
    fn get_promotes_recency() {
        let lru = Lru::new(2, None);
        lru.set("a", b"1".to_vec());
        lru.set("b", b"2".to_vec());
        lru.get("a");
        lru.set("c", b"3".to_vec());
        assert!(lru.exists("a"));
        assert!(!lru.exists("b"));
    }

    #[test]
    fn peek_does_not_promote() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let e2 = evicted.clone();
        let lru = Lru::new(2, Some(Box::new(move |k, _| e2.lock().unwrap().push(k.to_string()))));
        lru.set("a", b"1".to_vec());
        lru.set("b", b"2".to_vec());
        lru.peek("a");
        lru.set("c", b"3".to_vec());
        assert_eq!(&*evicted.lock().unwrap(), &["a".to_string()]);
    }

    #[test]
    fn replace_does_not_grow_or_evict() {
        let evicted = Arc::new(Mutex::new(0usize));
        let e2 = evicted.clone();
        let lru = Lru::new(2, Some(Box::new(move |_, _| *e2.lock().unwrap() += 1)));
        lru.set("a", b"1".to_vec());
        lru.set("a", b"2".to_vec());
        assert_eq!(lru.size(), 1);
        assert_eq!(*evicted.lock().unwrap(), 0);
        assert_eq!(lru.peek("a"), Some(b"2".to_vec()));
    }

    #[test]
    fn delete_does_not_fire_callback_and_is_idempotent() {
        let evicted = Arc::new(Mutex::new(0usize));
        let e2 = evicted.clone();
        let lru = Lru::new(2, Some(Box::new(move |_, _| *e2.lock().unwrap() += 1)));
        lru.set("a", b"1".to_vec());
        lru.delete("a");
        lru.delete("a");
        assert_eq!(*evicted.lock().unwrap(), 0);
        assert_eq!(lru.size(), 0);
    }
}
