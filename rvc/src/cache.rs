use std::{collections::HashMap, hash::Hash};

pub const DEFAULT_CAPACITY: usize = 8;

/// Map from parameter key to a precomputed kernel.
///
/// Holds at most `capacity` entries. Inserting a new key into a full cache clears
/// every entry first.
pub struct BoundedCache<K, V> {
    entries: HashMap<K, V>,
    capacity: usize,
}

impl<K: Eq + Hash + Copy, V> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        BoundedCache {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, build: F) -> Result<&mut V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let value = match self.entries.remove(&key) {
            Some(value) => value,
            None => {
                let value = build()?;
                if self.entries.len() >= self.capacity {
                    tracing::debug!(evicted = self.entries.len(), "kernel cache full, clearing");
                    self.entries.clear();
                }
                value
            }
        };
        Ok(self.entries.entry(key).or_insert(value))
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, build: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_insert_with::<std::convert::Infallible, _>(key, || Ok(build())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash + Copy, V> Default for BoundedCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
