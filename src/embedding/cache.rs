// file: src/embedding/cache.rs
// description: bounded least-recently-used cache of loaded embedding models

use std::collections::VecDeque;
use tracing::debug;

pub const DEFAULT_MODEL_CACHE_CAPACITY: usize = 2;

/// Name-keyed model handles, most recently used at the back.
#[derive(Debug)]
pub struct ModelCache<M> {
    capacity: usize,
    entries: VecDeque<(String, M)>,
}

impl<M: Clone> ModelCache<M> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Names from least to most recently used.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub fn get(&mut self, name: &str) -> Option<M> {
        let position = self.entries.iter().position(|(key, _)| key == name)?;
        let entry = self.entries.remove(position)?;
        let handle = entry.1.clone();
        self.entries.push_back(entry);
        Some(handle)
    }

    /// Insert or refresh a handle, returning the evicted entry if capacity was exceeded.
    pub fn insert(&mut self, name: &str, handle: M) -> Option<(String, M)> {
        if let Some(position) = self.entries.iter().position(|(key, _)| key == name) {
            self.entries.remove(position);
        }
        self.entries.push_back((name.to_string(), handle));

        if self.entries.len() > self.capacity {
            let evicted = self.entries.pop_front();
            if let Some((key, _)) = &evicted {
                debug!("Evicted embedding model '{}' from cache", key);
            }
            return evicted;
        }
        None
    }

    /// Return the cached handle or load, cache and return a new one. Failed loads are not cached.
    pub fn get_or_try_load<E, F>(&mut self, name: &str, load: F) -> Result<M, E>
    where
        F: FnOnce() -> Result<M, E>,
    {
        if let Some(handle) = self.get(name) {
            return Ok(handle);
        }

        let handle = load()?;
        self.insert(name, handle.clone());
        Ok(handle)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<M: Clone> Default for ModelCache<M> {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_CACHE_CAPACITY)
    }
}
