use crate::core::geo::TileCoord;
use lru::LruCache;
use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(512) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// In-memory tile cache using LRU eviction
#[derive(Debug, Clone)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<TileCoord, Arc<Vec<u8>>>>>,
}

impl TileCache {
    /// A capacity of zero falls back to 512 tiles
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Get a tile, marking it as recently used
    pub fn get(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.cache.lock().ok()?.get(coord).cloned()
    }

    pub fn insert(&self, coord: TileCoord, data: Vec<u8>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(coord, Arc::new(data));
        }
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains(coord))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cache
            .lock()
            .map(|cache| cache.cap().get())
            .unwrap_or(0)
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = TileCache::new(2);
        let a = TileCoord::new(0, 0, 1);
        let b = TileCoord::new(1, 0, 1);
        let c = TileCoord::new(0, 1, 1);

        cache.insert(a, vec![1]);
        cache.insert(b, vec![2]);
        assert!(cache.get(&a).is_some());
        cache.insert(c, vec![3]);

        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        assert_eq!(TileCache::new(0).capacity(), 512);

        let cache = TileCache::default();
        cache.insert(TileCoord::new(0, 0, 0), vec![0]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
