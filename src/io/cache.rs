//! LRU cache for decoded grid tiles.

use lru::LruCache;
use serde::Serialize;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::io::grid::Tile;
use crate::types::{Noaa1bError, Noaa1bResult};

/// Tile cache shared by every grid handle of one variable
pub type SharedCache = Arc<Mutex<TileCache>>;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub memory_bytes: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memory-bounded LRU cache keyed by tile index
#[derive(Debug)]
pub struct TileCache {
    cache: LruCache<usize, Arc<Tile>>,
    memory_limit: usize,
    current_memory: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl TileCache {
    /// Create a cache holding at most `memory_limit` bytes of tile data
    pub fn new(memory_limit: usize) -> Self {
        Self {
            cache: LruCache::unbounded(),
            memory_limit,
            current_memory: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn shared(memory_limit: usize) -> SharedCache {
        Arc::new(Mutex::new(Self::new(memory_limit)))
    }

    /// Look up a tile, updating LRU order and hit/miss counts
    pub fn get(&mut self, index: usize) -> Option<Arc<Tile>> {
        match self.cache.get(&index) {
            Some(tile) => {
                self.hits += 1;
                Some(Arc::clone(tile))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.cache.contains(&index)
    }

    /// Insert a tile, evicting least recently used tiles to make room.
    /// A tile larger than the whole budget is not retained.
    pub fn insert(&mut self, index: usize, tile: Arc<Tile>) {
        let size = tile.byte_size();

        if let Some(old) = self.cache.pop(&index) {
            self.current_memory = self.current_memory.saturating_sub(old.byte_size());
        }

        while self.current_memory + size > self.memory_limit && !self.cache.is_empty() {
            if let Some((_, evicted)) = self.cache.pop_lru() {
                self.current_memory = self.current_memory.saturating_sub(evicted.byte_size());
                self.evictions += 1;
            }
        }

        if size <= self.memory_limit {
            self.cache.put(index, tile);
            self.current_memory += size;
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
            memory_bytes: self.current_memory as u64,
            evictions: self.evictions,
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.current_memory = 0;
    }

    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    pub fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

pub(crate) fn lock_cache(cache: &SharedCache) -> Noaa1bResult<MutexGuard<'_, TileCache>> {
    cache.lock().map_err(|_| {
        Noaa1bError::Io(io::Error::new(
            io::ErrorKind::Other,
            "tile cache lock poisoned",
        ))
    })
}
