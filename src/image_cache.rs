//! Image cache for fast navigation.
//!
//! Caches decoded RGB8 image data using an LRU policy, keyed by path and
//! view transform. This allows instant display of recently viewed images
//! and of the preloaded next image.

use crate::image_loader::Transform;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Cached RGB8 pixel data.
#[derive(Clone, Debug)]
pub struct CachedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CachedImage {
    /// Creates a CachedImage from raw image data.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub transform: Transform,
}

impl CacheKey {
    /// Key of the untransformed decode.
    pub fn original(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            transform: Transform::default(),
        }
    }

    pub fn transformed(path: impl Into<PathBuf>, transform: Transform) -> Self {
        Self {
            path: path.into(),
            transform,
        }
    }
}

/// LRU cache for storing decoded images.
pub struct ImageCache {
    cache: LruCache<CacheKey, CachedImage>,
}

impl ImageCache {
    /// Creates a new image cache with the specified capacity (at least one entry).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Changes the capacity, dropping least recently used entries if it shrinks.
    pub fn resize(&mut self, capacity: usize) {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        log::debug!("Cache RESIZE: {} -> {}", self.capacity(), capacity);
        self.cache.resize(capacity);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Retrieves an image from the cache if it exists, marking it recently used.
    pub fn get(&mut self, key: &CacheKey) -> Option<CachedImage> {
        let result = self.cache.get(key).cloned();
        if result.is_some() {
            log::debug!("Cache HIT: {}", key.path.display());
        } else {
            log::debug!("Cache MISS: {}", key.path.display());
        }
        result
    }

    /// Returns the cached image, or runs `loader` and stores its result.
    pub fn get_or_load<E, F>(&mut self, key: &CacheKey, loader: F) -> Result<CachedImage, E>
    where
        F: FnOnce() -> Result<CachedImage, E>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let loaded = loader()?;
        self.put(key.clone(), loaded.clone());
        Ok(loaded)
    }

    /// Drops the least recently used entry if the cache is full.
    pub fn evict_if_needed(&mut self) -> Option<CacheKey> {
        if self.cache.len() < self.capacity() {
            return None;
        }
        let (evicted, _) = self.cache.pop_lru()?;
        log::debug!("Cache EVICT: {}", evicted.path.display());
        Some(evicted)
    }

    /// Stores an image in the cache.
    ///
    /// A new key evicts exactly one entry first when the cache is full;
    /// an existing key is replaced in place.
    pub fn put(&mut self, key: CacheKey, cached_image: CachedImage) {
        if !self.cache.contains(&key) {
            self.evict_if_needed();
        }
        log::debug!(
            "Cache PUT: {} ({}x{})",
            key.path.display(),
            cached_image.width,
            cached_image.height
        );
        self.cache.put(key, cached_image);
    }

    /// Checks if an image is in the cache without touching its recency.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains(key)
    }

    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.cache.pop(key).is_some()
    }

    /// Removes every transform variant of `path`. Returns how many were dropped.
    pub fn invalidate_path(&mut self, path: &Path) -> usize {
        let stale: Vec<CacheKey> = self
            .cache
            .iter()
            .filter(|(key, _)| key.path == path)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.cache.pop(key);
        }
        stale.len()
    }

    pub fn clear(&mut self) {
        if !self.is_empty() {
            log::debug!("Cache CLEAR: {} entries", self.len());
        }
        self.cache.clear();
    }
}
