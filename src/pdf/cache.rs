//! LRU page cache for rendered PDF pages

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::types::PageData;

/// Cache key for rendered pages
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Page number (1-indexed)
    pub page: usize,
    /// Zoom factor (stored as millionths for stable hashing)
    pub zoom_millionths: u32,
}

impl CacheKey {
    #[must_use]
    pub fn new(page: usize, zoom: f32) -> Self {
        Self {
            page,
            zoom_millionths: (zoom * 1_000_000.0) as u32,
        }
    }
}

/// LRU cache for rendered page data
pub struct PageCache {
    cache: LruCache<CacheKey, Arc<PageData>>,
}

impl PageCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<PageData>> {
        self.cache.get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains(key)
    }

    /// Insert a page into the cache, returning an Arc to the data
    pub fn insert(&mut self, key: CacheKey, data: PageData) -> Arc<PageData> {
        let arc = Arc::new(data);
        self.cache.put(key, arc.clone());
        arc
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::PageRaster;
    use super::*;

    fn test_page_data(page: usize, zoom: f32) -> PageData {
        PageData {
            page_num: page,
            zoom,
            raster: PageRaster {
                png: vec![0; 16],
                width_px: 10,
                height_px: 10,
            },
            spans: vec![],
        }
    }

    #[test]
    fn cache_insert_and_get() {
        let mut cache = PageCache::new(10);
        let key = CacheKey::new(1, 1.5);
        cache.insert(key.clone(), test_page_data(1, 1.5));

        assert!(cache.contains(&key));
        assert!(cache.get(&key).is_some());
        assert!(!cache.contains(&CacheKey::new(1, 1.75)));
    }

    #[test]
    fn cache_lru_eviction() {
        let mut cache = PageCache::new(2);
        for page in 1..=3 {
            cache.insert(CacheKey::new(page, 1.0), test_page_data(page, 1.0));
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&CacheKey::new(1, 1.0)));
        assert!(cache.contains(&CacheKey::new(3, 1.0)));
    }

    #[test]
    fn cache_invalidate_all() {
        let mut cache = PageCache::new(4);
        cache.insert(CacheKey::new(1, 1.0), test_page_data(1, 1.0));
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
