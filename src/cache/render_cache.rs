use std::num::NonZeroUsize;

use lru::LruCache;

use crate::foundation::core::Bitmap;
use crate::foundation::error::{SlideError, SlideResult};
use crate::keys::RenderKey;

/// Bounded `RenderKey -> Bitmap` store with least-recently-used eviction.
///
/// This is the source of truth for "do we already have this rendering". Entries are only ever
/// removed by capacity pressure.
pub struct RenderCache {
    entries: LruCache<RenderKey, Bitmap>,
    evictions: u64,
}

impl RenderCache {
    pub fn new(capacity: usize) -> SlideResult<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| SlideError::validation("render cache capacity must be >= 1"))?;
        Ok(Self {
            entries: LruCache::new(capacity),
            evictions: 0,
        })
    }

    /// Look up a snapshot, marking it most recently used.
    pub fn get(&mut self, key: &RenderKey) -> Option<Bitmap> {
        self.entries.get(key).cloned()
    }

    /// Look up a snapshot without touching recency.
    pub fn peek(&self, key: &RenderKey) -> Option<&Bitmap> {
        self.entries.peek(key)
    }

    pub fn contains(&self, key: &RenderKey) -> bool {
        self.entries.contains(key)
    }

    /// Insert or refresh a snapshot, evicting the least recently used entry when full.
    pub fn put(&mut self, key: RenderKey, bitmap: Bitmap) {
        if let Some((evicted, _)) = self.entries.push(key, bitmap)
            && !self.entries.contains(&evicted)
        {
            self.evictions = self.evictions.saturating_add(1);
            tracing::trace!(key = %evicted, "render cache evicted snapshot");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Number of entries dropped by capacity pressure so far.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/render_cache.rs"]
mod tests;
