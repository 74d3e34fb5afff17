use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use url::Url;

use crate::foundation::core::Bitmap;
use crate::foundation::error::{SlideError, SlideResult};

/// Thread-safe in-memory image cache keyed by resource URL.
///
/// Read synchronously on the interactive thread and written from resolution tasks.
pub struct MemoryImageCache {
    inner: Mutex<LruCache<Url, Bitmap>>,
}

impl MemoryImageCache {
    pub fn new(capacity: usize) -> SlideResult<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| SlideError::validation("memory image cache capacity must be >= 1"))?;
        Ok(Self {
            inner: Mutex::new(LruCache::new(capacity)),
        })
    }

    pub fn get(&self, url: &Url) -> Option<Bitmap> {
        self.inner.lock().get(url).cloned()
    }

    pub fn put(&self, url: &Url, image: Bitmap) {
        self.inner.lock().put(url.clone(), image);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
