use std::fmt;
use std::sync::Arc;

use super::CacheKey;
use crate::images::CachedImage;

type ImageStore = moka::sync::Cache<CacheKey, Arc<CachedImage>>;

/// Concurrency-safe in-memory storage for decoded images.
///
/// At most one image is stored per [`CacheKey`]. Values are replaced
/// wholesale and handed out as shared [`Arc`] handles, so readers never race
/// a writer on the contents of a slot. The map is unbounded and lives for
/// the whole session; [`reset`](Self::reset) is the only way entries leave
/// it.
///
/// Cloning an `ImageCache` clones a handle to the same underlying map,
/// which is how loaders share it.
#[derive(Clone)]
pub struct ImageCache {
    images: ImageStore,
}

impl ImageCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        let images = ImageStore::builder().name("images").build();
        Self { images }
    }

    /// Returns the image stored for `key`, if any.
    ///
    /// This is a purely local lookup; absence is a valid result, not an
    /// error.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CachedImage>> {
        self.images.get(key)
    }

    /// Stores or replaces the image for `key`; `None` removes the entry.
    ///
    /// A completed write is visible to all subsequent [`get`](Self::get)
    /// calls, from any thread.
    pub fn set(&self, key: CacheKey, image: Option<Arc<CachedImage>>) {
        match image {
            Some(image) => self.images.insert(key, image),
            None => self.images.invalidate(&key),
        }
    }

    /// Removes all entries.
    pub fn reset(&self) {
        self.images.invalidate_all();
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.images.entry_count())
            .finish()
    }
}
