//! Decoded images and the loader state machine that produces them.
//!
//! An [`ImageLoader`] drives a single image through
//! `Idle → Loading → {Loaded | Failed}`, consulting the shared
//! [`ImageCache`] before ever touching the network and writing back into it
//! on success. The display surface observes transitions through a watch
//! channel ([`ImageLoader::subscribe`]), which by construction keeps exactly
//! one state current per loader.

use std::fmt;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use tokio::sync::watch;

use crate::caching::{CacheKey, ImageCache, LoadError, LoadResult};
use crate::download::Downloader;

/// A successfully decoded in-memory image.
///
/// Once stored in the cache this is only ever handed out behind an [`Arc`];
/// the pixel data is never mutated in place.
pub struct CachedImage {
    image: DynamicImage,
    format: ImageFormat,
    byte_size: usize,
}

impl CachedImage {
    /// The decoded pixel data.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// The container format the payload was decoded from.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// The size of the encoded payload in bytes.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[cfg(test)]
    pub(crate) fn for_testing(width: u32, height: u32) -> Self {
        Self {
            image: DynamicImage::new_rgba8(width, height),
            format: ImageFormat::Png,
            byte_size: 0,
        }
    }
}

impl fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedImage")
            .field("format", &self.format)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("byte_size", &self.byte_size)
            .finish()
    }
}

/// Decodes a fetched payload into a [`CachedImage`].
///
/// Synchronous and pure; any payload that is not a supported image format
/// is a [`LoadError::Malformed`].
pub fn decode(bytes: &[u8]) -> LoadResult<CachedImage> {
    let format =
        image::guess_format(bytes).map_err(|err| LoadError::Malformed(err.to_string()))?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| LoadError::Malformed(err.to_string()))?;

    Ok(CachedImage {
        image,
        format,
        byte_size: bytes.len(),
    })
}

/// The lifecycle of one image load, as rendered by a display surface.
///
/// Exactly one state is current at any instant for a given loader, and per
/// loader the transitions are strictly ordered. The terminal states are not
/// final: a new [`ImageLoader::load`] call re-enters `Loading` (or jumps
/// straight to `Loaded` on a cache hit).
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    /// No load has been started yet.
    #[default]
    Idle,
    /// A download for the given key is in flight.
    Loading(CacheKey),
    /// The image is available.
    Loaded(Arc<CachedImage>),
    /// The load attempt failed; a new `load` call retries.
    Failed(LoadError),
}

impl LoadState {
    /// The loaded image, if this state carries one.
    pub fn image(&self) -> Option<&Arc<CachedImage>> {
        match self {
            Self::Loaded(image) => Some(image),
            _ => None,
        }
    }
}

/// Loads a single image, cache first.
///
/// The locator is fixed at construction, mirroring one loader per displayed
/// image. Loaders share the [`ImageCache`] (and the [`Downloader`]) by
/// handle; nothing else is shared between them.
#[derive(Debug)]
pub struct ImageLoader {
    locator: String,
    cache: ImageCache,
    downloader: Arc<Downloader>,
    state: watch::Sender<LoadState>,
}

impl ImageLoader {
    /// Creates an idle loader for `locator`.
    ///
    /// The locator is validated by [`load`](Self::load), not here, so that
    /// the failure surfaces through [`LoadState`] like every other one.
    pub fn new(locator: impl Into<String>, cache: ImageCache, downloader: Arc<Downloader>) -> Self {
        Self {
            locator: locator.into(),
            cache,
            downloader,
            state: watch::Sender::new(LoadState::Idle),
        }
    }

    /// The locator this loader was created for.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// The current state.
    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Subscribes to state transitions.
    ///
    /// The receiver immediately observes the current state and every
    /// transition from then on, in order.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// Drives one load attempt and returns the state it ended in.
    ///
    /// A cache hit transitions straight to [`LoadState::Loaded`] without any
    /// network access. On a miss the loader transitions to
    /// [`LoadState::Loading`], downloads and decodes the payload, and stores
    /// the result into the shared cache before confirming `Loaded`. All
    /// failures end the attempt in [`LoadState::Failed`] and leave the cache
    /// untouched.
    pub async fn load(&self) -> LoadState {
        let key = match CacheKey::parse(&self.locator) {
            Ok(key) => key,
            Err(err) => {
                tracing::debug!(locator = %self.locator, error = %err, "refusing to load image");
                return self.transition(LoadState::Failed(err));
            }
        };

        if let Some(image) = self.cache.get(&key) {
            tracing::debug!(key = %key, "image cache hit");
            return self.transition(LoadState::Loaded(image));
        }

        self.transition(LoadState::Loading(key.clone()));

        let bytes = match self.downloader.download(&key).await {
            Ok(bytes) => bytes,
            Err(err) => return self.transition(LoadState::Failed(err)),
        };

        match decode(&bytes) {
            Ok(image) => self.store(Arc::new(image), key),
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "fetched payload did not decode");
                self.transition(LoadState::Failed(err))
            }
        }
    }

    /// Stores `image` into the shared cache and confirms [`LoadState::Loaded`].
    ///
    /// Idempotent: storing the same image for the same key again is a
    /// redundant write and a repeated `Loaded` state.
    pub fn store(&self, image: Arc<CachedImage>, key: CacheKey) -> LoadState {
        self.cache.set(key, Some(image.clone()));
        self.transition(LoadState::Loaded(image))
    }

    fn transition(&self, next: LoadState) -> LoadState {
        self.state.send_replace(next.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Config;

    fn loader(locator: &str, cache: ImageCache) -> ImageLoader {
        let downloader = Arc::new(Downloader::new(&Config::default()));
        ImageLoader::new(locator, cache, downloader)
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(b"certainly not an image");
        assert!(matches!(result, Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let png = recipes_test::png_fixture();
        let result = decode(&png[..png.len() / 2]);
        assert!(matches!(result, Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_decode_png() {
        let image = decode(&recipes_test::png_fixture()).unwrap();
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!((image.width(), image.height()), (4, 4));
        assert!(image.byte_size() > 0);
    }

    #[tokio::test]
    async fn test_fresh_loader_is_idle() {
        let loader = loader("https://example.com/a.jpg", ImageCache::new());
        assert!(matches!(loader.state(), LoadState::Idle));
    }

    #[tokio::test]
    async fn test_store_is_idempotent() {
        let cache = ImageCache::new();
        let loader = loader("https://example.com/a.jpg", cache.clone());

        let key = CacheKey::parse("https://example.com/a.jpg").unwrap();
        let image = Arc::new(CachedImage::for_testing(4, 4));

        for _ in 0..2 {
            let state = loader.store(image.clone(), key.clone());
            assert!(matches!(state, LoadState::Loaded(stored) if Arc::ptr_eq(&stored, &image)));
        }

        let stored = cache.get(&key).unwrap();
        assert!(Arc::ptr_eq(&stored, &image));
    }
}
