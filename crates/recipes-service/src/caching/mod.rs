//! # Image caching
//!
//! Repeated views of the same recipe image must not re-download it, so all
//! decoded images live in a single shared [`ImageCache`] keyed by their
//! normalized URL. The cache is a plain concurrent map: one successfully
//! decoded image per [`CacheKey`], no expiry and no size bound. Both are
//! deliberate: the set of recipe images is small and session-scoped, and
//! the cache is dropped with the session. Eviction is a known limitation,
//! not an oversight.
//!
//! ## [`CacheKey`]
//!
//! A [`CacheKey`] is the normalized string form of an absolute image URL.
//! Two locators that normalize to the same string are the same resource.
//! Keys are immutable and cheap to clone, and constructing one is the only
//! place where locator validation happens — a locator that does not parse
//! never reaches the network.
//!
//! ## [`LoadError`]
//!
//! Failures while loading an image are carried as values, never thrown
//! away: every failed load attempt ends in a
//! [`LoadState::Failed`](crate::images::LoadState) holding a [`LoadError`].
//! The variants keep their detail as plain strings so states stay `Clone`.
//! The cache itself has no error conditions; a missing entry is a valid
//! lookup result.
//!
//! ## Concurrency
//!
//! [`ImageCache`] is safe for concurrent multi-reader/multi-writer use.
//! Mutations are serialized by the backing concurrent map, and a completed
//! write is visible to every subsequent read. What the cache does *not* do
//! is coalesce concurrent loads of the same key: two loaders racing on a
//! cache miss may both download the image, and the second write simply
//! replaces the first. The natural extension point for single-flight
//! behavior is moka's `entry` API, which dedupes concurrent computations of
//! the same key; so far the redundant download has not been worth the
//! coupling.

mod cache_key;
mod error;
mod memory;

pub use cache_key::CacheKey;
pub use error::{LoadError, LoadResult};
pub use memory::ImageCache;
