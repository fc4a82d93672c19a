use thiserror::Error;

/// An error that happens while loading an image.
///
/// Loads fail in exactly three ways, and all of them are terminal for the
/// attempt that produced them: the caller retries by starting a new load.
/// Errors are surfaced as data through
/// [`LoadState::Failed`](crate::images::LoadState), which is why the detail
/// is kept as plain strings rather than error sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The locator could not be parsed into an absolute image URL.
    ///
    /// This is detected locally; no network I/O is attempted.
    #[error("invalid image url: {0}")]
    InvalidUrl(String),
    /// The image could not be fetched from the remote source.
    ///
    /// Covers transport failures as well as non-success status codes.
    #[error("download failed: {0}")]
    Download(String),
    /// The payload was fetched successfully, but does not decode to an image.
    #[error("malformed image: {0}")]
    Malformed(String),
}

/// Shorthand for results produced while loading an image.
pub type LoadResult<T> = Result<T, LoadError>;
