use std::fmt;
use std::sync::Arc;

use url::Url;

use super::LoadError;

/// The normalized locator of a cached image.
///
/// Equality and hashing are by the normalized string form, so two locators
/// that differ only in what URL normalization removes (scheme/host case,
/// default ports, missing path slash) address the same cache slot. A key is
/// immutable once constructed and cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    url: Arc<str>,
}

impl CacheKey {
    /// Parses and normalizes a raw locator into a [`CacheKey`].
    ///
    /// Only absolute `http`/`https` URLs make valid keys; anything else is
    /// rejected with [`LoadError::InvalidUrl`] before any I/O happens.
    pub fn parse(locator: &str) -> Result<Self, LoadError> {
        let url = Url::parse(locator.trim())
            .map_err(|err| LoadError::InvalidUrl(format!("`{locator}`: {err}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(LoadError::InvalidUrl(format!(
                "`{locator}`: unsupported scheme `{}`",
                url.scheme()
            )));
        }

        Ok(Self {
            url: url.as_str().into(),
        })
    }

    /// The normalized string form of this key.
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let key = CacheKey::parse("HTTPS://Example.COM:443/photos/Small.jpg").unwrap();
        assert_eq!(key.as_str(), "https://example.com/photos/Small.jpg");
    }

    #[test]
    fn test_normalized_keys_are_equal() {
        let plain = CacheKey::parse("https://example.com").unwrap();
        let slash = CacheKey::parse("https://example.com/").unwrap();
        assert_eq!(plain, slash);
        assert_eq!(plain.as_str(), "https://example.com/");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let key = CacheKey::parse("  https://example.com/a.jpg\n").unwrap();
        assert_eq!(key.as_str(), "https://example.com/a.jpg");
    }

    #[test]
    fn test_invalid_locators() {
        for locator in ["", "not a url", "/photos/small.jpg", "example.com/a.jpg"] {
            assert!(
                matches!(CacheKey::parse(locator), Err(LoadError::InvalidUrl(_))),
                "`{locator}` should not parse"
            );
        }
    }

    #[test]
    fn test_unsupported_schemes() {
        for locator in ["ftp://example.com/a.jpg", "file:///tmp/a.jpg", "data:,AAAA"] {
            assert!(
                matches!(CacheKey::parse(locator), Err(LoadError::InvalidUrl(_))),
                "`{locator}` should be rejected"
            );
        }
    }
}
