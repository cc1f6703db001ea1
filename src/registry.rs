//! The list of resources cached eagerly at install time

use tracing::warn;
use url::Url;

/// Immutable ordered list of URLs designated for eager caching.
///
/// Built once at startup from configuration and read-only afterwards. Entries
/// may be absolute (`https://cdn.example/lib.js`) or origin-relative
/// (`/index.html`); relative entries resolve against the configured origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRegistry {
    urls: Vec<Url>,
}

impl ResourceRegistry {
    /// Resolve `entries` against `origin`. Malformed entries are skipped with
    /// a warning rather than failing startup.
    pub fn resolve(origin: &Url, entries: &[String]) -> Self {
        let urls = entries
            .iter()
            .filter_map(|entry| match origin.join(entry) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("skipping malformed resource entry {entry:?}: {e}");
                    None
                }
            })
            .collect();

        Self { urls }
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
