use thiserror::Error;

/// A failed network round trip.
///
/// Carries a message rather than the client's error type so that fetch
/// implementations other than the built-in HTTP one can produce it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("network error: {0}")]
pub struct FetchError(String);

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("malformed header record: {0}")]
    Headers(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure during eager store population. Any one of these aborts the whole
/// install step; the caller retries in full.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("unexpected status {status} while caching {url}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
