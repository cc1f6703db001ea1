//! Network fetch abstraction and the reqwest-backed implementation

#[cfg(test)]
use mockall::automock;

use crate::error::FetchError;
use crate::http::{Method, Request, Response};

/// How intermediary caches may treat a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Default,
    /// Every call must reach the origin: ask intermediaries neither to serve
    /// nor to store a copy.
    NoStore,
}

/// Trait for issuing network fetches
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform one network round trip and capture the full response.
    ///
    /// # Returns
    /// * `Ok(Response)` - Any response the origin produced, success or not
    /// * `Err(FetchError)` - The round trip itself failed
    async fn fetch(&self, request: &Request, mode: CacheMode) -> Result<Response, FetchError>;
}

/// Fetcher implementation over a shared reqwest client
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("shellcache")
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request, mode: CacheMode) -> Result<Response, FetchError> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), request.url.clone());

        if mode == CacheMode::NoStore {
            builder = builder
                .header(reqwest::header::CACHE_CONTROL, "no-store")
                .header(reqwest::header::PRAGMA, "no-cache");
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(Response::new(status, body).with_headers(headers))
    }
}
