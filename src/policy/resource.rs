//! Cache-first resource policy with background revalidation

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fetch::{CacheMode, Fetcher};
use crate::http::{Request, Response};
use crate::store::Store;

/// Serves general assets from the current store when possible and refreshes
/// the stored copy from the network.
///
/// A store hit is returned immediately; the network leg then runs as a
/// detached task purely to repopulate the store for next time. On a miss the
/// caller waits for the network, and a network failure with nothing stored
/// propagates as-is — no synthetic fallback for generic resources.
pub struct ResourcePolicy {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn Fetcher>,
    store_name: String,
}

impl ResourcePolicy {
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: Arc<dyn Fetcher>,
        store_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            store_name: store_name.into(),
        }
    }

    pub async fn handle(&self, request: &Request) -> Result<Response, FetchError> {
        let cached = match self.store.get(&self.store_name, &request.key()).await {
            Ok(cached) => cached,
            // A degraded store read is no worse than having no cache
            Err(e) => {
                warn!("store lookup for {} failed: {e}", request.url);
                None
            }
        };

        let refresh = Self::refresh(
            self.store.clone(),
            self.fetcher.clone(),
            self.store_name.clone(),
            request.clone(),
            cached.clone(),
        );

        match cached {
            Some(hit) => {
                debug!("serving {} from store {}", request.url, self.store_name);
                tokio::spawn(refresh);
                Ok(hit)
            }
            None => refresh.await,
        }
    }

    /// Network leg: fetch, repopulate the store on success, fall back to the
    /// stored response on failure.
    async fn refresh(
        store: Arc<dyn Store>,
        fetcher: Arc<dyn Fetcher>,
        store_name: String,
        request: Request,
        cached: Option<Response>,
    ) -> Result<Response, FetchError> {
        match fetcher.fetch(&request, CacheMode::Default).await {
            Ok(response) => {
                if response.ok() {
                    if let Err(e) = store
                        .put(&store_name, request.key(), response.clone())
                        .await
                    {
                        warn!("failed to refresh store entry for {}: {e}", request.url);
                    }
                }
                Ok(response)
            }
            Err(e) => match cached {
                Some(hit) => Ok(hit),
                None => Err(e),
            },
        }
    }
}
