//! Store installation and stale-store eviction

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tracing::{info, warn};

use crate::error::{InstallError, StoreError};
use crate::fetch::{CacheMode, Fetcher};
use crate::http::{Request, Response};
use crate::registry::ResourceRegistry;
use crate::store::Store;

/// Owns creation and deletion of named stores. Policies only ever read and
/// write entries; stores themselves come and go through here.
pub struct Lifecycle {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<ResourceRegistry>,
    store_name: String,
}

impl Lifecycle {
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: Arc<dyn Fetcher>,
        registry: Arc<ResourceRegistry>,
        store_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            registry,
            store_name: store_name.into(),
        }
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Create the current store and eagerly populate it with every registered
    /// resource.
    ///
    /// All-or-nothing: every resource is fetched before anything is written,
    /// so a single failed or non-success fetch aborts the install with an
    /// empty store. The caller retries the whole step.
    pub async fn install(&self) -> Result<(), InstallError> {
        info!(store = %self.store_name, "installing response store");
        self.store.open(&self.store_name).await?;

        let fetches = self.registry.urls().iter().map(|url| {
            let request = Request::get(url.clone());
            async move {
                let response = self
                    .fetcher
                    .fetch(&request, CacheMode::Default)
                    .await
                    .map_err(|source| InstallError::Fetch {
                        url: request.url.to_string(),
                        source,
                    })?;

                if !response.ok() {
                    return Err(InstallError::Status {
                        url: request.url.to_string(),
                        status: response.status(),
                    });
                }

                Ok((request, response))
            }
        });
        let fetched: Vec<(Request, Response)> = try_join_all(fetches).await?;

        for (request, response) in fetched {
            self.store
                .put(&self.store_name, request.key(), response)
                .await?;
        }

        info!(
            store = %self.store_name,
            resources = self.registry.len(),
            "response store populated"
        );
        Ok(())
    }

    /// Delete every store other than the current one.
    ///
    /// Deletions are independent and best-effort: one failure is logged and
    /// never blocks the others. Only a failure to enumerate store names fails
    /// activation itself.
    pub async fn activate(&self) -> Result<(), StoreError> {
        let names = self.store.list().await?;

        let deletions = names
            .into_iter()
            .filter(|name| name != &self.store_name)
            .map(|name| async move {
                match self.store.delete(&name).await {
                    Ok(_) => info!(store = %name, "deleted stale store"),
                    Err(e) => warn!(store = %name, "failed to delete stale store: {e}"),
                }
            });
        join_all(deletions).await;

        Ok(())
    }
}
