//! Worker facade wiring the router, policies, and store lifecycle together

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::{self, WorkerConfig};
use crate::error::{FetchError, InstallError, StoreError};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::http::{Request, Response};
use crate::lifecycle::Lifecycle;
use crate::notify::{Broadcaster, Notice};
use crate::policy::{ManifestPolicy, ResourcePolicy};
use crate::registry::ResourceRegistry;
use crate::router::{Route, Router};
use crate::store::{SqliteStore, Store};

/// Outcome of routing one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The worker produced this response.
    Response(Response),
    /// Not ours; forward the request to the network untouched.
    Bypass,
}

/// The embedding runtime's single entry point.
///
/// Hand inbound request events to [`Worker::handle_fetch`], call
/// [`Worker::install`] once when the worker is first set up and
/// [`Worker::activate`] when it takes over, and watch
/// [`Worker::subscribe`] for update notices.
pub struct Worker {
    router: Router,
    manifest: ManifestPolicy,
    resources: ResourcePolicy,
    lifecycle: Lifecycle,
    broadcaster: Arc<Broadcaster>,
}

impl Worker {
    /// Open a worker backed by the SQLite store at the configured (or
    /// default) path and a live HTTP fetcher.
    pub fn new(config: WorkerConfig) -> Result<Self, StoreError> {
        let db_path = config
            .db_path
            .clone()
            .unwrap_or_else(config::default_db_path);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Ok(Self::build(config, store, Arc::new(HttpFetcher::new())))
    }

    /// Assemble a worker from injected store and fetcher capabilities.
    pub fn build(config: WorkerConfig, store: Arc<dyn Store>, fetcher: Arc<dyn Fetcher>) -> Self {
        let registry = Arc::new(ResourceRegistry::resolve(&config.origin, &config.resources));
        let broadcaster = Arc::new(Broadcaster::new());
        let store_name = config.store_name();

        let router = Router::new(config.manifest_url.clone(), &config.origin, registry.clone());
        let manifest = ManifestPolicy::new(
            fetcher.clone(),
            broadcaster.clone(),
            &config.current_version,
        );
        let resources = ResourcePolicy::new(store.clone(), fetcher.clone(), store_name.clone());
        let lifecycle = Lifecycle::new(store, fetcher, registry, store_name);

        Self {
            router,
            manifest,
            resources,
            lifecycle,
            broadcaster,
        }
    }

    /// Register an observer for update notices.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notice> {
        self.broadcaster.subscribe()
    }

    /// Create and eagerly populate the current store. All-or-nothing.
    pub async fn install(&self) -> Result<(), InstallError> {
        self.lifecycle.install().await
    }

    /// Evict stores left behind by earlier versions. Best-effort.
    pub async fn activate(&self) -> Result<(), StoreError> {
        self.lifecycle.activate().await
    }

    /// Route one inbound request to the policy that owns it, or decline.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, FetchError> {
        match self.router.classify(request) {
            Route::Manifest => Ok(FetchOutcome::Response(self.manifest.handle(request).await)),
            Route::Resource => {
                let response = self.resources.handle(request).await?;
                Ok(FetchOutcome::Response(response))
            }
            Route::Bypass => Ok(FetchOutcome::Bypass),
        }
    }
}
