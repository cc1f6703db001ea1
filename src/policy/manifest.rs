//! Always-fresh manifest policy

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::fetch::{CacheMode, Fetcher};
use crate::http::{Request, Response};
use crate::manifest::Manifest;
use crate::notify::{Notice, Notifier};
use crate::version;

/// Serves the version manifest, always from the origin, and raises an update
/// notice when the published version is newer than the one running.
///
/// This policy never touches the store and never fails: a network error
/// degrades to a synthesized "no update known" manifest body.
pub struct ManifestPolicy {
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    current_version: String,
}

impl ManifestPolicy {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            current_version: current_version.into(),
        }
    }

    pub async fn handle(&self, request: &Request) -> Response {
        let response = match self.fetcher.fetch(request, CacheMode::NoStore).await {
            Ok(response) => response,
            Err(e) => {
                warn!("manifest fetch for {} failed: {e}", request.url);
                return Manifest::fallback(&self.current_version).to_response();
            }
        };

        if response.ok() {
            match response.json::<Manifest>() {
                Ok(manifest) => self.check_for_update(manifest),
                // Unparseable bodies skip the version check; the response
                // still goes back to the caller untouched
                Err(e) => debug!("manifest body from {} not parseable: {e}", request.url),
            }
        }

        response
    }

    fn check_for_update(&self, manifest: Manifest) {
        let newer = version::compare(&manifest.latest_version, &self.current_version)
            == Ordering::Greater;
        if !newer {
            debug!(
                "no update: published {} vs running {}",
                manifest.latest_version, self.current_version
            );
            return;
        }

        debug!(
            "update available: {} -> {}",
            self.current_version, manifest.latest_version
        );
        self.notifier.notify(Notice::UpdateAvailable {
            update_data: manifest,
        });
    }
}
