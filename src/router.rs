//! Request classification

use std::sync::Arc;

use url::{Origin, Url};

use crate::http::{Method, Request};
use crate::registry::ResourceRegistry;

/// Where an inbound request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The version manifest endpoint; always served fresh.
    Manifest,
    /// A same-origin or registered resource; cache-first.
    Resource,
    /// Not ours; the request passes through untouched.
    Bypass,
}

/// Classifies inbound requests. Pure: no side effects, no I/O.
pub struct Router {
    manifest_url: Url,
    origin: Origin,
    registry: Arc<ResourceRegistry>,
}

impl Router {
    pub fn new(manifest_url: Url, origin: &Url, registry: Arc<ResourceRegistry>) -> Self {
        Self {
            manifest_url,
            origin: origin.origin(),
            registry,
        }
    }

    /// Decide how to handle a request.
    ///
    /// The manifest match is checked first and wins over the origin rule, so
    /// a manifest endpoint hosted on the app origin is still served fresh.
    /// Only GET requests are interceptable.
    pub fn classify(&self, request: &Request) -> Route {
        if request.method != Method::Get {
            return Route::Bypass;
        }

        if request.url == self.manifest_url {
            return Route::Manifest;
        }

        if request.url.origin() == self.origin || self.registry.contains(&request.url) {
            return Route::Resource;
        }

        Route::Bypass
    }
}
