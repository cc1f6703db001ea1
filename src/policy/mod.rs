//! Request-handling policies
//!
//! Exactly two strategies exist, one per route:
//!
//! - [`manifest`]: always-fresh fetch of the version manifest, with update
//!   notification and a degraded-mode fallback body
//! - [`resource`]: cache-first serving with background revalidation

pub mod manifest;
pub mod resource;

pub use manifest::ManifestPolicy;
pub use resource::ResourcePolicy;
