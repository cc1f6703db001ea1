//! Named response stores
//!
//! A store maps request identity (method + URL) to a captured response. Each
//! store has a name; the worker keeps exactly one version-tagged store current
//! and evicts the rest on activation.
//!
//! # Modules
//!
//! - [`memory`]: in-memory store for tests and hosts without persistence
//! - [`sqlite`]: SQLite-backed store that survives process restarts

#[cfg(test)]
use mockall::automock;

use crate::error::StoreError;
use crate::http::{RequestKey, Response};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Capability handle over named response stores.
///
/// Policies receive this as an injected dependency; only the lifecycle layer
/// creates and deletes stores. Implementations must tolerate concurrent reads
/// and writes; concurrent writes to the same key are last-writer-wins.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Ensure the named store exists.
    async fn open(&self, name: &str) -> Result<(), StoreError>;

    /// Look up a captured response.
    async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, StoreError>;

    /// Insert or overwrite a captured response.
    async fn put(
        &self,
        name: &str,
        key: RequestKey,
        response: Response,
    ) -> Result<(), StoreError>;

    /// Delete a named store and everything in it.
    ///
    /// Returns `Ok(false)` if no store by that name existed.
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;

    /// Names of all existing stores.
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}
