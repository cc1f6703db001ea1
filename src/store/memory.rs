//! In-memory store for tests and hosts without a persistence layer

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::http::{RequestKey, Response};
use crate::store::Store;

type StoreMap = HashMap<String, HashMap<RequestKey, Response>>;

#[derive(Default)]
pub struct MemoryStore {
    stores: Mutex<StoreMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreMap>, StoreError> {
        self.stores.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn open(&self, name: &str) -> Result<(), StoreError> {
        self.lock()?.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, StoreError> {
        Ok(self
            .lock()?
            .get(name)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(
        &self,
        name: &str,
        key: RequestKey,
        response: Response,
    ) -> Result<(), StoreError> {
        self.lock()?
            .entry(name.to_string())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
