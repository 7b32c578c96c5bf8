//! # Memory
//!
//! In-process backend selected with `memory://`. Collections are kept in
//! insertion order so first-match lookups behave like the Redis backend.
//!
//! With the `test-util` feature, deletes can be switched to fail so callers can
//! exercise their error paths.
#[cfg(feature = "test-util")]
use std::sync::atomic::{AtomicBool, Ordering};
use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tokio::sync::RwLock;

use crate::{error::StoreError, filter::Filter};

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    #[cfg(feature = "test-util")]
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "test-util")]
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::Relaxed);
    }

    pub async fn insert(&self, key: &str, document: Value) {
        self.collections
            .write()
            .await
            .entry(key.to_string())
            .or_default()
            .push(document);
    }

    pub async fn retrieve(&self, key: &str, filter: &Filter) -> Vec<Value> {
        self.collections
            .read()
            .await
            .get(key)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn update(&self, key: &str, filter: &Filter, field: &str, value: &Value) -> usize {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(key) else {
            return 0;
        };

        let mut updated = 0;
        for document in documents.iter_mut().filter(|d| filter.matches(d)) {
            if let Some(object) = document.as_object_mut() {
                object.insert(field.to_string(), value.clone());
                updated += 1;
            }
        }

        updated
    }

    pub async fn delete(&self, key: &str, filter: &Filter) -> Result<usize, StoreError> {
        #[cfg(feature = "test-util")]
        if self.fail_deletes.load(Ordering::Relaxed) {
            return Err(StoreError::Injected);
        }

        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(key) else {
            return Ok(0);
        };

        let before = documents.len();
        documents.retain(|document| !filter.matches(document));

        Ok(before - documents.len())
    }

    pub async fn count(&self, key: &str) -> usize {
        self.collections
            .read()
            .await
            .get(key)
            .map_or(0, Vec::len)
    }
}
