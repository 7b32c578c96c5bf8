//! # Store
//!
//! Document store client. Documents are JSON objects grouped into named
//! collections and addressed with [`Filter`]s.
//!
//! ## Backends
//!
//! | URL scheme | Backend |
//! |---|---|
//! | `redis://`, `rediss://`, `redis+unix://`, `unix://` | [`RemoteStore`] |
//! | `memory://` | [`MemoryStore`] |
//!
//! Every collection name is prefixed with the store namespace, so several apps
//! can share one Redis database.
use serde_json::Value;
use tracing::debug;

pub mod error;
pub mod filter;
pub mod memory;
pub mod remote;

pub use error::StoreError;
pub use filter::Filter;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

#[derive(Clone)]
enum Backend {
    Memory(MemoryStore),
    Remote(RemoteStore),
}

#[derive(Clone)]
pub struct Store {
    backend: Backend,
    namespace: String,
}

impl Store {
    pub fn connect(url: &str, namespace: &str) -> Result<Self, StoreError> {
        let scheme = url.split_once("://").map_or(url, |(scheme, _)| scheme);

        let backend = match scheme {
            "memory" => Backend::Memory(MemoryStore::new()),
            "redis" | "rediss" | "redis+unix" | "unix" => Backend::Remote(RemoteStore::open(url)?),
            other => return Err(StoreError::UnsupportedScheme(other.to_string())),
        };

        Ok(Self {
            backend,
            namespace: namespace.to_string(),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
            namespace: String::new(),
        }
    }

    /// Makes every delete on an in-memory store fail until switched back.
    #[cfg(feature = "test-util")]
    pub fn fail_deletes(&self, fail: bool) {
        if let Backend::Memory(store) = &self.backend {
            store.fail_deletes(fail);
        }
    }

    pub fn collection(&self, name: &str) -> Collection {
        let key = if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}:{name}", self.namespace)
        };

        Collection {
            backend: self.backend.clone(),
            key,
        }
    }
}

#[derive(Clone)]
pub struct Collection {
    backend: Backend,
    key: String,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.key
    }

    pub async fn insert(&self, document: Value) -> Result<(), StoreError> {
        if !document.is_object() {
            return Err(StoreError::InvalidDocument);
        }

        debug!("insert into {}", self.key);
        match &self.backend {
            Backend::Memory(store) => {
                store.insert(&self.key, document).await;
                Ok(())
            }
            Backend::Remote(store) => store.insert(&self.key, document).await,
        }
    }

    /// Matching documents in insertion order.
    pub async fn retrieve(&self, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        debug!("retrieve {filter} from {}", self.key);
        match &self.backend {
            Backend::Memory(store) => Ok(store.retrieve(&self.key, filter).await),
            Backend::Remote(store) => store.retrieve(&self.key, filter).await,
        }
    }

    /// Sets `field` to `value` on every matching document, returning how many changed.
    pub async fn update(
        &self,
        filter: &Filter,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<usize, StoreError> {
        let value = value.into();

        debug!("update {field} where {filter} in {}", self.key);
        match &self.backend {
            Backend::Memory(store) => Ok(store.update(&self.key, filter, field, &value).await),
            Backend::Remote(store) => store.update(&self.key, filter, field, &value).await,
        }
    }

    pub async fn delete(&self, filter: &Filter) -> Result<usize, StoreError> {
        debug!("delete {filter} from {}", self.key);
        match &self.backend {
            Backend::Memory(store) => store.delete(&self.key, filter).await,
            Backend::Remote(store) => store.delete(&self.key, filter).await,
        }
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        match &self.backend {
            Backend::Memory(store) => Ok(store.count(&self.key).await),
            Backend::Remote(store) => store.count(&self.key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Collection, Filter, Store, StoreError};

    async fn exercise(recipes: Collection) {
        recipes
            .insert(json!({"id": 0, "title": "Pancakes", "body": "flour"}))
            .await
            .unwrap();
        recipes
            .insert(json!({"id": 1, "title": "Waffles", "body": "batter"}))
            .await
            .unwrap();
        recipes
            .insert(json!({"id": 2, "title": "Pancakes", "body": "duplicate"}))
            .await
            .unwrap();

        assert_eq!(recipes.count().await.unwrap(), 3);

        let pancakes = recipes
            .retrieve(&Filter::eq("title", "Pancakes"))
            .await
            .unwrap();
        assert_eq!(pancakes.len(), 2);
        assert_eq!(pancakes[0]["body"], "flour");
        assert_eq!(pancakes[1]["body"], "duplicate");

        let updated = recipes
            .update(&Filter::eq("title", "Waffles"), "body", "syrup")
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let waffles = recipes
            .retrieve(&Filter::eq("title", "Waffles"))
            .await
            .unwrap();
        assert_eq!(waffles, vec![json!({"id": 1, "title": "Waffles", "body": "syrup"})]);

        let deleted = recipes.delete(&Filter::eq("title", "Pancakes")).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(recipes.count().await.unwrap(), 1);

        let deleted = recipes.delete(&Filter::eq("title", "Pancakes")).await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let store = Store::connect("memory://", "test").unwrap();

        exercise(store.collection("recipes")).await;
    }

    #[tokio::test]
    async fn test_redis_backend() {
        let Ok(url) = std::env::var("REDIS_URL") else {
            eprintln!("REDIS_URL not set, skipping");
            return;
        };

        let namespace = format!("store-test-{}", std::process::id());
        let store = Store::connect(&url, &namespace).unwrap();
        let recipes = store.collection("recipes");
        recipes.delete(&Filter::all()).await.unwrap();

        exercise(recipes.clone()).await;

        recipes.delete(&Filter::all()).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_non_objects() {
        let recipes = Store::in_memory().collection("recipes");

        let result = recipes.insert(json!("just a string")).await;
        assert!(matches!(result, Err(StoreError::InvalidDocument)));
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = Store::connect("acorn-store://localhost:2525/recipe-webapp", "x");

        assert!(matches!(result, Err(StoreError::UnsupportedScheme(s)) if s == "acorn-store"));
    }

    #[test]
    fn test_namespace_prefixes_collections() {
        let store = Store::connect("memory://", "recipe-webapp").unwrap();
        assert_eq!(store.collection("recipes").name(), "recipe-webapp:recipes");

        assert_eq!(Store::in_memory().collection("recipes").name(), "recipes");
    }
}
