//! # Recipes
//!
//! Repository mapping [`Recipe`]s to documents in the `recipes` collection.
//!
//! ## Schema
//! - Fields: id (**int**), title (**string**), body (**string**)
//! - Title is the lookup key. Duplicates are possible, first match wins
//! - Ids come from an atomic counter seeded with the collection size at boot
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::{Collection, Filter, Store, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const RECIPE_COLLECTION: &str = "recipes";
pub const RECIPE_TITLE: &str = "title";
pub const RECIPE_BODY: &str = "body";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub body: String,
}

impl Recipe {
    pub fn blank(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}

pub enum Lookup {
    Missing,
    Exists(Recipe),
}

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("no recipe found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Recipes {
    collection: Collection,
    next_id: AtomicI64,
}

impl Recipes {
    pub fn new(collection: Collection, next_id: i64) -> Self {
        Self {
            collection,
            next_id: AtomicI64::new(next_id),
        }
    }

    /// Seeds the id counter from the collection size. A failed count is logged and the
    /// counter starts at zero.
    pub async fn bootstrap(store: &Store) -> Self {
        let collection = store.collection(RECIPE_COLLECTION);

        let next_id = match collection.count().await {
            Ok(size) => size as i64,
            Err(e) => {
                warn!("Failed to get the size of {}: {e}", collection.name());
                0
            }
        };
        info!("Recipe id counter starts at {next_id}");

        Self::new(collection, next_id)
    }

    pub async fn lookup(&self, title: &str) -> Result<Lookup, StoreError> {
        let documents = self.collection.retrieve(&title_filter(title)).await?;
        debug!("{} document(s) titled {title:?}", documents.len());

        Ok(documents
            .into_iter()
            .next()
            .and_then(from_document)
            .map_or(Lookup::Missing, Lookup::Exists))
    }

    pub async fn load(&self, title: &str) -> Result<Recipe, RecipeError> {
        match self.lookup(title).await? {
            Lookup::Exists(recipe) => Ok(recipe),
            Lookup::Missing => Err(RecipeError::NotFound),
        }
    }

    /// Inserts a new document under a freshly assigned id, which is written back into
    /// `recipe`.
    pub async fn save(&self, recipe: &mut Recipe) -> Result<(), StoreError> {
        recipe.id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.collection.insert(serde_json::to_value(&*recipe)?).await?;
        info!("Saved recipe {:?} with id {}", recipe.title, recipe.id);

        Ok(())
    }

    pub async fn update(&self, title: &str, body: &str) -> Result<(), StoreError> {
        let updated = self
            .collection
            .update(&title_filter(title), RECIPE_BODY, body)
            .await?;
        info!("Updated {updated} recipe(s) titled {title:?}");

        Ok(())
    }

    pub async fn delete(&self, title: &str) -> Result<(), StoreError> {
        let deleted = self.collection.delete(&title_filter(title)).await?;
        info!("Deleted {deleted} recipe(s) titled {title:?}");

        Ok(())
    }
}

fn title_filter(title: &str) -> Filter {
    Filter::eq(RECIPE_TITLE, title)
}

// A document without a string body reads as missing.
fn from_document(document: Value) -> Option<Recipe> {
    serde_json::from_value(document)
        .map_err(|e| debug!("Unreadable recipe document: {e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use store::Store;

    use super::*;

    fn recipes() -> (Store, Recipes) {
        let store = Store::in_memory();
        let recipes = Recipes::new(store.collection(RECIPE_COLLECTION), 0);
        (store, recipes)
    }

    #[tokio::test]
    async fn test_load_missing() {
        let (_, recipes) = recipes();

        assert!(matches!(recipes.load("Pancakes").await, Err(RecipeError::NotFound)));
        assert!(matches!(recipes.lookup("Pancakes").await, Ok(Lookup::Missing)));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (_, recipes) = recipes();

        let mut recipe = Recipe {
            title: "Pancakes".to_string(),
            body: "flour, eggs, milk".to_string(),
            ..Default::default()
        };
        recipes.save(&mut recipe).await.unwrap();

        let loaded = recipes.load("Pancakes").await.unwrap();
        assert_eq!(loaded, recipe);
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let (_, recipes) = recipes();

        let mut first = Recipe::blank("a");
        let mut second = Recipe::blank("b");
        recipes.save(&mut first).await.unwrap();
        recipes.save(&mut second).await.unwrap();

        assert_eq!(first.id, 0);
        assert_eq!(second.id, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_title() {
        let (_, recipes) = recipes();

        let mut recipe = Recipe {
            title: "Pancakes".to_string(),
            body: "flour".to_string(),
            ..Default::default()
        };
        recipes.save(&mut recipe).await.unwrap();
        recipes.update("Pancakes", "flour, sugar").await.unwrap();

        let loaded = recipes.load("Pancakes").await.unwrap();
        assert_eq!(loaded.id, recipe.id);
        assert_eq!(loaded.title, "Pancakes");
        assert_eq!(loaded.body, "flour, sugar");
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, recipes) = recipes();

        recipes.save(&mut Recipe::blank("Pancakes")).await.unwrap();
        recipes.save(&mut Recipe::blank("Waffles")).await.unwrap();
        recipes.delete("Pancakes").await.unwrap();

        assert!(matches!(recipes.load("Pancakes").await, Err(RecipeError::NotFound)));
        assert!(recipes.load("Waffles").await.is_ok());
        assert_eq!(store.collection(RECIPE_COLLECTION).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let (store, recipes) = recipes();
        let collection = store.collection(RECIPE_COLLECTION);

        collection
            .insert(json!({"id": 4, "title": "Pancakes", "body": "first"}))
            .await
            .unwrap();
        collection
            .insert(json!({"id": 9, "title": "Pancakes", "body": "second"}))
            .await
            .unwrap();

        let loaded = recipes.load("Pancakes").await.unwrap();
        assert_eq!(loaded.id, 4);
        assert_eq!(loaded.body, "first");
    }

    #[tokio::test]
    async fn test_document_without_body_is_missing() {
        let (store, recipes) = recipes();

        store
            .collection(RECIPE_COLLECTION)
            .insert(json!({"id": 0, "title": "Pancakes"}))
            .await
            .unwrap();

        assert!(matches!(recipes.load("Pancakes").await, Err(RecipeError::NotFound)));
    }

    #[tokio::test]
    async fn test_document_fields() {
        let (store, recipes) = recipes();
        let collection = store.collection(RECIPE_COLLECTION);

        collection
            .insert(json!({"title": "Toast", "body": "bread"}))
            .await
            .unwrap();
        collection
            .insert(json!({"id": 1, "title": "Soup", "body": 42}))
            .await
            .unwrap();

        assert_eq!(
            recipes.load("Toast").await.unwrap(),
            Recipe {
                id: 0,
                title: "Toast".to_string(),
                body: "bread".to_string(),
            }
        );
        assert!(matches!(recipes.load("Soup").await, Err(RecipeError::NotFound)));
    }

    #[tokio::test]
    async fn test_titles_with_quotes() {
        let (_, recipes) = recipes();

        let title = r#"Mom's "famous" pie"#;
        recipes.save(&mut Recipe::blank(title)).await.unwrap();
        recipes.update(title, "apples").await.unwrap();

        assert_eq!(recipes.load(title).await.unwrap().body, "apples");
        assert!(matches!(recipes.load("Mom's ").await, Err(RecipeError::NotFound)));
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_from_size() {
        let store = Store::in_memory();
        let collection = store.collection(RECIPE_COLLECTION);
        for title in ["a", "b", "c"] {
            collection
                .insert(json!({"title": title, "body": ""}))
                .await
                .unwrap();
        }

        let recipes = Recipes::bootstrap(&store).await;
        let mut recipe = Recipe::blank("d");
        recipes.save(&mut recipe).await.unwrap();

        assert_eq!(recipe.id, 3);
    }

    #[tokio::test]
    async fn test_concurrent_saves_get_distinct_ids() {
        let (_, recipes) = recipes();
        let recipes = std::sync::Arc::new(recipes);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let recipes = recipes.clone();
                tokio::spawn(async move {
                    let mut recipe = Recipe::blank(&format!("recipe {i}"));
                    recipes.save(&mut recipe).await.unwrap();
                    recipe.id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();

        assert_eq!(ids, (0..16).collect::<Vec<i64>>());
    }
}
