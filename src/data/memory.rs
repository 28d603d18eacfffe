use crate::domain::models::{Ingredient, Recipe, Tag};
use crate::domain::repository::{IngredientRepository, RecipeRepository, TagRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

#[derive(Default)]
struct CatalogInner {
    recipes: HashMap<u32, Recipe>,
    tags: HashMap<u32, Tag>,
    ingredients: HashMap<u32, Ingredient>,
    next_recipe_id: u32,
    next_tag_id: u32,
    next_ingredient_id: u32,
}

impl CatalogInner {
    fn upsert_tag(&mut self, owner_id: &str, name: &str) -> Tag {
        if let Some(tag) = self
            .tags
            .values()
            .find(|t| t.owner_id == owner_id && t.name == name)
        {
            trace!(tag_id = tag.id, name = name, "Reusing existing tag");
            return tag.clone();
        }
        self.next_tag_id += 1;
        let tag = Tag {
            id: self.next_tag_id,
            name: name.to_string(),
            owner_id: owner_id.to_string(),
        };
        debug!(tag_id = tag.id, name = name, "Created tag");
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    fn upsert_ingredient(&mut self, owner_id: &str, name: &str) -> Ingredient {
        if let Some(ingredient) = self
            .ingredients
            .values()
            .find(|i| i.owner_id == owner_id && i.name == name)
        {
            trace!(
                ingredient_id = ingredient.id,
                name = name,
                "Reusing existing ingredient"
            );
            return ingredient.clone();
        }
        self.next_ingredient_id += 1;
        let ingredient = Ingredient {
            id: self.next_ingredient_id,
            name: name.to_string(),
            owner_id: owner_id.to_string(),
        };
        debug!(ingredient_id = ingredient.id, name = name, "Created ingredient");
        self.ingredients.insert(ingredient.id, ingredient.clone());
        ingredient
    }
}

/// In-memory recipe/tag/ingredient store. A single lock guards all three
/// maps so that a recipe write with nested tag/ingredient resolution is one
/// critical section; concurrent resolutions of the same name cannot create
/// duplicate rows.
#[derive(Clone)]
pub struct InMemoryCatalog {
    inner: Arc<RwLock<CatalogInner>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CatalogInner::default())),
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecipeRepository for InMemoryCatalog {
    async fn insert_recipe(&self, mut recipe: Recipe) -> Result<Recipe> {
        let mut inner = self.inner.write().await;
        inner.next_recipe_id += 1;
        recipe.id = inner.next_recipe_id;
        debug!(recipe_id = recipe.id, owner_id = %recipe.owner_id, "Recipe inserted");
        inner.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn list_recipes(&self, owner_id: &str) -> Result<Vec<Recipe>> {
        let inner = self.inner.read().await;
        let mut recipes: Vec<Recipe> = inner
            .recipes
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        // Newest first; ids are monotonic so descending id is creation order.
        recipes.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(recipes)
    }

    async fn find_recipe(&self, owner_id: &str, id: u32) -> Result<Option<Recipe>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recipes
            .get(&id)
            .filter(|r| r.owner_id == owner_id)
            .cloned())
    }

    async fn update_recipe(&self, recipe: Recipe) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .recipes
            .get(&recipe.id)
            .is_some_and(|r| r.owner_id == recipe.owner_id);
        if owned {
            inner.recipes.insert(recipe.id, recipe);
        }
        Ok(owned)
    }

    async fn delete_recipe(&self, owner_id: &str, id: u32) -> Result<Option<Recipe>> {
        let mut inner = self.inner.write().await;
        let owned = inner.recipes.get(&id).is_some_and(|r| r.owner_id == owner_id);
        if !owned {
            return Ok(None);
        }
        let removed = inner.recipes.remove(&id);
        debug!(recipe_id = id, owner_id = owner_id, "Recipe deleted");
        Ok(removed)
    }
}

#[async_trait]
impl TagRepository for InMemoryCatalog {
    async fn list_tags(&self, owner_id: &str) -> Result<Vec<Tag>> {
        let inner = self.inner.read().await;
        let mut tags: Vec<Tag> = inner
            .tags
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(tags)
    }

    async fn find_tag(&self, owner_id: &str, id: u32) -> Result<Option<Tag>> {
        let inner = self.inner.read().await;
        Ok(inner.tags.get(&id).filter(|t| t.owner_id == owner_id).cloned())
    }

    async fn get_or_create_tag(&self, owner_id: &str, name: &str) -> Result<Tag> {
        let mut inner = self.inner.write().await;
        Ok(inner.upsert_tag(owner_id, name))
    }

    async fn resolve_tags(&self, owner_id: &str, names: &[String]) -> Result<Vec<u32>> {
        // One write-lock acquisition for the whole list keeps the
        // read-then-create sequence serialized across requests.
        let mut inner = self.inner.write().await;
        let mut ids = Vec::new();
        for name in names {
            let id = inner.upsert_tag(owner_id, name).id;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn update_tag(&self, tag: Tag) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .tags
            .get(&tag.id)
            .is_some_and(|t| t.owner_id == tag.owner_id);
        if owned {
            inner.tags.insert(tag.id, tag);
        }
        Ok(owned)
    }

    async fn delete_tag(&self, owner_id: &str, id: u32) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner.tags.get(&id).is_some_and(|t| t.owner_id == owner_id);
        if !owned {
            return Ok(false);
        }
        inner.tags.remove(&id);
        // Drop the association from any recipe that referenced the tag.
        for recipe in inner.recipes.values_mut() {
            recipe.tag_ids.retain(|tag_id| *tag_id != id);
        }
        debug!(tag_id = id, owner_id = owner_id, "Tag deleted");
        Ok(true)
    }
}

#[async_trait]
impl IngredientRepository for InMemoryCatalog {
    async fn list_ingredients(&self, owner_id: &str) -> Result<Vec<Ingredient>> {
        let inner = self.inner.read().await;
        let mut ingredients: Vec<Ingredient> = inner
            .ingredients
            .values()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        ingredients.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(ingredients)
    }

    async fn find_ingredient(&self, owner_id: &str, id: u32) -> Result<Option<Ingredient>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ingredients
            .get(&id)
            .filter(|i| i.owner_id == owner_id)
            .cloned())
    }

    async fn get_or_create_ingredient(&self, owner_id: &str, name: &str) -> Result<Ingredient> {
        let mut inner = self.inner.write().await;
        Ok(inner.upsert_ingredient(owner_id, name))
    }

    async fn resolve_ingredients(&self, owner_id: &str, names: &[String]) -> Result<Vec<u32>> {
        let mut inner = self.inner.write().await;
        let mut ids = Vec::new();
        for name in names {
            let id = inner.upsert_ingredient(owner_id, name).id;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn update_ingredient(&self, ingredient: Ingredient) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .ingredients
            .get(&ingredient.id)
            .is_some_and(|i| i.owner_id == ingredient.owner_id);
        if owned {
            inner.ingredients.insert(ingredient.id, ingredient);
        }
        Ok(owned)
    }

    async fn delete_ingredient(&self, owner_id: &str, id: u32) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .ingredients
            .get(&id)
            .is_some_and(|i| i.owner_id == owner_id);
        if !owned {
            return Ok(false);
        }
        inner.ingredients.remove(&id);
        for recipe in inner.recipes.values_mut() {
            recipe.ingredient_ids.retain(|ingredient_id| *ingredient_id != id);
        }
        debug!(ingredient_id = id, owner_id = owner_id, "Ingredient deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn sample_recipe(owner_id: &str) -> Recipe {
        Recipe {
            id: 0,
            owner_id: owner_id.to_string(),
            title: "Sample recipe".to_string(),
            time_minutes: 10,
            price: Decimal::new(535, 2),
            description: "Sample description".to_string(),
            link: None,
            image: None,
            tag_ids: vec![],
            ingredient_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_insert_recipe_assigns_increasing_ids() {
        let catalog = InMemoryCatalog::new();

        let first = catalog.insert_recipe(sample_recipe("owner-1")).await.unwrap();
        let second = catalog.insert_recipe(sample_recipe("owner-1")).await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_list_recipes_newest_first() {
        let catalog = InMemoryCatalog::new();

        let first = catalog.insert_recipe(sample_recipe("owner-1")).await.unwrap();
        let second = catalog.insert_recipe(sample_recipe("owner-1")).await.unwrap();

        let recipes = catalog.list_recipes("owner-1").await.unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].id, second.id);
        assert_eq!(recipes[1].id, first.id);
    }

    #[tokio::test]
    async fn test_recipes_scoped_to_owner() {
        let catalog = InMemoryCatalog::new();

        let mine = catalog.insert_recipe(sample_recipe("owner-1")).await.unwrap();
        let theirs = catalog.insert_recipe(sample_recipe("owner-2")).await.unwrap();

        let recipes = catalog.list_recipes("owner-1").await.unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].id, mine.id);

        // Someone else's recipe looks absent, not forbidden.
        let found = catalog.find_recipe("owner-1", theirs.id).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_recipe_scoped_to_owner() {
        let catalog = InMemoryCatalog::new();
        let theirs = catalog.insert_recipe(sample_recipe("owner-2")).await.unwrap();

        let removed = catalog.delete_recipe("owner-1", theirs.id).await.unwrap();
        assert!(removed.is_none());

        let still_there = catalog.find_recipe("owner-2", theirs.id).await.unwrap();
        assert!(still_there.is_some());
    }

    #[tokio::test]
    async fn test_resolve_tags_creates_missing_rows() {
        let catalog = InMemoryCatalog::new();

        let ids = catalog
            .resolve_tags("owner-1", &["vegan".to_string(), "dessert".to_string()])
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        let tags = catalog.list_tags("owner-1").await.unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_tags_reuses_existing_row() {
        let catalog = InMemoryCatalog::new();
        let existing = catalog.get_or_create_tag("owner-1", "indian").await.unwrap();

        let ids = catalog
            .resolve_tags("owner-1", &["indian".to_string()])
            .await
            .unwrap();

        assert_eq!(ids, vec![existing.id]);
        assert_eq!(catalog.list_tags("owner-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_tags_is_case_sensitive() {
        let catalog = InMemoryCatalog::new();
        catalog.get_or_create_tag("owner-1", "Vegan").await.unwrap();

        catalog
            .resolve_tags("owner-1", &["vegan".to_string()])
            .await
            .unwrap();

        // "Vegan" and "vegan" are distinct names.
        assert_eq!(catalog.list_tags("owner-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_tags_collapses_repeated_names() {
        let catalog = InMemoryCatalog::new();

        let ids = catalog
            .resolve_tags("owner-1", &["vegan".to_string(), "vegan".to_string()])
            .await
            .unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(catalog.list_tags("owner-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_name_different_owners_are_distinct() {
        let catalog = InMemoryCatalog::new();

        let mine = catalog.get_or_create_tag("owner-1", "vegan").await.unwrap();
        let theirs = catalog.get_or_create_tag("owner-2", "vegan").await.unwrap();

        assert_ne!(mine.id, theirs.id);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_never_duplicate() {
        let catalog = InMemoryCatalog::new();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let catalog = catalog.clone();
                tokio::spawn(async move {
                    catalog.resolve_tags("owner-1", &["vegan".to_string()]).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(catalog.list_tags("owner-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_tags_descending_name() {
        let catalog = InMemoryCatalog::new();
        catalog.get_or_create_tag("owner-1", "Dessert").await.unwrap();
        catalog.get_or_create_tag("owner-1", "Vegan").await.unwrap();

        let tags = catalog.list_tags("owner-1").await.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Vegan", "Dessert"]);
    }

    #[tokio::test]
    async fn test_list_ingredients_descending_name() {
        let catalog = InMemoryCatalog::new();
        catalog.get_or_create_ingredient("owner-1", "Kale").await.unwrap();
        catalog.get_or_create_ingredient("owner-1", "Salt").await.unwrap();

        let ingredients = catalog.list_ingredients("owner-1").await.unwrap();
        let names: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Salt", "Kale"]);
    }

    #[tokio::test]
    async fn test_delete_tag_strips_recipe_associations() {
        let catalog = InMemoryCatalog::new();
        let tag = catalog.get_or_create_tag("owner-1", "vegan").await.unwrap();

        let mut recipe = sample_recipe("owner-1");
        recipe.tag_ids = vec![tag.id];
        let recipe = catalog.insert_recipe(recipe).await.unwrap();

        let deleted = catalog.delete_tag("owner-1", tag.id).await.unwrap();
        assert!(deleted);

        let recipe = catalog.find_recipe("owner-1", recipe.id).await.unwrap().unwrap();
        assert!(recipe.tag_ids.is_empty());
    }

    #[tokio::test]
    async fn test_delete_recipe_keeps_tags() {
        let catalog = InMemoryCatalog::new();
        let tag = catalog.get_or_create_tag("owner-1", "vegan").await.unwrap();

        let mut recipe = sample_recipe("owner-1");
        recipe.tag_ids = vec![tag.id];
        let recipe = catalog.insert_recipe(recipe).await.unwrap();

        catalog.delete_recipe("owner-1", recipe.id).await.unwrap();

        // The tag row itself outlives the recipe.
        assert!(catalog.find_tag("owner-1", tag.id).await.unwrap().is_some());
    }
}
