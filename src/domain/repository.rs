use crate::domain::models::{Ingredient, Recipe, Tag};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;

/// Owner-scoped recipe access. Every method takes the owning user's id
/// explicitly; a recipe belonging to someone else is reported as absent.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Inserts the recipe, assigning the next id. Returns the stored row.
    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe>;
    /// All recipes for the owner, newest (highest id) first.
    async fn list_recipes(&self, owner_id: &str) -> Result<Vec<Recipe>>;
    async fn find_recipe(&self, owner_id: &str, id: u32) -> Result<Option<Recipe>>;
    /// Replaces the stored row if it exists and is owned; returns whether it was.
    async fn update_recipe(&self, recipe: Recipe) -> Result<bool>;
    /// Returns the deleted row so the caller can release attached resources.
    async fn delete_recipe(&self, owner_id: &str, id: u32) -> Result<Option<Recipe>>;
}

/// Owner-scoped tag access plus the nested-upsert resolver.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All tags for the owner, by descending name.
    async fn list_tags(&self, owner_id: &str) -> Result<Vec<Tag>>;
    async fn find_tag(&self, owner_id: &str, id: u32) -> Result<Option<Tag>>;
    /// Find-or-create by exact name. Never creates a duplicate for the owner.
    async fn get_or_create_tag(&self, owner_id: &str, name: &str) -> Result<Tag>;
    /// Resolves a whole name list to ids atomically, creating missing rows.
    /// Ids come back in first-appearance order; repeated names collapse.
    async fn resolve_tags(&self, owner_id: &str, names: &[String]) -> Result<Vec<u32>>;
    async fn update_tag(&self, tag: Tag) -> Result<bool>;
    /// Removes the tag and strips it from every recipe that references it.
    async fn delete_tag(&self, owner_id: &str, id: u32) -> Result<bool>;
}

#[async_trait]
pub trait IngredientRepository: Send + Sync {
    /// All ingredients for the owner, by descending name.
    async fn list_ingredients(&self, owner_id: &str) -> Result<Vec<Ingredient>>;
    async fn find_ingredient(&self, owner_id: &str, id: u32) -> Result<Option<Ingredient>>;
    async fn get_or_create_ingredient(&self, owner_id: &str, name: &str) -> Result<Ingredient>;
    async fn resolve_ingredients(&self, owner_id: &str, names: &[String]) -> Result<Vec<u32>>;
    async fn update_ingredient(&self, ingredient: Ingredient) -> Result<bool>;
    async fn delete_ingredient(&self, owner_id: &str, id: u32) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save_user(&self, user: User) -> Result<()>;
    /// Saves the user only if no other user holds the email. The check and
    /// the write are one atomic step; returns whether the save happened.
    async fn save_user_if_email_free(&self, user: User) -> Result<bool>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
}

/// Storage for recipe image binaries. Paths are relative to the media root.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists the bytes and returns the stored relative path.
    async fn save_image(&self, ext: &str, data: &[u8]) -> Result<String>;
    /// Releases a previously stored binary. Missing files are not an error.
    async fn delete_image(&self, path: &str) -> Result<()>;
}
