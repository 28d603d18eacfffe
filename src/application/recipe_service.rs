use crate::domain::error::DomainError;
use crate::domain::models::{
    CreateRecipe, Ingredient, NameRef, Recipe, RecipeDetail, RecipeSummary, Tag, UpdateRecipe,
};
use crate::domain::repository::{
    ImageStore, IngredientRepository, RecipeRepository, TagRepository,
};
use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

fn image_ext(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("Title must not be empty".to_string()));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), DomainError> {
    if price.is_sign_negative() {
        return Err(DomainError::Validation("Price must not be negative".to_string()));
    }
    if price.scale() > 2 {
        return Err(DomainError::Validation(
            "Price supports at most two decimal places".to_string(),
        ));
    }
    Ok(())
}

/// Extracts the raw names from nested payload items, rejecting empty ones.
/// Runs before any store call so a bad item fails the whole write with
/// nothing committed.
fn validate_names(kind: &str, refs: &[NameRef]) -> Result<Vec<String>, DomainError> {
    refs.iter()
        .map(|r| {
            if r.name.is_empty() {
                Err(DomainError::Validation(format!(
                    "{} name must not be empty",
                    kind
                )))
            } else {
                Ok(r.name.clone())
            }
        })
        .collect()
}

pub struct RecipeService<S, I>
where
    S: RecipeRepository + TagRepository + IngredientRepository,
    I: ImageStore,
{
    store: Arc<S>,
    images: Arc<I>,
}

impl<S, I> RecipeService<S, I>
where
    S: RecipeRepository + TagRepository + IngredientRepository,
    I: ImageStore,
{
    pub fn new(store: Arc<S>, images: Arc<I>) -> Self {
        Self { store, images }
    }

    async fn expand(&self, recipe: &Recipe) -> Result<(Vec<Tag>, Vec<Ingredient>)> {
        let mut tags = Vec::with_capacity(recipe.tag_ids.len());
        for id in &recipe.tag_ids {
            if let Some(tag) = self.store.find_tag(&recipe.owner_id, *id).await? {
                tags.push(tag);
            }
        }
        let mut ingredients = Vec::with_capacity(recipe.ingredient_ids.len());
        for id in &recipe.ingredient_ids {
            if let Some(ingredient) = self.store.find_ingredient(&recipe.owner_id, *id).await? {
                ingredients.push(ingredient);
            }
        }
        Ok((tags, ingredients))
    }

    async fn detail(&self, recipe: Recipe) -> Result<RecipeDetail> {
        let (tags, ingredients) = self.expand(&recipe).await?;
        Ok(RecipeDetail::from_parts(recipe, tags, ingredients))
    }

    #[instrument(skip(self), fields(owner_id = owner_id))]
    pub async fn list_recipes(&self, owner_id: &str) -> Result<Vec<RecipeSummary>> {
        let recipes = self.store.list_recipes(owner_id).await?;
        let mut summaries = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            let (tags, ingredients) = self.expand(&recipe).await?;
            summaries.push(RecipeSummary::from_parts(recipe, tags, ingredients));
        }
        Ok(summaries)
    }

    #[instrument(skip(self), fields(owner_id = owner_id, recipe_id = id))]
    pub async fn get_recipe(&self, owner_id: &str, id: u32) -> Result<RecipeDetail> {
        let recipe = self
            .store
            .find_recipe(owner_id, id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Recipe not found".to_string()))?;
        self.detail(recipe).await
    }

    #[instrument(skip(self, req), fields(owner_id = owner_id, title = %req.title))]
    pub async fn create_recipe(&self, owner_id: &str, req: CreateRecipe) -> Result<RecipeDetail> {
        validate_title(&req.title)?;
        validate_price(req.price)?;
        // Stored at scale 2 so "5" and "5.00" render the same.
        let mut price = req.price;
        price.rescale(2);
        let tag_names = validate_names("Tag", &req.tags)?;
        let ingredient_names = validate_names("Ingredient", &req.ingredients)?;

        let tag_ids = self.store.resolve_tags(owner_id, &tag_names).await?;
        let ingredient_ids = self
            .store
            .resolve_ingredients(owner_id, &ingredient_names)
            .await?;

        let recipe = Recipe {
            id: 0, // assigned by the store
            owner_id: owner_id.to_string(),
            title: req.title,
            time_minutes: req.time_minutes,
            price,
            description: req.description,
            link: req.link,
            image: None,
            tag_ids,
            ingredient_ids,
        };
        let recipe = self.store.insert_recipe(recipe).await?;
        info!(recipe_id = recipe.id, "Recipe created");
        self.detail(recipe).await
    }

    /// Shared by PUT and PATCH. With `partial` false the required fields
    /// (`title`, `time_minutes`, `price`) must be present; in both modes an
    /// absent optional field leaves the stored value untouched, and an
    /// explicit empty `tags`/`ingredients` list clears the association set.
    #[instrument(skip(self, req), fields(owner_id = owner_id, recipe_id = id))]
    pub async fn update_recipe(
        &self,
        owner_id: &str,
        id: u32,
        req: UpdateRecipe,
        partial: bool,
    ) -> Result<RecipeDetail> {
        // Resolve the target first so an unknown or foreign id reads as
        // absent rather than invalid.
        let mut recipe = self
            .store
            .find_recipe(owner_id, id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Recipe not found".to_string()))?;

        if !partial && (req.title.is_none() || req.time_minutes.is_none() || req.price.is_none()) {
            return Err(DomainError::Validation(
                "title, time_minutes and price are required".to_string(),
            )
            .into());
        }

        if let Some(title) = &req.title {
            validate_title(title)?;
        }
        if let Some(price) = req.price {
            validate_price(price)?;
        }
        let tag_names = match &req.tags {
            Some(refs) => Some(validate_names("Tag", refs)?),
            None => None,
        };
        let ingredient_names = match &req.ingredients {
            Some(refs) => Some(validate_names("Ingredient", refs)?),
            None => None,
        };

        if let Some(title) = req.title {
            recipe.title = title;
        }
        if let Some(time_minutes) = req.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(mut price) = req.price {
            price.rescale(2);
            recipe.price = price;
        }
        if let Some(description) = req.description {
            recipe.description = description;
        }
        if let Some(link) = req.link {
            recipe.link = Some(link);
        }
        if let Some(names) = tag_names {
            recipe.tag_ids = self.store.resolve_tags(owner_id, &names).await?;
        }
        if let Some(names) = ingredient_names {
            recipe.ingredient_ids = self.store.resolve_ingredients(owner_id, &names).await?;
        }

        if !self.store.update_recipe(recipe.clone()).await? {
            return Err(DomainError::NotFound("Recipe not found".to_string()).into());
        }
        info!(recipe_id = recipe.id, "Recipe updated");
        self.detail(recipe).await
    }

    #[instrument(skip(self), fields(owner_id = owner_id, recipe_id = id))]
    pub async fn delete_recipe(&self, owner_id: &str, id: u32) -> Result<()> {
        let removed = self
            .store
            .delete_recipe(owner_id, id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Recipe not found".to_string()))?;

        if let Some(path) = removed.image {
            // The row is already gone; a stuck binary is logged, not fatal.
            if let Err(e) = self.images.delete_image(&path).await {
                warn!(error = %e, path = %path, "Failed to release recipe image");
            }
        }
        info!(recipe_id = id, "Recipe deleted");
        Ok(())
    }

    #[instrument(skip(self, data), fields(owner_id = owner_id, recipe_id = id, size = data.len()))]
    pub async fn upload_image(
        &self,
        owner_id: &str,
        id: u32,
        content_type: &str,
        data: &[u8],
    ) -> Result<RecipeDetail> {
        let ext = image_ext(content_type).ok_or_else(|| {
            DomainError::Validation(format!("Unsupported image content type: {}", content_type))
        })?;
        if data.is_empty() {
            return Err(DomainError::Validation("Image file is empty".to_string()).into());
        }

        let mut recipe = self
            .store
            .find_recipe(owner_id, id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Recipe not found".to_string()))?;

        let path = self.images.save_image(ext, data).await?;
        let previous = recipe.image.replace(path.clone());

        if !self.store.update_recipe(recipe.clone()).await? {
            // The recipe vanished between lookup and write; release the
            // orphaned binary.
            if let Err(e) = self.images.delete_image(&path).await {
                warn!(error = %e, path = %path, "Failed to release orphaned image");
            }
            return Err(DomainError::NotFound("Recipe not found".to_string()).into());
        }
        if let Some(old) = previous {
            if let Err(e) = self.images.delete_image(&old).await {
                warn!(error = %e, path = %old, "Failed to release replaced image");
            }
        }
        info!(recipe_id = recipe.id, "Recipe image stored");
        self.detail(recipe).await
    }

    // Tag operations

    pub async fn list_tags(&self, owner_id: &str) -> Result<Vec<Tag>> {
        self.store.list_tags(owner_id).await
    }

    #[instrument(skip(self, req), fields(owner_id = owner_id, name = %req.name))]
    pub async fn create_tag(&self, owner_id: &str, req: NameRef) -> Result<Tag> {
        let names = validate_names("Tag", std::slice::from_ref(&req))?;
        self.store.get_or_create_tag(owner_id, &names[0]).await
    }

    #[instrument(skip(self, req), fields(owner_id = owner_id, tag_id = id))]
    pub async fn update_tag(&self, owner_id: &str, id: u32, req: NameRef) -> Result<Tag> {
        let names = validate_names("Tag", std::slice::from_ref(&req))?;
        let mut tag = self
            .store
            .find_tag(owner_id, id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Tag not found".to_string()))?;
        tag.name = names.into_iter().next().unwrap_or_default();
        if !self.store.update_tag(tag.clone()).await? {
            return Err(DomainError::NotFound("Tag not found".to_string()).into());
        }
        Ok(tag)
    }

    #[instrument(skip(self), fields(owner_id = owner_id, tag_id = id))]
    pub async fn delete_tag(&self, owner_id: &str, id: u32) -> Result<()> {
        if !self.store.delete_tag(owner_id, id).await? {
            return Err(DomainError::NotFound("Tag not found".to_string()).into());
        }
        Ok(())
    }

    // Ingredient operations

    pub async fn list_ingredients(&self, owner_id: &str) -> Result<Vec<Ingredient>> {
        self.store.list_ingredients(owner_id).await
    }

    #[instrument(skip(self, req), fields(owner_id = owner_id, name = %req.name))]
    pub async fn create_ingredient(&self, owner_id: &str, req: NameRef) -> Result<Ingredient> {
        let names = validate_names("Ingredient", std::slice::from_ref(&req))?;
        self.store.get_or_create_ingredient(owner_id, &names[0]).await
    }

    #[instrument(skip(self, req), fields(owner_id = owner_id, ingredient_id = id))]
    pub async fn update_ingredient(
        &self,
        owner_id: &str,
        id: u32,
        req: NameRef,
    ) -> Result<Ingredient> {
        let names = validate_names("Ingredient", std::slice::from_ref(&req))?;
        let mut ingredient = self
            .store
            .find_ingredient(owner_id, id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Ingredient not found".to_string()))?;
        ingredient.name = names.into_iter().next().unwrap_or_default();
        if !self.store.update_ingredient(ingredient.clone()).await? {
            return Err(DomainError::NotFound("Ingredient not found".to_string()).into());
        }
        Ok(ingredient)
    }

    #[instrument(skip(self), fields(owner_id = owner_id, ingredient_id = id))]
    pub async fn delete_ingredient(&self, owner_id: &str, id: u32) -> Result<()> {
        if !self.store.delete_ingredient(owner_id, id).await? {
            return Err(DomainError::NotFound("Ingredient not found".to_string()).into());
        }
        Ok(())
    }
}
