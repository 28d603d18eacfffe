use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub owner_id: String,
}

/// A recipe as the store keeps it. Associations are id sets; the API layer
/// expands them to `{id, name}` objects before serializing.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: u32,
    pub owner_id: String,
    pub title: String,
    pub time_minutes: u32,
    pub price: Decimal,
    pub description: String,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tag_ids: Vec<u32>,
    pub ingredient_ids: Vec<u32>,
}

/// A tag or ingredient referenced by name inside a recipe payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRecipe {
    pub title: String,
    pub time_minutes: u32,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<NameRef>,
    #[serde(default)]
    pub ingredients: Vec<NameRef>,
}

/// Update payload shared by PUT and PATCH. Every field is optional so that
/// an absent key can be told apart from an explicit value; `tags: Some(vec![])`
/// clears the association set while `tags: None` leaves it untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateRecipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<NameRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<NameRef>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: u32,
    pub title: String,
    pub time_minutes: u32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: u32,
    pub title: String,
    pub time_minutes: u32,
    pub price: Decimal,
    pub description: String,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

impl RecipeSummary {
    pub fn from_parts(recipe: Recipe, tags: Vec<Tag>, ingredients: Vec<Ingredient>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags,
            ingredients,
        }
    }
}

impl RecipeDetail {
    pub fn from_parts(recipe: Recipe, tags: Vec<Tag>, ingredients: Vec<Ingredient>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            description: recipe.description,
            link: recipe.link,
            image: recipe.image,
            tags,
            ingredients,
        }
    }
}
