use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::Ingredient;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub query: Option<String>,
    /// Overrides the configured filter policy for this request.
    #[serde(default)]
    pub strict: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecipeRequest {
    pub recipe_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsaveRecipeRequest {
    pub recipe_id: Option<i64>,
}

/// Saved recipe with its ingredient list fetched from the provider.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipeWithIngredients {
    pub id: Uuid,
    pub recipe_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Serialize)]
pub struct SavedRecipesResponse {
    pub recipes: Vec<SavedRecipeWithIngredients>,
}

#[derive(Debug, Serialize)]
pub struct UnsavedResponse {
    pub success: bool,
}
