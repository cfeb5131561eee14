use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{
    FeedQuery, SaveRecipeRequest, SavedRecipeWithIngredients, SavedRecipesResponse,
    UnsaveRecipeRequest, UnsavedResponse,
};
use super::model::Recipe;
use super::provider::ProviderError;
use super::repo::{self, SavedRecipe};
use crate::{
    auth::services::AuthUser,
    config::FilterConfig,
    dietary::{filter_recipes, FilterOptions, FilterPolicy},
    error::{bad_request, internal, not_found, ApiError},
    preferences::repo::load_profile,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(recipe_feed))
        .route("/recipes/saved", get(saved_recipes))
        .route("/recipes/save", post(save_recipe).delete(unsave_recipe))
        .route("/recipes/:id", get(recipe_details))
}

/// Status for a failed provider call: 404 for an unknown recipe, 429 while
/// rate limited, 502 otherwise.
pub(crate) fn upstream(e: ProviderError) -> ApiError {
    error!(error = %e, "recipe provider failed");
    match e {
        ProviderError::Status { status: 404, .. } => not_found("Recipe not found"),
        ProviderError::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            "Recipe provider rate limit reached".into(),
        ),
        _ => (StatusCode::BAD_GATEWAY, "Failed to fetch recipes".into()),
    }
}

/// How one feed request fetches and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPlan<'a> {
    pub query: Option<&'a str>,
    pub fetch_size: usize,
    pub options: FilterOptions,
}

impl<'a> FeedPlan<'a> {
    pub fn new(q: &'a FeedQuery, cfg: &FilterConfig) -> Self {
        Self {
            query: q.query.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            fetch_size: cfg.fetch_size,
            options: FilterOptions {
                policy: FilterPolicy::from_strict(q.strict.unwrap_or(cfg.strict)),
                page_size: cfg.page_size,
            },
        }
    }
}

#[instrument(skip(state))]
pub async fn recipe_feed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<FeedQuery>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let profile = load_profile(&state.db, user_id).await.map_err(internal)?;
    let plan = FeedPlan::new(&q, &state.config.filter);

    let candidates = match plan.query {
        Some(query) => state.recipes.search(query, &profile, plan.fetch_size).await,
        None => state.recipes.random(&profile, plan.fetch_size).await,
    }
    .map_err(upstream)?;

    let outcome = filter_recipes(candidates, &profile, &state.denylists, plan.options);
    if !outcome.non_compliant.is_empty() {
        warn!(
            user_id = %user_id,
            non_compliant = ?outcome.non_compliant,
            "serving recipes that miss some dietary preferences"
        );
    }
    info!(
        user_id = %user_id,
        served = outcome.recipes.len(),
        rejected = outcome.rejected,
        "recipe feed"
    );
    Ok(Json(outcome.recipes))
}

#[instrument(skip(state))]
pub async fn recipe_details(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = state.recipes.details(id).await.map_err(upstream)?;
    Ok(Json(recipe))
}

#[instrument(skip(state, payload))]
pub async fn save_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SaveRecipeRequest>,
) -> Result<Json<SavedRecipe>, ApiError> {
    let title = payload.title.as_deref().map(str::trim).unwrap_or_default();
    let Some(recipe_id) = payload.recipe_id.filter(|_| !title.is_empty()) else {
        return Err(bad_request("Missing required fields"));
    };

    let saved = repo::save(&state.db, user_id, recipe_id, title, payload.image.as_deref())
        .await
        .map_err(internal)?;
    match saved {
        Some(row) => {
            info!(user_id = %user_id, recipe_id, "recipe saved");
            Ok(Json(row))
        }
        None => Err((StatusCode::CONFLICT, "Recipe already saved".into())),
    }
}

#[instrument(skip(state, payload))]
pub async fn unsave_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UnsaveRecipeRequest>,
) -> Result<Json<UnsavedResponse>, ApiError> {
    let recipe_id = payload
        .recipe_id
        .ok_or_else(|| bad_request("Missing recipe ID"))?;
    if !repo::unsave(&state.db, user_id, recipe_id)
        .await
        .map_err(internal)?
    {
        return Err(not_found("Recipe not saved"));
    }
    info!(user_id = %user_id, recipe_id, "recipe unsaved");
    Ok(Json(UnsavedResponse { success: true }))
}

#[instrument(skip(state))]
pub async fn saved_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SavedRecipesResponse>, ApiError> {
    let rows = repo::list_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;

    let mut recipes = Vec::with_capacity(rows.len());
    for row in rows {
        let ingredients = match state.recipes.details(row.recipe_id).await {
            Ok(recipe) => recipe.extended_ingredients.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, recipe_id = row.recipe_id, "saved recipe details unavailable");
                Vec::new()
            }
        };
        recipes.push(SavedRecipeWithIngredients {
            id: row.id,
            recipe_id: row.recipe_id,
            title: row.title,
            image: row.image,
            ingredients,
        });
    }
    Ok(Json(SavedRecipesResponse { recipes }))
}
