use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{AddRecipeRequest, GroceryListResponse, ListUpdatedResponse, UpdateListRequest};
use super::repo;
use crate::{
    auth::{handlers::current_user, services::AuthUser},
    emails::mailer::GroceryListEmail,
    error::{bad_request, internal, ApiError},
    recipes::handlers::upstream,
    state::AppState,
};

pub const DEFAULT_EMAIL_SUBJECT: &str = "Your Grocery List";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/grocery-list", get(get_list))
        .route("/grocery-list/add", post(add_recipe))
        .route("/grocery-list/update", post(update_list))
        .route("/grocery-list/clear", post(clear_list))
        .route("/grocery-list/send", post(send_list))
}

/// Non-blank lines of the stored list followed by `extra`.
pub fn merge_lines(existing: Option<&str>, extra: Vec<String>) -> Vec<String> {
    existing
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .chain(extra)
        .collect()
}

#[instrument(skip(state))]
pub async fn get_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<GroceryListResponse>, ApiError> {
    let list = repo::find(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(GroceryListResponse {
        items: list.and_then(|l| l.items).unwrap_or_default(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddRecipeRequest>,
) -> Result<Json<ListUpdatedResponse>, ApiError> {
    let recipe = state
        .recipes
        .details(payload.recipe_id)
        .await
        .map_err(upstream)?;

    let existing = repo::find(&state.db, user_id).await.map_err(internal)?;
    let lines = merge_lines(
        existing.as_ref().and_then(|l| l.items.as_deref()),
        recipe.ingredient_lines(),
    );
    if lines.is_empty() {
        warn!(recipe_id = recipe.id, "recipe has no ingredients to add");
        return Err(bad_request("Recipe has no ingredients"));
    }

    let organized = state.assistant.organize(&lines).await.map_err(internal)?;
    repo::upsert(&state.db, user_id, Some(&organized))
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, recipe_id = recipe.id, lines = lines.len(), "recipe added to grocery list");
    Ok(Json(ListUpdatedResponse::new(
        "Grocery list updated successfully",
        Some(organized),
    )))
}

#[instrument(skip(state, payload))]
pub async fn update_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateListRequest>,
) -> Result<Json<ListUpdatedResponse>, ApiError> {
    if payload.items.trim().is_empty() {
        return Err(bad_request("Items are required"));
    }
    repo::upsert(&state.db, user_id, Some(&payload.items))
        .await
        .map_err(internal)?;
    Ok(Json(ListUpdatedResponse::new(
        "Grocery list updated successfully",
        Some(payload.items),
    )))
}

#[instrument(skip(state))]
pub async fn clear_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ListUpdatedResponse>, ApiError> {
    repo::clear(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(ListUpdatedResponse::new(
        "Grocery list cleared successfully",
        None,
    )))
}

#[instrument(skip(state))]
pub async fn send_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ListUpdatedResponse>, ApiError> {
    let user = current_user(&state, user_id).await?;
    let list = repo::find(&state.db, user_id).await.map_err(internal)?;
    let Some(items) = list.as_ref().and_then(|l| l.text()) else {
        return Err(bad_request("Grocery list is empty"));
    };

    let email = GroceryListEmail {
        to_email: user.email,
        grocery_list: items.to_string(),
        recipe_name: DEFAULT_EMAIL_SUBJECT.into(),
    };
    state
        .mailer
        .send_grocery_list(&email)
        .await
        .map_err(internal)?;
    repo::clear(&state.db, user_id).await.map_err(internal)?;

    info!(user_id = %user_id, "grocery list sent");
    Ok(Json(ListUpdatedResponse::new(
        "Grocery list sent and cleared successfully",
        None,
    )))
}
