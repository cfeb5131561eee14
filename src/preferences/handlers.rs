use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument};

use super::dto::{PreferencesRequest, PreferencesView, SavedResponse};
use super::repo::{self, UserPreferences};
use crate::{
    auth::services::AuthUser,
    error::{internal, ApiError},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/preferences", get(get_preferences).post(save_preferences))
}

#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PreferencesView>, ApiError> {
    let prefs = repo::find(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(prefs.map(|p| p.to_view()).unwrap_or_default()))
}

#[instrument(skip(state, payload))]
pub async fn save_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PreferencesRequest>,
) -> Result<Json<SavedResponse>, ApiError> {
    let row = UserPreferences::from_request(user_id, &payload);
    let saved = repo::upsert(&state.db, &row).await.map_err(internal)?;
    info!(
        user_id = %user_id,
        tags = saved.dietary_tags().len(),
        "preferences saved"
    );
    Ok(Json(SavedResponse { success: true }))
}
