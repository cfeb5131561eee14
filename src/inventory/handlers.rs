use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::repo::{self, InventoryItem};
use crate::{
    auth::services::AuthUser,
    error::{bad_request, internal, ApiError},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub inventory_items: Vec<InventoryItem>,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub items: Vec<InventoryItem>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory))
        .route("/inventory/process", post(process_ingredients))
}

fn clean_lines(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[instrument(skip(state, payload))]
pub async fn process_ingredients(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let lines = clean_lines(payload.ingredients);
    if lines.is_empty() {
        return Err(bad_request("Ingredients are required"));
    }

    let drafts = state
        .assistant
        .extract_inventory(&lines)
        .await
        .map_err(internal)?;
    let inventory_items = repo::insert_many(&state.db, user_id, &drafts)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, lines = lines.len(), added = inventory_items.len(), "inventory updated");
    Ok(Json(ProcessResponse {
        success: true,
        message: "Ingredients processed and added to inventory".into(),
        inventory_items,
    }))
}

#[instrument(skip(state))]
pub async fn list_inventory(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<InventoryResponse>, ApiError> {
    let items = repo::list_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(InventoryResponse { items }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_lines_drops_blanks() {
        let lines = clean_lines(vec![" 2 eggs ".into(), "".into(), "  ".into(), "milk".into()]);
        assert_eq!(lines, vec!["2 eggs", "milk"]);
    }
}
