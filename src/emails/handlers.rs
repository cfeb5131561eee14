use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{ScheduleRequest, ScheduledListResponse, ScheduledResponse, SweepResponse};
use super::repo::{self, GROCERY_LIST};
use super::services::sweep_due;
use crate::{
    auth::{dto::MessageResponse, services::AuthUser},
    error::{internal, not_found, ApiError},
    grocery::repo as grocery_repo,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/grocery-list/schedule", post(schedule))
        .route("/grocery-list/schedule/:id", delete(cancel))
        .route("/grocery-list/scheduled", get(list_scheduled))
        .route("/grocery-list/process-scheduled", post(process_mine))
        .route("/cron/process-scheduled-emails", get(process_all))
}

/// True when `headers` carry `Authorization: Bearer <secret>`. An unset
/// secret never matches.
pub fn cron_authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return false;
    };
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret)
}

#[instrument(skip(state, payload))]
pub async fn schedule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ScheduleRequest>,
) -> Result<Json<ScheduledResponse>, ApiError> {
    let list = grocery_repo::find(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Grocery list not found"))?;

    let data = json!({ "groceryList": list.items });
    let row = repo::create(&state.db, user_id, GROCERY_LIST, payload.scheduled_for, &data)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, email_id = %row.id, scheduled_for = %row.scheduled_for, "email scheduled");
    Ok(Json(ScheduledResponse {
        message: "Email scheduled successfully".into(),
        id: row.id,
        scheduled_for: row.scheduled_for,
    }))
}

#[instrument(skip(state))]
pub async fn list_scheduled(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ScheduledListResponse>, ApiError> {
    let scheduled_emails = repo::list_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(ScheduledListResponse { scheduled_emails }))
}

#[instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !repo::delete_for_user(&state.db, user_id, id)
        .await
        .map_err(internal)?
    {
        return Err(not_found("Scheduled email not found"));
    }
    info!(user_id = %user_id, email_id = %id, "scheduled email cancelled");
    Ok(Json(MessageResponse {
        message: "Scheduled email cancelled successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn process_mine(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SweepResponse>, ApiError> {
    let results = sweep_due(&state, Some(user_id)).await.map_err(internal)?;
    Ok(Json(results.into()))
}

#[instrument(skip(state, headers))]
pub async fn process_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepResponse>, ApiError> {
    if !cron_authorized(&headers, state.config.cron_secret.as_deref()) {
        warn!("cron sweep with bad or missing secret");
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized".into()));
    }
    let results = sweep_due(&state, None).await.map_err(internal)?;
    Ok(Json(results.into()))
}
