use axum::{
    Json,
    extract::{Path, State},
};
use immolink_db::models::CompletionReason;
use immolink_services::dao::collaboration::{AdminUpdateFields, ForceCloseMode};
use serde::Deserialize;

use crate::{error::ApiError, extractors::auth::AdminUser, state::AppState};

use super::collaboration::{parse_id, to_response, CollaborationResponse};

#[derive(Debug, Deserialize)]
pub struct ForceCloseRequest {
    pub mode: ForceCloseMode,
    pub completion_reason: Option<CompletionReason>,
}

#[derive(Debug, Deserialize)]
pub struct ForceCompleteRequest {
    pub completion_reason: Option<CompletionReason>,
}

pub async fn force_close(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(body): Json<ForceCloseRequest>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state
        .collaborations
        .admin_force_close(admin.0.user_id, id, body.mode, body.completion_reason)
        .await?;
    Ok(Json(to_response(collab)))
}

pub async fn force_complete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(body): Json<ForceCompleteRequest>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state
        .collaborations
        .admin_force_complete(admin.0.user_id, id, body.completion_reason)
        .await?;
    Ok(Json(to_response(collab)))
}

pub async fn update(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(body): Json<AdminUpdateFields>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state
        .collaborations
        .admin_update(admin.0.user_id, id, body)
        .await?;
    Ok(Json(to_response(collab)))
}

pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&id)?;
    state.collaborations.admin_delete(admin.0.user_id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
