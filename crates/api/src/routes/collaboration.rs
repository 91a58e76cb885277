use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use immolink_db::models::{
    step_title, ActivityType, Collaboration, CollaborationStatus, CompensationType,
    CompletionReason, ParticipantRole, PostRef, PostType,
};
use immolink_services::dao::collaboration::{ProposalTerms, ResponseDecision};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    pub post_type: PostType,
    pub post_id: String,
    pub proposed_commission: Option<f64>,
    pub compensation_type: Option<CompensationType>,
    pub compensation_amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub decision: ResponseDecision,
}

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub step: String,
    pub validated_by: ParticipantRole,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub completion_reason: CompletionReason,
}

#[derive(Debug, Serialize)]
pub struct CollaborationResponse {
    pub id: String,
    pub post_type: PostType,
    pub post_id: String,
    pub post_owner_id: String,
    pub collaborator_id: String,
    pub proposed_commission: Option<f64>,
    pub compensation_type: Option<CompensationType>,
    pub compensation_amount: Option<f64>,
    pub status: CollaborationStatus,
    pub current_step: String,
    pub owner_signed: bool,
    pub collaborator_signed: bool,
    pub contract_modified: bool,
    pub progress_steps: Vec<ProgressStepResponse>,
    pub completion_reason: Option<CompletionReason>,
    pub completed_by_role: Option<ParticipantRole>,
    pub activities: Vec<ActivityResponse>,
    pub version: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ProgressStepResponse {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub owner_validated: bool,
    pub collaborator_validated: bool,
    pub notes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activity_type: ActivityType,
    pub message: String,
    pub created_by: String,
    pub created_at: String,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CollaborationResponse>>, ApiError> {
    let collabs = state.collaborations.find_for_user(auth.user_id).await?;
    Ok(Json(collabs.into_iter().map(to_response).collect()))
}

pub async fn propose(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProposeRequest>,
) -> Result<(StatusCode, Json<CollaborationResponse>), ApiError> {
    let post_id = ObjectId::parse_str(&body.post_id)
        .map_err(|_| ApiError::BadRequest("Invalid post_id".to_string()))?;

    let actor = state.users.find_by_id(auth.user_id).await?;

    let collab = state
        .collaborations
        .propose(
            &actor,
            PostRef {
                post_type: body.post_type,
                post_id,
            },
            ProposalTerms {
                proposed_commission: body.proposed_commission,
                compensation_type: body.compensation_type,
                compensation_amount: body.compensation_amount,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(collab))))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state
        .collaborations
        .find_by_id_for(auth.user_id, auth.is_admin(), id)
        .await?;
    Ok(Json(to_response(collab)))
}

pub async fn by_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((post_type, post_id)): Path<(String, String)>,
) -> Result<Json<Vec<CollaborationResponse>>, ApiError> {
    let post_type = match post_type.as_str() {
        "property" => PostType::Property,
        "search_ad" => PostType::SearchAd,
        _ => return Err(ApiError::BadRequest("Invalid post type".to_string())),
    };
    let post_id = ObjectId::parse_str(&post_id)
        .map_err(|_| ApiError::BadRequest("Invalid post_id".to_string()))?;

    let collabs = state
        .collaborations
        .find_by_post(
            auth.user_id,
            auth.is_admin(),
            PostRef { post_type, post_id },
        )
        .await?;
    Ok(Json(collabs.into_iter().map(to_response).collect()))
}

pub async fn respond(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<RespondRequest>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state
        .collaborations
        .respond(auth.user_id, id, body.decision)
        .await?;
    Ok(Json(to_response(collab)))
}

pub async fn add_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AddNoteRequest>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state
        .collaborations
        .add_note(auth.user_id, id, body.content)
        .await?;
    Ok(Json(to_response(collab)))
}

pub async fn update_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateProgressRequest>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state
        .collaborations
        .update_progress(auth.user_id, id, &body.step, body.validated_by, body.note)
        .await?;
    Ok(Json(to_response(collab)))
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state.collaborations.cancel(auth.user_id, id).await?;
    Ok(Json(to_response(collab)))
}

pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CompleteRequest>,
) -> Result<Json<CollaborationResponse>, ApiError> {
    let id = parse_id(&id)?;
    let collab = state
        .collaborations
        .complete(auth.user_id, id, body.completion_reason)
        .await?;
    Ok(Json(to_response(collab)))
}

pub(crate) fn parse_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid collaboration id".to_string()))
}

pub(crate) fn to_response(c: Collaboration) -> CollaborationResponse {
    CollaborationResponse {
        id: c.id.unwrap().to_hex(),
        post_type: c.post_ref.post_type,
        post_id: c.post_ref.post_id.to_hex(),
        post_owner_id: c.post_owner_id.to_hex(),
        collaborator_id: c.collaborator_id.to_hex(),
        proposed_commission: c.proposed_commission,
        compensation_type: c.compensation_type,
        compensation_amount: c.compensation_amount,
        status: c.status,
        current_step: c.current_step,
        owner_signed: c.owner_signed,
        collaborator_signed: c.collaborator_signed,
        contract_modified: c.contract_modified,
        progress_steps: c
            .progress_steps
            .into_iter()
            .map(|s| ProgressStepResponse {
                title: step_title(&s.id).unwrap_or_default().to_string(),
                id: s.id,
                completed: s.completed,
                owner_validated: s.owner_validated,
                collaborator_validated: s.collaborator_validated,
                notes: s.notes,
            })
            .collect(),
        completion_reason: c.completion_reason,
        completed_by_role: c.completed_by_role,
        activities: c
            .activities
            .into_iter()
            .map(|a| ActivityResponse {
                activity_type: a.activity_type,
                message: a.message,
                created_by: a.created_by.to_hex(),
                created_at: a.created_at.try_to_rfc3339_string().unwrap_or_default(),
            })
            .collect(),
        version: c.version,
        created_at: c.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}
