use axum::{
    Json,
    extract::{Path, State},
};
use immolink_services::contract::ContractView;
use serde::Deserialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::collaboration::parse_id;

#[derive(Debug, Deserialize)]
pub struct UpdateContractRequest {
    #[serde(default)]
    pub contract_text: String,
    #[serde(default)]
    pub additional_terms: String,
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ContractView>, ApiError> {
    let id = parse_id(&id)?;
    let view = state.contracts.get_or_init(auth.user_id, id).await?;
    Ok(Json(view))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateContractRequest>,
) -> Result<Json<ContractView>, ApiError> {
    let id = parse_id(&id)?;
    let view = state
        .contracts
        .update(auth.user_id, id, body.contract_text, body.additional_terms)
        .await?;
    Ok(Json(view))
}

pub async fn sign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ContractView>, ApiError> {
    let id = parse_id(&id)?;
    let view = state.contracts.sign(auth.user_id, id).await?;
    Ok(Json(view))
}
