use axum::{Json, extract::State, http::StatusCode};
use immolink_db::models::TransactionType;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub title: String,
    pub city: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub transaction_type: TransactionType,
}

#[derive(Debug, Deserialize)]
pub struct CreateSearchAdRequest {
    pub title: String,
    pub city: Option<String>,
    pub budget: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub status: String,
}

pub async fn create_property(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let property = state
        .posts
        .create_property(
            auth.user_id,
            body.title,
            body.city,
            body.price,
            body.transaction_type,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            id: property.id.unwrap().to_hex(),
            owner_id: property.owner_id.to_hex(),
            title: property.title,
            status: format!("{:?}", property.status).to_lowercase(),
        }),
    ))
}

pub async fn create_search_ad(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateSearchAdRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let ad = state
        .posts
        .create_search_ad(auth.user_id, body.title, body.city, body.budget)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            id: ad.id.unwrap().to_hex(),
            owner_id: ad.owner_id.to_hex(),
            title: ad.title,
            status: format!("{:?}", ad.status).to_lowercase(),
        }),
    ))
}
