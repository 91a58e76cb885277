use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Buyer-side search request. The counterpart of a [`super::Property`]
/// listing as the subject of a collaboration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAd {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner_id: ObjectId,
    pub title: String,
    pub city: Option<String>,
    pub budget: Option<f64>,
    #[serde(default)]
    pub status: SearchAdStatus,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchAdStatus {
    #[default]
    Active,
    Fulfilled,
}

impl SearchAd {
    pub const COLLECTION: &'static str = "search_ads";
}
