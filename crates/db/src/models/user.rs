use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    /// Agency or company name shown on contracts.
    pub agency_name: Option<String>,
    /// SIREN registration number, printed on generated contracts.
    pub siren: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub account_type: AccountType,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

/// Professional account category.
///
/// `Agent` accounts manage listings and are the only ones allowed to
/// propose collaborations. `ReferralPartner` accounts publish leads and
/// may not receive a commission of 50% or more.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Agent,
    ReferralPartner,
    Admin,
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
