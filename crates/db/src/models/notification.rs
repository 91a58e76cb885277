use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub recipient_id: ObjectId,
    pub actor_id: Option<ObjectId>,
    pub notification_type: NotificationType,
    pub entity_type: String,
    pub entity_id: ObjectId,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: Option<bson::Document>,
    #[serde(default)]
    pub is_read: bool,
    pub read_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    CollaborationProposal,
    CollaborationResponse,
    ContractUpdated,
    ContractSigned,
    CollaborationActivated,
    ProgressUpdate,
    NoteAdded,
    CollaborationCompleted,
    CollaborationCancelled,
    AdminAction,
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";
}
