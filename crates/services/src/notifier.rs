use bson::{oid::ObjectId, DateTime};
use immolink_db::models::{Notification, NotificationType};
use mongodb::Database;
use tracing::warn;

use crate::dao::base::BaseDao;

/// Fire-and-forget notification channel. Delivery failure must never fail
/// the state transition that triggered it, so `emit` returns nothing and
/// logs instead of propagating.
pub struct Notifier {
    base: BaseDao<Notification>,
}

impl Notifier {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn emit(
        &self,
        recipient_id: ObjectId,
        actor_id: Option<ObjectId>,
        notification_type: NotificationType,
        entity_type: &str,
        entity_id: ObjectId,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Option<bson::Document>,
    ) {
        let notification = Notification {
            id: None,
            recipient_id,
            actor_id,
            notification_type,
            entity_type: entity_type.to_string(),
            entity_id,
            title: title.into(),
            message: message.into(),
            data,
            is_read: false,
            read_at: None,
            created_at: DateTime::now(),
        };

        if let Err(e) = self.base.insert_one(&notification).await {
            warn!(
                recipient = %recipient_id,
                entity = %entity_id,
                ?notification_type,
                error = %e,
                "Failed to emit notification"
            );
        }
    }
}
