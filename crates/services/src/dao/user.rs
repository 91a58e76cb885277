use bson::{doc, oid::ObjectId, DateTime};
use immolink_db::models::{AccountType, User};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        email: String,
        display_name: String,
        password_hash: String,
        account_type: AccountType,
        phone: Option<String>,
        agency_name: Option<String>,
        siren: Option<String>,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            display_name,
            avatar: None,
            phone,
            agency_name,
            siren,
            password_hash: Some(password_hash),
            account_type,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<User> {
        self.base.find_by_id(id).await
    }
}
