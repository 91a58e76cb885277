use bson::{doc, oid::ObjectId, DateTime};
use immolink_db::models::{
    PostRef, PostType, Property, PropertyStatus, SearchAd, SearchAdStatus, TransactionType,
};
use mongodb::Database;
use tracing::info;

use super::base::{BaseDao, DaoError, DaoResult};

/// Resolution of a polymorphic post reference: who owns it, whether it is
/// still live, and (for properties) the transaction type driving the
/// completion status flip.
#[derive(Debug, Clone)]
pub struct ResolvedPost {
    pub owner_id: ObjectId,
    pub title: String,
    pub archived: bool,
    pub transaction_type: Option<TransactionType>,
}

pub struct PostDao {
    pub properties: BaseDao<Property>,
    pub search_ads: BaseDao<SearchAd>,
}

impl PostDao {
    pub fn new(db: &Database) -> Self {
        Self {
            properties: BaseDao::new(db, Property::COLLECTION),
            search_ads: BaseDao::new(db, SearchAd::COLLECTION),
        }
    }

    pub async fn create_property(
        &self,
        owner_id: ObjectId,
        title: String,
        city: Option<String>,
        price: Option<f64>,
        transaction_type: TransactionType,
    ) -> DaoResult<Property> {
        let now = DateTime::now();
        let property = Property {
            id: None,
            owner_id,
            title,
            city,
            price,
            transaction_type,
            status: PropertyStatus::Active,
            is_archived: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = self.properties.insert_one(&property).await?;
        self.properties.find_by_id(id).await
    }

    pub async fn create_search_ad(
        &self,
        owner_id: ObjectId,
        title: String,
        city: Option<String>,
        budget: Option<f64>,
    ) -> DaoResult<SearchAd> {
        let now = DateTime::now();
        let ad = SearchAd {
            id: None,
            owner_id,
            title,
            city,
            budget,
            status: SearchAdStatus::Active,
            is_archived: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = self.search_ads.insert_one(&ad).await?;
        self.search_ads.find_by_id(id).await
    }

    /// Resolves a post reference to its owner and liveness. A missing or
    /// hard-deleted post is `NotFound`; archival is reported, not an error,
    /// since the caller decides whether archived means gone.
    pub async fn resolve(&self, post_ref: PostRef) -> DaoResult<ResolvedPost> {
        match post_ref.post_type {
            PostType::Property => {
                let property = self
                    .properties
                    .find_one(doc! { "_id": post_ref.post_id, "deleted_at": null })
                    .await?
                    .ok_or(DaoError::NotFound)?;
                Ok(ResolvedPost {
                    owner_id: property.owner_id,
                    title: property.title,
                    archived: property.is_archived,
                    transaction_type: Some(property.transaction_type),
                })
            }
            PostType::SearchAd => {
                let ad = self
                    .search_ads
                    .find_one(doc! { "_id": post_ref.post_id, "deleted_at": null })
                    .await?
                    .ok_or(DaoError::NotFound)?;
                Ok(ResolvedPost {
                    owner_id: ad.owner_id,
                    title: ad.title,
                    archived: ad.is_archived,
                    transaction_type: None,
                })
            }
        }
    }

    /// Flips the post's status after a collaboration concluded the deal:
    /// sold/rented for properties (by transaction type), fulfilled for
    /// search ads. One-way, best-effort write; the collaboration save has
    /// already committed when this runs.
    pub async fn mark_completed(&self, post_ref: PostRef) -> DaoResult<()> {
        match post_ref.post_type {
            PostType::Property => {
                let property = self.properties.find_by_id(post_ref.post_id).await?;
                let status = match property.transaction_type {
                    TransactionType::Sale => PropertyStatus::Sold,
                    TransactionType::Rental => PropertyStatus::Rented,
                };
                self.properties
                    .update_by_id(
                        post_ref.post_id,
                        doc! { "$set": { "status": bson::to_bson(&status)? } },
                    )
                    .await?;
                info!(post_id = %post_ref.post_id, ?status, "Property status updated after collaboration completion");
            }
            PostType::SearchAd => {
                self.search_ads
                    .update_by_id(
                        post_ref.post_id,
                        doc! { "$set": { "status": "fulfilled" } },
                    )
                    .await?;
                info!(post_id = %post_ref.post_id, "Search ad fulfilled after collaboration completion");
            }
        }
        Ok(())
    }
}
