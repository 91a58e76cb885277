use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index(bson::doc! { "account_type": 1 }),
        ],
    )
    .await?;

    // Properties
    create_indexes(
        db,
        "properties",
        vec![
            index(bson::doc! { "owner_id": 1 }),
            index(bson::doc! { "status": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Search Ads
    create_indexes(
        db,
        "search_ads",
        vec![
            index(bson::doc! { "owner_id": 1 }),
            index(bson::doc! { "status": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Collaborations. The partial unique index is the storage-level
    // backstop for proposal exclusivity: at most one collaboration per
    // post in a live lifecycle state, no matter how many proposals race.
    create_indexes(
        db,
        "collaborations",
        vec![
            index_unique_partial(
                bson::doc! { "post_ref.post_id": 1 },
                bson::doc! { "status": { "$in": ["pending", "accepted", "active"] } },
            ),
            index(bson::doc! { "collaborator_id": 1, "created_at": -1 }),
            index(bson::doc! { "post_owner_id": 1, "created_at": -1 }),
            index(bson::doc! { "status": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        "notifications",
        vec![
            index(bson::doc! { "recipient_id": 1, "is_read": 1, "created_at": -1 }),
            index(bson::doc! { "entity_id": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn index_unique_partial(keys: bson::Document, filter: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(filter)
                .build(),
        )
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
