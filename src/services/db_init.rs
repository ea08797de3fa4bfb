use mongodb::{
    bson::doc,
    options::IndexOptions,
    Database, IndexModel,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // portfolios: one per user
    {
        let col = db.collection::<mongodb::bson::Document>("portfolios");
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;
    }

    // orders: history per user, newest first
    {
        let col = db.collection::<mongodb::bson::Document>("orders");
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .build();

        col.create_index(model, None).await?;
    }

    // orders: limit-order monitor scan (status + symbol)
    {
        let col = db.collection::<mongodb::bson::Document>("orders");
        let model = IndexModel::builder()
            .keys(doc! { "status": 1, "symbol": 1 })
            .build();

        col.create_index(model, None).await?;
    }

    // notifications: unread badge and list
    {
        let col = db.collection::<mongodb::bson::Document>("notifications");
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "read": 1, "created_at": -1 })
            .build();

        col.create_index(model, None).await?;
    }

    Ok(())
}
