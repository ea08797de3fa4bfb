use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::FindOptions;
use serde::Deserialize;

use crate::{
    error::AppError,
    events,
    models::{Notification, NotificationKind},
    AppState,
};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    #[serde(default, rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
}

fn collection(state: &AppState) -> mongodb::Collection<Notification> {
    state.db.collection::<Notification>("notifications")
}

fn changed(state: &AppState, user_id: ObjectId) {
    events::publish(&state.events_tx, user_id, &[events::NOTIFICATIONS_UPDATED]);
}

pub async fn list(
    state: &AppState,
    user_id: ObjectId,
    unread_only: bool,
    limit: Option<i64>,
) -> Result<Vec<Notification>, AppError> {
    let mut filter = doc! { "user_id": user_id };
    if unread_only {
        filter.insert("read", false);
    }

    let opts = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .limit(limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
        .build();

    let mut cursor = collection(state).find(filter, opts).await?;

    let mut items: Vec<Notification> = Vec::new();
    while let Some(res) = cursor.next().await {
        items.push(res?);
    }
    Ok(items)
}

pub async fn unread_count(state: &AppState, user_id: ObjectId) -> Result<u64, AppError> {
    let n = collection(state)
        .count_documents(doc! { "user_id": user_id, "read": false }, None)
        .await?;
    Ok(n)
}

/// Stores a notification for `user_id` and tells their open event streams.
pub async fn notify(
    state: &AppState,
    user_id: ObjectId,
    kind: NotificationKind,
    title: &str,
    message: &str,
) -> Result<Notification, AppError> {
    let n = Notification {
        id: ObjectId::new(),
        user_id,
        kind,
        title: title.to_string(),
        message: message.to_string(),
        read: false,
        created_at: Utc::now().timestamp(),
    };

    collection(state).insert_one(&n, None).await?;
    changed(state, user_id);
    Ok(n)
}

/// Like [`notify`] but only logs on failure; used after a trade already
/// went through.
pub async fn notify_quietly(state: &AppState, user_id: ObjectId, kind: NotificationKind, title: &str, message: &str) {
    if let Err(e) = notify(state, user_id, kind, title, message).await {
        tracing::warn!("could not store notification for {user_id}: {e}");
    }
}

pub async fn create(state: &AppState, user_id: ObjectId, input: NewNotification) -> Result<Notification, AppError> {
    let title = input.title.trim();
    let message = input.message.trim();

    if title.is_empty() {
        return Err(AppError::field("title", "Title is required."));
    }
    if message.is_empty() {
        return Err(AppError::field("message", "Message is required."));
    }

    notify(state, user_id, input.kind, title, message).await
}

pub async fn mark_read(state: &AppState, user_id: ObjectId, id: ObjectId) -> Result<(), AppError> {
    let res = collection(state)
        .update_one(
            doc! { "_id": id, "user_id": user_id },
            doc! { "$set": { "read": true } },
            None,
        )
        .await?;

    if res.matched_count == 0 {
        return Err(AppError::NotFound("Notification not found".into()));
    }

    changed(state, user_id);
    Ok(())
}

pub async fn mark_all_read(state: &AppState, user_id: ObjectId) -> Result<u64, AppError> {
    let filter: Document = doc! { "user_id": user_id, "read": false };
    let res = collection(state)
        .update_many(filter, doc! { "$set": { "read": true } }, None)
        .await?;

    if res.modified_count > 0 {
        changed(state, user_id);
    }
    Ok(res.modified_count)
}

pub async fn delete(state: &AppState, user_id: ObjectId, id: ObjectId) -> Result<(), AppError> {
    let res = collection(state)
        .delete_one(doc! { "_id": id, "user_id": user_id }, None)
        .await?;

    if res.deleted_count == 0 {
        return Err(AppError::NotFound("Notification not found".into()));
    }

    changed(state, user_id);
    Ok(())
}
