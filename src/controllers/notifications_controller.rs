use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    Extension, Json, Path, Query, State,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::{CurrentUser, NotificationView},
    services::notification_service::{self, NewNotification},
    AppState,
};

use super::{body, created, ok, parse_id, query, require_user, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<i64>,
}

// GET /api/notifications?unread=true&limit=20
pub async fn list(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    q: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult {
    let u = require_user(user)?;
    let q = query(q)?;

    let items = notification_service::list(&state, u.id, q.unread, q.limit).await?;
    ok(items.into_iter().map(NotificationView::from).collect::<Vec<_>>())
}

// GET /api/notifications/unread-count
pub async fn unread_count(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> ApiResult {
    let u = require_user(user)?;
    ok(json!({ "count": notification_service::unread_count(&state, u.id).await? }))
}

// POST /api/notifications
pub async fn create(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    payload: Result<Json<NewNotification>, JsonRejection>,
) -> ApiResult {
    let u = require_user(user)?;
    let input = body(payload)?;
    created(NotificationView::from(notification_service::create(&state, u.id, input).await?))
}

// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> ApiResult {
    let u = require_user(user)?;
    let id = parse_id(&id)?;
    notification_service::mark_read(&state, u.id, id).await?;
    ok(json!({ "id": id.to_hex(), "read": true }))
}

// POST /api/notifications/read-all
pub async fn mark_all_read(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> ApiResult {
    let u = require_user(user)?;
    ok(json!({ "updated": notification_service::mark_all_read(&state, u.id).await? }))
}

// DELETE /api/notifications/:id
pub async fn delete(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> ApiResult {
    let u = require_user(user)?;
    let id = parse_id(&id)?;
    notification_service::delete(&state, u.id, id).await?;
    ok(json!({ "id": id.to_hex(), "deleted": true }))
}
