use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Json, Path, Query, State},
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::{CurrentUser, OrderStatus, OrderView},
    services::{order_validation::OrderInput, trading_service},
    AppState,
};

use super::{body, created, ok, parse_id, query, require_user, ApiResult};

// POST /api/orders/validate
pub async fn validate(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> ApiResult {
    let u = require_user(user)?;
    let input = body(payload)?;
    ok(trading_service::validate(&state, u.id, input).await?)
}

// POST /api/orders
pub async fn place(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> ApiResult {
    let u = require_user(user)?;
    let input = body(payload)?;
    created(trading_service::place_order(&state, u.id, input).await?)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

// GET /api/orders?status=PENDING&limit=50
pub async fn list(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    q: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult {
    let u = require_user(user)?;
    let q = query(q)?;

    let status = match q.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(s.parse::<OrderStatus>().map_err(|e| AppError::field("status", &e))?),
        None => None,
    };

    let orders = trading_service::list_orders(&state, u.id, status, q.limit).await?;
    ok(orders.into_iter().map(OrderView::from).collect::<Vec<_>>())
}

// GET /api/orders/:id
pub async fn get(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> ApiResult {
    let u = require_user(user)?;
    let id = parse_id(&id)?;
    ok(OrderView::from(trading_service::get_order(&state, u.id, id).await?))
}

// POST /api/orders/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> ApiResult {
    let u = require_user(user)?;
    let id = parse_id(&id)?;
    ok(OrderView::from(trading_service::cancel_order(&state, u.id, id).await?))
}
