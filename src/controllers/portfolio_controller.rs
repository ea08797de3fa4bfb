use axum::extract::{rejection::QueryRejection, Extension, Query, State};
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::CurrentUser,
    services::portfolio_service,
    AppState,
};

use super::{ok, query, require_user, ApiResult};

// GET /api/portfolio
pub async fn get_portfolio(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> ApiResult {
    let u = require_user(user)?;
    ok(portfolio_service::summary(&state, u.id).await?)
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<usize>,
}

// GET /api/portfolio/transactions?limit=50
pub async fn transactions(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    q: Result<Query<TransactionsQuery>, QueryRejection>,
) -> ApiResult {
    let u = require_user(user)?;
    let q = query(q)?;
    ok(portfolio_service::transactions(&state, u.id, q.limit).await?)
}

// POST /api/portfolio/reset
pub async fn reset(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> ApiResult {
    let u = require_user(user)?;
    let pf = portfolio_service::reset(&state, u.id).await?;
    ok(json!({ "balance": pf.balance, "holdings": pf.holdings }))
}
