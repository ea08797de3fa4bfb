use axum::extract::{rejection::QueryRejection, Path, Query, State};
use serde::Deserialize;

use crate::{
    services::{
        market_data::ScreenerFilter,
        stocks_service::{self, HistoryRange},
    },
    AppState,
};

use super::{ok, parse_interval, query, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

// GET /api/stocks/search?q=rel&limit=10
pub async fn search(State(state): State<AppState>, q: Result<Query<SearchQuery>, QueryRejection>) -> ApiResult {
    let q = query(q)?;
    ok(stocks_service::search(&state, &q.q, q.limit).await?)
}

// GET /api/stocks/:symbol/quote
pub async fn quote(State(state): State<AppState>, Path(symbol): Path<String>) -> ApiResult {
    ok(stocks_service::quote(&state, &symbol).await?)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub range: HistoryRange,
    pub interval: Option<String>,
    pub count: Option<usize>,
}

// GET /api/stocks/:symbol/history?range=intraday|daily&interval=5min&count=100
pub async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    q: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult {
    let q = query(q)?;
    let interval = parse_interval(q.interval.as_deref())?;
    ok(stocks_service::history(&state, &symbol, q.range, interval, q.count).await?)
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

// GET /api/stocks/:symbol/news
pub async fn symbol_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    q: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult {
    let q = query(q)?;
    ok(stocks_service::news(&state, Some(&symbol), q.limit).await?)
}

// GET /api/news
pub async fn market_news(State(state): State<AppState>, q: Result<Query<LimitQuery>, QueryRejection>) -> ApiResult {
    let q = query(q)?;
    ok(stocks_service::news(&state, None, q.limit).await?)
}

// GET /api/stocks/screener?sector=Technology&max_price=500
pub async fn screener(State(state): State<AppState>, q: Result<Query<ScreenerFilter>, QueryRejection>) -> ApiResult {
    let filter = query(q)?;
    ok(stocks_service::screener(&state, filter).await?)
}
