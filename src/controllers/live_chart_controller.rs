use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    error::AppError,
    services::{
        live_chart_service::{clamp_count, normalize_symbol},
        live_poller::PollEvent,
    },
    AppState,
};

use super::{ok, parse_interval, query, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub interval: Option<String>,
    pub count: Option<usize>,
}

// GET /api/live-chart/:symbol?interval=1min&count=100
pub async fn chart(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    q: Result<Query<ChartQuery>, QueryRejection>,
) -> ApiResult {
    let q = query(q)?;
    let interval = parse_interval(q.interval.as_deref())?;
    ok(state.live_chart.chart(&symbol, interval, clamp_count(q.count)).await?)
}

// GET /api/live-chart/:symbol/latest?interval=1min
pub async fn latest(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    q: Result<Query<ChartQuery>, QueryRejection>,
) -> ApiResult {
    let q = query(q)?;
    let interval = parse_interval(q.interval.as_deref())?;
    ok(state.live_chart.latest(&symbol, interval).await?)
}

fn sse_event(evt: &PollEvent) -> Event {
    let name = match evt {
        PollEvent::Update(_) => "update",
        PollEvent::Error(_) => "error",
    };
    Event::default()
        .event(name)
        .data(serde_json::to_string(evt).unwrap_or_default())
}

// GET /api/live-chart/:symbol/stream  (SSE)
pub async fn stream(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Sse<impl futures_util::stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let sym = normalize_symbol(&symbol)?;
    let sub = state.live_hub.subscribe(&sym);
    tracing::info!("live stream opened for {sym}");

    // the newest bar goes out first, the poller's next tick may be minutes away
    let stream = futures_util::stream::unfold((sub.last, sub.rx), |(mut pending, mut rx)| async move {
        if let Some(evt) = pending.take() {
            return Some((Ok(sse_event(&evt)), (pending, rx)));
        }
        loop {
            match rx.recv().await {
                Ok(evt) => return Some((Ok(sse_event(&evt)), (pending, rx))),
                // a slow client just misses bars
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    ))
}

// GET /api/live-chart/status
pub async fn status(State(state): State<AppState>) -> ApiResult {
    ok(json!({
        "service": state.live_chart.status(),
        "streaming": state.live_hub.active_symbols(),
    }))
}

// DELETE /api/live-chart/cache
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult {
    let removed = state.live_chart.clear_cache();
    tracing::info!("live chart cache cleared ({removed} entries)");
    ok(json!({ "removed": removed }))
}

// DELETE /api/live-chart/cache/:symbol
pub async fn invalidate(State(state): State<AppState>, Path(symbol): Path<String>) -> ApiResult {
    let sym = normalize_symbol(&symbol)?;
    ok(json!({ "symbol": sym, "removed": state.live_chart.invalidate(&sym) }))
}
