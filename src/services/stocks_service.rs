use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{Candle, DataSource},
    AppState,
};

use super::{
    live_chart_service::{clamp_count, normalize_symbol},
    market_data::{ChartInterval, NewsItem, ProviderError, Quote, ScreenerFilter, ScreenerItem, SearchHit},
    mock_data,
};

const DAY_SECS: i64 = 86_400;

fn unavailable(what: &str) -> AppError {
    AppError::ServiceUnavailable(format!("{what} is unavailable: no market data key is configured"))
}

fn provider_failed(symbol: &str, e: ProviderError) -> AppError {
    match e {
        ProviderError::Empty(_) => AppError::NotFound(format!("No data for {symbol}")),
        other => AppError::Provider(other),
    }
}

/// Quote through the short-lived cache. 503 when FMP is not configured.
pub async fn quote(state: &AppState, symbol: &str) -> Result<Quote, AppError> {
    let sym = normalize_symbol(symbol)?;
    let key = format!("quote:{sym}");

    if let Some(q) = state.quote_cache.get(&key) {
        return Ok(q);
    }
    if !state.market.has_fmp_key() {
        return Err(unavailable("Quote"));
    }

    let q = state.market.quote(&sym).await.map_err(|e| provider_failed(&sym, e))?;
    state.quote_cache.insert(key, q.clone());
    Ok(q)
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarketPrice {
    pub price: f64,
    pub source: DataSource,
}

/// Best current price: cached or fresh quote, then the newest chart candle
/// (which may be mock data).
pub async fn current_price(state: &AppState, symbol: &str) -> Result<MarketPrice, AppError> {
    let sym = normalize_symbol(symbol)?;

    if state.market.has_fmp_key() || state.quote_cache.get(&format!("quote:{sym}")).is_some() {
        match quote(state, &sym).await {
            Ok(q) if q.price.is_finite() && q.price > 0.0 => {
                return Ok(MarketPrice { price: q.price, source: DataSource::Fmp });
            }
            Ok(_) => tracing::warn!("quote for {sym} had no usable price"),
            Err(e) => tracing::warn!("quote for {sym} failed, using chart price: {e}"),
        }
    }

    let live = state.live_chart.latest(&sym, ChartInterval::OneMin).await?;
    Ok(MarketPrice {
        price: live.candle.close,
        source: live.source,
    })
}

pub async fn search(state: &AppState, query: &str, limit: Option<usize>) -> Result<Vec<SearchHit>, AppError> {
    let q = query.trim();
    if q.is_empty() {
        return Ok(vec![]);
    }

    let limit = limit.unwrap_or(10).clamp(1, 50);
    let key = format!("search:{}:{limit}", q.to_lowercase());

    if let Some(hits) = state.search_cache.get(&key) {
        return Ok(hits);
    }
    if !state.market.has_fmp_key() {
        return Err(unavailable("Search"));
    }

    let hits: Vec<SearchHit> = state
        .market
        .search(q, limit)
        .await?
        .into_iter()
        .filter(|h| !h.symbol.trim().is_empty())
        .collect();

    state.search_cache.insert(key, hits.clone());
    Ok(hits)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRange {
    #[default]
    Intraday,
    Daily,
}

#[derive(Debug, Clone, Serialize)]
pub struct History {
    pub symbol: String,
    pub range: HistoryRange,
    pub interval: Option<ChartInterval>,
    pub candles: Vec<Candle>,
    pub source: DataSource,
    pub cached: bool,
}

pub async fn history(
    state: &AppState,
    symbol: &str,
    range: HistoryRange,
    interval: ChartInterval,
    count: Option<usize>,
) -> Result<History, AppError> {
    let sym = normalize_symbol(symbol)?;
    let count = clamp_count(count);

    if range == HistoryRange::Intraday {
        let snap = state.live_chart.chart(&sym, interval, count).await?;
        return Ok(History {
            symbol: snap.symbol,
            range,
            interval: Some(snap.interval),
            candles: snap.candles,
            source: snap.source,
            cached: snap.cached,
        });
    }

    if state.market.has_fmp_key() {
        match state.market.daily_candles(&sym, count).await {
            Ok(candles) => {
                return Ok(History {
                    symbol: sym,
                    range,
                    interval: None,
                    candles,
                    source: DataSource::Fmp,
                    cached: false,
                });
            }
            Err(e) => tracing::warn!("FMP daily history for {sym} failed: {e}"),
        }
    }

    tracing::warn!("serving mock daily history for {sym}");
    let candles = mock_data::generate_candles(&sym, DAY_SECS, count, Utc::now().timestamp());
    Ok(History {
        symbol: sym,
        range,
        interval: None,
        candles,
        source: DataSource::Mock,
        cached: false,
    })
}

pub async fn news(state: &AppState, symbol: Option<&str>, limit: Option<usize>) -> Result<Vec<NewsItem>, AppError> {
    let sym = symbol.map(normalize_symbol).transpose()?;
    if !state.market.has_fmp_key() {
        return Err(unavailable("News"));
    }

    let limit = limit.unwrap_or(20).clamp(1, 100);
    Ok(state.market.news(sym.as_deref(), limit).await?)
}

pub async fn screener(state: &AppState, mut filter: ScreenerFilter) -> Result<Vec<ScreenerItem>, AppError> {
    if !state.market.has_fmp_key() {
        return Err(unavailable("Screener"));
    }

    filter.limit = filter.limit.clamp(1, 100);
    Ok(state.market.screener(&filter).await?)
}
