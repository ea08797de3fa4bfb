use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::models::Candle;

const FMP_BASE: &str = "https://financialmodelingprep.com/api/v3";
const TWELVE_DATA_BASE: &str = "https://api.twelvedata.com";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} API key is not configured")]
    MissingKey(&'static str),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("key rejected: {0}")]
    Unauthorized(String),

    #[error("upstream returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("no data for {0}")]
    Empty(String),
}

impl ProviderError {
    /// The current key is spent; the next key may still work.
    pub fn rotates_key(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Unauthorized(_))
    }

    /// Worth retrying with the same key after a pause.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(body),
            s => Self::Http { status: s.as_u16(), body },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChartInterval {
    #[default]
    #[serde(rename = "1min")]
    OneMin,
    #[serde(rename = "5min")]
    FiveMin,
    #[serde(rename = "15min")]
    FifteenMin,
    #[serde(rename = "30min")]
    ThirtyMin,
    #[serde(rename = "1hour")]
    OneHour,
    #[serde(rename = "4hour")]
    FourHour,
}

impl ChartInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMin => "1min",
            Self::FiveMin => "5min",
            Self::FifteenMin => "15min",
            Self::ThirtyMin => "30min",
            Self::OneHour => "1hour",
            Self::FourHour => "4hour",
        }
    }

    fn twelve_data(&self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::FourHour => "4h",
            other => other.as_str(),
        }
    }

    pub fn seconds(&self) -> i64 {
        match self {
            Self::OneMin => 60,
            Self::FiveMin => 300,
            Self::FifteenMin => 900,
            Self::ThirtyMin => 1_800,
            Self::OneHour => 3_600,
            Self::FourHour => 14_400,
        }
    }
}

impl FromStr for ChartInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1min" | "1m" => Ok(Self::OneMin),
            "5min" | "5m" => Ok(Self::FiveMin),
            "15min" | "15m" => Ok(Self::FifteenMin),
            "30min" | "30m" => Ok(Self::ThirtyMin),
            "1hour" | "1h" | "60min" => Ok(Self::OneHour),
            "4hour" | "4h" => Ok(Self::FourHour),
            other => Err(format!("unsupported interval: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

/// Financial Modeling Prep with Twelve Data as the secondary source.
///
/// FMP keys are tried in turn: a key that is rate limited or rejected moves
/// the shared cursor to the next key, so later calls start from a key that
/// still works.
#[derive(Clone)]
pub struct MarketDataClient {
    http: Client,
    fmp_keys: Arc<Vec<String>>,
    fmp_cursor: Arc<AtomicUsize>,
    twelve_data_key: String,
    fmp_base: String,
    twelve_data_base: String,
    retry: RetryPolicy,
}

impl MarketDataClient {
    pub fn new(settings: &Settings) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs.max(1)))
            .build()
            .unwrap_or_default();

        Self {
            http,
            fmp_keys: Arc::new(settings.fmp_api_keys.clone()),
            fmp_cursor: Arc::new(AtomicUsize::new(0)),
            twelve_data_key: settings.twelve_data_api_key.clone(),
            fmp_base: FMP_BASE.to_string(),
            twelve_data_base: TWELVE_DATA_BASE.to_string(),
            retry: RetryPolicy {
                retries: settings.provider_retries,
                backoff: Duration::from_millis(settings.provider_backoff_ms),
            },
        }
    }

    /// Points both providers somewhere else, e.g. a proxy or a local stand-in.
    pub fn with_endpoints(mut self, fmp_base: &str, twelve_data_base: &str) -> Self {
        self.fmp_base = fmp_base.trim_end_matches('/').to_string();
        self.twelve_data_base = twelve_data_base.trim_end_matches('/').to_string();
        self
    }

    pub fn has_fmp_key(&self) -> bool {
        !self.fmp_keys.is_empty()
    }

    pub fn has_twelve_data_key(&self) -> bool {
        !self.twelve_data_key.trim().is_empty()
    }

    pub fn fmp_key_count(&self) -> usize {
        self.fmp_keys.len()
    }

    pub fn active_key_index(&self) -> usize {
        match self.fmp_keys.len() {
            0 => 0,
            n => self.fmp_cursor.load(Ordering::Relaxed) % n,
        }
    }

    fn rotate_key(&self, from: usize) {
        let n = self.fmp_keys.len();
        if n < 2 {
            return;
        }
        // only the first caller to see this key fail advances the cursor
        let _ = self
            .fmp_cursor
            .compare_exchange(from, (from + 1) % n, Ordering::Relaxed, Ordering::Relaxed);
        tracing::warn!("FMP key #{from} exhausted, rotating to #{}", (from + 1) % n);
    }

    async fn send_once(&self, url: &str, query: &[(&str, String)]) -> Result<serde_json::Value, ProviderError> {
        let res = self.http.get(url).query(query).send().await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let value = res.json::<serde_json::Value>().await?;
        Ok(value)
    }

    async fn send_with_retry(&self, url: &str, query: &[(&str, String)]) -> Result<serde_json::Value, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.send_once(url, query).await {
                Err(e) if e.is_transient() && attempt < self.retry.retries => {
                    attempt += 1;
                    tracing::warn!("market data request failed ({e}), retry {attempt}/{}", self.retry.retries);
                    tokio::time::sleep(self.retry.backoff).await;
                }
                other => return other,
            }
        }
    }

    async fn fmp_get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ProviderError> {
        if !self.has_fmp_key() {
            return Err(ProviderError::MissingKey("FMP"));
        }

        let url = format!("{}/{}", self.fmp_base, path.trim_start_matches('/'));
        let mut last_err = ProviderError::MissingKey("FMP");

        for _ in 0..self.fmp_keys.len() {
            let idx = self.active_key_index();
            let mut q: Vec<(&str, String)> = query.to_vec();
            q.push(("apikey", self.fmp_keys[idx].clone()));

            let result = self
                .send_with_retry(&url, &q)
                .await
                .and_then(check_fmp_body);

            match result {
                Ok(v) => return serde_json::from_value::<T>(v).map_err(|e| ProviderError::Decode(e.to_string())),
                Err(e) if e.rotates_key() => {
                    self.rotate_key(idx);
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err)
    }

    async fn twelve_data_get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ProviderError> {
        if !self.has_twelve_data_key() {
            return Err(ProviderError::MissingKey("Twelve Data"));
        }

        let url = format!("{}/{}", self.twelve_data_base, path.trim_start_matches('/'));
        let mut q: Vec<(&str, String)> = query.to_vec();
        q.push(("apikey", self.twelve_data_key.clone()));

        let v = self.send_with_retry(&url, &q).await?;

        // errors come back as 200 with {"status":"error","code":429,...}
        if v.get("status").and_then(|s| s.as_str()) == Some("error") {
            let code = v.get("code").and_then(|c| c.as_u64()).unwrap_or(500) as u16;
            let msg = v.get("message").and_then(|m| m.as_str()).unwrap_or_default().to_string();
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY);
            return Err(ProviderError::from_status(status, msg));
        }

        serde_json::from_value::<T>(v).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    pub async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let items: Vec<Quote> = self.fmp_get(&format!("quote/{symbol}"), &[]).await?;
        items
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Empty(symbol.to_string()))
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ProviderError> {
        self.fmp_get("search", &[("query", query.to_string()), ("limit", limit.to_string())])
            .await
    }

    pub async fn intraday_candles(
        &self,
        symbol: &str,
        interval: ChartInterval,
        count: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let bars: Vec<FmpBar> = self
            .fmp_get(&format!("historical-chart/{}/{symbol}", interval.as_str()), &[])
            .await?;

        finish_candles(symbol, bars.iter().filter_map(FmpBar::to_candle).collect(), count)
    }

    pub async fn daily_candles(&self, symbol: &str, count: usize) -> Result<Vec<Candle>, ProviderError> {
        let full: FmpDailyHistory = self
            .fmp_get(
                &format!("historical-price-full/{symbol}"),
                &[("timeseries", count.to_string())],
            )
            .await?;

        finish_candles(symbol, full.historical.iter().filter_map(FmpBar::to_candle).collect(), count)
    }

    pub async fn twelve_data_candles(
        &self,
        symbol: &str,
        interval: ChartInterval,
        count: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let series: TwelveDataSeries = self
            .twelve_data_get(
                "time_series",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.twelve_data().to_string()),
                    ("outputsize", count.to_string()),
                ],
            )
            .await?;

        finish_candles(symbol, series.values.iter().filter_map(TwelveDataBar::to_candle).collect(), count)
    }

    pub async fn news(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<NewsItem>, ProviderError> {
        let mut q = vec![("limit", limit.to_string())];
        if let Some(s) = symbol {
            q.push(("tickers", s.to_string()));
        }
        self.fmp_get("stock_news", &q).await
    }

    pub async fn screener(&self, filter: &ScreenerFilter) -> Result<Vec<ScreenerItem>, ProviderError> {
        let mut q = vec![("limit", filter.limit.to_string())];
        if let Some(s) = &filter.sector {
            q.push(("sector", s.clone()));
        }
        if let Some(m) = filter.min_market_cap {
            q.push(("marketCapMoreThan", m.to_string()));
        }
        if let Some(p) = filter.max_price {
            q.push(("priceLowerThan", p.to_string()));
        }
        if let Some(e) = &filter.exchange {
            q.push(("exchange", e.clone()));
        }
        self.fmp_get("stock-screener", &q).await
    }
}

/// FMP reports some failures as 200 with an `Error Message` body.
fn check_fmp_body(v: serde_json::Value) -> Result<serde_json::Value, ProviderError> {
    let Some(msg) = v.get("Error Message").and_then(|m| m.as_str()) else {
        return Ok(v);
    };

    let lower = msg.to_lowercase();
    if lower.contains("limit") {
        Err(ProviderError::RateLimited(msg.to_string()))
    } else if lower.contains("api key") || lower.contains("apikey") {
        Err(ProviderError::Unauthorized(msg.to_string()))
    } else {
        Err(ProviderError::Http { status: 400, body: msg.to_string() })
    }
}

/// Sorts ascending, drops duplicate timestamps, keeps the newest `count`.
fn finish_candles(symbol: &str, mut candles: Vec<Candle>, count: usize) -> Result<Vec<Candle>, ProviderError> {
    candles.sort_by_key(|c| c.time);
    candles.dedup_by_key(|c| c.time);

    if candles.is_empty() {
        return Err(ProviderError::Empty(symbol.to_string()));
    }
    if candles.len() > count {
        candles.drain(..candles.len() - count);
    }
    Ok(candles)
}

fn parse_timestamp(s: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub changes_percentage: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub day_low: Option<f64>,
    #[serde(default)]
    pub day_high: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub stock_exchange: Option<String>,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerItem {
    pub symbol: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreenerFilter {
    pub sector: Option<String>,
    pub exchange: Option<String>,
    pub min_market_cap: Option<f64>,
    pub max_price: Option<f64>,
    #[serde(default = "default_screener_limit")]
    pub limit: usize,
}

fn default_screener_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
struct FmpBar {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

impl FmpBar {
    fn to_candle(&self) -> Option<Candle> {
        Some(Candle {
            time: parse_timestamp(&self.date)?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume.max(0.0) as u64,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FmpDailyHistory {
    #[serde(default)]
    historical: Vec<FmpBar>,
}

#[derive(Debug, Deserialize)]
struct TwelveDataSeries {
    #[serde(default)]
    values: Vec<TwelveDataBar>,
}

// Twelve Data sends every number as a string
#[derive(Debug, Deserialize)]
struct TwelveDataBar {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

impl TwelveDataBar {
    fn to_candle(&self) -> Option<Candle> {
        Some(Candle {
            time: parse_timestamp(&self.datetime)?,
            open: self.open.parse().ok()?,
            high: self.high.parse().ok()?,
            low: self.low.parse().ok()?,
            close: self.close.parse().ok()?,
            volume: self
                .volume
                .as_deref()
                .and_then(|v| v.parse::<f64>().ok())
                .map(|v| v.max(0.0) as u64)
                .unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::{
        extract::{Query, State},
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str, keys: &[&str], retries: u32) -> MarketDataClient {
        let mut settings = crate::config::load();
        settings.fmp_api_keys = keys.iter().map(|k| k.to_string()).collect();
        settings.twelve_data_api_key.clear();
        settings.provider_retries = retries;
        settings.provider_backoff_ms = 1;
        MarketDataClient::new(&settings).with_endpoints(base, base)
    }

    async fn quote_by_key(Query(q): Query<HashMap<String, String>>) -> Response {
        match q.get("apikey").map(String::as_str) {
            Some("bad") => (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response(),
            Some("limit") => Json(json!({ "Error Message": "Limit Reach . Please upgrade your plan" })).into_response(),
            _ => Json(json!([{ "symbol": "AAPL", "price": 123.0 }])).into_response(),
        }
    }

    #[tokio::test]
    async fn spent_keys_rotate_until_one_answers() {
        let base = serve(Router::new().route("/quote/:symbol", get(quote_by_key))).await;
        let fmp = client(&base, &["bad", "limit", "good"], 0);

        let q = fmp.quote("AAPL").await.unwrap();
        assert_eq!(q.price, 123.0);
        assert_eq!(fmp.active_key_index(), 2);

        // the cursor stays on the working key
        fmp.quote("AAPL").await.unwrap();
        assert_eq!(fmp.active_key_index(), 2);
    }

    #[tokio::test]
    async fn each_key_is_tried_at_most_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/quote/:symbol",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::TOO_MANY_REQUESTS, "slow down")
                }),
            )
            .with_state(hits.clone());
        let fmp = client(&serve(app).await, &["a", "b", "c"], 2);

        let err = fmp.quote("AAPL").await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    fn flaky_app(failures: usize, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/quote/:symbol",
                get(move |State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < failures {
                        (StatusCode::BAD_GATEWAY, "upstream hiccup").into_response()
                    } else {
                        Json(json!([{ "symbol": "TCS", "price": 3_900.5 }])).into_response()
                    }
                }),
            )
            .with_state(hits)
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let fmp = client(&serve(flaky_app(2, hits.clone())).await, &["k"], 2);

        assert_eq!(fmp.quote("TCS").await.unwrap().price, 3_900.5);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(fmp.active_key_index(), 0);
    }

    #[tokio::test]
    async fn retries_stop_at_the_configured_count() {
        let hits = Arc::new(AtomicUsize::new(0));
        let fmp = client(&serve(flaky_app(5, hits.clone())).await, &["k"], 1);

        let err = fmp.quote("TCS").await.unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 502, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn limit_reach_body_rotates_key() {
        let err = check_fmp_body(json!({ "Error Message": "Limit Reach . Please upgrade your plan" })).unwrap_err();
        assert!(err.rotates_key());
    }

    #[test]
    fn invalid_key_body_rotates_key() {
        let err = check_fmp_body(json!({ "Error Message": "Invalid API KEY." })).unwrap_err();
        assert!(matches!(err, ProviderError::Unauthorized(_)));
    }

    #[test]
    fn status_classification() {
        assert!(ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()).rotates_key());
        assert!(ProviderError::from_status(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert!(!ProviderError::from_status(StatusCode::NOT_FOUND, String::new()).is_transient());
        assert!(ProviderError::Transport("reset".into()).is_transient());
    }

    #[test]
    fn fmp_bars_become_ascending_tail() {
        let bars: Vec<FmpBar> = serde_json::from_value(json!([
            { "date": "2024-01-15 10:02:00", "open": 3.0, "high": 3.5, "low": 2.5, "close": 3.2, "volume": 10 },
            { "date": "2024-01-15 10:01:00", "open": 2.0, "high": 2.5, "low": 1.5, "close": 2.2, "volume": 10 },
            { "date": "2024-01-15 10:00:00", "open": 1.0, "high": 1.5, "low": 0.5, "close": 1.2, "volume": 10 }
        ]))
        .unwrap();

        let candles = finish_candles("X", bars.iter().filter_map(FmpBar::to_candle).collect(), 2).unwrap();
        assert_eq!(candles.len(), 2);
        assert!(candles[0].time < candles[1].time);
        assert_eq!(candles[1].close, 3.2);
    }

    #[test]
    fn twelve_data_strings_parse() {
        let bar = TwelveDataBar {
            datetime: "2024-01-15".into(),
            open: "1.5".into(),
            high: "2".into(),
            low: "1".into(),
            close: "1.75".into(),
            volume: Some("1200".into()),
        };
        let c = bar.to_candle().unwrap();
        assert_eq!(c.close, 1.75);
        assert_eq!(c.volume, 1200);
    }

    #[test]
    fn empty_series_is_an_error() {
        assert!(matches!(finish_candles("X", vec![], 10), Err(ProviderError::Empty(_))));
    }

    #[test]
    fn interval_parsing() {
        assert_eq!("5m".parse::<ChartInterval>().unwrap(), ChartInterval::FiveMin);
        assert_eq!("1h".parse::<ChartInterval>().unwrap().seconds(), 3_600);
        assert!("7min".parse::<ChartInterval>().is_err());
    }
}
