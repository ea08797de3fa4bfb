use std::sync::OnceLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    error::AppError,
    models::{Candle, DataSource},
};

use super::{
    cache::{CacheStats, TtlCache},
    market_data::{ChartInterval, MarketDataClient},
    market_hours::{MarketClock, MarketSession},
    mock_data,
};

pub const DEFAULT_COUNT: usize = 100;
pub const MAX_COUNT: usize = 500;
// bars fetched when only the newest one is wanted
const LATEST_WINDOW: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub symbol: String,
    pub interval: ChartInterval,
    pub candles: Vec<Candle>,
    pub source: DataSource,
    pub fetched_at: i64,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveCandle {
    pub symbol: String,
    pub interval: ChartInterval,
    pub candle: Candle,
    pub source: DataSource,
    pub fetched_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartServiceStatus {
    pub cache: CacheStats,
    pub chart_ttl_secs: u64,
    pub latest_ttl_secs: u64,
    pub fmp_keys: usize,
    pub active_fmp_key: usize,
    pub twelve_data: bool,
    pub session: MarketSession,
    pub poll_interval_secs: u64,
}

fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9.\-^=]{1,15}$").expect("symbol regex"))
}

/// Upper-cases and checks a ticker. Anything else is a 400.
pub fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let sym = raw.trim().to_uppercase();
    if sym.is_empty() {
        return Err(AppError::field("symbol", "Missing symbol."));
    }
    if !symbol_re().is_match(&sym) {
        return Err(AppError::field("symbol", "Invalid symbol."));
    }
    Ok(sym)
}

pub fn clamp_count(count: Option<usize>) -> usize {
    count.unwrap_or(DEFAULT_COUNT).clamp(1, MAX_COUNT)
}

/// Chart data with a TTL cache in front of FMP, then Twelve Data, then mock.
#[derive(Clone)]
pub struct LiveChartService {
    market: MarketDataClient,
    cache: TtlCache<ChartSnapshot>,
    latest_ttl: Duration,
    clock: MarketClock,
}

impl LiveChartService {
    pub fn new(settings: &Settings, market: MarketDataClient, clock: MarketClock) -> Self {
        Self {
            market,
            cache: TtlCache::new(Duration::from_secs(settings.chart_cache_ttl_secs)),
            latest_ttl: Duration::from_secs(settings.latest_cache_ttl_secs),
            clock,
        }
    }

    pub fn clock(&self) -> &MarketClock {
        &self.clock
    }

    pub fn cache(&self) -> &TtlCache<ChartSnapshot> {
        &self.cache
    }

    async fn fetch_candles(&self, symbol: &str, interval: ChartInterval, count: usize) -> (Vec<Candle>, DataSource) {
        if self.market.has_fmp_key() {
            match self.market.intraday_candles(symbol, interval, count).await {
                Ok(c) => return (c, DataSource::Fmp),
                Err(e) => tracing::warn!("FMP chart for {symbol} failed: {e}"),
            }
        }

        if self.market.has_twelve_data_key() {
            match self.market.twelve_data_candles(symbol, interval, count).await {
                Ok(c) => return (c, DataSource::TwelveData),
                Err(e) => tracing::warn!("Twelve Data chart for {symbol} failed: {e}"),
            }
        }

        tracing::warn!("serving mock chart data for {symbol}");
        let candles = mock_data::generate_candles(symbol, interval.seconds(), count, Utc::now().timestamp());
        (candles, DataSource::Mock)
    }

    async fn load(&self, key: String, ttl: Duration, symbol: &str, interval: ChartInterval, count: usize) -> ChartSnapshot {
        if let Some(mut hit) = self.cache.get(&key) {
            hit.cached = true;
            return hit;
        }

        let (candles, source) = self.fetch_candles(symbol, interval, count).await;
        let snap = ChartSnapshot {
            symbol: symbol.to_string(),
            interval,
            candles,
            source,
            fetched_at: Utc::now().timestamp(),
            cached: false,
        };

        self.cache.insert_with_ttl(key, snap.clone(), ttl);
        snap
    }

    /// Never fails for a valid symbol: mock data is the last resort.
    pub async fn chart(&self, symbol: &str, interval: ChartInterval, count: usize) -> Result<ChartSnapshot, AppError> {
        let sym = normalize_symbol(symbol)?;
        let count = count.clamp(1, MAX_COUNT);
        let key = format!("chart:{sym}:{}:{count}", interval.as_str());

        Ok(self.load(key, self.cache.default_ttl(), &sym, interval, count).await)
    }

    pub async fn latest(&self, symbol: &str, interval: ChartInterval) -> Result<LiveCandle, AppError> {
        let sym = normalize_symbol(symbol)?;
        let key = format!("latest:{sym}:{}", interval.as_str());

        let snap = self.load(key, self.latest_ttl, &sym, interval, LATEST_WINDOW).await;
        let candle = snap
            .candles
            .last()
            .copied()
            .ok_or_else(|| AppError::ServiceUnavailable(format!("No chart data for {sym}")))?;

        Ok(LiveCandle {
            symbol: snap.symbol,
            interval,
            candle,
            source: snap.source,
            fetched_at: snap.fetched_at,
        })
    }

    pub fn invalidate(&self, symbol: &str) -> usize {
        let sym = symbol.trim().to_uppercase();
        self.cache.remove_prefix(&format!("chart:{sym}:")) + self.cache.remove_prefix(&format!("latest:{sym}:"))
    }

    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    pub fn status(&self) -> ChartServiceStatus {
        let session = self.clock.session_now();
        ChartServiceStatus {
            cache: self.cache.stats(),
            chart_ttl_secs: self.cache.default_ttl().as_secs(),
            latest_ttl_secs: self.latest_ttl.as_secs(),
            fmp_keys: self.market.fmp_key_count(),
            active_fmp_key: self.market.active_key_index(),
            twelve_data: self.market.has_twelve_data_key(),
            session,
            poll_interval_secs: session.poll_interval().as_secs(),
        }
    }
}
