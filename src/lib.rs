//! Library entrypoint for the TradeBro backend.
//!
//! The binary only wires config, Mongo and the listener; everything else lives
//! here so integration tests under `tests/` can build the same app state and
//! routers.

use std::time::Duration;

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub mod middleware;
// handlers and services refer to the auth middleware as `crate::auth`
pub use middleware::auth;

pub mod services;
pub mod client;

pub mod controllers;
pub mod routes;

use services::{
    cache::TtlCache,
    chat_service::GeminiClient,
    live_chart_service::LiveChartService,
    live_poller::LiveChartHub,
    market_data::{MarketDataClient, Quote, SearchHit},
    market_hours::MarketClock,
    order_validation::FeeSchedule,
};

#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub settings: config::Settings,
    pub market: MarketDataClient,
    pub live_chart: LiveChartService,
    pub live_hub: LiveChartHub,
    pub quote_cache: TtlCache<Quote>,
    pub search_cache: TtlCache<Vec<SearchHit>>,
    pub fees: FeeSchedule,
    pub api_limiter: middleware::rate_limit::RateLimiter,
    pub chat_limiter: middleware::rate_limit::RateLimiter,
    pub chat: GeminiClient,
    pub events_tx: events::EventSender,
}

impl AppState {
    pub fn new(db: mongodb::Database, settings: config::Settings) -> Self {
        let market = MarketDataClient::new(&settings);
        let clock = MarketClock::new(settings.market_utc_offset_minutes);
        let live_chart = LiveChartService::new(&settings, market.clone(), clock);
        let (events_tx, _events_rx) = events::channel();

        Self {
            db,
            market,
            live_hub: LiveChartHub::new(live_chart.clone()),
            live_chart,
            quote_cache: TtlCache::new(Duration::from_secs(settings.quote_cache_ttl_secs)),
            search_cache: TtlCache::new(Duration::from_secs(settings.search_cache_ttl_secs)),
            fees: FeeSchedule::from_settings(&settings),
            api_limiter: middleware::rate_limit::RateLimiter::new(
                settings.rate_limit_max,
                Duration::from_secs(settings.rate_limit_window_secs),
            ),
            chat_limiter: middleware::rate_limit::RateLimiter::new(
                settings.chat_rate_limit_max,
                Duration::from_secs(settings.chat_rate_limit_window_secs),
            ),
            chat: GeminiClient::new(&settings),
            events_tx,
            settings,
        }
    }
}
