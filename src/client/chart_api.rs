use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    error::AppError,
    services::{
        live_chart_service::{ChartSnapshot, LiveCandle},
        live_poller::CandleSource,
        market_data::ChartInterval,
    },
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// Reads the live-chart endpoints of a running backend.
#[derive(Clone)]
pub struct ChartApiClient {
    http: Client,
    base_url: String,
    interval: ChartInterval,
}

impl ChartApiClient {
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            interval: ChartInterval::OneMin,
        }
    }

    pub fn with_interval(mut self, interval: ChartInterval) -> Self {
        self.interval = interval;
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("chart backend unreachable: {e}")))?;

        let status = res.status();
        let body = res
            .json::<Envelope<T>>()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("bad chart response ({status}): {e}")))?;

        match body.data {
            Some(data) if status.is_success() && body.success => Ok(data),
            _ => {
                let msg = body.message.unwrap_or_else(|| format!("chart request failed with {status}"));
                Err(match status {
                    StatusCode::BAD_REQUEST => AppError::BadRequest(msg),
                    StatusCode::NOT_FOUND => AppError::NotFound(msg),
                    _ => AppError::ServiceUnavailable(msg),
                })
            }
        }
    }

    pub async fn chart(&self, symbol: &str, count: usize) -> Result<ChartSnapshot, AppError> {
        self.get(
            &format!("/api/live-chart/{}", symbol.trim()),
            &[("interval", self.interval.as_str().to_string()), ("count", count.to_string())],
        )
        .await
    }

    pub async fn latest(&self, symbol: &str) -> Result<LiveCandle, AppError> {
        self.get(
            &format!("/api/live-chart/{}/latest", symbol.trim()),
            &[("interval", self.interval.as_str().to_string())],
        )
        .await
    }
}

impl CandleSource for ChartApiClient {
    async fn fetch_latest(&self, symbol: &str) -> Result<LiveCandle, AppError> {
        self.latest(symbol).await
    }
}
