use serde::{Deserialize, Serialize};

/// One OHLCV bar. `time` is the bar open in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Fmp,
    #[serde(rename = "twelvedata")]
    TwelveData,
    Mock,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fmp => "fmp",
            Self::TwelveData => "twelvedata",
            Self::Mock => "mock",
        }
    }
}
