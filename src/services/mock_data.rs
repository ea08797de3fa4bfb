//! Random-walk OHLCV used when every market data provider fails.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::models::Candle;

// per-bar return volatility
const STEP_VOLATILITY: f64 = 0.004;

/// A stable starting price per symbol, so repeated mocks stay in one range.
pub fn base_price(symbol: &str) -> f64 {
    let sum: u64 = symbol.bytes().map(|b| b as u64).sum();
    100.0 + (sum % 2_900) as f64
}

pub fn generate_candles(symbol: &str, step_secs: i64, count: usize, end_ts: i64) -> Vec<Candle> {
    let mut rng = rand::rng();
    generate_candles_with(&mut rng, symbol, step_secs, count, end_ts)
}

/// `count` bars ending with the bar that contains `end_ts`, oldest first.
pub fn generate_candles_with<R: Rng>(
    rng: &mut R,
    symbol: &str,
    step_secs: i64,
    count: usize,
    end_ts: i64,
) -> Vec<Candle> {
    if count == 0 {
        return vec![];
    }

    let step = step_secs.max(1);
    let last_open = end_ts - end_ts.rem_euclid(step);
    let first_open = last_open - step * (count as i64 - 1);

    let returns = match Normal::new(0.0, STEP_VOLATILITY) {
        Ok(n) => n,
        Err(_) => return vec![],
    };

    let mut out = Vec::with_capacity(count);
    let mut price = base_price(symbol) * rng.random_range(0.9..1.1);

    for i in 0..count {
        let open = price;
        let close = (open * (1.0 + returns.sample(rng))).max(0.01);

        let wick_up = open.max(close) * rng.random_range(0.0..STEP_VOLATILITY);
        let wick_down = open.min(close) * rng.random_range(0.0..STEP_VOLATILITY);

        let high = open.max(close) + wick_up;
        let low = (open.min(close) - wick_down).max(0.005);

        out.push(Candle {
            time: first_open + step * i as i64,
            open: round2(open),
            high: round2(high),
            low: round2(low),
            close: round2(close),
            volume: rng.random_range(1_000..50_000),
        });

        price = close;
    }

    out
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn returns_exactly_count_entries() {
        let candles = generate_candles_with(&mut rng(), "AAPL", 60, 120, 1_700_000_000);
        assert_eq!(candles.len(), 120);
    }

    #[test]
    fn times_are_strictly_increasing_by_step() {
        let candles = generate_candles_with(&mut rng(), "AAPL", 300, 50, 1_700_000_123);
        for pair in candles.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, 300);
        }
        let last = candles.last().unwrap();
        assert_eq!(last.time % 300, 0);
        assert!(last.time <= 1_700_000_123 && 1_700_000_123 < last.time + 300);
    }

    #[test]
    fn bars_are_well_formed() {
        let candles = generate_candles_with(&mut rng(), "RELIANCE", 60, 500, 1_700_000_000);
        for c in candles {
            assert!(c.low > 0.0);
            assert!(c.high >= c.open.max(c.close), "{c:?}");
            assert!(c.low <= c.open.min(c.close), "{c:?}");
        }
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(generate_candles("AAPL", 60, 0, 1_700_000_000).is_empty());
    }

    #[test]
    fn base_price_is_stable_per_symbol() {
        assert_eq!(base_price("TCS"), base_price("TCS"));
        assert!(base_price("TCS") >= 100.0);
    }
}
