use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,
    // empty => any origin
    pub client_origin: String,

    // market data providers
    pub fmp_api_keys: Vec<String>,
    pub twelve_data_api_key: String,
    pub http_timeout_secs: u64,
    pub provider_retries: u32,
    pub provider_backoff_ms: u64,

    pub gemini_api_key: String,
    pub gemini_model: String,

    // caches
    pub chart_cache_ttl_secs: u64,
    pub latest_cache_ttl_secs: u64,
    pub quote_cache_ttl_secs: u64,
    pub search_cache_ttl_secs: u64,

    // paper trading
    pub starting_balance: f64,
    pub fee_rate: f64,
    pub fee_min: f64,
    pub fee_max: f64,
    pub limit_order_poll_secs: u64,

    // rate limiting (fixed window, per client ip)
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub chat_rate_limit_max: u32,
    pub chat_rate_limit_window_secs: u64,

    pub market_utc_offset_minutes: i32,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

// numeric money settings; NaN and inf parse as f64 but are never usable
fn finite_or(key: &str, default: f64) -> f64 {
    let v: f64 = parse_or(key, default);
    if v.is_finite() { v } else { default }
}

/// Collects FMP keys from `FMP_API_KEYS` (comma separated) plus `FMP_API_KEY`,
/// dropping blanks and duplicates while keeping order.
fn fmp_keys() -> Vec<String> {
    let mut keys: Vec<String> = vec![];
    let listed = env::var("FMP_API_KEYS").unwrap_or_default();
    let single = env::var("FMP_API_KEY").unwrap_or_default();

    for k in listed.split(',').chain(std::iter::once(single.as_str())) {
        let k = k.trim();
        if !k.is_empty() && !keys.iter().any(|x| x == k) {
            keys.push(k.to_string());
        }
    }
    keys
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    Settings {
        mongodb_uri: var_or("MONGODB_URI", "mongodb://localhost:27017"),
        mongodb_db: var_or("MONGODB_DB", "tradebro"),
        host: var_or("HOST", "127.0.0.1"),
        port: parse_or("PORT", 5001),

        jwt_secret: var_or("JWT_SECRET", "change-me-dev-secret"),
        jwt_cookie_name: var_or("JWT_COOKIE_NAME", "token"),
        client_origin: var_or("CLIENT_ORIGIN", ""),

        fmp_api_keys: fmp_keys(),
        twelve_data_api_key: var_or("TWELVE_DATA_API_KEY", "").trim().to_string(),
        http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", 10),
        provider_retries: parse_or("PROVIDER_RETRIES", 2),
        provider_backoff_ms: parse_or("PROVIDER_BACKOFF_MS", 500),

        gemini_api_key: var_or("GEMINI_API_KEY", "").trim().to_string(),
        gemini_model: var_or("GEMINI_MODEL", "gemini-1.5-flash"),

        chart_cache_ttl_secs: parse_or("CHART_CACHE_TTL_SECS", 60),
        latest_cache_ttl_secs: parse_or("LATEST_CACHE_TTL_SECS", 15),
        quote_cache_ttl_secs: parse_or("QUOTE_CACHE_TTL_SECS", 10),
        search_cache_ttl_secs: parse_or("SEARCH_CACHE_TTL_SECS", 300),

        starting_balance: finite_or("STARTING_BALANCE", 100_000.0),
        fee_rate: finite_or("FEE_RATE", 0.001),
        fee_min: finite_or("FEE_MIN", 1.0),
        fee_max: finite_or("FEE_MAX", 100.0),
        limit_order_poll_secs: parse_or("LIMIT_ORDER_POLL_SECS", 15),

        rate_limit_max: parse_or("RATE_LIMIT_MAX", 100),
        rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 900),
        chat_rate_limit_max: parse_or("CHAT_RATE_LIMIT_MAX", 20),
        chat_rate_limit_window_secs: parse_or("CHAT_RATE_LIMIT_WINDOW_SECS", 60),

        market_utc_offset_minutes: parse_or("MARKET_UTC_OFFSET_MINUTES", 330),
    }
}
