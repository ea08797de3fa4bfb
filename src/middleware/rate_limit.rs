use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, AppState};

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub retry_after: Duration,
}

/// Fixed-window request counter per client key. Process local.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|p| p.into_inner());

        let w = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        if now.duration_since(w.started) >= self.window {
            *w = Window { started: now, count: 0 };
        }

        let retry_after = self.window.saturating_sub(now.duration_since(w.started));

        if w.count >= self.max_requests {
            return RateDecision {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                retry_after,
            };
        }

        w.count += 1;
        RateDecision {
            allowed: true,
            limit: self.max_requests,
            remaining: self.max_requests - w.count,
            retry_after,
        }
    }

    /// Drops windows that have ended. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|p| p.into_inner());
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.window);
        before - windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// First `X-Forwarded-For` hop, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|a| a.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn apply(limiter: &RateLimiter, req: &Request) -> RateDecision {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let key = client_key(req.headers(), peer);
    let decision = limiter.check(&key);

    if !decision.allowed {
        tracing::warn!("rate limit hit for {key} on {}", req.uri().path());
    }
    decision
}

fn rejection(d: RateDecision) -> Response {
    let res = AppError::RateLimited {
        message: "Too many requests, please try again later.".to_string(),
        retry_after_secs: d.retry_after.as_secs().max(1),
    }
    .into_response();
    with_headers(res, d)
}

fn with_headers(mut res: Response, d: RateDecision) -> Response {
    let h = res.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&d.limit.to_string()) {
        h.insert("X-RateLimit-Limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&d.remaining.to_string()) {
        h.insert("X-RateLimit-Remaining", v);
    }
    res
}

/// General limit for everything under `/api`.
pub async fn limit_api(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !req.uri().path().starts_with("/api") {
        return next.run(req).await;
    }

    let d = apply(&state.api_limiter, &req);
    if !d.allowed {
        return rejection(d);
    }
    with_headers(next.run(req).await, d)
}

/// Stricter limit for the chatbot, which costs an LLM call per request.
pub async fn limit_chat(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let d = apply(&state.chat_limiter, &req);
    if !d.allowed {
        return rejection(d);
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_in_window() {
        let rl = RateLimiter::new(2, Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(rl.check_at("1.2.3.4", t0).allowed);
        let second = rl.check_at("1.2.3.4", t0);
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        let third = rl.check_at("1.2.3.4", t0 + Duration::from_secs(1));
        assert!(!third.allowed);
        assert_eq!(third.retry_after, Duration::from_secs(59));
    }

    #[test]
    fn window_resets_after_expiry() {
        let rl = RateLimiter::new(1, Duration::from_secs(10));
        let t0 = Instant::now();

        assert!(rl.check_at("a", t0).allowed);
        assert!(!rl.check_at("a", t0 + Duration::from_secs(5)).allowed);
        assert!(rl.check_at("a", t0 + Duration::from_secs(10)).allowed);
    }

    #[test]
    fn clients_are_counted_separately() {
        let rl = RateLimiter::new(1, Duration::from_secs(10));
        assert!(rl.check("a").allowed);
        assert!(rl.check("b").allowed);
        assert_eq!(rl.tracked_clients(), 2);
    }

    #[test]
    fn sweep_drops_finished_windows() {
        let rl = RateLimiter::new(1, Duration::ZERO);
        rl.check("a");
        assert_eq!(rl.sweep(), 1);
        assert_eq!(rl.tracked_clients(), 0);
    }

    #[test]
    fn rejection_carries_limit_headers() {
        let rl = RateLimiter::new(1, Duration::from_secs(30));
        rl.check("c");
        let d = rl.check("c");
        assert!(!d.allowed);

        let res = rejection(d);
        assert_eq!(res.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()["x-ratelimit-limit"], "1");
        assert_eq!(res.headers()["x-ratelimit-remaining"], "0");
        assert!(res.headers().contains_key(axum::http::header::RETRY_AFTER));
    }

    #[test]
    fn forwarded_for_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("9.9.9.9, 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        assert_eq!(client_key(&headers, Some(peer)), "9.9.9.9");
        assert_eq!(client_key(&HeaderMap::new(), Some(peer)), "127.0.0.1");
        assert_eq!(client_key(&HeaderMap::new(), None), "unknown");
    }
}
