use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::CurrentUser, AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user id as hex string
    pub sub: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for part in raw.split(';') {
        let part = part.trim();
        let mut it = part.splitn(2, '=');
        let k = it.next()?.trim();
        let v = it.next()?.trim();
        if k == name {
            return Some(v.to_string());
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").or_else(|| raw.strip_prefix("bearer "))?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Verifies an HS256 token and returns the user it names.
pub fn verify_token(secret: &str, token: &str) -> Option<CurrentUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation).ok()?;
    let id = ObjectId::parse_str(&data.claims.sub).ok()?;
    Some(CurrentUser { id })
}

/// Issues a token for `user_id`. Login happens upstream; this is for
/// tooling and tests that need a valid caller.
pub fn issue_token(secret: &str, user_id: &ObjectId, days: i64) -> Result<String, String> {
    let exp = (Utc::now() + Duration::days(days)).timestamp() as usize;
    let claims = Claims { sub: user_id.to_hex(), exp };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| e.to_string())
}

pub async fn inject_current_user(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = bearer_token(req.headers())
        .or_else(|| get_cookie(req.headers(), &state.settings.jwt_cookie_name));

    if let Some(token) = token {
        match verify_token(&state.settings.jwt_secret, &token) {
            // Store user in request extensions so handlers can access it
            Some(user) => {
                req.extensions_mut().insert(user);
            }
            None => tracing::debug!("ignoring invalid or expired token"),
        }
    }

    next.run(req).await
}

fn is_public_path(path: &str) -> bool {
    path == "/"
        || path.starts_with("/health")
        || path.starts_with("/api/stocks")
        || path == "/api/news"
        || path.starts_with("/api/live-chart")
        || path.starts_with("/api/market")
        || path == "/api/chat"
}

pub async fn require_auth(req: Request, next: Next) -> Response {
    let path = req.uri().path();

    if is_public_path(path) {
        return next.run(req).await;
    }

    // If inject_current_user already put CurrentUser in extensions => authenticated
    if req.extensions().get::<CurrentUser>().is_some() {
        return next.run(req).await;
    }

    AppError::Unauthorized("Authentication required".to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn issued_tokens_verify() {
        let id = ObjectId::new();
        let token = issue_token("s3cret", &id, 1).unwrap();

        assert_eq!(verify_token("s3cret", &token).unwrap().id, id);
        assert!(verify_token("other", &token).is_none());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let id = ObjectId::new();
        let token = issue_token("s3cret", &id, -2).unwrap();
        assert!(verify_token("s3cret", &token).is_none());
    }

    #[test]
    fn token_sources() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=xyz"));

        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));
        assert_eq!(get_cookie(&headers, "token").as_deref(), Some("xyz"));
    }

    #[test]
    fn public_paths() {
        assert!(is_public_path("/api/live-chart/AAPL"));
        assert!(is_public_path("/health/db"));
        assert!(!is_public_path("/api/orders"));
        assert!(!is_public_path("/api/portfolio"));
    }
}
