use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use mongodb::{bson::oid::ObjectId, Client};
use serde_json::Value;
use tower::ServiceExt;
use tradebro::{auth, config, routes, AppState};

async fn test_state(api_limit: u32) -> AppState {
    let mut settings = config::load();
    settings.fmp_api_keys.clear();
    settings.twelve_data_api_key = String::new();
    settings.rate_limit_max = api_limit;

    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("mongodb client");
    let db = client.database(&settings.mongodb_db);

    AppState::new(db, settings)
}

async fn response_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn api_limit_returns_429_after_max() {
    let state = test_state(2).await;

    for remaining in ["1", "0"] {
        let res = routes::app(state.clone()).oneshot(get("/api/market/status")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-ratelimit-remaining"], remaining);
    }

    let res = routes::app(state).oneshot(get("/api/market/status")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(res.headers()["x-ratelimit-limit"], "2");
    assert_eq!(res.headers()["x-ratelimit-remaining"], "0");

    let json = response_json(res).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("Too many requests"));
}

#[tokio::test]
async fn health_is_not_rate_limited() {
    let state = test_state(1).await;

    for _ in 0..3 {
        let res = routes::app(state.clone()).oneshot(get("/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn clients_are_limited_separately() {
    let state = test_state(1).await;

    let a = routes::app(state.clone()).oneshot(get("/api/market/status")).await.unwrap();
    let other = Request::builder()
        .uri("/api/market/status")
        .header("x-forwarded-for", "198.51.100.1")
        .body(Body::empty())
        .unwrap();
    let b = routes::app(state).oneshot(other).await.unwrap();

    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
}

#[tokio::test]
async fn me_returns_token_subject() {
    let state = test_state(100).await;
    let id = ObjectId::new();
    let token = auth::issue_token(&state.settings.jwt_secret, &id, 1).unwrap();

    let req = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let res = routes::app(state).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["data"]["id"], id.to_hex());
}

#[tokio::test]
async fn token_cookie_is_accepted() {
    let state = test_state(100).await;
    let token = auth::issue_token(&state.settings.jwt_secret, &ObjectId::new(), 1).unwrap();
    let cookie = format!("{}={token}", state.settings.jwt_cookie_name);

    let req = Request::builder()
        .uri("/api/me")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let res = routes::app(state).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn forged_token_is_unauthorized() {
    let state = test_state(100).await;
    let token = auth::issue_token("some-other-secret", &ObjectId::new(), 1).unwrap();

    let req = Request::builder()
        .uri("/api/notifications")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let res = routes::app(state).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_areas_need_a_user() {
    let state = test_state(100).await;

    for uri in ["/api/portfolio", "/api/notifications/unread-count", "/api/events"] {
        let res = routes::app(state.clone()).oneshot(get(uri)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn empty_notification_title_is_bad_request() {
    let state = test_state(100).await;
    let token = auth::issue_token(&state.settings.jwt_secret, &ObjectId::new(), 1).unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/api/notifications")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"type":"system","title":"","message":"hello"}"#))
        .unwrap();
    let res = routes::app(state).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(response_json(res).await["errors"]["title"].is_string());
}

#[tokio::test]
async fn unknown_public_route_is_json_404() {
    let res = routes::app(test_state(100).await)
        .oneshot(get("/health/nope"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(res).await["success"], false);
}
