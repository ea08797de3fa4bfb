use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::post,
    Router,
};
use http_body_util::BodyExt;
use mongodb::{bson::oid::ObjectId, Client};
use serde_json::Value;
use tower::ServiceExt;
use tradebro::{auth, config, controllers::trading_controller, models::CurrentUser, routes, AppState};

async fn test_state() -> AppState {
    let mut settings = config::load();
    settings.fmp_api_keys.clear();
    settings.twelve_data_api_key = String::new();

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

fn bearer(state: &AppState) -> String {
    let token = auth::issue_token(&state.settings.jwt_secret, &ObjectId::new(), 1).unwrap();
    format!("Bearer {token}")
}

fn json_post(uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
}

#[tokio::test]
async fn place_order_unauthorized_returns_401() {
    let state = test_state().await;
    let app = Router::new()
        .route("/api/orders", post(trading_controller::place))
        .with_state(state);

    let body = r#"{"symbol":"AAPL","side":"BUY","quantity":1}"#;
    let req = json_post("/api/orders").body(Body::from(body)).unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let json = response_json(res).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn orders_require_token_through_full_app() {
    let state = test_state().await;

    let req = Request::builder().uri("/api/orders").body(Body::empty()).unwrap();
    let res = routes::app(state).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_json(res).await["message"], "Authentication required");
}

#[tokio::test]
async fn fractional_quantity_is_rejected_before_pricing() {
    let state = test_state().await;
    let auth_header = bearer(&state);

    let body = r#"{"symbol":"AAPL","side":"BUY","quantity":1.5}"#;
    let req = json_post("/api/orders")
        .header(header::AUTHORIZATION, auth_header)
        .body(Body::from(body))
        .unwrap();

    let res = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let json = response_json(res).await;
    assert_eq!(json["errors"]["quantity"], "Enter a valid quantity.");
}

#[tokio::test]
async fn limit_order_without_price_is_rejected() {
    let state = test_state().await;
    let app = Router::new()
        .route("/api/orders", post(trading_controller::place))
        .with_state(state);

    let body = r#"{"symbol":"TCS","side":"SELL","method":"LIMIT","quantity":2}"#;
    let mut req = json_post("/api/orders").body(Body::from(body)).unwrap();

    // authenticated so we reach validation, not the 401 branch
    req.extensions_mut().insert(CurrentUser { id: ObjectId::new() });

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(response_json(res).await["errors"]["price"].is_string());
}

#[tokio::test]
async fn malformed_body_is_json_bad_request() {
    let state = test_state().await;
    let auth_header = bearer(&state);

    let body = r#"{"symbol":"AAPL","side":"HOLD","quantity":1}"#;
    let req = json_post("/api/orders/validate")
        .header(header::AUTHORIZATION, auth_header)
        .body(Body::from(body))
        .unwrap();

    let res = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(res).await["success"], false);
}

#[tokio::test]
async fn bad_order_id_is_bad_request() {
    let state = test_state().await;
    let auth_header = bearer(&state);

    let req = Request::builder()
        .method("POST")
        .uri("/api/orders/not-an-id/cancel")
        .header(header::AUTHORIZATION, auth_header)
        .body(Body::empty())
        .unwrap();

    let res = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_status_filter_is_bad_request() {
    let state = test_state().await;
    let auth_header = bearer(&state);

    let req = Request::builder()
        .uri("/api/orders?status=SHIPPED")
        .header(header::AUTHORIZATION, auth_header)
        .body(Body::empty())
        .unwrap();

    let res = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(response_json(res).await["errors"]["status"].is_string());
}
