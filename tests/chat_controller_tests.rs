use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use mongodb::Client;
use serde_json::{json, Value};
use tower::ServiceExt;
use tradebro::{config, routes, AppState};

async fn test_state(chat_limit: u32) -> AppState {
    let mut settings = config::load();
    settings.gemini_api_key = String::new();
    settings.chat_rate_limit_max = chat_limit;

    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("mongodb client");
    let db = client.database(&settings.mongodb_db);

    AppState::new(db, settings)
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[tokio::test]
async fn empty_message_is_bad_request() {
    let app = routes::app(test_state(20).await);

    let res = app.oneshot(chat_request(json!({ "message": "   " }))).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(response_json(res).await["errors"]["message"].is_string());
}

#[tokio::test]
async fn overlong_message_is_bad_request() {
    let app = routes::app(test_state(20).await);

    let res = app
        .oneshot(chat_request(json!({ "message": "a".repeat(2001) })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_key_gives_fallback_reply() {
    let app = routes::app(test_state(20).await);

    let body = json!({
        "message": "What is a limit order?",
        "history": [
            { "role": "user", "content": "hi" },
            { "role": "assistant", "content": "Hello!" }
        ]
    });
    let res = app.oneshot(chat_request(body)).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;
    assert_eq!(json["data"]["fallback"], true);
    assert!(!json["data"]["reply"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn chat_has_its_own_stricter_limit() {
    let state = test_state(1).await;

    let first = routes::app(state.clone())
        .oneshot(chat_request(json!({ "message": "hello" })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = routes::app(state)
        .oneshot(chat_request(json!({ "message": "hello again" })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));
}
