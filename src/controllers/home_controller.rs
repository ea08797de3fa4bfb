use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use mongodb::bson::doc;
use serde_json::json;

use crate::{error::AppError, AppState};

use super::{ok, ApiResult};

pub async fn home() -> ApiResult {
    ok(json!({
        "name": "tradebro",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn health_db(State(state): State<AppState>) -> ApiResult {
    state.db.run_command(doc! { "ping": 1 }, None).await?;
    ok(json!({ "mongo": "ok" }))
}
