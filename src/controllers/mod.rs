use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Json, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::json;

use crate::{error::AppError, models::CurrentUser, services::market_data::ChartInterval};

pub mod home_controller;
pub mod stocks_controller;
pub mod live_chart_controller;
pub mod market_controller;
pub mod trading_controller;
pub mod portfolio_controller;
pub mod notifications_controller;
pub mod realtime_controller;
pub mod chat_controller;
pub mod user_controller;

pub type ApiResult = Result<Response, AppError>;

/// `{ "success": true, "data": ... }` with 200.
pub fn ok<T: Serialize>(data: T) -> ApiResult {
    Ok((StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response())
}

pub fn created<T: Serialize>(data: T) -> ApiResult {
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": data }))).into_response())
}

pub fn require_user(user: Option<Extension<CurrentUser>>) -> Result<CurrentUser, AppError> {
    match user {
        Some(Extension(u)) => Ok(u),
        None => Err(AppError::Unauthorized("Authentication required".into())),
    }
}

/// Turns axum's plain-text body rejection into the JSON error shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

pub fn query<T>(q: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    q.map(|Query(v)| v).map_err(|e| AppError::BadRequest(e.body_text()))
}

pub fn parse_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::BadRequest("Invalid id.".into()))
}

pub fn parse_interval(raw: Option<&str>) -> Result<ChartInterval, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse::<ChartInterval>().map_err(|e| AppError::field("interval", &e)),
        None => Ok(ChartInterval::default()),
    }
}
