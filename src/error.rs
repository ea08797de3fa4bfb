use std::collections::HashMap;

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::market_data::ProviderError;

/// Field name => message. `_form` holds errors not tied to one field.
pub type FieldErrors = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    RateLimited { message: String, retry_after_secs: u64 },

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("market data error: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn field(field: &str, message: &str) -> Self {
        let mut errs = FieldErrors::new();
        errs.insert(field.to_string(), message.to_string());
        Self::Validation(errs)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) | Self::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }

        // internal details stay in the log
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Provider(_) => "Market data is unavailable right now".to_string(),
            other => other.to_string(),
        };

        let body = match &self {
            Self::Validation(errs) => json!({ "success": false, "message": message, "errors": errs }),
            _ => json!({ "success": false, "message": message }),
        };

        let mut res = (status, Json(body)).into_response();

        if let Self::RateLimited { retry_after_secs, .. } = self {
            if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                res.headers_mut().insert(header::RETRY_AFTER, v);
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = AppError::field("quantity", "Enter a valid quantity.");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let res = AppError::RateLimited {
            message: "slow down".into(),
            retry_after_secs: 42,
        }
        .into_response();

        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn provider_errors_are_503() {
        let err = AppError::from(ProviderError::MissingKey("FMP"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
