use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::Json;

use crate::gateway::GatewayError;
use crate::models::chat::ErrorBody;

/// Every failure a handler can produce, mapped to a status code and JSON body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody {
                error: msg,
                details: None,
            }),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorBody {
                error: "Invalid OpenAI API key".to_string(),
                details: None,
            }),
            ApiError::Internal(details) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody {
                error: "Internal server error".to_string(),
                details: Some(details),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Validation => ApiError::BadRequest(GatewayError::Validation.to_string()),
            GatewayError::Auth => ApiError::Unauthorized,
            GatewayError::Upstream(details) => ApiError::Internal(details),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}
