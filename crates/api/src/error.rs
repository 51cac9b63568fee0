use axum::{
    Json,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use driveview_services::GraphError;
use serde::Serialize;

use crate::cookies;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// No session cookie at all. Nothing to clear.
    Unauthorized(String),
    /// The remote API rejected the stored token. Clears the session
    /// cookies on the way out.
    SessionExpired,
    NotFound(String),
    Internal(String),
    /// Non-auth remote failure; downstream status and payload are
    /// preserved for diagnostics.
    Upstream { status: u16, body: String },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => plain(StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => plain(StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::SessionExpired => {
                let mut headers = HeaderMap::new();
                for name in [cookies::ACCESS_TOKEN, cookies::REFRESH_TOKEN] {
                    headers.append(header::SET_COOKIE, cookies::clear(name).parse().unwrap());
                }
                let body = ErrorResponse {
                    error: "session_expired".to_string(),
                    message: "The session has expired, please sign in again".to_string(),
                };
                (StatusCode::UNAUTHORIZED, headers, Json(body)).into_response()
            }
            ApiError::NotFound(msg) => plain(StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => {
                plain(StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
            }
            ApiError::Upstream { status, body } => {
                let response_data = serde_json::from_str::<serde_json::Value>(&body)
                    .unwrap_or(serde_json::Value::String(body));
                let payload = serde_json::json!({
                    "error": "upstream_error",
                    "message": "The remote drive API reported an error",
                    "statusCode": status,
                    "responseData": response_data,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
            }
        }
    }
}

fn plain(status: StatusCode, error: &str, message: String) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        message,
    };
    (status, Json(body)).into_response()
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Unauthorized => ApiError::SessionExpired,
            GraphError::Status { status, body } => ApiError::Upstream { status, body },
            GraphError::Network(e) => ApiError::Internal(e.to_string()),
        }
    }
}
