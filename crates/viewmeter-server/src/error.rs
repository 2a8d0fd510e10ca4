//! HTTP mapping for the shared error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use viewmeter_core::error::{ClientCode, ViewMeterError};

/// Handler error: a [`ViewMeterError`] rendered as a JSON body.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ViewMeterError);

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(ViewMeterError::BadRequest(msg.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = match code {
            ClientCode::BadRequest => StatusCode::BAD_REQUEST,
            ClientCode::Unsupported => StatusCode::NOT_IMPLEMENTED,
            ClientCode::UnsupportedVersion
            | ClientCode::Parse
            | ClientCode::Io
            | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
