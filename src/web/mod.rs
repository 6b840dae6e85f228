//! HTTP surface: router, handlers and the error body every failure renders as.

pub mod app;
pub mod handlers;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::core::WaitlistError;

pub use app::{AppState, build_router};

/// Body of every non-success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBody {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct WebError(pub WaitlistError);

impl From<WaitlistError> for WebError {
    fn from(err: WaitlistError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self(WaitlistError::InvalidBody(rejection.body_text()))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "request failed");
        }

        let body = ResultBody {
            status: status.as_u16(),
            message: self.0.message(),
            error: self.0.detail(),
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;
