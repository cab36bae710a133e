use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use outreach_core::errors::{ApplicationError, InterfaceError};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::error;

/// HTTP error rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(InterfaceError::bad_request(message))
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self(InterfaceError::unprocessable(message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self(InterfaceError::internal(message))
    }

    pub fn not_found() -> Self {
        Self(InterfaceError::NotFound { message: "Not Found".to_string() })
    }
}

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self(value)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        Self(value.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(InterfaceError::unprocessable(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(event_name = "http.error", status = status.as_u16(), detail = self.0.detail(), "request failed");
        }
        (status, Json(json!({ "detail": self.0.detail() }))).into_response()
    }
}

/// JSON body extractor whose rejections use the `detail` error shape (422).
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(Self(value))
    }
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
