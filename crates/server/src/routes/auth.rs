use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use outreach_core::domain::connection::ConnectRequest;
use serde_json::{json, Value};
use tracing::error;

use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/gmail/connect", post(connect_gmail))
}

/// Starts a Gmail connection for a specific user; `redirect_url` is always present (null when
/// the connection is already usable).
async fn connect_gmail(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ConnectRequest>,
) -> Result<Json<Value>, ApiError> {
    let result = state.gmail.setup(&request.entity_id).await;

    if !result.success {
        error!(
            event_name = "auth.gmail.connect_failed",
            entity_id = %request.entity_id,
            reason = %result.message,
            "failed to setup Gmail integration"
        );
        return Err(ApiError::internal(result.message));
    }

    Ok(Json(json!({
        "success": true,
        "message": result.message,
        "redirect_url": result.redirect_url,
    })))
}
