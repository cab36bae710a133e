use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use outreach_core::domain::connection::SetupResponse;
use outreach_core::domain::email::{EmailRequest, EmailResponse};
use tracing::{error, info};

use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/setup", post(setup))
        .route("/generate", post(generate))
        .route("/send", post(send))
}

pub(crate) fn setup_result(result: SetupResponse, failure: &str) -> Result<Json<SetupResponse>, ApiError> {
    if result.success {
        Ok(Json(result))
    } else {
        error!(event_name = "integration.setup.failed", reason = %result.message, "{failure}");
        let detail = if result.message.starts_with(failure) {
            result.message
        } else {
            format!("{failure}: {}", result.message)
        };
        Err(ApiError::internal(detail))
    }
}

async fn setup(State(state): State<AppState>) -> Result<Json<SetupResponse>, ApiError> {
    let result = state.gmail.setup(&state.default_entity_id).await;
    setup_result(result, "Failed to setup Gmail integration")
}

async fn generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> Result<Json<EmailResponse>, ApiError> {
    request.validate()?;

    match state.composer.compose_email(&request.content_prompt, request.is_formal).await {
        Ok(content) => Ok(Json(EmailResponse {
            success: true,
            message: "Email generated successfully".to_string(),
            email_content: Some(content),
            error: None,
        })),
        Err(err) => Ok(Json(EmailResponse {
            success: false,
            message: "Failed to generate email".to_string(),
            error: Some(err.to_string()),
            ..EmailResponse::default()
        })),
    }
}

async fn send(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> Result<Json<EmailResponse>, ApiError> {
    request.validate()?;

    let content = match state.composer.compose_email(&request.content_prompt, request.is_formal).await {
        Ok(content) => content,
        Err(err) => {
            error!(event_name = "gmail.generate.failed", error = %err, "failed to generate email");
            return Ok(Json(EmailResponse {
                success: false,
                message: "Failed to generate email".to_string(),
                error: Some(err.to_string()),
                ..EmailResponse::default()
            }));
        }
    };

    let sent = state
        .gmail
        .send(&request.recipient_email, &request.subject, &content, &state.default_entity_id)
        .await;

    match sent {
        Ok(_) => {
            info!(event_name = "gmail.send.completed", recipient = %request.recipient_email, "email sent");
            Ok(Json(EmailResponse {
                success: true,
                message: format!("Email sent successfully to {}", request.recipient_email),
                email_content: Some(content),
                error: None,
            }))
        }
        Err(err) => {
            error!(event_name = "gmail.send.failed", error = %err, "failed to send email");
            Ok(Json(EmailResponse {
                success: false,
                message: "Failed to send email".to_string(),
                email_content: Some(content),
                error: Some(err.message().to_string()),
            }))
        }
    }
}
