use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use outreach_broker::WhatsAppPayload;
use outreach_core::domain::connection::SetupResponse;
use outreach_core::domain::whatsapp::{
    WhatsAppMediaRequest, WhatsAppMessageRequest, WhatsAppMessageResponse, WhatsAppSetupRequest,
    WhatsAppTemplateRequest,
};
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiJson};
use crate::routes::gmail::setup_result;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/setup", post(setup))
        .route("/generate", post(generate))
        .route("/send", post(send))
        .route("/send-media", post(send_media))
        .route("/send-template", post(send_template))
}

async fn setup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WhatsAppSetupRequest>,
) -> Result<Json<SetupResponse>, ApiError> {
    if request.auth_token.is_empty() || request.phone_number_id.is_empty() {
        return Err(ApiError::bad_request(
            "Both auth_token and phone_number_id are required for WhatsApp integration",
        ));
    }

    let entity_id = request.entity_id.filter(|id| !id.is_empty()).unwrap_or_else(|| state.default_entity_id.clone());
    let result = state.whatsapp.setup(&request.auth_token, &request.phone_number_id, &entity_id).await;
    setup_result(result, "Failed to setup WhatsApp integration")
}

fn generation_failed(error: String) -> WhatsAppMessageResponse {
    WhatsAppMessageResponse {
        success: false,
        message: "Failed to generate message".to_string(),
        error: Some(error),
        ..WhatsAppMessageResponse::default()
    }
}

async fn generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WhatsAppMessageRequest>,
) -> Json<WhatsAppMessageResponse> {
    Json(match state.composer.compose_whatsapp(&request.content_prompt).await {
        Ok(content) => WhatsAppMessageResponse {
            success: true,
            message: "Message generated successfully".to_string(),
            phone_number: Some(request.phone_number),
            message_content: Some(content),
            error: None,
        },
        Err(err) => {
            error!(event_name = "whatsapp.generate.failed", error = %err, "failed to generate message");
            generation_failed(err.to_string())
        }
    })
}

/// Free-form text only reaches recipients inside the 24-hour customer service window;
/// `/send-template` is the way to open a conversation.
async fn send(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WhatsAppMessageRequest>,
) -> Json<WhatsAppMessageResponse> {
    warn!(
        event_name = "whatsapp.send.restricted",
        "free-form messages are only delivered if the recipient messaged this number within the last 24 hours; \
         use /send-template for initial contact"
    );

    let content = match state.composer.compose_whatsapp(&request.content_prompt).await {
        Ok(content) => content,
        Err(err) => {
            error!(event_name = "whatsapp.generate.failed", error = %err, "failed to generate message");
            return Json(generation_failed(err.to_string()));
        }
    };

    let sent = state
        .whatsapp
        .send(
            &request.phone_number,
            WhatsAppPayload::Text(content.clone()),
            request.api_key.as_deref(),
            &request.entity_id,
        )
        .await;

    Json(match sent {
        Ok(_) => {
            info!(event_name = "whatsapp.send.completed", "message sent to {}", request.phone_number);
            WhatsAppMessageResponse {
                success: true,
                message: format!("Message sent successfully to {}", request.phone_number),
                phone_number: Some(request.phone_number),
                message_content: Some(content),
                error: None,
            }
        }
        Err(err) => {
            error!(event_name = "whatsapp.send.failed", error = %err, "failed to send message");
            WhatsAppMessageResponse {
                success: false,
                message: "Failed to send message".to_string(),
                phone_number: Some(request.phone_number),
                message_content: Some(content),
                error: Some(err.message().to_string()),
            }
        }
    })
}

async fn send_media(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WhatsAppMediaRequest>,
) -> Json<WhatsAppMessageResponse> {
    let payload = WhatsAppPayload::Media { url: request.media_url.clone(), caption: request.caption.clone() };
    let sent = state
        .whatsapp
        .send(&request.phone_number, payload, request.api_key.as_deref(), &request.entity_id)
        .await;

    Json(match sent {
        Ok(_) => WhatsAppMessageResponse {
            success: true,
            message: format!("Media sent successfully to {}", request.phone_number),
            phone_number: Some(request.phone_number),
            message_content: Some(request.caption),
            error: None,
        },
        Err(err) => {
            error!(event_name = "whatsapp.media.failed", error = %err, "failed to send media");
            WhatsAppMessageResponse {
                success: false,
                message: "Failed to send media".to_string(),
                phone_number: Some(request.phone_number),
                message_content: None,
                error: Some(err.message().to_string()),
            }
        }
    })
}

async fn send_template(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WhatsAppTemplateRequest>,
) -> Json<WhatsAppMessageResponse> {
    info!(
        event_name = "whatsapp.template.started",
        template = %request.template_name,
        "sending template message to {}",
        request.phone_number
    );

    let payload = WhatsAppPayload::Template { name: request.template_name, params: request.template_params };
    let sent = state
        .whatsapp
        .send(&request.phone_number, payload, request.api_key.as_deref(), &request.entity_id)
        .await;

    Json(match sent {
        Ok(_) => WhatsAppMessageResponse {
            success: true,
            message: format!("Template sent successfully to {}", request.phone_number),
            phone_number: Some(request.phone_number),
            ..WhatsAppMessageResponse::default()
        },
        Err(err) => {
            error!(event_name = "whatsapp.template.failed", error = %err, "failed to send template");
            WhatsAppMessageResponse {
                success: false,
                message: "Failed to send template".to_string(),
                phone_number: Some(request.phone_number),
                error: Some(err.message().to_string()),
                ..WhatsAppMessageResponse::default()
            }
        }
    })
}
