use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use outreach_core::domain::connection::SetupResponse;
use outreach_core::domain::is_usable_secret;
use outreach_core::domain::slack::{ChannelListResponse, SlackMessageRequest, SlackMessageResponse};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{ApiError, ApiJson};
use crate::routes::gmail::setup_result;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/setup", post(setup))
        .route("/channels", get(channels))
        .route("/generate", post(generate))
        .route("/send", post(send))
}

#[derive(Debug, Deserialize)]
struct ChannelsQuery {
    #[serde(default)]
    bot_token: Option<String>,
}

async fn setup(State(state): State<AppState>) -> Result<Json<SetupResponse>, ApiError> {
    setup_result(state.slack.setup().await, "Failed to setup Slack integration")
}

async fn channels(
    State(state): State<AppState>,
    Query(query): Query<ChannelsQuery>,
) -> Result<Json<ChannelListResponse>, ApiError> {
    let token = query
        .bot_token
        .filter(|token| is_usable_secret(Some(token)))
        .ok_or_else(|| ApiError::bad_request("A valid Slack bot token must be provided"))?;

    let channels = state.channels.list_channels(&token).await;
    Ok(Json(ChannelListResponse { channels }))
}

fn generation_failed(error: String) -> SlackMessageResponse {
    SlackMessageResponse {
        success: false,
        message: "Failed to generate message".to_string(),
        error: Some(error),
        ..SlackMessageResponse::default()
    }
}

async fn generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SlackMessageRequest>,
) -> Json<SlackMessageResponse> {
    match state.composer.compose_slack(&request.content_prompt).await {
        Ok(content) => Json(SlackMessageResponse {
            success: true,
            message: "Message generated successfully".to_string(),
            channel_name: Some(request.display_channel()),
            message_content: Some(content),
            error: None,
        }),
        Err(err) => {
            error!(event_name = "slack.generate.failed", error = %err, "failed to generate message");
            Json(generation_failed(err.to_string()))
        }
    }
}

async fn send(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SlackMessageRequest>,
) -> Json<SlackMessageResponse> {
    let channel = request.display_channel();

    let content = match state.composer.compose_slack(&request.content_prompt).await {
        Ok(content) => content,
        Err(err) => {
            error!(event_name = "slack.generate.failed", error = %err, "failed to generate message");
            return Json(generation_failed(err.to_string()));
        }
    };

    let sent = state
        .slack
        .send(&content, &request.channel_id, request.channel_name.as_deref(), request.bot_token.as_deref())
        .await;

    match sent {
        Ok(_) => {
            info!(event_name = "slack.send.completed", channel = %channel, "message sent to #{channel}");
            Json(SlackMessageResponse {
                success: true,
                message: format!("Message sent successfully to #{channel}"),
                channel_name: Some(channel),
                message_content: Some(content),
                error: None,
            })
        }
        Err(err) => {
            error!(event_name = "slack.send.failed", error = %err, "failed to send message");
            Json(SlackMessageResponse {
                success: false,
                message: "Failed to send message".to_string(),
                channel_name: Some(channel),
                message_content: Some(content),
                error: Some(err.message().to_string()),
            })
        }
    }
}
