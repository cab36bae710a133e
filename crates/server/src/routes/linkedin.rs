use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use outreach_core::domain::connection::ConnectRequest;
use outreach_core::domain::is_usable_secret;
use outreach_core::domain::linkedin::{
    ActionsResponse, LinkedInConnectionRequest, LinkedInMessageRequest, LinkedInPostRequest,
    LinkedInProfileSearchRequest, LinkedInProfilesResponse, LinkedInResponse, DEFAULT_CONNECTION_NOTE,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

const CONNECTION_NOTE_PROMPT: &str =
    "Write a brief, professional LinkedIn connection request message that is concise and friendly.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/setup", post(setup))
        .route("/search-profiles", post(search_profiles))
        .route("/connect", post(connect))
        .route("/message", post(message))
        .route("/post", post(create_post))
        .route("/actions", get(actions))
}

fn require_token(access_token: &str) -> Result<(), ApiError> {
    if is_usable_secret(Some(access_token)) {
        Ok(())
    } else {
        Err(ApiError::bad_request("A valid LinkedIn access token must be provided"))
    }
}

fn failed(message: &str, error: String) -> LinkedInResponse {
    LinkedInResponse { success: false, message: message.to_string(), data: None, error: Some(error) }
}

/// The body is optional here; an empty request sets up the default entity.
async fn setup(State(state): State<AppState>, body: Bytes) -> Result<Json<LinkedInResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ConnectRequest::default()
    } else {
        serde_json::from_slice::<ConnectRequest>(&body)
            .map_err(|err| ApiError::unprocessable(err.to_string()))?
    };

    let result = state.linkedin.setup(&request.entity_id).await;
    if !result.success {
        return Ok(Json(failed("Failed to setup LinkedIn integration", result.message)));
    }

    Ok(Json(LinkedInResponse {
        success: true,
        message: result.message,
        data: result.redirect_url.map(|url| json!({ "redirect_url": url })),
        error: None,
    }))
}

async fn search_profiles(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LinkedInProfileSearchRequest>,
) -> Result<Json<LinkedInProfilesResponse>, ApiError> {
    require_token(&request.access_token)?;

    let result = state
        .linkedin
        .search_profiles(&request.keywords, &request.access_token, request.limit, &request.entity_id)
        .await;

    Ok(Json(match result {
        Ok(search) => LinkedInProfilesResponse {
            success: true,
            message: search.message,
            profiles: search.profiles,
            error: None,
        },
        Err(err) => LinkedInProfilesResponse {
            success: false,
            message: "Failed to search profiles".to_string(),
            profiles: Vec::new(),
            error: Some(err.message().to_string()),
        },
    }))
}

async fn connect(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LinkedInConnectionRequest>,
) -> Result<Json<LinkedInResponse>, ApiError> {
    require_token(&request.access_token)?;

    let note = match request.message.filter(|message| !message.is_empty()) {
        Some(message) => message,
        None => match state.composer.compose_linkedin(CONNECTION_NOTE_PROMPT).await {
            Ok(note) => note,
            Err(err) => {
                warn!(event_name = "linkedin.connect.note_fallback", error = %err, "using default connection note");
                DEFAULT_CONNECTION_NOTE.to_string()
            }
        },
    };

    let result = state
        .linkedin
        .send_connection_request(&request.profile_url, Some(&note), &request.access_token, &request.entity_id)
        .await;

    Ok(Json(match result {
        Ok(message) => LinkedInResponse {
            success: true,
            message,
            data: Some(json!({ "message_sent": note })),
            error: None,
        },
        Err(err) => failed("Failed to send connection request", err.message().to_string()),
    }))
}

async fn message(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LinkedInMessageRequest>,
) -> Result<Json<LinkedInResponse>, ApiError> {
    require_token(&request.access_token)?;

    let content = match state.composer.compose_linkedin(&request.content_prompt).await {
        Ok(content) => content,
        Err(err) => {
            error!(event_name = "linkedin.generate.failed", error = %err, "failed to generate message");
            return Ok(Json(failed("Failed to generate message", err.to_string())));
        }
    };

    let result = state
        .linkedin
        .send_message(&request.profile_id, &content, &request.access_token, &request.entity_id)
        .await;

    Ok(Json(match result {
        Ok(_) => {
            info!(event_name = "linkedin.message.completed", profile_id = %request.profile_id, "message sent");
            LinkedInResponse {
                success: true,
                message: "Message sent successfully".to_string(),
                data: Some(json!({ "message_content": content })),
                error: None,
            }
        }
        Err(err) => {
            error!(event_name = "linkedin.message.failed", error = %err, "failed to send message");
            LinkedInResponse {
                data: Some(json!({ "message_content": content })),
                ..failed("Failed to send message", err.message().to_string())
            }
        }
    }))
}

async fn create_post(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LinkedInPostRequest>,
) -> Result<Json<LinkedInResponse>, ApiError> {
    request.validate()?;
    require_token(&request.access_token)?;

    let content = match state.composer.compose_linkedin(&request.content_prompt).await {
        Ok(content) => content,
        Err(err) => {
            error!(event_name = "linkedin.generate.failed", error = %err, "failed to generate post content");
            return Ok(Json(failed("Failed to generate post content", err.to_string())));
        }
    };

    let result = state
        .linkedin
        .create_post(
            &content,
            &request.access_token,
            request.image_url.as_deref(),
            request.article_url.as_deref(),
            &request.entity_id,
        )
        .await;

    Ok(Json(match result {
        Ok(post) => {
            info!(event_name = "linkedin.post.completed", post_id = ?post.post_id, "post created");
            LinkedInResponse {
                success: true,
                message: post.message,
                data: Some(json!({ "post_content": content, "post_id": post.post_id })),
                error: None,
            }
        }
        Err(err) => {
            error!(event_name = "linkedin.post.failed", error = %err, "failed to create post");
            LinkedInResponse {
                data: Some(json!({ "post_content": content })),
                ..failed("Failed to create post", err.message().to_string())
            }
        }
    }))
}

async fn actions(State(state): State<AppState>) -> Json<ActionsResponse> {
    Json(match state.linkedin.list_actions().await {
        Ok(actions) => ActionsResponse {
            success: true,
            message: format!("Found {} LinkedIn actions", actions.len()),
            actions,
            error: None,
        },
        Err(err) => ActionsResponse {
            success: false,
            message: "Failed to list LinkedIn actions".to_string(),
            actions: Vec::new(),
            error: Some(err.message().to_string()),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Method, StatusCode};
    use outreach_broker::client::{ActionResponse, BrokerAction, BrokerError, InitiatedConnection};
    use outreach_broker::memory::InMemoryBroker;
    use serde_json::{json, Value};

    use crate::routes::test_support::{app, get, post, send, ScriptedLlm};

    #[tokio::test]
    async fn setup_without_body_uses_default_entity() {
        let broker = Arc::new(InMemoryBroker::new().with_connection(Ok(InitiatedConnection {
            redirect_url: Some("https://auth.example.com/li".to_string()),
            ..InitiatedConnection::default()
        })));

        let (status, body) =
            send(app(ScriptedLlm::replying("hi"), broker.clone()), Method::POST, "/api/v1/linkedin/setup", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["redirect_url"], "https://auth.example.com/li");
        assert_eq!(broker.connection_calls()[0].entity_id, "default");
    }

    #[tokio::test]
    async fn setup_failure_stays_in_body() {
        let broker = Arc::new(InMemoryBroker::new().with_connection(Err(BrokerError::Transport("down".to_string()))));

        let (status, body) = post(
            app(ScriptedLlm::replying("hi"), broker.clone()),
            "/api/v1/linkedin/setup",
            json!({"entity_id": "user-9"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Failed to setup LinkedIn integration");
        assert!(body["error"].as_str().expect("error").starts_with("Error setting up LinkedIn integration"));
        assert_eq!(broker.connection_calls()[0].entity_id, "user-9");
    }

    #[tokio::test]
    async fn placeholder_token_is_bad_request() {
        let (status, body) = post(
            app(ScriptedLlm::replying("hi"), InMemoryBroker::new()),
            "/api/v1/linkedin/search-profiles",
            json!({"keywords": "rust", "access_token": "string"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "A valid LinkedIn access token must be provided");
    }

    #[tokio::test]
    async fn search_maps_profiles() {
        let broker = InMemoryBroker::new().with_action(
            "LINKEDIN_SEARCH_FOR_PEOPLE",
            Ok(ActionResponse {
                data: Some(json!([{"id": "p1", "name": "Ada", "headline": "Engineer", "profileUrl": "https://linkedin.com/in/ada"}])),
                successfull: Some(true),
                ..ActionResponse::default()
            }),
        );

        let (status, body) = post(
            app(ScriptedLlm::replying("hi"), broker),
            "/api/v1/linkedin/search-profiles",
            json!({"keywords": "rust", "access_token": "li-token"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Found 1 profiles matching your search");
        assert_eq!(body["profiles"][0]["url"], "https://linkedin.com/in/ada");
    }

    #[tokio::test]
    async fn search_treats_null_limit_and_entity_as_defaults() {
        let broker = Arc::new(InMemoryBroker::new().with_action(
            "LINKEDIN_SEARCH_FOR_PEOPLE",
            Ok(ActionResponse {
                data: Some(json!([{"id": "p1", "name": "Ada"}])),
                successfull: Some(true),
                ..ActionResponse::default()
            }),
        ));

        let (status, body) = post(
            app(ScriptedLlm::replying("hi"), broker.clone()),
            "/api/v1/linkedin/search-profiles",
            json!({"keywords": "x", "access_token": "li-token", "limit": null, "entity_id": null}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let executed = broker.executed();
        assert_eq!(executed[0].entity_id, "default");
        assert_eq!(executed[0].input["limit"], 10);
    }

    #[tokio::test]
    async fn setup_with_null_entity_uses_default() {
        let broker = Arc::new(InMemoryBroker::new().with_connection(Ok(InitiatedConnection {
            redirect_url: Some("https://auth.example.com/li".to_string()),
            ..InitiatedConnection::default()
        })));

        let (status, _) =
            post(app(ScriptedLlm::replying("hi"), broker.clone()), "/api/v1/linkedin/setup", json!({"entity_id": null}))
                .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(broker.connection_calls()[0].entity_id, "default");
    }

    #[tokio::test]
    async fn connect_generates_note_when_missing() {
        let broker = Arc::new(InMemoryBroker::new().with_action(
            "LINKEDIN_SENDS_CONNECTION_REQUEST",
            Ok(ActionResponse { successfull: Some(true), ..ActionResponse::default() }),
        ));

        let (status, body) = post(
            app(ScriptedLlm::replying("  Great to meet you at RustConf!  "), broker.clone()),
            "/api/v1/linkedin/connect",
            json!({"profile_url": "https://linkedin.com/in/ada", "access_token": "li-token"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["message_sent"], "Great to meet you at RustConf!");
        assert_eq!(broker.executed()[0].input["message"], "Great to meet you at RustConf!");
    }

    #[tokio::test]
    async fn connect_falls_back_to_default_note() {
        let broker = Arc::new(InMemoryBroker::new().with_action(
            "LINKEDIN_SENDS_CONNECTION_REQUEST",
            Ok(ActionResponse { successfull: Some(true), ..ActionResponse::default() }),
        ));

        let (_, body) = post(
            app(ScriptedLlm::replying("   "), broker),
            "/api/v1/linkedin/connect",
            json!({"profile_url": "https://linkedin.com/in/ada", "access_token": "li-token"}),
        )
        .await;

        assert_eq!(body["data"]["message_sent"], "I'd like to connect with you on LinkedIn.");
    }

    #[tokio::test]
    async fn message_failure_keeps_content() {
        let (status, body) = post(
            app(ScriptedLlm::replying("Thanks for the talk"), InMemoryBroker::new()),
            "/api/v1/linkedin/message",
            json!({"profile_id": "p1", "content_prompt": "Thank them", "access_token": "li-token"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Failed to send message");
        assert_eq!(body["data"]["message_content"], "Thanks for the talk");
    }

    #[tokio::test]
    async fn post_returns_post_id() {
        let broker = InMemoryBroker::new().with_action(
            "LINKEDIN_CREATES_POST",
            Ok(ActionResponse { data: Some(json!({"id": "urn:li:share:1"})), ..ActionResponse::default() }),
        );

        let (status, body) = post(
            app(ScriptedLlm::replying("We shipped!"), broker),
            "/api/v1/linkedin/post",
            json!({"content_prompt": "Announce launch", "access_token": "li-token"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Post created successfully");
        assert_eq!(body["data"], json!({"post_content": "We shipped!", "post_id": "urn:li:share:1"}));
    }

    #[tokio::test]
    async fn post_rejects_non_http_urls() {
        let (status, _) = post(
            app(ScriptedLlm::replying("We shipped!"), InMemoryBroker::new()),
            "/api/v1/linkedin/post",
            json!({"content_prompt": "Announce", "access_token": "li-token", "image_url": "ftp://x/y.png"}),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn actions_lists_linkedin_catalog() {
        let broker = InMemoryBroker::new().with_catalog(Ok(vec![
            BrokerAction { name: "LINKEDIN_CREATES_POST".to_string(), description: Some("Create a post".to_string()) },
            BrokerAction { name: "GMAIL_SEND_EMAIL".to_string(), description: None },
        ]));

        let (status, body) = get(app(ScriptedLlm::replying("hi"), broker), "/api/v1/linkedin/actions").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Found 1 LinkedIn actions");
        assert_eq!(body["actions"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["error"], Value::Null);
    }
}
