use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::error::not_found;
use crate::health;
use crate::middleware::log_requests;
use crate::state::AppState;

pub mod auth;
pub mod gmail;
pub mod linkedin;
pub mod slack;
pub mod whatsapp;

/// Routes served under the configured API prefix.
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health::routes())
        .route("/docs", get(health::docs))
        .nest("/gmail", gmail::routes())
        .nest("/auth", auth::routes())
        .nest("/slack", slack::routes())
        .nest("/linkedin", linkedin::routes())
        .nest("/whatsapp", whatsapp::routes())
}

pub fn router(state: AppState) -> Router {
    let prefix = state.api_prefix.clone();
    let root = Router::new().route("/", get(health::root));

    // An empty prefix mounts the API at the root, where its health route replaces the bare one.
    let app = if prefix.is_empty() {
        root.merge(api_routes())
    } else {
        root.route("/health", get(health::liveness)).nest(&prefix, api_routes())
    };

    app.fallback(not_found)
        .layer(from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use outreach_agent::{LlmClient, LlmError};
    use outreach_broker::memory::InMemoryBroker;
    use outreach_core::config::AppConfig;
    use outreach_slack::web::{AuthTest, Conversation, ConversationsList, SlackApiError};
    use outreach_slack::SlackApi;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::AppState;

    pub struct ScriptedLlm {
        reply: Result<String, LlmError>,
        models: Result<Vec<String>, LlmError>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        pub fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                models: Ok(vec!["models/gemini-1.5-pro".to_string()]),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(error: LlmError) -> Arc<Self> {
            Arc::new(Self { reply: Err(error.clone()), models: Err(error), prompts: Mutex::new(Vec::new()) })
        }

        pub fn without_models() -> Arc<Self> {
            Arc::new(Self { reply: Ok("ok".to_string()), models: Ok(Vec::new()), prompts: Mutex::new(Vec::new()) })
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("prompt log lock").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().expect("prompt log lock").push(prompt.to_string());
            self.reply.clone()
        }

        async fn list_models(&self) -> Result<Vec<String>, LlmError> {
            self.models.clone()
        }
    }

    /// Accepts only `xoxb-good`; every other token is rejected as `invalid_auth`.
    pub struct FakeSlack;

    #[async_trait]
    impl SlackApi for FakeSlack {
        async fn conversations_list(&self, bot_token: &str) -> Result<ConversationsList, SlackApiError> {
            if bot_token != "xoxb-good" {
                return Ok(ConversationsList { ok: false, error: Some("invalid_auth".to_string()), channels: Vec::new() });
            }
            Ok(ConversationsList {
                ok: true,
                error: None,
                channels: vec![
                    Conversation { id: Some("C1".to_string()), name: Some("general".to_string()) },
                    Conversation { id: Some("C2".to_string()), name: None },
                ],
            })
        }

        async fn auth_test(&self, bot_token: &str) -> Result<AuthTest, SlackApiError> {
            if bot_token != "xoxb-good" {
                return Ok(AuthTest { ok: false, error: Some("invalid_auth".to_string()), ..AuthTest::default() });
            }
            Ok(AuthTest {
                ok: true,
                user: Some("outreach-bot".to_string()),
                team: Some("Acme".to_string()),
                error: None,
            })
        }
    }

    pub fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.api_key = "gemini-test".to_string().into();
        config.broker.api_key = "composio-test".to_string().into();
        config
    }

    pub fn state_with(llm: Arc<dyn LlmClient>, broker: impl Into<Arc<InMemoryBroker>>) -> AppState {
        let broker: Arc<InMemoryBroker> = broker.into();
        AppState::new(&config(), llm, broker, Arc::new(FakeSlack))
    }

    pub fn app(llm: Arc<dyn LlmClient>, broker: impl Into<Arc<InMemoryBroker>>) -> Router {
        super::router(state_with(llm, broker))
    }

    pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
        (status, value)
    }

    pub async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(app, Method::POST, uri, Some(body)).await
    }

    pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        send(app, Method::GET, uri, None).await
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use outreach_broker::memory::InMemoryBroker;
    use serde_json::json;
    use tower::ServiceExt;

    use super::test_support::{app, get, post, ScriptedLlm};

    #[tokio::test]
    async fn unknown_routes_return_detail_404() {
        let (status, body) = get(app(ScriptedLlm::replying("hi"), InMemoryBroker::new()), "/api/v1/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not Found"}));
    }

    #[tokio::test]
    async fn malformed_json_is_unprocessable() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/gmail/generate")
            .header("content-type", "application/json")
            .body(Body::from("{\"recipient_email\": "))
            .expect("request");

        let response =
            app(ScriptedLlm::replying("hi"), InMemoryBroker::new()).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_fields_are_unprocessable() {
        let (status, body) = post(
            app(ScriptedLlm::replying("hi"), InMemoryBroker::new()),
            "/api/v1/slack/generate",
            json!({"channel_id": "C1"}),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().expect("detail").contains("content_prompt"));
    }

    #[tokio::test]
    async fn root_docs_link_resolves_to_endpoint_index() {
        let (status, root) = get(app(ScriptedLlm::replying("hi"), InMemoryBroker::new()), "/").await;
        assert_eq!(status, StatusCode::OK);

        let docs = root["docs"].as_str().expect("docs link").to_string();
        assert_eq!(docs, "/api/v1/docs");

        let (status, index) = get(app(ScriptedLlm::replying("hi"), InMemoryBroker::new()), &docs).await;
        assert_eq!(status, StatusCode::OK);
        let endpoints = index["endpoints"].as_array().expect("endpoints");
        assert!(endpoints.contains(&json!({"method": "POST", "path": "/api/v1/gmail/send"})));
        assert!(endpoints.contains(&json!({"method": "GET", "path": "/api/v1/docs"})));
    }

    #[tokio::test]
    async fn responses_carry_request_id_and_cors_headers() {
        let request = Request::builder()
            .uri("/health")
            .header("origin", "https://app.example.com")
            .body(Body::empty())
            .expect("request");

        let response =
            app(ScriptedLlm::replying("hi"), InMemoryBroker::new()).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            response.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
