use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(health)).route("/detailed", get(detailed))
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.service_name,
        "message": format!("Welcome to the {}", state.service_name),
        "docs": format!("{}/docs", state.api_prefix),
    }))
}

/// Method and path (relative to the API prefix) of every served endpoint.
const ENDPOINTS: &[(&str, &str)] = &[
    ("GET", "/health"),
    ("GET", "/health/detailed"),
    ("GET", "/docs"),
    ("POST", "/gmail/setup"),
    ("POST", "/gmail/generate"),
    ("POST", "/gmail/send"),
    ("POST", "/auth/gmail/connect"),
    ("POST", "/slack/setup"),
    ("GET", "/slack/channels"),
    ("POST", "/slack/generate"),
    ("POST", "/slack/send"),
    ("POST", "/linkedin/setup"),
    ("POST", "/linkedin/search-profiles"),
    ("POST", "/linkedin/connect"),
    ("POST", "/linkedin/message"),
    ("POST", "/linkedin/post"),
    ("GET", "/linkedin/actions"),
    ("POST", "/whatsapp/setup"),
    ("POST", "/whatsapp/generate"),
    ("POST", "/whatsapp/send"),
    ("POST", "/whatsapp/send-media"),
    ("POST", "/whatsapp/send-template"),
];

pub async fn docs(State(state): State<AppState>) -> Json<Value> {
    let endpoints: Vec<Value> = ENDPOINTS
        .iter()
        .map(|(method, path)| json!({ "method": method, "path": format!("{}{path}", state.api_prefix) }))
        .collect();

    Json(json!({ "name": state.service_name, "version": env!("CARGO_PKG_VERSION"), "endpoints": endpoints }))
}

pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", service: state.service_name })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemInfo {
    pub version: &'static str,
    pub platform: String,
    pub uptime_seconds: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub status: &'static str,
    pub details: Value,
}

impl ConnectionStatus {
    fn from_check(details: Value) -> Self {
        let connected = details.get("success").and_then(Value::as_bool).unwrap_or(false);
        Self { status: if connected { "connected" } else { "disconnected" }, details }
    }

    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiConnections {
    pub gemini: ConnectionStatus,
    pub slack: ConnectionStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub system_info: SystemInfo,
    pub api_connections: ApiConnections,
}

/// Always answers 200; a failing Gemini check only downgrades `status` to `degraded`.
pub async fn detailed(State(state): State<AppState>) -> (StatusCode, Json<DetailedHealthResponse>) {
    let gemini = ConnectionStatus::from_check(gemini_check(&state).await);
    let slack = ConnectionStatus::from_check(slack_check(&state).await);
    let status = if gemini.is_connected() { "healthy" } else { "degraded" };

    info!(
        event_name = "system.health.detailed",
        status,
        gemini = gemini.status,
        slack = slack.status,
        "detailed health check completed"
    );

    let payload = DetailedHealthResponse {
        status,
        service: state.service_name,
        system_info: SystemInfo {
            version: env!("CARGO_PKG_VERSION"),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            uptime_seconds: state.started_at.elapsed().as_secs(),
        },
        api_connections: ApiConnections { gemini, slack },
    };

    (StatusCode::OK, Json(payload))
}

async fn gemini_check(state: &AppState) -> Value {
    match state.composer.llm().list_models().await {
        Ok(models) if models.is_empty() => {
            json!({ "success": false, "error": "No models available from Google Gemini API" })
        }
        Ok(models) => json!({
            "success": true,
            "message": "Successfully connected to Google Gemini API",
            "models_available": models.len(),
        }),
        Err(err) => {
            warn!(event_name = "system.health.gemini_failed", error = %err, "gemini connectivity check failed");
            json!({ "success": false, "error": format!("Error connecting to Google Gemini API: {err}") })
        }
    }
}

async fn slack_check(state: &AppState) -> Value {
    let Some(token) = state.health_bot_token.as_ref() else {
        return json!({ "success": false, "error": "SLACK_BOT_TOKEN is not set" });
    };

    match state.slack_api.auth_test(token.expose_secret()).await {
        Ok(identity) if identity.ok => json!({
            "success": true,
            "message": "Successfully connected to Slack API",
            "bot_name": identity.user,
            "team": identity.team,
        }),
        Ok(identity) => json!({
            "success": false,
            "error": format!("Slack API error: {}", identity.error.unwrap_or_else(|| "Unknown error".to_string())),
        }),
        Err(err) => json!({ "success": false, "error": format!("Error connecting to Slack API: {err}") }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use outreach_agent::LlmError;
    use outreach_broker::memory::InMemoryBroker;
    use serde_json::json;

    use crate::health::{detailed, health, root};
    use crate::routes::test_support::{app, config, get, state_with, FakeSlack, ScriptedLlm};
    use crate::state::AppState;

    #[tokio::test]
    async fn health_names_the_service() {
        let state = state_with(ScriptedLlm::replying("hi"), InMemoryBroker::new());

        let Json(payload) = health(State(state)).await;

        assert_eq!(payload.status, "healthy");
        assert_eq!(payload.service, "Outreach AI Agents API");
    }

    #[tokio::test]
    async fn root_points_at_docs() {
        let state = state_with(ScriptedLlm::replying("hi"), InMemoryBroker::new());

        let Json(payload) = root(State(state)).await;

        assert_eq!(payload["docs"], "/api/v1/docs");
        assert_eq!(payload["message"], "Welcome to the Outreach AI Agents API");
    }

    #[tokio::test]
    async fn detailed_is_healthy_when_gemini_answers() {
        let mut config = config();
        config.slack.bot_token = Some("xoxb-good".to_string().into());
        let state =
            AppState::new(&config, ScriptedLlm::replying("hi"), Arc::new(InMemoryBroker::new()), Arc::new(FakeSlack));

        let (status, Json(payload)) = detailed(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "healthy");
        assert_eq!(payload.api_connections.gemini.status, "connected");
        assert_eq!(payload.api_connections.gemini.details["models_available"], 1);
        assert_eq!(payload.api_connections.slack.status, "connected");
        assert_eq!(payload.api_connections.slack.details["team"], "Acme");
    }

    #[tokio::test]
    async fn detailed_degrades_when_gemini_fails() {
        let state = state_with(
            ScriptedLlm::failing(LlmError::Api { status: 403, body: "API key not valid".to_string() }),
            InMemoryBroker::new(),
        );

        let (status, Json(payload)) = detailed(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.api_connections.gemini.status, "disconnected");
        assert!(payload.api_connections.gemini.details["error"]
            .as_str()
            .expect("error")
            .starts_with("Error connecting to Google Gemini API:"));
        assert_eq!(
            payload.api_connections.slack.details,
            json!({"success": false, "error": "SLACK_BOT_TOKEN is not set"})
        );
    }

    #[tokio::test]
    async fn detailed_reports_empty_model_list() {
        let state = state_with(ScriptedLlm::without_models(), InMemoryBroker::new());

        let (_, Json(payload)) = detailed(State(state)).await;

        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.api_connections.gemini.details["error"], "No models available from Google Gemini API");
    }

    #[tokio::test]
    async fn detailed_surfaces_slack_rejection() {
        let mut config = config();
        config.slack.bot_token = Some("xoxb-revoked".to_string().into());
        let state =
            AppState::new(&config, ScriptedLlm::replying("hi"), Arc::new(InMemoryBroker::new()), Arc::new(FakeSlack));

        let (_, Json(payload)) = detailed(State(state)).await;

        assert_eq!(payload.api_connections.slack.details["error"], "Slack API error: invalid_auth");
    }

    #[tokio::test]
    async fn bare_and_prefixed_health_routes_are_served() {
        let (status, body) = get(app(ScriptedLlm::replying("hi"), InMemoryBroker::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy"}));

        let (status, body) = get(app(ScriptedLlm::replying("hi"), InMemoryBroker::new()), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "Outreach AI Agents API");
    }

    #[tokio::test]
    async fn empty_prefix_mounts_api_at_root() {
        let mut config = config();
        config.server.api_prefix = "/".to_string();
        let state =
            AppState::new(&config, ScriptedLlm::replying("hi"), Arc::new(InMemoryBroker::new()), Arc::new(FakeSlack));

        let (status, body) = get(crate::routes::router(state), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "Outreach AI Agents API");
    }
}
