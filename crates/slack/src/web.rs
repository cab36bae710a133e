//! Minimal Slack Web API client: channel listing and token checks.

use std::time::Duration;

use async_trait::async_trait;
use outreach_core::config::SlackConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CHANNEL_TYPES: &str = "public_channel,private_channel";
const PAGE_LIMIT: &str = "1000";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlackApiError {
    #[error("slack request failed: {0}")]
    Transport(String),
    #[error("slack returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("could not decode slack response: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ConversationsList {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channels: Vec<Conversation>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthTest {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn conversations_list(&self, bot_token: &str) -> Result<ConversationsList, SlackApiError>;
    async fn auth_test(&self, bot_token: &str) -> Result<AuthTest, SlackApiError>;
}

pub struct SlackWebClient {
    client: Client,
    base_url: String,
}

impl SlackWebClient {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;
        Ok(Self { client, base_url: config.api_base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SlackApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SlackApiError::Http { status: status.as_u16(), body });
    }
    response.json::<T>().await.map_err(|error| SlackApiError::Decode(error.to_string()))
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn conversations_list(&self, bot_token: &str) -> Result<ConversationsList, SlackApiError> {
        debug!(event_name = "slack.web.conversations_list", "listing slack conversations");
        let response = self
            .client
            .get(self.url("conversations.list"))
            .bearer_auth(bot_token)
            .query(&[("types", CHANNEL_TYPES), ("exclude_archived", "true"), ("limit", PAGE_LIMIT)])
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(error.without_url().to_string()))?;
        decode(response).await
    }

    async fn auth_test(&self, bot_token: &str) -> Result<AuthTest, SlackApiError> {
        let response = self
            .client
            .post(self.url("auth.test"))
            .bearer_auth(bot_token)
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(error.without_url().to_string()))?;
        decode(response).await
    }
}
