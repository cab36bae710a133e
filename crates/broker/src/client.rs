//! Integration broker seam and its Composio REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use outreach_core::config::BrokerConfig;
use outreach_core::domain::connection::ConnectionApp;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker request failed: {0}")]
    Transport(String),
    #[error("broker returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("could not decode broker response: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatedConnection {
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub connected_account_id: Option<String>,
    #[serde(default)]
    pub connection_status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ConnectedAccount {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ConnectedAccount {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("ACTIVE")
    }
}

/// Raw execution result. The broker spells the success flag `successfull`;
/// some actions report `success` instead.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub successfull: Option<bool>,
    #[serde(default)]
    pub success: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BrokerAction {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[async_trait]
pub trait IntegrationBroker: Send + Sync {
    async fn initiate_connection(
        &self,
        app: ConnectionApp,
        entity_id: &str,
        params: Map<String, Value>,
    ) -> Result<InitiatedConnection, BrokerError>;

    async fn get_connected_account(&self, id: &str) -> Result<ConnectedAccount, BrokerError>;

    async fn execute_action(
        &self,
        action: &str,
        input: Value,
        entity_id: &str,
    ) -> Result<ActionResponse, BrokerError>;

    /// Actions the broker exposes, optionally narrowed to one app.
    async fn list_actions(&self, app: Option<ConnectionApp>) -> Result<Vec<BrokerAction>, BrokerError>;
}

pub struct ComposioClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl ComposioClient {
    pub fn new(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| BrokerError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, self.api_key.expose_secret())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BrokerError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|error| BrokerError::Transport(error.without_url().to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BrokerError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(event_name = "broker.http_error", status = status.as_u16(), "broker rejected request");
        return Err(BrokerError::Api { status: status.as_u16(), body });
    }
    response.json::<T>().await.map_err(|error| BrokerError::Decode(error.to_string()))
}

#[derive(Deserialize)]
struct ActionList {
    #[serde(default)]
    items: Vec<BrokerAction>,
}

#[async_trait]
impl IntegrationBroker for ComposioClient {
    async fn initiate_connection(
        &self,
        app: ConnectionApp,
        entity_id: &str,
        params: Map<String, Value>,
    ) -> Result<InitiatedConnection, BrokerError> {
        debug!(event_name = "broker.connection.initiate", app = app.broker_name(), entity_id, "initiating connection");
        let url = format!("{}/v1/connectedAccounts", self.base_url);
        let body = json!({
            "appName": app.broker_name(),
            "entityId": entity_id,
            "data": params,
        });
        self.send(self.client.post(url).json(&body)).await
    }

    async fn get_connected_account(&self, id: &str) -> Result<ConnectedAccount, BrokerError> {
        let url = format!("{}/v1/connectedAccounts/{id}", self.base_url);
        self.send(self.client.get(url)).await
    }

    async fn execute_action(
        &self,
        action: &str,
        input: Value,
        entity_id: &str,
    ) -> Result<ActionResponse, BrokerError> {
        debug!(event_name = "broker.action.execute", action, entity_id, "executing broker action");
        let url = format!("{}/v2/actions/{action}/execute", self.base_url);
        let body = json!({ "entityId": entity_id, "input": input });
        self.send(self.client.post(url).json(&body)).await
    }

    async fn list_actions(&self, app: Option<ConnectionApp>) -> Result<Vec<BrokerAction>, BrokerError> {
        let url = format!("{}/v2/actions", self.base_url);
        let mut request = self.client.get(url);
        if let Some(app) = app {
            request = request.query(&[("apps", app.broker_name())]);
        }
        let list: ActionList = self.send(request).await?;
        Ok(list.items)
    }
}
