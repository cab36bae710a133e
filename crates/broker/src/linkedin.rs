use std::sync::Arc;

use outreach_core::domain::connection::{ConnectionApp, SetupResponse};
use outreach_core::domain::is_usable_secret;
use outreach_core::domain::linkedin::{ActionInfo, LinkedInProfileInfo, DEFAULT_CONNECTION_NOTE};
use outreach_core::CredentialCache;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::client::{BrokerError, IntegrationBroker};
use crate::connection::setup_integration;
use crate::outcome::{execute_first_available, failure_reason, is_truthy, ActionOutcome, DispatchError};

pub const SEARCH_ACTIONS: [&str; 3] =
    ["LINKEDIN_SEARCH_FOR_PEOPLE", "LINKEDIN_SEARCHES_FOR_PEOPLE", "LINKEDIN_SEARCHES_PROFILES"];
pub const CONNECT_ACTIONS: [&str; 3] = [
    "LINKEDIN_SENDS_CONNECTION_REQUEST",
    "LINKEDIN_SENDS_A_CONNECTION_REQUEST",
    "LINKEDIN_CONNECT_WITH_PROFILE",
];
pub const MESSAGE_ACTIONS: [&str; 3] =
    ["LINKEDIN_SENDS_MESSAGE", "LINKEDIN_SENDS_A_MESSAGE", "LINKEDIN_MESSAGE_PROFILE"];
pub const POST_ACTIONS: [&str; 3] = ["LINKEDIN_CREATES_POST", "LINKEDIN_CREATES_A_POST", "LINKEDIN_SHARE_POST"];

const INVALID_TOKEN: &str = "Invalid access token provided";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileSearch {
    pub message: String,
    pub profiles: Vec<LinkedInProfileInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedPost {
    pub message: String,
    pub post_id: Option<String>,
}

#[derive(Clone)]
pub struct LinkedInService {
    broker: Arc<dyn IntegrationBroker>,
    tokens: Arc<CredentialCache>,
}

impl LinkedInService {
    pub fn new(broker: Arc<dyn IntegrationBroker>, tokens: Arc<CredentialCache>) -> Self {
        Self { broker, tokens }
    }

    pub async fn setup(&self, entity_id: &str) -> SetupResponse {
        setup_integration(self.broker.as_ref(), ConnectionApp::LinkedIn, entity_id, Map::new()).await
    }

    async fn accept_token(&self, access_token: &str, entity_id: &str) -> Result<(), DispatchError> {
        if !is_usable_secret(Some(access_token)) {
            error!(event_name = "linkedin.token.invalid", entity_id, "unusable access token supplied");
            return Err(DispatchError::new(INVALID_TOKEN));
        }
        self.tokens.store(entity_id, access_token).await;
        Ok(())
    }

    pub async fn search_profiles(
        &self,
        keywords: &str,
        access_token: &str,
        limit: u32,
        entity_id: &str,
    ) -> Result<ProfileSearch, DispatchError> {
        self.accept_token(access_token, entity_id).await?;

        let input = json!({ "keywords": keywords, "limit": limit, "token": access_token });
        let response = execute_first_available(self.broker.as_ref(), &SEARCH_ACTIONS, &input, entity_id)
            .await
            .map_err(|err| transport_failure("Error searching LinkedIn profiles", &err))?;

        if let Some(data) = response.data.as_ref().filter(|data| is_truthy(data)) {
            let profiles = parse_profiles(data);
            info!(event_name = "linkedin.search.succeeded", count = profiles.len(), "profile search completed");
            return Ok(ProfileSearch {
                message: format!("Found {} profiles matching your search", profiles.len()),
                profiles,
            });
        }

        let reason = failure_reason(&response).unwrap_or_else(|| "No profiles found".to_string());
        Err(DispatchError::new(format!("Failed to search LinkedIn profiles: {reason}")))
    }

    pub async fn send_connection_request(
        &self,
        profile_url: &str,
        message: Option<&str>,
        access_token: &str,
        entity_id: &str,
    ) -> Result<String, DispatchError> {
        self.accept_token(access_token, entity_id).await?;

        let note = message.filter(|text| !text.is_empty()).unwrap_or(DEFAULT_CONNECTION_NOTE);
        let input = json!({ "profileUrl": profile_url, "message": note, "token": access_token });
        let response = execute_first_available(self.broker.as_ref(), &CONNECT_ACTIONS, &input, entity_id)
            .await
            .map_err(|err| transport_failure("Error sending connection request", &err))?;

        match ActionOutcome::interpret(&response).error_or("Unknown error") {
            None => Ok("Connection request sent successfully".to_string()),
            Some(reason) => Err(DispatchError::new(format!("Failed to send connection request: {reason}"))),
        }
    }

    pub async fn send_message(
        &self,
        profile_id: &str,
        message: &str,
        access_token: &str,
        entity_id: &str,
    ) -> Result<String, DispatchError> {
        self.accept_token(access_token, entity_id).await?;

        let input = json!({ "profileId": profile_id, "message": message, "token": access_token });
        let response = execute_first_available(self.broker.as_ref(), &MESSAGE_ACTIONS, &input, entity_id)
            .await
            .map_err(|err| transport_failure("Error sending message", &err))?;

        match ActionOutcome::interpret(&response).error_or("Unknown error") {
            None => Ok("Message sent successfully".to_string()),
            Some(reason) => Err(DispatchError::new(format!("Failed to send message: {reason}"))),
        }
    }

    pub async fn create_post(
        &self,
        content: &str,
        access_token: &str,
        image_url: Option<&str>,
        article_url: Option<&str>,
        entity_id: &str,
    ) -> Result<PublishedPost, DispatchError> {
        self.accept_token(access_token, entity_id).await?;

        let mut input = Map::new();
        input.insert("content".to_string(), Value::from(content));
        input.insert("token".to_string(), Value::from(access_token));
        if let Some(url) = image_url.filter(|url| !url.is_empty()) {
            input.insert("imageUrl".to_string(), Value::from(url));
        }
        if let Some(url) = article_url.filter(|url| !url.is_empty()) {
            input.insert("articleUrl".to_string(), Value::from(url));
        }

        let response =
            execute_first_available(self.broker.as_ref(), &POST_ACTIONS, &Value::Object(input), entity_id)
                .await
                .map_err(|err| transport_failure("Error creating post", &err))?;

        match ActionOutcome::interpret(&response) {
            ActionOutcome::Succeeded { data } => Ok(PublishedPost {
                message: "Post created successfully".to_string(),
                post_id: data.as_ref().and_then(|data| data.get("id")).and_then(scalar_text),
            }),
            failed => {
                let reason = failed.error_or("Unknown error").unwrap_or_default();
                Err(DispatchError::new(format!("Failed to create post: {reason}")))
            }
        }
    }

    /// Broker actions whose name mentions LinkedIn.
    pub async fn list_actions(&self) -> Result<Vec<ActionInfo>, DispatchError> {
        let actions = self
            .broker
            .list_actions(Some(ConnectionApp::LinkedIn))
            .await
            .map_err(|err| transport_failure("Error listing LinkedIn actions", &err))?;

        Ok(actions
            .into_iter()
            .filter(|action| action.name.contains("LINKEDIN"))
            .map(|action| ActionInfo {
                name: action.name,
                description: action
                    .description
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| "No description available".to_string()),
            })
            .collect())
    }
}

fn transport_failure(context: &str, err: &BrokerError) -> DispatchError {
    error!(event_name = "linkedin.broker_failed", context, error = %err, "broker call failed");
    DispatchError::new(format!("{context}: {err}"))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Profiles arrive either as a bare array or under `profiles`.
fn parse_profiles(data: &Value) -> Vec<LinkedInProfileInfo> {
    let entries = match data {
        Value::Array(items) => items.as_slice(),
        Value::Object(fields) => match fields.get("profiles") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(scalar_text)?;
            Some(LinkedInProfileInfo {
                id,
                name: entry.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                headline: entry.get("headline").and_then(Value::as_str).map(str::to_string),
                url: entry.get("profileUrl").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect()
}
