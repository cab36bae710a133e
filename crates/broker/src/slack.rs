use std::sync::Arc;

use outreach_core::domain::connection::{ConnectionApp, SetupResponse};
use outreach_core::domain::{is_usable_secret, DEFAULT_ENTITY_ID};
use outreach_core::CredentialCache;
use serde_json::{json, Map};
use tracing::{error, info};

use crate::client::IntegrationBroker;
use crate::connection::setup_integration;
use crate::outcome::{ActionOutcome, DispatchError, UNKNOWN_RESPONSE_ERROR};

pub const SEND_MESSAGE_ACTION: &str = "SLACK_SENDS_A_MESSAGE_TO_A_SLACK_CHANNEL";

const MISSING_TOKEN: &str = "No valid bot token provided or found in cache. Please provide a bot token or first call the channels endpoint with a valid token.";

/// Posts messages to Slack through the broker.
///
/// Bot tokens are remembered per channel, shared with the channel directory,
/// so a caller who listed channels can send without repeating the token.
#[derive(Clone)]
pub struct SlackDispatchService {
    broker: Arc<dyn IntegrationBroker>,
    tokens: Arc<CredentialCache>,
}

impl SlackDispatchService {
    pub fn new(broker: Arc<dyn IntegrationBroker>, tokens: Arc<CredentialCache>) -> Self {
        Self { broker, tokens }
    }

    pub async fn setup(&self) -> SetupResponse {
        setup_integration(self.broker.as_ref(), ConnectionApp::Slack, DEFAULT_ENTITY_ID, Map::new()).await
    }

    pub async fn send(
        &self,
        message: &str,
        channel_id: &str,
        channel_name: Option<&str>,
        bot_token: Option<&str>,
    ) -> Result<String, DispatchError> {
        if channel_id.is_empty() {
            return Err(DispatchError::new("Channel ID is required"));
        }

        let token = match bot_token.filter(|token| is_usable_secret(Some(token))) {
            Some(token) => {
                self.tokens.store(channel_id, token).await;
                token.to_string()
            }
            None => match self.tokens.get(channel_id).await {
                Some(cached) => {
                    info!(event_name = "slack.send.cached_token", channel_id, "using cached bot token");
                    cached
                }
                None => return Err(DispatchError::new(MISSING_TOKEN)),
            },
        };

        info!(
            event_name = "slack.send.started",
            channel = channel_name.unwrap_or(channel_id),
            chars = message.chars().count(),
            "sending slack message"
        );

        let input = json!({ "channel": channel_id, "text": message, "token": token });
        let response = self
            .broker
            .execute_action(SEND_MESSAGE_ACTION, input, DEFAULT_ENTITY_ID)
            .await
            .map_err(|err| {
                error!(event_name = "slack.send.transport_failed", error = %err, "broker call failed");
                DispatchError::new(format!("Error using Composio API: {err}"))
            })?;

        match ActionOutcome::interpret(&response).error_or(UNKNOWN_RESPONSE_ERROR) {
            None => Ok("Message successfully sent to channel".to_string()),
            Some(reason) => Err(DispatchError::new(format!("Failed to send message via Composio: {reason}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use outreach_core::CredentialCache;
    use serde_json::json;

    use super::{SlackDispatchService, SEND_MESSAGE_ACTION};
    use crate::client::ActionResponse;
    use crate::memory::InMemoryBroker;

    fn delivered() -> ActionResponse {
        ActionResponse { data: Some(json!({"ok": true, "ts": "1712.01"})), ..ActionResponse::default() }
    }

    #[tokio::test]
    async fn channel_id_is_required() {
        let service = SlackDispatchService::new(Arc::new(InMemoryBroker::new()), Arc::default());

        let error = service.send("hi", "", None, Some("xoxb-1")).await.unwrap_err();

        assert_eq!(error.message(), "Channel ID is required");
    }

    #[tokio::test]
    async fn supplied_token_is_forwarded_and_cached() {
        let broker = Arc::new(InMemoryBroker::new().with_action(SEND_MESSAGE_ACTION, Ok(delivered())));
        let tokens = Arc::new(CredentialCache::default());
        let service = SlackDispatchService::new(broker.clone(), tokens.clone());

        service.send("Deploy finished", "C042", Some("eng"), Some("xoxb-live")).await.expect("sent");

        assert_eq!(tokens.get("C042").await.as_deref(), Some("xoxb-live"));
        assert_eq!(
            broker.executed()[0].input,
            json!({"channel": "C042", "text": "Deploy finished", "token": "xoxb-live"})
        );
    }

    #[tokio::test]
    async fn falls_back_to_cached_token() {
        let broker = Arc::new(InMemoryBroker::new().with_action(SEND_MESSAGE_ACTION, Ok(delivered())));
        let tokens = Arc::new(CredentialCache::default());
        tokens.store("C042", "xoxb-cached").await;
        let service = SlackDispatchService::new(broker.clone(), tokens);

        service.send("hi", "C042", None, Some("string")).await.expect("sent with cached token");

        assert_eq!(broker.executed()[0].input["token"], "xoxb-cached");
    }

    #[tokio::test]
    async fn missing_token_fails_without_calling_broker() {
        let broker = Arc::new(InMemoryBroker::new());
        let service = SlackDispatchService::new(broker.clone(), Arc::default());

        let error = service.send("hi", "C042", None, None).await.unwrap_err();

        assert!(error.message().starts_with("No valid bot token provided or found in cache."));
        assert!(broker.executed().is_empty());
    }

    #[tokio::test]
    async fn broker_rejection_is_reported() {
        let broker = Arc::new(InMemoryBroker::new().with_action(
            SEND_MESSAGE_ACTION,
            Ok(ActionResponse { successfull: Some(false), error: Some(json!("not_in_channel")), ..ActionResponse::default() }),
        ));
        let service = SlackDispatchService::new(broker, Arc::default());

        let error = service.send("hi", "C042", None, Some("xoxb-live")).await.unwrap_err();

        assert_eq!(error.message(), "Failed to send message via Composio: not_in_channel");
    }
}
